use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::mpsc::Receiver,
};

use log::error;

use crate::{SpotterError, workout::SessionOutput};

pub fn write_session(
    file: &PathBuf,
    session_receiver: Receiver<SessionOutput>,
) -> Result<(), SpotterError> {
    let session_file = File::create(file).map_err(|e| SpotterError::WriterError { source: e })?;
    let mut session_file_writer = BufWriter::new(session_file);
    for output in &session_receiver {
        match serde_json::to_string(&output) {
            Ok(line) => {
                if let Err(e) = writeln!(session_file_writer, "{}", line) {
                    error!("Error while writing session event to output file: {}", e);
                }
            }
            Err(e) => error!("Could not serialize session event: {}", e),
        }
    }
    session_file_writer
        .flush()
        .map_err(|e| SpotterError::WriterError { source: e })?;
    Ok(())
}
