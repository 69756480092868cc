pub(crate) mod classifier;

pub use classifier::{PositionClassifier, RemoteClassifier, ScriptedClassifier};

use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::SpotterError;

/// A single still image, opaque to the counter. The bytes are whatever the
/// capture tool wrote; only the classifier endpoint interprets them.
#[derive(Clone, Debug)]
pub struct Frame {
    pub bytes: Vec<u8>,
    /// Milliseconds since the epoch when the frame was captured
    pub timestamp_ms: u128,
}

impl Frame {
    pub fn capture(bytes: Vec<u8>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Self {
            bytes,
            timestamp_ms,
        }
    }
}

/// A source of "the current frame" for the sampling loop.
///
/// Camera lifecycle, permissions, and encoding all live behind this boundary;
/// the counter only needs a still image representative of the current instant.
///
/// # Lifecycle
///
/// 1. Call `start()` once to validate the source and open any resources
/// 2. Call `current_frame()` on every sampling tick
///
/// A failed `current_frame()` is not fatal: the sampling loop logs it and skips
/// the tick, leaving the session state unchanged.
pub trait FrameSource {
    /// Validate and open the frame source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unusable, for example a missing spool
    /// directory.
    fn start(&mut self) -> Result<(), SpotterError>;

    /// Get the most recent frame from the source.
    ///
    /// # Errors
    ///
    /// Returns an error if no frame can be produced this instant.
    fn current_frame(&mut self) -> Result<Frame, SpotterError>;
}

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Reads the newest still image from a spool directory that an external
/// capture tool keeps writing frames into.
pub struct DirectoryFrameSource {
    dir: PathBuf,
}

impl DirectoryFrameSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl FrameSource for DirectoryFrameSource {
    fn start(&mut self) -> Result<(), SpotterError> {
        if !self.dir.is_dir() {
            return Err(SpotterError::NoFrameDir {
                path: format!("{}", self.dir.display()),
            });
        }
        Ok(())
    }

    fn current_frame(&mut self) -> Result<Frame, SpotterError> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| SpotterError::FrameReadError { source: e })?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false);
            if !is_frame {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| SpotterError::FrameReadError { source: e })?;
            if newest.as_ref().is_none_or(|(ts, _)| modified > *ts) {
                newest = Some((modified, path));
            }
        }

        let (modified, path) = newest.ok_or(SpotterError::NoFrameAvailable)?;
        let bytes =
            std::fs::read(&path).map_err(|e| SpotterError::FrameReadError { source: e })?;
        let timestamp_ms = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        Ok(Frame {
            bytes,
            timestamp_ms,
        })
    }
}

/// A mock frame source for tests and offline replay.
///
/// Serves a canned sequence of frames, or cycles a single frame forever. An
/// exhausted sequence reports `NoFrameAvailable`, which exercises the sampling
/// loop's skip-a-tick path.
pub struct MockFrameSource {
    cur_tick: usize,
    frames: Vec<Frame>,
    cycle: bool,
}

impl Default for MockFrameSource {
    fn default() -> Self {
        Self {
            cur_tick: 0,
            frames: Vec::new(),
            cycle: false,
        }
    }
}

impl MockFrameSource {
    /// Serve the provided frames in order, then fail every call.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            cur_tick: 0,
            frames,
            cycle: false,
        }
    }

    /// Serve the same frame on every call.
    pub fn cycling(frame: Frame) -> Self {
        Self {
            cur_tick: 0,
            frames: vec![frame],
            cycle: true,
        }
    }
}

impl FrameSource for MockFrameSource {
    fn start(&mut self) -> Result<(), SpotterError> {
        Ok(())
    }

    fn current_frame(&mut self) -> Result<Frame, SpotterError> {
        if self.frames.is_empty() {
            return Err(SpotterError::NoFrameAvailable);
        }
        if self.cycle {
            return Ok(self.frames[self.cur_tick % self.frames.len()].clone());
        }
        if self.cur_tick >= self.frames.len() {
            return Err(SpotterError::NoFrameAvailable);
        }

        let frame = self.frames[self.cur_tick].clone();
        self.cur_tick += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_source_requires_existing_dir() {
        let mut source = DirectoryFrameSource::new(PathBuf::from("/definitely/not/here"));
        assert!(source.start().is_err());
    }

    #[test]
    fn test_directory_source_serves_newest_frame() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("older.jpg"), b"old frame").unwrap();
        let older = SystemTime::now() - std::time::Duration::from_secs(60);
        let file = std::fs::File::options()
            .append(true)
            .open(dir.path().join("older.jpg"))
            .unwrap();
        file.set_modified(older).unwrap();
        std::fs::write(dir.path().join("newer.jpg"), b"new frame").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a frame").unwrap();

        let mut source = DirectoryFrameSource::new(dir.path().to_path_buf());
        source.start().unwrap();
        let frame = source.current_frame().unwrap();
        assert_eq!(frame.bytes, b"new frame");
    }

    #[test]
    fn test_directory_source_reports_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = DirectoryFrameSource::new(dir.path().to_path_buf());
        source.start().unwrap();
        assert!(matches!(
            source.current_frame(),
            Err(SpotterError::NoFrameAvailable)
        ));
    }

    #[test]
    fn test_mock_source_exhausts() {
        let mut source = MockFrameSource::from_frames(vec![Frame::capture(vec![1, 2, 3])]);
        source.start().unwrap();
        assert!(source.current_frame().is_ok());
        assert!(source.current_frame().is_err());
    }

    #[test]
    fn test_mock_source_cycles() {
        let mut source = MockFrameSource::cycling(Frame::capture(vec![7]));
        for _ in 0..5 {
            assert_eq!(source.current_frame().unwrap().bytes, vec![7]);
        }
    }
}
