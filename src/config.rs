use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SpotterError;
use crate::workout::SamplerSettings;
use crate::workout::sampler::{DEFAULT_COOLDOWN_MS, DEFAULT_SAMPLE_INTERVAL_MS};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_CLASSIFIER_ENDPOINT: &str = "http://127.0.0.1:8750";

#[derive(Serialize, Deserialize, Debug)]
pub struct AppConfig {
    pub sample_interval_ms: u64,
    pub cooldown_ms: u64,
    pub classifier_endpoint: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            classifier_endpoint: DEFAULT_CLASSIFIER_ENDPOINT.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?.join("spotter").join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let file = std::fs::File::open(config_path).expect("Could not open config file");
            Some(serde_json::from_reader(file).expect("Could not parse config file"))
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<(), SpotterError> {
        let config_path = dirs::config_dir()
            .ok_or(SpotterError::NoConfigDir)?
            .join("spotter")
            .join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            std::fs::create_dir_all(config_path.parent().ok_or(SpotterError::NoConfigDir)?)
                .map_err(|e| SpotterError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| SpotterError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| SpotterError::ConfigSerializeError { source: e })
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            sample_interval: Duration::from_millis(self.sample_interval_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}
