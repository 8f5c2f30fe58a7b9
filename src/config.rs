use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow, bail};

/// Tunables for the simulated assistant. Loaded from
/// `<config_dir>/cropchat/config.json`; a missing file means defaults, and a
/// partial file only overrides the fields it names.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_response_delay_ms")]
    pub response_delay_ms: u64,
    #[serde(default = "default_recording_duration_ms")]
    pub recording_duration_ms: u64,
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    #[serde(default = "default_response_corpus")]
    pub response_corpus: Vec<String>,
    #[serde(default = "default_transcript_placeholder")]
    pub transcript_placeholder: String,
}

fn default_response_delay_ms() -> u64 {
    2000
}

fn default_recording_duration_ms() -> u64 {
    3000
}

fn default_max_input_length() -> usize {
    500
}

fn default_response_corpus() -> Vec<String> {
    [
        "Based on \"{query}\", maize is a strong fit. It tolerates variable rainfall and matures quickly.",
        "For conditions like \"{query}\", I'd look at cassava. It handles poor soils and long dry spells.",
        "Given \"{query}\", sorghum is worth a try. It is drought-hardy and does well on marginal land.",
        "With \"{query}\" in mind, consider groundnuts. They fix nitrogen and suit light sandy soils.",
        "Reading \"{query}\", sweet potato stands out: low input needs and a forgiving harvest window.",
        "From \"{query}\", beans could work well intercropped with maize to keep the soil productive.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_transcript_placeholder() -> String {
    "My field has sandy soil, around 600mm of rain a year, and I need a short-season crop".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_delay_ms: default_response_delay_ms(),
            recording_duration_ms: default_recording_duration_ms(),
            max_input_length: default_max_input_length(),
            response_corpus: default_response_corpus(),
            transcript_placeholder: default_transcript_placeholder(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// An unusable configuration is fatal at startup: the controller must
    /// never draw from an empty corpus or paste an empty transcript.
    pub fn validate(&self) -> Result<()> {
        if self.response_corpus.is_empty() {
            bail!("response_corpus must contain at least one reply template");
        }
        if self.response_corpus.iter().any(|t| t.trim().is_empty()) {
            bail!("response_corpus entries must not be blank");
        }
        if self.transcript_placeholder.trim().is_empty() {
            bail!("transcript_placeholder must not be blank");
        }
        if self.max_input_length == 0 {
            bail!("max_input_length must be at least 1");
        }
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("cropchat").join("config.json"))
    }

    /// Where the log file goes; kept beside the config so the whole app
    /// footprint lives in one directory.
    pub fn log_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("cropchat").join("cropchat.log"))
    }
}
