//! Engine configuration
//!
//! Stored as RON. Every field has a default, so a partial file (or none at
//! all) is fine:
//!
//! ```ron
//! (
//!     pacing: (frame_period_ms: 33, max_skip: 2),
//!     resolution: Half,
//!     headless: true,
//!     max_frames: Some(300),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::display::ResolutionMode;
use crate::pacing::PacingConfig;

/// Config file consulted when `FIXPACE_CONFIG` is unset
pub const DEFAULT_PATH: &str = "fixpace.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pacing: PacingConfig,
    pub resolution: ResolutionMode,
    pub fullscreen: bool,
    /// Run without a window, presenting into a capture sink
    pub headless: bool,
    /// Measure the wall clock against a sleep before starting
    pub clock_self_test: bool,
    /// Stop after this many virtual frames (headless only)
    pub max_frames: Option<u64>,
    /// Where headless mode writes PNG frames, if anywhere
    pub capture_dir: Option<PathBuf>,
    pub capture_every: u32,
    /// Headless mode: open a diagnostic pause every N batches
    pub diagnostic_every: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            resolution: ResolutionMode::Full,
            fullscreen: false,
            headless: false,
            clock_self_test: true,
            max_frames: None,
            capture_dir: None,
            capture_every: 30,
            diagnostic_every: None,
        }
    }
}

impl EngineConfig {
    /// Resolve the config from the environment: `FIXPACE_CONFIG`, then
    /// `fixpace.ron` if present, then defaults. `FIXPACE_MAX_FRAMES`
    /// overrides the frame limit.
    pub fn from_env() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os("FIXPACE_CONFIG").map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None if Path::new(DEFAULT_PATH).exists() => Self::load(DEFAULT_PATH)?,
            None => {
                log::debug!("no config file, using defaults");
                Self::default()
            }
        };

        if let Ok(value) = std::env::var("FIXPACE_MAX_FRAMES") {
            config.apply_max_frames(&value)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pacing.frame_period_ms == 0 {
            return Err(ConfigError::Invalid("frame_period_ms must be at least 1".into()));
        }
        if self.capture_every == 0 {
            return Err(ConfigError::Invalid("capture_every must be at least 1".into()));
        }
        if self.diagnostic_every == Some(0) {
            return Err(ConfigError::Invalid("diagnostic_every must be at least 1".into()));
        }
        Ok(())
    }

    fn apply_max_frames(&mut self, value: &str) -> Result<(), ConfigError> {
        match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => {
                self.max_frames = Some(n);
                Ok(())
            }
            _ => Err(ConfigError::Invalid(format!(
                "FIXPACE_MAX_FRAMES must be a positive integer, got {value:?}"
            ))),
        }
    }
}
