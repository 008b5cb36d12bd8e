//! YAML configuration for an enhancement pipeline.
//!
//! A config selects the engine, its parameters and the working-resolution
//! bounds. Every field is optional; missing fields take their defaults.
//!
//! ```yaml
//! engine: bimef
//! bimef:
//!   mu: 0.5
//!   k: 3.0
//!   fusion:
//!     type: multi_scale
//!     levels: 4
//! adapter:
//!   bimef_max_dimension: 384
//! ```
//!
//! # Example
//!
//! ```rust
//! use lumen_enhance::{EnhanceConfig, EngineKind};
//!
//! let config = EnhanceConfig::from_yaml_str("engine: agcwd\nagcwd:\n  alpha: 0.4\n").unwrap();
//! assert_eq!(config.engine, EngineKind::Agcwd);
//! assert_eq!(config.agcwd.alpha, 0.4);
//! ```

use std::path::{Path, PathBuf};

use crate::adapter::ResolutionAdapter;
use crate::agcwd::{AgcwdParams, AGCWD_MAX_DIMENSION};
use crate::bimef::{BimefParams, BIMEF_MAX_DIMENSION};
use crate::engine::{Engine, EngineKind, Enhancer};
use lumen_core::PixelBuffer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config file not found.
    #[error("config file not found: {path}")]
    NotFound {
        /// Path that was searched.
        path: PathBuf,
    },

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<lumen_core::Error> for ConfigError {
    fn from(err: lumen_core::Error) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Working-resolution bounds per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Run through a [`ResolutionAdapter`]; when off, engines see full
    /// resolution.
    pub enabled: bool,
    /// Bound used with AGCWD.
    pub agcwd_max_dimension: u32,
    /// Bound used with BIMEF.
    pub bimef_max_dimension: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            agcwd_max_dimension: AGCWD_MAX_DIMENSION,
            bimef_max_dimension: BIMEF_MAX_DIMENSION,
        }
    }
}

impl AdapterConfig {
    /// Bound for `kind`.
    pub fn max_dimension(&self, kind: EngineKind) -> u32 {
        match kind {
            EngineKind::Agcwd => self.agcwd_max_dimension,
            EngineKind::Bimef => self.bimef_max_dimension,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Engine to run.
    pub engine: EngineKind,
    /// AGCWD parameters.
    pub agcwd: AgcwdParams,
    /// BIMEF parameters.
    pub bimef: BimefParams,
    /// Resolution adaptation.
    pub adapter: AdapterConfig,
}

impl EnhanceConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), engine = ?config.engine, "Loaded enhance config");
        Ok(config)
    }

    /// Serializes to YAML.
    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks the parameters of both engines and the adapter bounds.
    pub fn validate(&self) -> ConfigResult<()> {
        self.agcwd.validate()?;
        self.bimef.validate()?;
        if self.adapter.agcwd_max_dimension == 0 || self.adapter.bimef_max_dimension == 0 {
            return Err(ConfigError::Invalid(
                "adapter bounds must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Builds the selected engine.
    pub fn build_engine(&self) -> Engine {
        match self.engine {
            EngineKind::Agcwd => Engine::agcwd(self.agcwd),
            EngineKind::Bimef => Engine::bimef(self.bimef),
        }
    }

    /// Builds the adapter for the selected engine, or `None` if disabled.
    pub fn build_adapter(&self) -> ConfigResult<Option<ResolutionAdapter>> {
        if !self.adapter.enabled {
            return Ok(None);
        }
        let bound = self.adapter.max_dimension(self.engine);
        Ok(Some(ResolutionAdapter::new(bound)?))
    }

    /// Runs the configured pipeline on `buffer`.
    pub fn process(&self, buffer: &PixelBuffer) -> lumen_core::Result<PixelBuffer> {
        let engine = self.build_engine();
        if !self.adapter.enabled {
            return engine.enhance(buffer);
        }
        ResolutionAdapter::new(self.adapter.max_dimension(self.engine))?.run(buffer, &engine)
    }
}
