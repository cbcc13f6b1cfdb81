//! Process-wide runtime configuration.
//!
//! The configuration is installed once at startup with [`init`] and is
//! read-only afterwards. Library code that runs before (or without) an
//! explicit `init`, such as unit tests, sees [`RuntimeConfig::default`].

use once_cell::sync::OnceCell;

use crate::error::{AnonymizerError, AnonymizerResult};

/// Default cap on input document size (16 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 16 * 1024 * 1024;

static CONFIG: OnceCell<RuntimeConfig> = OnceCell::new();

/// Settings shared by every anonymization call in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Default tracing filter directive (e.g. `info`, `paper_anonymizer=debug`).
    pub log_level: String,

    /// Inputs larger than this are rejected before parsing.
    pub max_input_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl RuntimeConfig {
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }
}

/// Installs the process-wide configuration. Fails if called twice.
pub fn init(config: RuntimeConfig) -> AnonymizerResult<&'static RuntimeConfig> {
    if config.max_input_bytes == 0 {
        return Err(AnonymizerError::InvalidInput {
            parameter: "max_input_bytes".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    CONFIG
        .set(config)
        .map_err(|_| AnonymizerError::InvalidInput {
            parameter: "config".to_string(),
            reason: "runtime configuration is already initialized".to_string(),
        })?;

    Ok(get())
}

/// Returns the installed configuration, or the defaults if `init` never ran.
pub fn get() -> &'static RuntimeConfig {
    static FALLBACK: once_cell::sync::Lazy<RuntimeConfig> =
        once_cell::sync::Lazy::new(RuntimeConfig::default);
    CONFIG.get().unwrap_or(&FALLBACK)
}
