//! Harness configuration
//!
//! Loaded from environment variables by the binary; library users can build
//! it directly.

use anyhow::Context;
use std::path::PathBuf;

/// Default cap for captured stdout / stderr (per stream)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory under which per-submission scratch directories are created
    pub scratch_root: PathBuf,
    /// Toolchain table to load instead of the built-in one
    pub languages_path: Option<PathBuf>,
    /// Compile step timeout; the submission's time limit when unset
    pub compile_time_limit_ms: Option<u32>,
    /// Maximum bytes kept from each of stdout and stderr
    pub max_output_bytes: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            languages_path: None,
            compile_time_limit_ms: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from `GRADER_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("GRADER_SCRATCH_DIR") {
            config.scratch_root = dir.into();
        }
        if let Ok(path) = std::env::var("GRADER_LANGUAGES_CONFIG") {
            config.languages_path = Some(path.into());
        }
        if let Ok(value) = std::env::var("GRADER_COMPILE_TIME_LIMIT_MS") {
            let ms = value
                .parse::<u32>()
                .with_context(|| format!("Invalid GRADER_COMPILE_TIME_LIMIT_MS: {}", value))?;
            config.compile_time_limit_ms = Some(ms);
        }
        if let Ok(value) = std::env::var("GRADER_MAX_OUTPUT_BYTES") {
            config.max_output_bytes = value
                .parse::<usize>()
                .with_context(|| format!("Invalid GRADER_MAX_OUTPUT_BYTES: {}", value))?;
        }

        Ok(config)
    }

    /// Compile timeout for a submission with the given time limit
    pub fn compile_time_limit(&self, time_limit_ms: u32) -> u32 {
        self.compile_time_limit_ms.unwrap_or(time_limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_time_limit_defaults_to_submission_limit() {
        let config = HarnessConfig::default();
        assert_eq!(config.compile_time_limit(1500), 1500);

        let config = HarnessConfig {
            compile_time_limit_ms: Some(30_000),
            ..HarnessConfig::default()
        };
        assert_eq!(config.compile_time_limit(1500), 30_000);
    }
}
