use thiserror::Error;

/// Faults that end a submission before any test case is judged
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Language identifier is not in the toolchain table
    #[error("Unsupported language")]
    UnsupportedLanguage { language: String },

    /// Scratch directory or source file could not be prepared
    #[error("Failed to prepare scratch files: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_language_message() {
        let err = HarnessError::UnsupportedLanguage {
            language: "cobol".into(),
        };
        assert_eq!(err.to_string(), "Unsupported language");
    }
}
