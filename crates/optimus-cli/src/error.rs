use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] optimus_core::ValidationError),

    #[error(transparent)]
    Quote(#[from] optimus_core::QuoteError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Quote(error) if error.is_upstream() => 3,
            Self::Quote(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimus_core::QuoteError;

    #[test]
    fn upstream_failures_exit_with_three() {
        let error = CliError::from(QuoteError::RetryExhausted {
            symbol: String::from("PETR4"),
            attempts: 3,
        });
        assert_eq!(error.exit_code(), 3);

        let error = CliError::from(QuoteError::invalid_request("symbol cannot be empty"));
        assert_eq!(error.exit_code(), 2);
    }
}
