//! Exit codes for the CLI.
//!
//! These codes enable scripting integration by providing structured
//! feedback about job results.

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// At least one clip produced (or a valid empty result)
    Success = 0,
    /// Partial success: some clips failed or fewer than requested
    PartialSuccess = 1,
    /// Unrecoverable job failure
    JobFailed = 2,
    /// Invalid command-line arguments or configuration
    Misuse = 3,
    /// Model endpoints unreachable or unhealthy
    Unhealthy = 4,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::PartialSuccess => write!(f, "partial success"),
            ExitCode::JobFailed => write!(f, "job failed"),
            ExitCode::Misuse => write!(f, "invalid arguments"),
            ExitCode::Unhealthy => write!(f, "endpoints unhealthy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 1);
        assert_eq!(ExitCode::JobFailed.as_i32(), 2);
        assert_eq!(ExitCode::Misuse.as_i32(), 3);
        assert_eq!(ExitCode::Unhealthy.as_i32(), 4);
    }
}
