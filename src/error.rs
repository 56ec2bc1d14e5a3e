//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the linedupe application.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected or fatal failure)
/// - 2: No duplicates found (completed normally, nothing repeated)
/// - 3: Partial success (completed, but some sources failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Run completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Run completed but nothing was repeated.
    NoDuplicates = 2,
    /// Partial success: Run completed but some sources could not be read.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Pick the exit code for a completed run.
    ///
    /// Source failures take precedence over whether anything was found.
    #[must_use]
    pub fn for_run(found: bool, had_errors: bool) -> Self {
        match (found, had_errors) {
            (_, true) => Self::PartialSuccess,
            (true, false) => Self::Success,
            (false, false) => Self::NoDuplicates,
        }
    }

    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "LD000",
            Self::GeneralError => "LD001",
            Self::NoDuplicates => "LD002",
            Self::PartialSuccess => "LD003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "LD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Underlying causes, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
