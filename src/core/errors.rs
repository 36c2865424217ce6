/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 *
 * Every failure also has an OS-style error code so the ABI entry points can
 * report it through the last-error slot the way the native functions do.
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A device attached to the system is not functioning
pub const ERROR_GEN_FAILURE: u32 = 31;
/// The parameter is incorrect
pub const ERROR_INVALID_PARAMETER: u32 = 87;
/// The specified procedure could not be found
pub const ERROR_PROC_NOT_FOUND: u32 = 127;
/// This operation returned because the timeout period expired
pub const ERROR_TIMEOUT: u32 = 1460;

/// Result type for compat operations
pub type CompatResult<T> = Result<T, CompatError>;

/// Compat primitive errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum CompatError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(compat::invalid_argument),
        help("Address size must be 1, 2, 4 or 8 and the address must be aligned to it.")
    )]
    InvalidArgument(String),

    #[error("Wait operation timed out")]
    #[diagnostic(
        code(compat::timeout),
        help("The value did not change before the deadline. This is an expected outcome of a bounded wait.")
    )]
    Timeout,

    #[error("No random provider available")]
    #[diagnostic(
        code(compat::provider_unavailable),
        help("Neither the native nor the legacy random entry point could be resolved on this host.")
    )]
    ProviderUnavailable,

    #[error("Random generation failed")]
    #[diagnostic(
        code(compat::generation_failure),
        help("The random provider rejected a chunk. The buffer contents are unspecified.")
    )]
    GenerationFailure,

    #[error("Native call failed with OS error {0}")]
    #[diagnostic(code(compat::os_error))]
    Os(u32),
}

impl CompatError {
    /// OS-style error code reported through the last-error slot
    pub const fn code(&self) -> u32 {
        match self {
            CompatError::InvalidArgument(_) => ERROR_INVALID_PARAMETER,
            CompatError::Timeout => ERROR_TIMEOUT,
            CompatError::ProviderUnavailable => ERROR_PROC_NOT_FOUND,
            CompatError::GenerationFailure => ERROR_GEN_FAILURE,
            CompatError::Os(code) => *code,
        }
    }

    /// Map an OS error code back into the taxonomy
    ///
    /// Used when a native entry point fails and leaves its own code behind.
    pub fn from_code(code: u32) -> Self {
        match code {
            ERROR_INVALID_PARAMETER => {
                CompatError::InvalidArgument("rejected by native provider".to_string())
            }
            ERROR_TIMEOUT => CompatError::Timeout,
            ERROR_PROC_NOT_FOUND => CompatError::ProviderUnavailable,
            ERROR_GEN_FAILURE => CompatError::GenerationFailure,
            other => CompatError::Os(other),
        }
    }

    /// Whether the error is an ordinary outcome rather than a fault
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CompatError::Timeout)
    }
}
