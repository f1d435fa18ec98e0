//! Convenience result type alias for NetPulse.

use crate::error::AppError;

/// A specialized `Result` type for NetPulse operations.
pub type AppResult<T> = Result<T, AppError>;
