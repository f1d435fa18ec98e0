//! Message validation rules.

use netpulse_core::error::AppError;

/// Maximum accepted message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 65_536;

/// Validates a raw inbound frame before parsing.
pub fn validate_inbound(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_MESSAGE_SIZE {
        return Err(AppError::protocol(format!(
            "Message exceeds maximum size of {} bytes",
            MAX_MESSAGE_SIZE
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::protocol("Empty message"));
    }

    Ok(())
}

/// Validates a metric name.
pub fn validate_metric_name(metric: &str) -> Result<(), AppError> {
    if metric.trim().is_empty() || metric.len() > 256 {
        return Err(AppError::protocol("Invalid metric name length"));
    }

    if metric.chars().any(char::is_control) {
        return Err(AppError::protocol("Metric name contains control characters"));
    }

    Ok(())
}
