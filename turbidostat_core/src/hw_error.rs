//! Maps `Box<dyn Error>` from the `Link` boundary to typed `TurbidostatError`.
//!
//! The traits in `turbidostat_traits` use `Box<dyn Error + Send + Sync>` so
//! any transport can plug in; this module converts those to our typed error
//! enum, with an optional feature-gated path for `HwError` downcasting.

use crate::error::TurbidostatError;

/// Map a link-boundary error to a typed `TurbidostatError`.
///
/// Attempts to downcast known error types first, then falls back to
/// string-based heuristics.
pub fn map_link_error(e: &(dyn std::error::Error + 'static)) -> TurbidostatError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        use turbidostat_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => TurbidostatError::Timeout,
                HwError::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                    TurbidostatError::Timeout
                }
                other => TurbidostatError::Malformed(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>()
        && io.kind() == std::io::ErrorKind::TimedOut
    {
        return TurbidostatError::Timeout;
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        TurbidostatError::Timeout
    } else {
        TurbidostatError::Malformed(s)
    }
}
