//! Human-readable error descriptions and structured JSON error formatting.

use turbidostat_core::error::TurbidostatError;
use turbidostat_hardware::error::HwError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(hw) = err.downcast_ref::<HwError>() {
        return match hw {
            HwError::Open { port, available, .. } => {
                let ports = if available.is_empty() {
                    "none found".to_string()
                } else {
                    available.join(", ")
                };
                format!(
                    "What happened: Could not open serial port {port}.\nLikely causes: Wrong port name, board unplugged, or the port is held by another program.\nHow to fix: Pass one of the available ports with --port ({ports}), or run `list-ports`."
                )
            }
            other => format!(
                "What happened: Serial link failure ({other}).\nLikely causes: Cable unplugged or board reset.\nHow to fix: Reconnect the board and rerun."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TurbidostatError>() {
        return match te {
            TurbidostatError::Timeout | TurbidostatError::ShortRead(_) => {
                "What happened: The chamber board did not answer in time.\nLikely causes: Board unpowered, wrong port, or serial.read_timeout_ms too low.\nHow to fix: Check power and cabling, confirm the port, and consider raising serial.read_timeout_ms.".to_string()
            }
            TurbidostatError::NoBlank => {
                "What happened: No blank reading could be captured on first run.\nLikely causes: The board is not answering.\nHow to fix: Check the hardware with --test, then rerun.".to_string()
            }
            TurbidostatError::Storage(msg) => format!(
                "What happened: Controller state could not be saved ({msg}).\nLikely causes: Disk full, read-only filesystem, or missing directory.\nHow to fix: Free space or point paths.state_file / --state-file at a writable location. The last good state is kept on disk."
            ),
            // Fallback to generic for other domain errors
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    if lower.contains("open data log") {
        return format!(
            "What happened: {msg}.\nLikely causes: Missing directory or no write permission.\nHow to fix: Point --logfile at a writable location."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for a port that cannot be opened, 3 for storage
/// failure, 1 for anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(HwError::Open { .. }) = err.downcast_ref::<HwError>() {
        return 2;
    }
    if let Some(TurbidostatError::Storage(_)) = err.downcast_ref::<TurbidostatError>() {
        return 3;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(hw) = err.downcast_ref::<HwError>() {
        return match hw {
            HwError::Open { .. } => "OpenFailed",
            _ => "Serial",
        };
    }
    match err.downcast_ref::<TurbidostatError>() {
        Some(TurbidostatError::Timeout | TurbidostatError::ShortRead(_)) => "Timeout",
        Some(TurbidostatError::NoBlank) => "NoBlank",
        Some(TurbidostatError::Storage(_)) => "Storage",
        Some(_) => "Sensor",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(HwError::Open { port, available, .. }) = err.downcast_ref::<HwError>() {
        obj["details"] = json!({ "port": port, "available": available });
    }
    obj.to_string()
}
