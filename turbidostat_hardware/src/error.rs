use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("cannot open serial port {port}: {reason} (available: {})", fmt_ports(.available))]
    Open {
        port: String,
        reason: String,
        available: Vec<String>,
    },
    #[error("serial error: {0}")]
    Serial(String),
    #[error("serial read timeout")]
    Timeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_ports(ports: &[String]) -> String {
    if ports.is_empty() {
        "none".to_string()
    } else {
        ports.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
