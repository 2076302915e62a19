use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("accelerometer unavailable after {reads} reads")]
    SensorFault { reads: u64 },
    #[error("accelerometer read timeout")]
    Timeout,
    #[error("drivetrain error: {0}")]
    Drive(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
