use std::fmt;

use crate::types::Characteristic;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub enum Error {
    /// Transport-level failure: connect, timeout, or a 5xx from the cloud service.
    DeviceUnreachable(BoxError),
    DeviceNotFound(String),
    WriteRejected(String),
    InvalidSetpoint { requested_f: i32, min_f: i32, max_f: i32 },
    InvalidMode(i64),
    InvalidStatus(i64),
    InvalidValue { characteristic: Characteristic, reason: String },
    Protocol(String),
    Decode(serde_json::Error),
    Io(std::io::Error),
}

impl Error {
    pub fn unreachable(e: impl Into<BoxError>) -> Self {
        Error::DeviceUnreachable(e.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DeviceUnreachable(e) => write!(f, "device unreachable: {e}"),
            Error::DeviceNotFound(id) => write!(f, "device not found: {id}"),
            Error::WriteRejected(msg) => write!(f, "write rejected: {msg}"),
            Error::InvalidSetpoint { requested_f, min_f, max_f } => write!(
                f,
                "invalid setpoint: {requested_f}\u{00b0}F not in {min_f}..={max_f}\u{00b0}F"
            ),
            Error::InvalidMode(code) => write!(f, "invalid mode: {code}"),
            Error::InvalidStatus(code) => write!(f, "invalid system status: {code}"),
            Error::InvalidValue { characteristic, reason } => {
                write!(f, "invalid value for {}: {reason}", characteristic.hap_name())
            }
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeviceUnreachable(e) => Some(e.as_ref()),
            Error::Decode(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::DeviceUnreachable(Box::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
