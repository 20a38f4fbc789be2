/// Error types for the geoprefix library
use std::fmt;

/// Result type alias for geoprefix operations
pub type Result<T> = std::result::Result<T, GeoError>;

/// Main error type for index building, loading and querying
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// Configuration errors (bad resolution, missing data directory or input file)
    Config(String),

    /// The load was canceled before it completed
    Canceled,

    /// I/O errors
    Io(String),

    /// A row could not be parsed
    Parse {
        /// 1-based line number in the source file (0 when unknown)
        line: u64,
        /// What was wrong with the row
        message: String,
    },

    /// Prefix length exceeds the address width
    InvalidPrefix(String),

    /// Text that is not an IP address was given to a lookup
    InvalidAddress(String),

    /// Lifecycle transition not allowed from the current state
    InvalidState(String),
}

impl GeoError {
    /// Build a parse error for the given line
    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        GeoError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GeoError::Canceled => write!(f, "Load canceled"),
            GeoError::Io(msg) => write!(f, "I/O error: {}", msg),
            GeoError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            GeoError::InvalidPrefix(msg) => write!(f, "Invalid prefix: {}", msg),
            GeoError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            GeoError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for GeoError {}

impl From<std::io::Error> for GeoError {
    fn from(err: std::io::Error) -> Self {
        GeoError::Io(err.to_string())
    }
}

impl From<csv::Error> for GeoError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.kind() {
            csv::ErrorKind::Io(_) => GeoError::Io(err.to_string()),
            _ => GeoError::Parse {
                line,
                message: err.to_string(),
            },
        }
    }
}
