use thiserror::Error;

pub type Result<T> = std::result::Result<T, WakeyError>;

/// everything that can go wrong during an operation.
/// none of these are fatal, they all get reported at the operation boundary
#[derive(Error, Debug)]
pub enum WakeyError {
    /// unparseable time/number/weekday from the user, recovered with a re-prompt
    #[error("invalid input: {0}")]
    InvalidInputFormat(String),

    /// alarm number outside 1..=len
    #[error("no alarm numbered {0}")]
    IndexOutOfRange(usize),

    /// missing music file, no audio device, unreachable calendar
    #[error("{0}")]
    ResourceUnavailable(String),

    #[error("couldn't parse file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("couldn't serialize: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
