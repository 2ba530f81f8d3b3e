use std::{error, fmt, io};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by particle-reverb.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    ParameterError(String),
    MessageError(String),
    IoError(io::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::MessageError(str) => write!(f, "Invalid effect message: {str}"),
            Self::IoError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}
