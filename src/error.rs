use thiserror::Error as ThisError;

#[derive(ThisError, Debug, Eq, PartialEq, Clone)]
pub enum Error {
    #[error("SIP message error: {0}")]
    SipMessageError(String),

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("{0}")]
    Error(String),
}

impl From<rsip::Error> for Error {
    fn from(e: rsip::Error) -> Self {
        Error::SipMessageError(e.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::SipMessageError(e.to_string())
    }
}
