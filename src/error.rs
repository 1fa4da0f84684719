//! Typed failures of the OATH session and its API.
//!
//! The conversion layer never fails; everything here comes from the
//! surrounding session: access password handling, credential lookup,
//! `otpauth://` parsing and the state file.

#[derive(Debug, thiserror::Error, PartialEq)]
#[allow(missing_docs)]
pub enum Error {
    #[error("the OATH session is locked, an access password is required")]
    Locked,

    #[error("wrong access password")]
    WrongPassword,

    #[error("no access password is set")]
    PasswordNotSet,

    #[error("no credential with id {0}")]
    NoSuchCredential(String),

    #[error("a credential with id {0} already exists")]
    CredentialExists(String),

    #[error("counter of credential {0} is exhausted")]
    CounterExhausted(String),

    #[error("invalid otpauth URI: {0}")]
    InvalidUri(String),

    #[error("secret is not valid base32")]
    InvalidSecret,

    #[error("state file: {0}")]
    State(String),
}

impl From<postcard::Error> for Error {
    fn from(error: postcard::Error) -> Self {
        Self::State(error.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::State(error.to_string())
    }
}
