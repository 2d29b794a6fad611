//! Types and abstractions for store errors.

use core::fmt;

use crate::share::ShareError;

/// An error raised by a store operation.
#[derive(Debug)]
pub enum Error {
    /// The username is already in use.
    DuplicateUser,
    /// No account exists for the given username.
    UnknownUser,
    /// The requested share count is invalid, or would exceed the 254 available protector shares.
    ShareExhausted,
    /// A locked store can only create bootstrap accounts (zero shares).
    BootstrapOnly,
    /// A locked store with no isolated-check bits configured cannot answer `is_valid_login` at all.
    StillBootstrapping,
    /// `write_password_data` was attempted before enough protector shares exist to recover later.
    UnderThreshold,
    /// Fewer shares were submitted to `unlock` than the threshold requires.
    InsufficientShares,
    /// More of the submitted shares were wrong than the threshold's correction capacity allows.
    UnrecoverableShares,
    /// The shares submitted to `unlock` did not recombine into the secret on record.
    BadUnlock,
    /// `unlock` was called on a store that is already unlocked.
    AlreadyUnlocked,
    /// The persisted file's format tag is not one this crate understands.
    BadFormat,
    /// An I/O failure while reading or writing the persisted file.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateUser => write!(f, "username already exists"),
            Error::UnknownUser => write!(f, "unknown user"),
            Error::ShareExhausted => write!(f, "invalid or exhausted share count"),
            Error::BootstrapOnly => write!(f, "store is locked; only bootstrap accounts (0 shares) can be created"),
            Error::StillBootstrapping => {
                write!(f, "store is still bootstrapping and isolated validation is disabled")
            }
            Error::UnderThreshold => write!(f, "not enough protector shares to write a recoverable file"),
            Error::InsufficientShares => write!(f, "fewer shares submitted than the threshold requires"),
            Error::UnrecoverableShares => write!(f, "too many incorrect shares to recover the secret"),
            Error::BadUnlock => write!(f, "recovered secret did not match the stored integrity fingerprint"),
            Error::AlreadyUnlocked => write!(f, "store is already unlocked"),
            Error::BadFormat => write!(f, "unrecognized persisted file format"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ShareError> for Error {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::InsufficientShares => Error::InsufficientShares,
            ShareError::UnrecoverableShares => Error::UnrecoverableShares,
        }
    }
}
