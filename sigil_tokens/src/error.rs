use thiserror::Error;

/// An error encountered while acquiring an access token
///
/// `E` is the identity client's own error type, preserved as the source of
/// the failure where one exists.
#[derive(Debug, Error)]
pub enum AcquisitionError<E> {
    /// An acquisition attempt completed without raising an error, but
    /// produced no token
    #[error("identity client completed the acquisition but returned no token")]
    NoTokenReturned,

    /// The interactive fallback flow failed
    #[error("interactive token acquisition failed")]
    Interactive(#[source] E),

    /// Silent acquisition failed for a reason other than required
    /// interaction, so no fallback was attempted
    #[error("silent token acquisition failed")]
    Silent(#[source] E),
}

impl<E> AcquisitionError<E> {
    /// The identity client error underlying this failure, if any
    pub fn identity_error(&self) -> Option<&E> {
        match self {
            AcquisitionError::NoTokenReturned => None,
            AcquisitionError::Interactive(e) | AcquisitionError::Silent(e) => Some(e),
        }
    }
}
