//! UseCase error types.

use thiserror::Error;

/// `signal` could not be relayed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("sender and target are not both members of room '{0}'")]
    NotRouted(String),

    #[error("failed to deliver signal: {0}")]
    DeliveryFailed(String),
}

/// `kick` was not carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KickError {
    #[error("requester is not the owner of a room the target is in")]
    NotAllowed,

    #[error("failed to notify kicked connection: {0}")]
    DeliveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayCredentialsError {
    #[error("relay credentials are not configured")]
    NotConfigured,

    #[error("failed to sign relay credentials: {0}")]
    SigningFailed(String),
}
