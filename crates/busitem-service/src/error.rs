use busitem_registry::RegistryError;
use thiserror::Error;

pub type Result<T, E = ServiceError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("bus connection failed: {0}")]
    Connect(String),
    #[error("bus name {0} is already owned")]
    NameUnavailable(String),
    #[error("bus connection closed")]
    Disconnected,
    #[error("send failed: {0}")]
    Send(String),
    #[error("no pending request with ticket {0}")]
    UnknownRequest(u64),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
