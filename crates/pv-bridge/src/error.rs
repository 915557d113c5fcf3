use busitem_registry::RegistryError;
use busitem_service::ServiceError;
use telemetry_provider::ProviderError;
use thiserror::Error;

pub type Result<T, E = BridgeError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),
    #[error("bus service: {0}")]
    Service(#[from] ServiceError),
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
}
