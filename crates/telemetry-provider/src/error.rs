use thiserror::Error;

pub type Result<T, E = ProviderError> = core::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("timeout")]
    Timeout,
    #[error("device not found: {0}")]
    DeviceNotFound(u32),
    #[error("channel not found: {0}")]
    ChannelNotFound(u32),
    #[error("device detection failed: {0}")]
    Detection(String),
    #[error("no drivers could be switched online")]
    NoDrivers,
    #[error("backend error: {0}")]
    Backend(String),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout)
    }
}
