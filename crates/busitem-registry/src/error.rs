use thiserror::Error;

pub type Result<T, E = RegistryError> = core::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("unknown path: {0}")]
    UnknownPath(String),
    #[error("unknown point id: {0}")]
    UnknownId(u16),
    #[error("duplicate path in schema: {0}")]
    DuplicatePath(String),
    #[error("schema holds more than {0} points")]
    TooManyPoints(usize),
    #[error("node '{parent}' cannot hold more than {max} children")]
    FanOutExceeded { parent: String, max: usize },
    #[error("could not build document: {0}")]
    Document(String),
}
