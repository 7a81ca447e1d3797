use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("unknown provider `{name}` (available: {})", .available.join(", "))]
    UnknownProvider { name: String, available: Vec<String> },
    #[error("provider `{name}` requested more than once")]
    DuplicateProvider { name: String },
}
