use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two handlers claimed the same method name.
    #[error("method `{0}` is already registered")]
    DuplicateMethod(String),
}
