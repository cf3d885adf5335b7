use tether_di::TypeInfo;

/// Errors when trying to register a config
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// The Config type is already registered
    #[error("The Config type '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),
}
