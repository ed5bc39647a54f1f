pub mod env;
pub mod settings;

pub use env::{EnvConfig, EnvResolver, SecretResolver};
pub use settings::{AsyncProviderConfig, ServiceConfig, SyncProviderConfig};
