pub mod store;

pub use store::{SecretStore, DEFAULT_SECRET_TTL};
