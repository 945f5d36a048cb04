pub mod audit;
pub mod kv;
pub mod secret;

pub use audit::{AuditEntry, AuditLog};
pub use kv::{FileKvStore, KeyValueStore};
pub use secret::{Secret, SecretStore, SECRET_STORE_KEY};
