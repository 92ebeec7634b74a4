// src/storage/mod.rs
pub mod cipher;
pub mod errors;
pub mod store;

pub use cipher::{SealedSample, TemplateCipher};
pub use errors::StorageError;
pub use store::{LockoutStore, MemoryStore, TemplateStore};
