mod file;
mod store;

pub use file::FileCredentialStore;
pub use store::{CredentialStore, MemoryCredentialStore, TokenPair};
