mod error;
mod in_memory;
mod provider;
mod store;

pub use error::{IndexOperation, IndexOperationFailed};
pub use in_memory::InMemoryIndexStore;
pub use provider::IndexAccessProvider;
pub use store::{IndexKey, IndexStore};
