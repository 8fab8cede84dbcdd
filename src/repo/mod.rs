pub mod registry;
pub mod repository;

pub use registry::RepositoryRegistry;
pub use repository::{Repository, RepositoryChangeKind};
