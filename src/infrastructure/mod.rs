//! Infrastructure layer: collaborator implementations and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod cache;
pub mod di;
pub mod error;
pub mod traits;

pub use cache::{MemoryCache, NullCache};
pub use di::ServiceContainer;
pub use error::InfraError;
pub use traits::{
    Cache, JsonDirFetcher, MemoryRowFetcher, QueryParams, RequestContext, RowFetcher, RowQuery,
};
