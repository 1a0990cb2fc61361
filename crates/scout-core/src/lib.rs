pub mod blob_store;
pub mod error;
pub mod model;
pub mod pagination;
pub mod repository;
pub mod schema;
pub mod search;

pub use error::{Error, Result};
pub use model::{Attachment, Document, Index, MetadataMap, Ranking, ScoredDocument};
pub use pagination::Paginator;
pub use repository::Repository;
pub use schema::{open_pool, EngineConfig, Pool, Stem};
pub use search::{Engine, SearchRequest, SearchResults};
