//! Retrieval side of the assistant.
//!
//! - `Document` and the interchange format shared by every stage
//! - `VectorIndex`: the similarity-search oracle
//! - `SqliteVectorIndex`: the on-disk index used in production

pub mod document;
pub mod index;
pub mod interchange;
pub mod sqlite;

pub use document::{Document, Metadata};
pub use index::VectorIndex;
pub use interchange::{
    serialize_documents, strip_code_fences, Interchange, ValidatedSet, ValidationStatus,
};
pub use sqlite::SqliteVectorIndex;
