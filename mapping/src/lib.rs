//! Strand Mapping
//!
//! Object-graph mapping between mapped domain objects and the server graph.
//!
//! Responsibilities:
//! - Track persisted objects by server identity (the mapping context)
//! - Compile an object graph into an ordered batch of write statements
//! - Bind server identities back onto saved objects
//! - Reconstruct objects from graph results

mod compiler;
mod context;
mod error;
mod mapper;
mod reader;


pub use compiler::{BatchRecord, Binding, CompiledBatch, CompiledStatement, NodeRef};
pub use context::{MappedRelationship, MappingContext, TrackedEntity};
pub use error::{MappingError, MappingResult};
pub use mapper::GraphMapper;
pub use reader::{GraphReader, ReadResult};
