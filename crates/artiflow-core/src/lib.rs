pub mod change;
pub mod completion;
pub mod config;
pub mod error;
pub mod graph;
pub mod instructions;
pub mod io;
pub mod metadata;
pub mod paths;
pub mod resolver;
pub mod schema;

pub use error::{ArtiflowError, Result};
pub use graph::{ArtifactGraph, BlockedArtifacts, CompletedSet};
pub use resolver::SchemaResolver;
pub use schema::SchemaModel;
