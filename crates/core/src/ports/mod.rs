//! Ports: the storage and collaborator interfaces the core depends on.

mod collaborators;
mod repository;

pub use collaborators::*;
pub use repository::*;
