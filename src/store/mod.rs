//! Template persistence
//!
//! An indexed store of named positional lists, and the template repository
//! built on it.

pub mod backend;
pub mod indexed;
pub mod templates;

pub use backend::{JsonFileBackend, MemoryBackend, StoreBackend};
pub use indexed::IndexedStore;
pub use templates::{
    compose_name, strip_present_name, GroupTemplate, NameTemplate, Template, TemplateKind,
    TemplateRepository,
};
