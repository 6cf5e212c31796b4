//! Pure data types for runwrap — commands, execution results, jobs, things.
//!
//! This crate is a leaf dependency with no async runtime and no I/O. It
//! exists so that consumers (per-tool wrapper crates, external embedders)
//! can work with runwrap's type system without pulling in the kernel's
//! transitive deps.

pub mod command;
pub mod job;
pub mod result;
pub mod thing;

// Flat re-exports for convenience
pub use command::*;
pub use job::*;
pub use result::*;
pub use thing::*;
