// Reconciliation core: merge a parsed draft into the stored document, review it
// field by field, resolve conflicts, and project the result back.
// Everything here is synchronous and free of I/O.

pub mod changes;
pub mod field;
pub mod ids;
pub mod merger;
pub mod projector;
pub mod resolver;
pub mod review;
pub mod schema;
pub mod tree;

pub use ids::{IdGenerator, UuidIdGenerator};
pub use tree::{Node, PathError, ReviewState};
