// Stored portfolio: Postgres persistence, validation before writes, the editor
// canvas view and direct deletes.

pub mod canvas;
pub mod edit;
pub mod handlers;
pub mod store;
pub mod validation;
