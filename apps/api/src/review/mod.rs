// Review sessions: one imported resume merged into the stored portfolio,
// edited through HTTP and committed or discarded as a whole.

pub mod handlers;
pub mod session;
pub mod store;

pub use store::SessionStore;
