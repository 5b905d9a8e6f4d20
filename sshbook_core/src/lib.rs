pub mod connections;
pub mod core;
pub mod utils;

// re‑export ergonomic entry points
pub use crate::core::relay::run_relay;
pub use crate::core::session::Session;
