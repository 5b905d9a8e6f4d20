pub mod profile;
pub mod store;

// re‑export ergonomic entry points
pub use profile::{NewProfile, ServerProfile};
pub use store::{ProfileStore, StoreError};
