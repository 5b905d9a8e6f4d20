pub mod relay;
pub mod session;

// Re-export the modules here for easy import elsewhere.
pub use relay::*;
pub use session::*;
