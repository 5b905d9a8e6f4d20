pub mod host_key;
pub mod ssh_connection;

// Re-export the modules here for easy import elsewhere.
pub use host_key::*;
pub use ssh_connection::*;
