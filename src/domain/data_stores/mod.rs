pub mod revocation_store;

pub use revocation_store::*;
