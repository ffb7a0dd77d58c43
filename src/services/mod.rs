pub mod data_stores;
pub mod revocation_service;
pub mod token_issuer;
pub mod token_validator;

pub use data_stores::*;
pub use revocation_service::*;
pub use token_issuer::*;
pub use token_validator::*;
