pub mod claims;
pub mod data_stores;
pub mod identity;
pub mod issued_credential;
pub mod role;
pub mod signing_scheme;
pub mod token_type;
pub mod validation;

pub use claims::*;
pub use data_stores::*;
pub use identity::*;
pub use issued_credential::*;
pub use role::*;
pub use signing_scheme::*;
pub use token_type::*;
pub use validation::*;
