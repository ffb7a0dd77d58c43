pub mod bearer;
pub mod config;

pub use bearer::*;
pub use config::Config;
