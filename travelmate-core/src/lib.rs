pub mod config;
pub mod credentials;
pub mod error;
pub mod error_utils;
pub mod retry;
pub mod types;

pub use config::*;
pub use credentials::*;
pub use error::*;
pub use error_utils::*;
pub use retry::*;
pub use types::*;
