pub mod config;
pub mod error;
pub mod ext;
pub mod hook;
pub mod store;

pub use error::{Result, VecInitError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
