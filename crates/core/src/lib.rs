pub mod domain;
pub mod error;
pub mod pagination;
pub mod types;

pub use error::CoreError;
