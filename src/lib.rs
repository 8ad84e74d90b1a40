pub mod circuit;
pub mod config;
pub mod export;
pub mod error;
pub use error::*;

pub use derive_new;
