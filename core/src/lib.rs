//! Nodestate Core Library
//! 
//! Shared types, configuration and error taxonomy for the node-state
//! comparator and the replay tool. Every other nodestate crate builds on
//! the definitions in here.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;
pub mod path;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
pub use path::*;
