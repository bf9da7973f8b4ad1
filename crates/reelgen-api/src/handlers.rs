//! Request handlers.

pub mod archive;
pub mod files;
pub mod generation;
pub mod health;

pub use archive::*;
pub use files::*;
pub use generation::*;
pub use health::*;
