//! HTTP request handlers for the RepoLens web server

pub mod analysis;
pub mod health;
pub mod repository;
pub mod types;

pub use analysis::*;
pub use health::*;
pub use repository::*;

pub use types::*;
