//! Request and response bodies, grouped by endpoint family

pub mod analysis;
pub mod common;
pub mod repository;

pub use analysis::*;
pub use common::*;
pub use repository::*;
