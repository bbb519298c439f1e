//! RepoLens Repository - fetching, walking and analysing repositories
//!
//! Clones a source with the system `git`, reads its files, history and
//! branches into a snapshot payload, and computes named aggregates over it.

pub mod analyzer;
pub mod fetcher;
pub mod filter;
pub mod processor;
pub mod walker;

pub use analyzer::*;
pub use fetcher::*;
pub use filter::*;
pub use processor::*;
pub use walker::*;
