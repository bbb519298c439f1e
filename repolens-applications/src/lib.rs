//! RepoLens Applications - snapshot storage and the packaging service
//!
//! ## Architecture
//!
//! - **Repository access** (repolens-repo): cloning, walking and analysis kinds
//! - **Applications** (this crate): persistence and the four core operations
//! - **Presentation** (repolens-web/cli): user interfaces

pub mod application;
pub mod store;

pub use application::{
    AnalysisDetails, RepolensApplication, RepolensApplicationBuilder, StoreStatus,
};
pub use store::{open_store, MemorySnapshotStore, SnapshotStore};
#[cfg(feature = "sqlite")]
pub use store::SqliteSnapshotStore;
