//! Persistence core for DormHelper.
//! This crate owns the store schema, legacy compatibility and every
//! repository the presentation layer calls.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use config::{ConfigError, LogLevel, LoggingConfig, StoreConfig, StoreLocation};
pub use db::{
    initialize, open_db, open_db_in_memory, DbError, DbResult, InitReport, MigrationStage,
    MigrationWarning, RequestsLayout, RequestsRevision,
};
pub use logging::{init_logging, logging_status};
pub use model::handbook::{HandbookNode, HandbookNodeId};
pub use model::news::{News, NewsId};
pub use model::request::{MaintenanceRequest, NewRequest, RequestId, RequestStatus};
pub use model::student::{Neighbor, NeighborId, ProfileUpsert, Student, StudentId};
pub use model::ValidationError;
pub use repo::handbook_repo::{HandbookRepository, SqliteHandbookRepository};
pub use repo::neighbor_repo::{NeighborRepository, SqliteNeighborRepository};
pub use repo::news_repo::{NewsRepository, SqliteNewsRepository};
pub use repo::request_repo::{RequestRepository, SqliteRequestRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{RepoError, RepoResult};
pub use store::{Store, TableCount};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
