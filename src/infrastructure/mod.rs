// Core infrastructure modules
pub mod database;        // Storage trait and table metadata
pub mod sqlite_database; // SQLite implementation of the storage trait
pub mod storage;         // Object storage buckets
pub mod auth;            // Accounts and sessions
pub mod viewer;          // Viewer context
pub mod middleware;      // Request-scoped viewer and service-key guards

pub use auth::{AuthService, Session, SignUpRequest};
pub use database::{ContentStore, UserTable};
pub use sqlite_database::SqliteDatabase;
pub use storage::{Bucket, LocalObjectStore, ObjectStore, StoredObject};
pub use viewer::ViewerContext;
