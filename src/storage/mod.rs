pub mod db;
pub mod models;
mod postgres;
mod sqlite;

pub use db::{connect, PostStore, StoreError};
pub use postgres::PgPostStore;
pub use sqlite::SqlitePostStore;
