pub mod config;
pub mod error;
pub mod sql;
pub mod storage;

pub use config::TableConfig;
pub use error::{DbError, DbResult};
pub use storage::cursor::Cursor;
pub use storage::row::Row;
pub use storage::table::Table;
