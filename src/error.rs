use thiserror::Error;
use std::io;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("corrupt database: {0}")]
    Corrupt(String),
    #[error("page {page_num} is out of bounds (max {max_pages} pages)")]
    PageOutOfBounds { page_num: u32, max_pages: u32 },
    #[error("table full: all {max_pages} pages are in use")]
    CapacityExhausted { max_pages: u32 },
    #[error("duplicate key {0}")]
    DuplicateKey(u32),
    #[error("value for column '{column}' is longer than {max} bytes")]
    StringTooLong { column: &'static str, max: usize },
    #[error("id must be positive")]
    NegativeId,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unrecognized statement '{0}'")]
    UnrecognizedStatement(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DbResult<T> = Result<T, DbError>;
