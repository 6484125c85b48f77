use crate::error::{DbError, DbResult};
use crate::storage::page::{INTERNAL_NODE_MAX_KEYS, LEAF_NODE_MAX_CELLS};

/// Default cap on the number of pages a table file may hold.
pub const TABLE_MAX_PAGES: u32 = 100;

/// Limits fixed for the lifetime of an open table.
///
/// The node capacities default to what fits in a page. Smaller values keep the
/// on-disk format unchanged and only make nodes split earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    pub max_pages: u32,
    pub leaf_max_cells: usize,
    pub internal_max_keys: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            max_pages: TABLE_MAX_PAGES,
            leaf_max_cells: LEAF_NODE_MAX_CELLS,
            internal_max_keys: INTERNAL_NODE_MAX_KEYS,
        }
    }
}

impl TableConfig {
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_leaf_max_cells(mut self, cells: usize) -> Self {
        self.leaf_max_cells = cells;
        self
    }

    pub fn with_internal_max_keys(mut self, keys: usize) -> Self {
        self.internal_max_keys = keys;
        self
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.max_pages == 0 {
            return Err(DbError::InvalidConfig("max_pages must be at least 1".into()));
        }
        if !(2..=LEAF_NODE_MAX_CELLS).contains(&self.leaf_max_cells) {
            return Err(DbError::InvalidConfig(format!(
                "leaf_max_cells must be between 2 and {}, got {}",
                LEAF_NODE_MAX_CELLS, self.leaf_max_cells
            )));
        }
        if !(2..=INTERNAL_NODE_MAX_KEYS).contains(&self.internal_max_keys) {
            return Err(DbError::InvalidConfig(format!(
                "internal_max_keys must be between 2 and {}, got {}",
                INTERNAL_NODE_MAX_KEYS, self.internal_max_keys
            )));
        }
        Ok(())
    }
}
