use std::path::Path;

use log::info;

use crate::config::TableConfig;
use crate::error::{DbError, DbResult};
use crate::storage::btree::{BTree, ROOT_PAGE_NUM, TreeShape};
use crate::storage::cursor::Cursor;
use crate::storage::page::{initialize_leaf_node, is_node_root, node_type, set_node_root};
use crate::storage::pager::Pager;
use crate::storage::row::Row;

/// The single table of a database file: rows keyed by `id` in a B+tree whose
/// root is always page 0.
pub struct Table {
    pager: Pager,
    root_page_num: u32,
    config: TableConfig,
}

impl Table {
    /// Open `path` with the default limits, creating an empty table if the file is new.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Table> {
        Table::open_with(path, TableConfig::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, config: TableConfig) -> DbResult<Table> {
        config.validate()?;
        let path = path.as_ref();
        let mut pager = Pager::open(path, config.max_pages)?;

        if pager.num_pages() == 0 {
            let root = &mut pager.get_page(ROOT_PAGE_NUM)?.data;
            initialize_leaf_node(root);
            set_node_root(root, true);
            info!("Created new table in {}.", path.display());
        } else {
            let root = &pager.get_page(ROOT_PAGE_NUM)?.data;
            node_type(root)?;
            if !is_node_root(root) {
                return Err(DbError::Corrupt(format!(
                    "page {} of {} is not a root node",
                    ROOT_PAGE_NUM,
                    path.display()
                )));
            }
            info!("Opened {} ({} pages).", path.display(), pager.num_pages());
        }

        Ok(Table {
            pager,
            root_page_num: ROOT_PAGE_NUM,
            config,
        })
    }

    fn tree(&mut self) -> BTree<'_> {
        BTree::new(&mut self.pager, self.root_page_num, self.config)
    }

    pub fn insert(&mut self, row: &Row) -> DbResult<()> {
        self.tree().insert(row.id(), row)
    }

    /// Cursor on `key`, or on the slot where `key` would be inserted.
    pub fn find(&mut self, key: u32) -> DbResult<Cursor<'_>> {
        let pos = self.tree().find(key)?;
        Cursor::new(&mut self.pager, pos.page_num, pos.cell_num)
    }

    /// Cursor on the first row in key order.
    pub fn scan(&mut self) -> DbResult<Cursor<'_>> {
        let leaf = self.tree().leftmost_leaf()?;
        Cursor::new(&mut self.pager, leaf, 0)
    }

    pub fn get(&mut self, key: u32) -> DbResult<Option<Row>> {
        let mut cursor = self.find(key)?;
        match cursor.key()? {
            Some(found) if found == key => cursor.value(),
            _ => Ok(None),
        }
    }

    pub fn verify(&mut self) -> DbResult<TreeShape> {
        self.tree().verify()
    }

    pub fn render_tree(&mut self) -> DbResult<String> {
        self.tree().render()
    }

    pub fn root_page_num(&self) -> u32 {
        self.root_page_num
    }

    pub fn num_pages(&self) -> u32 {
        self.pager.num_pages()
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Write every page back to disk and release the file.
    pub fn close(self) -> DbResult<()> {
        let pages = self.pager.num_pages();
        self.pager.close()?;
        info!("Closed table ({} pages written).", pages);
        Ok(())
    }
}
