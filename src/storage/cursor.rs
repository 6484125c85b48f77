use log::debug;

use crate::error::{DbError, DbResult};
use crate::storage::page::{
    LEAF_NODE_MAX_CELLS, NodeType, leaf_node_key, leaf_node_next_leaf, leaf_node_num_cells,
    leaf_node_value, node_type,
};
use crate::storage::pager::Pager;
use crate::storage::row::Row;

/// A position in the leaf level of a table.
///
/// The cursor holds the pager mutably, so the table cannot be modified while
/// one is alive. Iterating yields rows in ascending key order by following the
/// `next_leaf` links.
pub struct Cursor<'a> {
    pager: &'a mut Pager,
    page_num: u32,
    cell_num: usize,
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(pager: &'a mut Pager, page_num: u32, cell_num: usize) -> DbResult<Cursor<'a>> {
        let (num_cells, next_leaf) = leaf_header(pager, page_num)?;
        let end_of_table = cell_num >= num_cells && next_leaf == 0;
        debug!(
            "Cursor at leaf {} cell {} (end_of_table={}).",
            page_num, cell_num, end_of_table
        );
        Ok(Cursor {
            pager,
            page_num,
            cell_num,
            end_of_table,
        })
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    /// True once the cursor has moved past the last row of the table.
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Key of the cell under the cursor, or `None` past the end of its leaf.
    pub fn key(&mut self) -> DbResult<Option<u32>> {
        if self.end_of_table {
            return Ok(None);
        }
        let (num_cells, _) = leaf_header(self.pager, self.page_num)?;
        if self.cell_num >= num_cells {
            return Ok(None);
        }
        Ok(Some(leaf_node_key(&self.pager.get_page(self.page_num)?.data, self.cell_num)))
    }

    /// Row stored in the cell under the cursor, or `None` past the end of its leaf.
    pub fn value(&mut self) -> DbResult<Option<Row>> {
        if self.end_of_table {
            return Ok(None);
        }
        let (num_cells, _) = leaf_header(self.pager, self.page_num)?;
        if self.cell_num >= num_cells {
            return Ok(None);
        }
        let node = &self.pager.get_page(self.page_num)?.data;
        Ok(Some(Row::deserialize(leaf_node_value(node, self.cell_num))))
    }

    /// Step to the next cell, hopping to the next leaf when this one is used up.
    pub fn advance(&mut self) -> DbResult<()> {
        if self.end_of_table {
            return Ok(());
        }
        let (num_cells, next_leaf) = leaf_header(self.pager, self.page_num)?;
        self.cell_num += 1;
        if self.cell_num >= num_cells {
            if next_leaf == 0 {
                self.end_of_table = true;
            } else {
                self.page_num = next_leaf;
                self.cell_num = 0;
            }
        }
        Ok(())
    }
}

impl Iterator for Cursor<'_> {
    type Item = DbResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        // Bounded so a chain of empty leaves cannot spin forever.
        for _ in 0..=self.pager.max_pages() {
            if self.end_of_table {
                return None;
            }
            let step = self.value().and_then(|row| {
                self.advance()?;
                Ok(row)
            });
            match step {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => continue,
                Err(e) => {
                    self.end_of_table = true;
                    return Some(Err(e));
                }
            }
        }
        self.end_of_table = true;
        Some(Err(DbError::Corrupt(format!(
            "leaf chain from page {} never ends",
            self.page_num
        ))))
    }
}

/// `(num_cells, next_leaf)` of a leaf page, checked against the page layout.
fn leaf_header(pager: &mut Pager, page_num: u32) -> DbResult<(usize, u32)> {
    let node = &pager.get_page(page_num)?.data;
    if node_type(node)? != NodeType::Leaf {
        return Err(DbError::Corrupt(format!("cursor page {} is not a leaf", page_num)));
    }
    let num_cells = leaf_node_num_cells(node);
    if num_cells > LEAF_NODE_MAX_CELLS {
        return Err(DbError::Corrupt(format!("leaf page {} claims {} cells", page_num, num_cells)));
    }
    Ok((num_cells, leaf_node_next_leaf(node)))
}
