use log::debug;

use crate::config::TableConfig;
use crate::error::{DbError, DbResult};
use crate::storage::page::{
    INTERNAL_NODE_MAX_KEYS, INVALID_PAGE_NUM, LEAF_NODE_CELL_SIZE, LEAF_NODE_KEY_SIZE,
    LEAF_NODE_MAX_CELLS, NodeType, PAGE_SIZE, initialize_internal_node, initialize_leaf_node,
    internal_node_child, internal_node_find_child_index, internal_node_key,
    internal_node_num_keys, is_node_root, leaf_node_cell, leaf_node_cell_mut,
    leaf_node_cell_offset, leaf_node_find_index, leaf_node_key,
    leaf_node_next_leaf, leaf_node_num_cells, leaf_node_value_mut, node_parent, node_type,
    set_internal_node_child, set_internal_node_key, set_internal_node_num_keys,
    set_internal_node_right_child, set_leaf_node_key, set_leaf_node_next_leaf,
    set_leaf_node_num_cells, set_node_parent, set_node_root,
};
use crate::storage::pager::Pager;
use crate::storage::row::Row;

/// The root always lives in page 0; a root split moves both halves out instead.
pub const ROOT_PAGE_NUM: u32 = 0;

/// A cell position in the leaf level: either the cell holding a key, or the
/// slot where that key would be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub page_num: u32,
    pub cell_num: usize,
}

/// Summary returned by [`BTree::verify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeShape {
    /// Number of levels; a lone root leaf has depth 1.
    pub depth: usize,
    pub internal_nodes: usize,
    pub leaf_nodes: usize,
    pub rows: usize,
}

/// A B+tree over the pages of a [`Pager`], keyed by `u32`.
///
/// LEAF pages hold `(key, row)` cells sorted by key and are chained left to
/// right through `next_leaf`. INTERNAL pages hold `(child, key)` cells where
/// `key` is the largest key under `child`, plus a right child holding every
/// larger key.
///
///—————————————————————————————————————————————————————————————————————————————————————————————
/// On insert:
///   1. Descend from the root to the leaf that should hold the key.
///   2. Reject the key if the leaf already has it.
///   3. If the leaf has room, shift the tail one cell right and write the new cell.
///   4. Otherwise split the leaf:
///        • Make sure enough unused pages remain for every split the insert will cause,
///        • Move the upper half of the cells (plus the new one) into a new right leaf,
///        • Fix the parent's key for the left half, then add the right leaf to the parent.
///   5. Adding a child to a full internal node splits it the same way and recurses upward.
///   6. When the root splits, both halves move to new pages and page 0 becomes an
///      internal root with two children.
///—————————————————————————————————————————————————————————————————————————————————————————————
pub struct BTree<'a> {
    root_page: u32,
    pager: &'a mut Pager,
    config: TableConfig,
}

impl<'a> BTree<'a> {
    pub fn new(pager: &'a mut Pager, root_page: u32, config: TableConfig) -> BTree<'a> {
        BTree { root_page, pager, config }
    }

    pub fn root_page(&self) -> u32 {
        self.root_page
    }

    /// Descend to the leaf position for `key`.
    pub fn find(&mut self, key: u32) -> DbResult<Position> {
        debug!("find() → starting at root page {} for key={}", self.root_page, key);

        let mut page_num = self.root_page;
        for _ in 0..=self.pager.max_pages() {
            let node = &self.pager.get_page(page_num)?.data;
            match node_type(node)? {
                NodeType::Leaf => {
                    checked_leaf_cells(page_num, node)?;
                    let cell_num = leaf_node_find_index(node, key);
                    debug!("  → leaf {} cell {}", page_num, cell_num);
                    return Ok(Position { page_num, cell_num });
                }
                NodeType::Internal => {
                    checked_internal_keys(page_num, node)?;
                    let index = internal_node_find_child_index(node, key);
                    page_num = checked_child(page_num, node, index)?;
                    debug!("  → descending to child {} (index {})", page_num, index);
                }
            }
        }
        Err(DbError::Corrupt(format!("no leaf reachable for key {}", key)))
    }

    /// Page number of the leftmost leaf, where a full scan starts.
    pub fn leftmost_leaf(&mut self) -> DbResult<u32> {
        let mut page_num = self.root_page;
        for _ in 0..=self.pager.max_pages() {
            let node = &self.pager.get_page(page_num)?.data;
            match node_type(node)? {
                NodeType::Leaf => return Ok(page_num),
                NodeType::Internal => {
                    checked_internal_keys(page_num, node)?;
                    page_num = checked_child(page_num, node, 0)?;
                }
            }
        }
        Err(DbError::Corrupt("no leftmost leaf reachable from the root".into()))
    }

    /// Insert `row` under `key`. Nothing is modified when an error is returned.
    pub fn insert(&mut self, key: u32, row: &Row) -> DbResult<()> {
        debug!("insert() → starting at root {} for key={}", self.root_page, key);

        let pos = self.find(key)?;
        let num_cells = {
            let node = &self.pager.get_page(pos.page_num)?.data;
            let num_cells = leaf_node_num_cells(node);
            if pos.cell_num < num_cells && leaf_node_key(node, pos.cell_num) == key {
                return Err(DbError::DuplicateKey(key));
            }
            num_cells
        };

        if num_cells > self.config.leaf_max_cells {
            return Err(DbError::Corrupt(format!(
                "leaf {} holds {} cells, capacity is {}",
                pos.page_num, num_cells, self.config.leaf_max_cells
            )));
        }
        if num_cells < self.config.leaf_max_cells {
            let node = &mut self.pager.get_page(pos.page_num)?.data;
            leaf_insert_at(node, num_cells, pos.cell_num, key, row);
            debug!(
                "  → Wrote key={} into leaf {} at cell {} ({} cells).",
                key,
                pos.page_num,
                pos.cell_num,
                num_cells + 1
            );
            return Ok(());
        }

        let needed = self.pages_needed_for_split(pos.page_num)?;
        let available = self.pager.max_pages().saturating_sub(self.pager.unused_page_num());
        if needed > available {
            debug!(
                "  → Split of leaf {} needs {} pages, only {} left.",
                pos.page_num, needed, available
            );
            return Err(DbError::CapacityExhausted {
                max_pages: self.pager.max_pages(),
            });
        }

        self.split_leaf_and_insert(pos, key, row)
    }

    /// Count the pages a split of the full leaf `leaf_page` will allocate: one
    /// per split node, plus one more when the split reaches the root.
    /// An ancestor already above its capacity is reported as `Corrupt`.
    fn pages_needed_for_split(&mut self, leaf_page: u32) -> DbResult<u32> {
        let mut needed = 0;
        let mut page_num = leaf_page;
        for _ in 0..=self.pager.max_pages() {
            if page_num == self.root_page {
                return Ok(needed + 2);
            }
            needed += 1;
            let parent = node_parent(&self.pager.get_page(page_num)?.data);
            let parent_keys = internal_node_num_keys(&self.pager.get_page(parent)?.data);
            if parent_keys > self.config.internal_max_keys {
                return Err(DbError::Corrupt(format!(
                    "internal {} holds {} keys, capacity is {}",
                    parent, parent_keys, self.config.internal_max_keys
                )));
            }
            if parent_keys < self.config.internal_max_keys {
                return Ok(needed);
            }
            page_num = parent;
        }
        Err(DbError::Corrupt(format!("parent chain of page {} does not reach the root", leaf_page)))
    }

    /// Split the full leaf at `pos.page_num` while inserting `(key, row)` at `pos.cell_num`.
    ///
    /// The left (original) leaf keeps the first ⌈(n+1)/2⌉ cells, the new right leaf gets the rest.
    fn split_leaf_and_insert(&mut self, pos: Position, key: u32, row: &Row) -> DbResult<()> {
        let old_page = pos.page_num;
        let (parent, next_leaf, old_max, mut cells) = {
            let node = &self.pager.get_page(old_page)?.data;
            let num_cells = checked_leaf_cells(old_page, node)?;
            let cells: Vec<Vec<u8>> = (0..num_cells)
                .map(|i| leaf_node_cell(node, i).to_vec())
                .collect();
            (
                node_parent(node),
                leaf_node_next_leaf(node),
                leaf_node_key(node, num_cells - 1),
                cells,
            )
        };

        cells.insert(pos.cell_num, encode_leaf_cell(key, row));
        let left_count = (cells.len() + 1) / 2;
        let right_cells = cells.split_off(left_count);

        debug!(
            "split_leaf: leaf {} → left {} cells, right {} cells.",
            old_page,
            cells.len(),
            right_cells.len()
        );

        let right_page = self.pager.allocate_page()?;

        if old_page == self.root_page {
            let left_page = self.pager.allocate_page()?;
            self.write_leaf(left_page, self.root_page, right_page, &cells)?;
            self.write_leaf(right_page, self.root_page, 0, &right_cells)?;
            return self.create_new_root(left_page, right_page);
        }

        self.write_leaf(old_page, parent, right_page, &cells)?;
        self.write_leaf(right_page, parent, next_leaf, &right_cells)?;

        let new_left_max = cell_key(&cells[cells.len() - 1]);
        self.update_internal_key(parent, old_max, new_left_max)?;
        self.insert_child(parent, right_page)
    }

    /// Turn the root page into an internal node over `left_page` and `right_page`.
    /// Both children must already name the root as their parent.
    fn create_new_root(&mut self, left_page: u32, right_page: u32) -> DbResult<()> {
        let left_max = self.node_max_key(left_page)?;
        let root = self.root_page;
        self.write_internal(root, true, 0, &[left_max], &[left_page, right_page])?;
        debug!(
            "  → Root {} is now internal over {} and {} (key {}).",
            root, left_page, right_page, left_max
        );
        Ok(())
    }

    /// Add `child_page` to the internal node `parent_page`, splitting it if full.
    fn insert_child(&mut self, parent_page: u32, child_page: u32) -> DbResult<()> {
        let child_max = self.node_max_key(child_page)?;
        let (is_root, grandparent) = {
            let node = &self.pager.get_page(parent_page)?.data;
            (is_node_root(node), node_parent(node))
        };
        let (mut keys, mut children) = self.read_internal(parent_page)?;

        let index = keys.partition_point(|&k| k < child_max);
        let right_max = if index == keys.len() {
            Some(self.node_max_key(children[keys.len()])?)
        } else {
            None
        };
        match right_max {
            // The old right child turns into a regular keyed cell.
            Some(right_max) if child_max > right_max => {
                keys.push(right_max);
                children.push(child_page);
            }
            _ => {
                keys.insert(index, child_max);
                children.insert(index, child_page);
            }
        }

        if keys.len() <= self.config.internal_max_keys {
            self.write_internal(parent_page, is_root, grandparent, &keys, &children)?;
            let child = &mut self.pager.get_page(child_page)?.data;
            set_node_parent(child, parent_page);
            debug!(
                "insert_child: page {} added to internal {} ({} keys).",
                child_page,
                parent_page,
                keys.len()
            );
            return Ok(());
        }

        debug!("  → Internal overflow at page {}! Splitting.", parent_page);
        self.split_internal(parent_page, keys, children)
    }

    /// Split an overflowing internal node. `keys`/`children` are its full
    /// contents including the child that did not fit.
    ///
    /// The left half keeps the first ⌈children/2⌉ children; the last of them
    /// becomes its right child and its key moves up to the parent.
    fn split_internal(
        &mut self,
        page_num: u32,
        mut keys: Vec<u32>,
        mut children: Vec<u32>,
    ) -> DbResult<()> {
        let subtree_max = self.node_max_key(children[children.len() - 1])?;

        let left_len = (children.len() + 1) / 2;
        let right_children = children.split_off(left_len);
        let right_keys = keys.split_off(left_len);
        let left_max = keys[left_len - 1];
        keys.truncate(left_len - 1);

        debug!(
            "split_internal: page {} → left {} children, right {} children.",
            page_num,
            children.len(),
            right_children.len()
        );

        if page_num == self.root_page {
            let root = self.root_page;
            let left_page = self.pager.allocate_page()?;
            let right_page = self.pager.allocate_page()?;
            self.write_internal(left_page, false, root, &keys, &children)?;
            self.write_internal(right_page, false, root, &right_keys, &right_children)?;
            self.adopt(left_page, &children)?;
            self.adopt(right_page, &right_children)?;
            return self.create_new_root(left_page, right_page);
        }

        let parent = node_parent(&self.pager.get_page(page_num)?.data);
        let right_page = self.pager.allocate_page()?;
        self.write_internal(page_num, false, parent, &keys, &children)?;
        self.write_internal(right_page, false, parent, &right_keys, &right_children)?;
        self.adopt(page_num, &children)?;
        self.adopt(right_page, &right_children)?;

        self.update_internal_key(parent, subtree_max, left_max)?;
        self.insert_child(parent, right_page)
    }

    /// Point every page in `children` at `parent`.
    fn adopt(&mut self, parent: u32, children: &[u32]) -> DbResult<()> {
        for &child in children {
            let node = &mut self.pager.get_page(child)?.data;
            set_node_parent(node, parent);
        }
        Ok(())
    }

    /// Replace the key `old_key` in internal node `page_num` with `new_key`.
    /// A child reached through the right pointer has no stored key; nothing changes then.
    fn update_internal_key(&mut self, page_num: u32, old_key: u32, new_key: u32) -> DbResult<()> {
        let node = &mut self.pager.get_page(page_num)?.data;
        let index = internal_node_find_child_index(node, old_key);
        if index < internal_node_num_keys(node) {
            set_internal_node_key(node, index, new_key);
        }
        Ok(())
    }

    /// Largest key stored under `page_num`, found by following right children.
    pub fn node_max_key(&mut self, page_num: u32) -> DbResult<u32> {
        let mut current = page_num;
        for _ in 0..=self.pager.max_pages() {
            let node = &self.pager.get_page(current)?.data;
            match node_type(node)? {
                NodeType::Leaf => {
                    let num_cells = checked_leaf_cells(current, node)?;
                    if num_cells == 0 {
                        return Err(DbError::Corrupt(format!("leaf page {} is empty", current)));
                    }
                    return Ok(leaf_node_key(node, num_cells - 1));
                }
                NodeType::Internal => {
                    let num_keys = checked_internal_keys(current, node)?;
                    current = checked_child(current, node, num_keys)?;
                }
            }
        }
        Err(DbError::Corrupt(format!("no leaf below page {}", page_num)))
    }

    fn write_leaf(&mut self, page_num: u32, parent: u32, next_leaf: u32, cells: &[Vec<u8>]) -> DbResult<()> {
        let node = &mut self.pager.get_page(page_num)?.data;
        initialize_leaf_node(node);
        set_node_parent(node, parent);
        set_leaf_node_next_leaf(node, next_leaf);
        for (i, cell) in cells.iter().enumerate() {
            leaf_node_cell_mut(node, i).copy_from_slice(cell);
        }
        set_leaf_node_num_cells(node, cells.len());
        Ok(())
    }

    /// Read all keys and children from an internal node.
    ///
    /// Returns:
    ///   keys: Vec<u32> of length = num_keys
    ///   children: Vec<u32> of length = num_keys + 1, the right child last
    fn read_internal(&mut self, page_num: u32) -> DbResult<(Vec<u32>, Vec<u32>)> {
        let node = &self.pager.get_page(page_num)?.data;
        if node_type(node)? != NodeType::Internal {
            return Err(DbError::Corrupt(format!("page {} is not an internal node", page_num)));
        }
        let num_keys = checked_internal_keys(page_num, node)?;
        let keys = (0..num_keys).map(|i| internal_node_key(node, i)).collect();
        let children = (0..=num_keys).map(|i| internal_node_child(node, i)).collect();
        Ok((keys, children))
    }

    /// Write a complete internal node given `keys` and `children`.
    ///
    /// children.len() must equal keys.len() + 1.
    fn write_internal(
        &mut self,
        page_num: u32,
        is_root: bool,
        parent: u32,
        keys: &[u32],
        children: &[u32],
    ) -> DbResult<()> {
        if children.len() != keys.len() + 1 || keys.len() > INTERNAL_NODE_MAX_KEYS {
            return Err(DbError::Corrupt(format!(
                "write_internal: {} keys and {} children do not form a node",
                keys.len(),
                children.len()
            )));
        }

        let node = &mut self.pager.get_page(page_num)?.data;
        initialize_internal_node(node);
        set_node_root(node, is_root);
        set_node_parent(node, parent);
        set_internal_node_num_keys(node, keys.len());
        for (i, (&child, &key)) in children.iter().zip(keys).enumerate() {
            set_internal_node_child(node, i, child);
            set_internal_node_key(node, i, key);
        }
        set_internal_node_right_child(node, children[keys.len()]);
        Ok(())
    }

    /// Walk the whole tree and check every structural invariant.
    pub fn verify(&mut self) -> DbResult<TreeShape> {
        {
            let root = &self.pager.get_page(self.root_page)?.data;
            if !is_node_root(root) {
                return Err(DbError::Corrupt(format!("page {} is not flagged as root", self.root_page)));
            }
            if node_parent(root) != 0 {
                return Err(DbError::Corrupt("root has a parent pointer".into()));
            }
        }

        let mut shape = TreeShape::default();
        let mut leaves = Vec::new();
        let mut last_key = None;
        self.verify_node(self.root_page, 1, &mut shape, &mut leaves, &mut last_key)?;

        for pair in leaves.windows(2) {
            let next = leaf_node_next_leaf(&self.pager.get_page(pair[0])?.data);
            if next != pair[1] {
                return Err(DbError::Corrupt(format!(
                    "leaf {} links to {} instead of {}",
                    pair[0], next, pair[1]
                )));
            }
        }
        if let Some(&last) = leaves.last() {
            let next = leaf_node_next_leaf(&self.pager.get_page(last)?.data);
            if next != 0 {
                return Err(DbError::Corrupt(format!("last leaf {} links to {}", last, next)));
            }
        }
        Ok(shape)
    }

    /// Returns the largest key under `page_num`, or `None` for an empty root leaf.
    fn verify_node(
        &mut self,
        page_num: u32,
        depth: usize,
        shape: &mut TreeShape,
        leaves: &mut Vec<u32>,
        last_key: &mut Option<u32>,
    ) -> DbResult<Option<u32>> {
        if depth > self.pager.max_pages() as usize {
            return Err(DbError::Corrupt(format!("page {} sits in a cycle", page_num)));
        }
        let node = &self.pager.get_page(page_num)?.data;
        if page_num != self.root_page && is_node_root(node) {
            return Err(DbError::Corrupt(format!("non-root page {} is flagged as root", page_num)));
        }

        match node_type(node)? {
            NodeType::Leaf => {
                let num_cells = checked_leaf_cells(page_num, node)?;
                if num_cells > self.config.leaf_max_cells {
                    return Err(DbError::Corrupt(format!(
                        "leaf {} holds {} cells, capacity is {}",
                        page_num, num_cells, self.config.leaf_max_cells
                    )));
                }
                if num_cells == 0 && page_num != self.root_page {
                    return Err(DbError::Corrupt(format!("non-root leaf {} is empty", page_num)));
                }
                for i in 0..num_cells {
                    let key = leaf_node_key(node, i);
                    if let Some(previous) = *last_key {
                        if key <= previous {
                            return Err(DbError::Corrupt(format!(
                                "leaf {} key {} does not follow {}",
                                page_num, key, previous
                            )));
                        }
                    }
                    *last_key = Some(key);
                }

                if shape.depth == 0 {
                    shape.depth = depth;
                } else if shape.depth != depth {
                    return Err(DbError::Corrupt(format!(
                        "leaf {} at depth {}, expected {}",
                        page_num, depth, shape.depth
                    )));
                }
                shape.leaf_nodes += 1;
                shape.rows += num_cells;
                leaves.push(page_num);

                Ok(if num_cells == 0 {
                    None
                } else {
                    Some(leaf_node_key(node, num_cells - 1))
                })
            }
            NodeType::Internal => {
                let num_keys = checked_internal_keys(page_num, node)?;
                if num_keys > self.config.internal_max_keys {
                    return Err(DbError::Corrupt(format!(
                        "internal {} holds {} keys, capacity is {}",
                        page_num, num_keys, self.config.internal_max_keys
                    )));
                }
                let (keys, children) = self.read_internal(page_num)?;
                shape.internal_nodes += 1;

                let mut subtree_max = None;
                for (i, &child) in children.iter().enumerate() {
                    if child == INVALID_PAGE_NUM || child == self.root_page {
                        return Err(DbError::Corrupt(format!(
                            "internal {} has invalid child {}",
                            page_num, child
                        )));
                    }
                    let parent = node_parent(&self.pager.get_page(child)?.data);
                    if parent != page_num {
                        return Err(DbError::Corrupt(format!(
                            "page {} names {} as parent, but is a child of {}",
                            child, parent, page_num
                        )));
                    }
                    let child_max = self
                        .verify_node(child, depth + 1, shape, leaves, last_key)?
                        .ok_or_else(|| DbError::Corrupt(format!("subtree {} is empty", child)))?;
                    if i < keys.len() && keys[i] != child_max {
                        return Err(DbError::Corrupt(format!(
                            "internal {} key {} but child {} has max {}",
                            page_num, keys[i], child, child_max
                        )));
                    }
                    subtree_max = Some(child_max);
                }
                Ok(subtree_max)
            }
        }
    }

    /// Indented listing of the tree, as printed by `.btree`.
    pub fn render(&mut self) -> DbResult<String> {
        let mut out = String::new();
        self.render_node(self.root_page, 0, &mut out)?;
        Ok(out)
    }

    fn render_node(&mut self, page_num: u32, level: usize, out: &mut String) -> DbResult<()> {
        if level > self.pager.max_pages() as usize {
            return Err(DbError::Corrupt(format!("page {} sits in a cycle", page_num)));
        }
        let indent = "  ".repeat(level);
        let node = &self.pager.get_page(page_num)?.data;
        match node_type(node)? {
            NodeType::Leaf => {
                let num_cells = checked_leaf_cells(page_num, node)?;
                out.push_str(&format!("{}- leaf (size {})\n", indent, num_cells));
                for i in 0..num_cells {
                    out.push_str(&format!("{}  - {}\n", indent, leaf_node_key(node, i)));
                }
            }
            NodeType::Internal => {
                let (keys, children) = self.read_internal(page_num)?;
                out.push_str(&format!("{}- internal (size {})\n", indent, keys.len()));
                for (i, &key) in keys.iter().enumerate() {
                    self.render_node(children[i], level + 1, out)?;
                    out.push_str(&format!("{}  - key {}\n", indent, key));
                }
                self.render_node(children[keys.len()], level + 1, out)?;
            }
        }
        Ok(())
    }
}

/// Insert into a leaf with spare room, shifting cells at/after `cell_num` one slot right.
fn leaf_insert_at(node: &mut [u8; PAGE_SIZE], num_cells: usize, cell_num: usize, key: u32, row: &Row) {
    if cell_num < num_cells {
        let start = leaf_node_cell_offset(cell_num);
        let end = leaf_node_cell_offset(num_cells - 1) + LEAF_NODE_CELL_SIZE;
        node.copy_within(start..end, start + LEAF_NODE_CELL_SIZE);
    }
    set_leaf_node_key(node, cell_num, key);
    row.serialize(leaf_node_value_mut(node, cell_num));
    set_leaf_node_num_cells(node, num_cells + 1);
}

fn encode_leaf_cell(key: u32, row: &Row) -> Vec<u8> {
    let mut cell = vec![0u8; LEAF_NODE_CELL_SIZE];
    cell[..LEAF_NODE_KEY_SIZE].copy_from_slice(&key.to_le_bytes());
    row.serialize(&mut cell[LEAF_NODE_KEY_SIZE..]);
    cell
}

fn cell_key(cell: &[u8]) -> u32 {
    let mut bytes = [0u8; LEAF_NODE_KEY_SIZE];
    bytes.copy_from_slice(&cell[..LEAF_NODE_KEY_SIZE]);
    u32::from_le_bytes(bytes)
}

fn checked_leaf_cells(page_num: u32, node: &[u8; PAGE_SIZE]) -> DbResult<usize> {
    let num_cells = leaf_node_num_cells(node);
    if num_cells > LEAF_NODE_MAX_CELLS {
        return Err(DbError::Corrupt(format!("leaf page {} claims {} cells", page_num, num_cells)));
    }
    Ok(num_cells)
}

fn checked_internal_keys(page_num: u32, node: &[u8; PAGE_SIZE]) -> DbResult<usize> {
    let num_keys = internal_node_num_keys(node);
    if num_keys > INTERNAL_NODE_MAX_KEYS {
        return Err(DbError::Corrupt(format!("internal page {} claims {} keys", page_num, num_keys)));
    }
    Ok(num_keys)
}

fn checked_child(page_num: u32, node: &[u8; PAGE_SIZE], index: usize) -> DbResult<u32> {
    let child = internal_node_child(node, index);
    if child == INVALID_PAGE_NUM {
        return Err(DbError::Corrupt(format!("internal page {} has no child {}", page_num, index)));
    }
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u32) -> Row {
        Row::new(id, format!("user{}", id), format!("person{}@example.com", id)).unwrap()
    }

    #[test]
    fn leaf_insert_shifts_tail_right() {
        let mut node = [0u8; PAGE_SIZE];
        initialize_leaf_node(&mut node);
        leaf_insert_at(&mut node, 0, 0, 10, &row(10));
        leaf_insert_at(&mut node, 1, 1, 30, &row(30));
        leaf_insert_at(&mut node, 2, 1, 20, &row(20));

        assert_eq!(leaf_node_num_cells(&node), 3);
        let keys: Vec<u32> = (0..3).map(|i| leaf_node_key(&node, i)).collect();
        assert_eq!(keys, vec![10, 20, 30]);
        let moved = Row::deserialize(&leaf_node_cell(&node, 2)[LEAF_NODE_KEY_SIZE..]);
        assert_eq!(moved, row(30));
    }

    #[test]
    fn encoded_cell_starts_with_key() {
        let cell = encode_leaf_cell(0xdead_beef, &row(5));
        assert_eq!(cell.len(), LEAF_NODE_CELL_SIZE);
        assert_eq!(cell_key(&cell), 0xdead_beef);
        assert_eq!(Row::deserialize(&cell[LEAF_NODE_KEY_SIZE..]), row(5));
    }
}
