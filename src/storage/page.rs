// Common node header
// ┌─────────────────────────────────────────────────────────────────────────┐
// │ Offset │ Length │ Description                                           │
// │────────┼────────┼───────────────────────────────────────────────────────│
// │   0    │   1    │ NODE_TYPE (0 = internal, 1 = leaf)                    │
// │   1    │   1    │ IS_ROOT   (0 = false, 1 = true)                       │
// │   2    │   4    │ PARENT_PAGE (u32): page number of parent (0 if root)  │
// └─────────────────────────────────────────────────────────────────────────┘
//
// Leaf node
// ┌─────────────────────────────────────────────────────────────────────────┐
// │   6    │   4    │ NUM_CELLS (u32)                                       │
// │  10    │   4    │ NEXT_LEAF (u32): right sibling, 0 if none             │
// │  14    │ 297×n  │ Cells: [key u32][row, 293 bytes]                      │
// └─────────────────────────────────────────────────────────────────────────┘
//
// Internal node
// ┌─────────────────────────────────────────────────────────────────────────┐
// │   6    │   4    │ NUM_KEYS (u32)                                        │
// │  10    │   4    │ RIGHT_CHILD (u32)                                     │
// │  14    │  8×n   │ Cells: [child u32][key u32], key = max key of child   │
// └─────────────────────────────────────────────────────────────────────────┘

use crate::error::{DbError, DbResult};
use crate::storage::row::ROW_SIZE;

pub const PAGE_SIZE: usize = 4096;

pub const NODE_TYPE_SIZE: usize = 1;
pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = 1;
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
pub const PARENT_POINTER_SIZE: usize = 4;
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

pub const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_NEXT_LEAF_SIZE: usize = 4;
pub const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE + LEAF_NODE_NEXT_LEAF_SIZE;

pub const LEAF_NODE_KEY_SIZE: usize = 4;
pub const LEAF_NODE_KEY_OFFSET: usize = 0;
pub const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_VALUE_OFFSET: usize = LEAF_NODE_KEY_OFFSET + LEAF_NODE_KEY_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

pub const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

pub const INTERNAL_NODE_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_KEY_SIZE: usize = 4;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;
pub const INTERNAL_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_MAX_KEYS: usize = INTERNAL_NODE_SPACE_FOR_CELLS / INTERNAL_NODE_CELL_SIZE;

/// Right-child value of an internal node that has no children yet.
pub const INVALID_PAGE_NUM: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

impl NodeType {
    pub fn to_code(self) -> u8 {
        match self {
            NodeType::Internal => 0,
            NodeType::Leaf => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NodeType::Internal),
            1 => Some(NodeType::Leaf),
            _ => None,
        }
    }
}

fn read_u32(page: &[u8; PAGE_SIZE], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&page[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn write_u32(page: &mut [u8; PAGE_SIZE], offset: usize, value: u32) {
    page[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Read the node type tag. An unknown tag means the page is not a node.
pub fn node_type(page: &[u8; PAGE_SIZE]) -> DbResult<NodeType> {
    let code = page[NODE_TYPE_OFFSET];
    NodeType::from_code(code)
        .ok_or_else(|| DbError::Corrupt(format!("unknown node type tag {}", code)))
}

pub fn set_node_type(page: &mut [u8; PAGE_SIZE], node_type: NodeType) {
    page[NODE_TYPE_OFFSET] = node_type.to_code();
}

pub fn is_node_root(page: &[u8; PAGE_SIZE]) -> bool {
    page[IS_ROOT_OFFSET] != 0
}

pub fn set_node_root(page: &mut [u8; PAGE_SIZE], is_root: bool) {
    page[IS_ROOT_OFFSET] = if is_root { 1 } else { 0 };
}

pub fn node_parent(page: &[u8; PAGE_SIZE]) -> u32 {
    read_u32(page, PARENT_POINTER_OFFSET)
}

pub fn set_node_parent(page: &mut [u8; PAGE_SIZE], parent: u32) {
    write_u32(page, PARENT_POINTER_OFFSET, parent);
}

/// Reset the page to an empty, non-root leaf.
pub fn initialize_leaf_node(page: &mut [u8; PAGE_SIZE]) {
    page.fill(0);
    set_node_type(page, NodeType::Leaf);
    set_node_root(page, false);
    set_leaf_node_num_cells(page, 0);
    set_leaf_node_next_leaf(page, 0);
}

/// Reset the page to an empty, non-root internal node.
pub fn initialize_internal_node(page: &mut [u8; PAGE_SIZE]) {
    page.fill(0);
    set_node_type(page, NodeType::Internal);
    set_node_root(page, false);
    set_internal_node_num_keys(page, 0);
    set_internal_node_right_child(page, INVALID_PAGE_NUM);
}

// ---- leaf nodes ----

pub fn leaf_node_num_cells(page: &[u8; PAGE_SIZE]) -> usize {
    read_u32(page, LEAF_NODE_NUM_CELLS_OFFSET) as usize
}

pub fn set_leaf_node_num_cells(page: &mut [u8; PAGE_SIZE], num_cells: usize) {
    write_u32(page, LEAF_NODE_NUM_CELLS_OFFSET, num_cells as u32);
}

pub fn leaf_node_next_leaf(page: &[u8; PAGE_SIZE]) -> u32 {
    read_u32(page, LEAF_NODE_NEXT_LEAF_OFFSET)
}

pub fn set_leaf_node_next_leaf(page: &mut [u8; PAGE_SIZE], next_leaf: u32) {
    write_u32(page, LEAF_NODE_NEXT_LEAF_OFFSET, next_leaf);
}

/// Byte offset of cell `cell_num` from the start of the page.
pub fn leaf_node_cell_offset(cell_num: usize) -> usize {
    assert!(cell_num < LEAF_NODE_MAX_CELLS, "leaf cell {} out of range", cell_num);
    LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
}

pub fn leaf_node_cell(page: &[u8; PAGE_SIZE], cell_num: usize) -> &[u8] {
    let offset = leaf_node_cell_offset(cell_num);
    &page[offset..offset + LEAF_NODE_CELL_SIZE]
}

pub fn leaf_node_cell_mut(page: &mut [u8; PAGE_SIZE], cell_num: usize) -> &mut [u8] {
    let offset = leaf_node_cell_offset(cell_num);
    &mut page[offset..offset + LEAF_NODE_CELL_SIZE]
}

pub fn leaf_node_key(page: &[u8; PAGE_SIZE], cell_num: usize) -> u32 {
    read_u32(page, leaf_node_cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET)
}

pub fn set_leaf_node_key(page: &mut [u8; PAGE_SIZE], cell_num: usize, key: u32) {
    write_u32(page, leaf_node_cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET, key);
}

pub fn leaf_node_value(page: &[u8; PAGE_SIZE], cell_num: usize) -> &[u8] {
    let offset = leaf_node_cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
    &page[offset..offset + LEAF_NODE_VALUE_SIZE]
}

pub fn leaf_node_value_mut(page: &mut [u8; PAGE_SIZE], cell_num: usize) -> &mut [u8] {
    let offset = leaf_node_cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
    &mut page[offset..offset + LEAF_NODE_VALUE_SIZE]
}

/// Binary search for `key` among the leaf's cells. Returns the index holding
/// `key`, or the index at which it would be inserted.
pub fn leaf_node_find_index(page: &[u8; PAGE_SIZE], key: u32) -> usize {
    let mut min = 0;
    let mut one_past_max = leaf_node_num_cells(page);
    while one_past_max != min {
        let index = (min + one_past_max) / 2;
        let key_at_index = leaf_node_key(page, index);
        if key == key_at_index {
            return index;
        }
        if key < key_at_index {
            one_past_max = index;
        } else {
            min = index + 1;
        }
    }
    min
}

// ---- internal nodes ----

pub fn internal_node_num_keys(page: &[u8; PAGE_SIZE]) -> usize {
    read_u32(page, INTERNAL_NODE_NUM_KEYS_OFFSET) as usize
}

pub fn set_internal_node_num_keys(page: &mut [u8; PAGE_SIZE], num_keys: usize) {
    write_u32(page, INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys as u32);
}

pub fn internal_node_right_child(page: &[u8; PAGE_SIZE]) -> u32 {
    read_u32(page, INTERNAL_NODE_RIGHT_CHILD_OFFSET)
}

pub fn set_internal_node_right_child(page: &mut [u8; PAGE_SIZE], child: u32) {
    write_u32(page, INTERNAL_NODE_RIGHT_CHILD_OFFSET, child);
}

pub fn internal_node_cell_offset(cell_num: usize) -> usize {
    assert!(cell_num < INTERNAL_NODE_MAX_KEYS, "internal cell {} out of range", cell_num);
    INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
}

/// Child pointer `child_num`; `child_num == num_keys` reads the right child.
pub fn internal_node_child(page: &[u8; PAGE_SIZE], child_num: usize) -> u32 {
    if child_num == internal_node_num_keys(page) {
        internal_node_right_child(page)
    } else {
        read_u32(page, internal_node_cell_offset(child_num))
    }
}

pub fn set_internal_node_child(page: &mut [u8; PAGE_SIZE], child_num: usize, child: u32) {
    if child_num == internal_node_num_keys(page) {
        set_internal_node_right_child(page, child);
    } else {
        write_u32(page, internal_node_cell_offset(child_num), child);
    }
}

pub fn internal_node_key(page: &[u8; PAGE_SIZE], key_num: usize) -> u32 {
    read_u32(page, internal_node_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE)
}

pub fn set_internal_node_key(page: &mut [u8; PAGE_SIZE], key_num: usize, key: u32) {
    write_u32(page, internal_node_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE, key);
}

/// Index of the child whose subtree should contain `key`: the smallest index
/// whose key is ≥ `key`, or `num_keys` for the right child.
pub fn internal_node_find_child_index(page: &[u8; PAGE_SIZE], key: u32) -> usize {
    let mut min = 0;
    let mut max = internal_node_num_keys(page);
    while min != max {
        let index = (min + max) / 2;
        if internal_node_key(page, index) >= key {
            max = index;
        } else {
            min = index + 1;
        }
    }
    min
}

/// The listing printed by the `.constants` meta command.
pub fn constants_report() -> String {
    format!(
        "ROW_SIZE: {}\n\
         COMMON_NODE_HEADER_SIZE: {}\n\
         LEAF_NODE_HEADER_SIZE: {}\n\
         LEAF_NODE_CELL_SIZE: {}\n\
         LEAF_NODE_SPACE_FOR_CELLS: {}\n\
         LEAF_NODE_MAX_CELLS: {}\n\
         INTERNAL_NODE_MAX_KEYS: {}\n",
        ROW_SIZE,
        COMMON_NODE_HEADER_SIZE,
        LEAF_NODE_HEADER_SIZE,
        LEAF_NODE_CELL_SIZE,
        LEAF_NODE_SPACE_FOR_CELLS,
        LEAF_NODE_MAX_CELLS,
        INTERNAL_NODE_MAX_KEYS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacities_follow_from_page_size() {
        assert_eq!(COMMON_NODE_HEADER_SIZE, 6);
        assert_eq!(LEAF_NODE_HEADER_SIZE, 14);
        assert_eq!(LEAF_NODE_CELL_SIZE, 297);
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);
        assert_eq!(INTERNAL_NODE_HEADER_SIZE, 14);
        assert_eq!(INTERNAL_NODE_MAX_KEYS, 510);
    }

    #[test]
    fn header_fields_sit_at_fixed_offsets() {
        let mut page = [0u8; PAGE_SIZE];
        initialize_leaf_node(&mut page);
        set_node_root(&mut page, true);
        set_node_parent(&mut page, 0x0102_0304);
        set_leaf_node_num_cells(&mut page, 3);
        set_leaf_node_next_leaf(&mut page, 9);

        assert_eq!(page[0], 1);
        assert_eq!(page[1], 1);
        assert_eq!(&page[2..6], &[4, 3, 2, 1]);
        assert_eq!(&page[6..10], &3u32.to_le_bytes());
        assert_eq!(&page[10..14], &9u32.to_le_bytes());
        assert_eq!(node_type(&page).unwrap(), NodeType::Leaf);
        assert!(is_node_root(&page));
        assert_eq!(node_parent(&page), 0x0102_0304);
    }

    #[test]
    fn unknown_node_tag_is_corrupt() {
        let mut page = [0u8; PAGE_SIZE];
        page[NODE_TYPE_OFFSET] = 7;
        assert!(matches!(node_type(&page), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn initialize_clears_stale_contents() {
        let mut page = [0xabu8; PAGE_SIZE];
        initialize_internal_node(&mut page);
        assert_eq!(node_type(&page).unwrap(), NodeType::Internal);
        assert!(!is_node_root(&page));
        assert_eq!(internal_node_num_keys(&page), 0);
        assert_eq!(internal_node_right_child(&page), INVALID_PAGE_NUM);
        assert!(page[INTERNAL_NODE_HEADER_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn leaf_cells_are_laid_out_back_to_back() {
        let mut page = [0u8; PAGE_SIZE];
        initialize_leaf_node(&mut page);
        set_leaf_node_key(&mut page, 0, 10);
        set_leaf_node_key(&mut page, 1, 20);
        leaf_node_value_mut(&mut page, 0)[0] = 0xee;
        set_leaf_node_num_cells(&mut page, 2);

        assert_eq!(leaf_node_cell_offset(1), 14 + 297);
        assert_eq!(leaf_node_key(&page, 1), 20);
        assert_eq!(leaf_node_cell(&page, 0)[4], 0xee);
        assert_eq!(leaf_node_value(&page, 0)[0], 0xee);
    }

    #[test]
    fn leaf_binary_search_finds_key_or_insertion_point() {
        let mut page = [0u8; PAGE_SIZE];
        initialize_leaf_node(&mut page);
        for (i, key) in [2u32, 4, 6, 8].iter().enumerate() {
            set_leaf_node_key(&mut page, i, *key);
        }
        set_leaf_node_num_cells(&mut page, 4);

        assert_eq!(leaf_node_find_index(&page, 6), 2);
        assert_eq!(leaf_node_find_index(&page, 1), 0);
        assert_eq!(leaf_node_find_index(&page, 5), 2);
        assert_eq!(leaf_node_find_index(&page, 9), 4);
    }

    #[test]
    fn internal_child_lookup_routes_by_max_key() {
        let mut page = [0u8; PAGE_SIZE];
        initialize_internal_node(&mut page);
        set_internal_node_num_keys(&mut page, 2);
        set_internal_node_child(&mut page, 0, 3);
        set_internal_node_key(&mut page, 0, 10);
        set_internal_node_child(&mut page, 1, 4);
        set_internal_node_key(&mut page, 1, 20);
        set_internal_node_right_child(&mut page, 5);

        assert_eq!(internal_node_child(&page, 2), 5);
        assert_eq!(internal_node_find_child_index(&page, 10), 0);
        assert_eq!(internal_node_find_child_index(&page, 11), 1);
        assert_eq!(internal_node_find_child_index(&page, 21), 2);
        assert_eq!(&page[14..18], &3u32.to_le_bytes());
        assert_eq!(&page[18..22], &10u32.to_le_bytes());
    }

    #[test]
    fn constants_report_lists_leaf_capacity() {
        let report = constants_report();
        assert!(report.contains("ROW_SIZE: 293\n"));
        assert!(report.contains("LEAF_NODE_MAX_CELLS: 13\n"));
    }
}
