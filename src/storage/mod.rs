pub mod btree;
pub mod cursor;
pub mod page;
pub mod pager;
pub mod row;
pub mod table;
