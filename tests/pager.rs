use std::fs;

use leafdb::DbError;
use leafdb::storage::page::PAGE_SIZE;
use leafdb::storage::pager::Pager;
use tempfile::tempdir;

#[test]
fn new_file_has_no_pages() {
    let dir = tempdir().unwrap();
    let pager = Pager::open(dir.path().join("p.db"), 10).unwrap();
    assert_eq!(pager.num_pages(), 0);
    assert_eq!(pager.unused_page_num(), 0);
}

#[test]
fn pages_start_zeroed_and_extend_the_count() {
    let dir = tempdir().unwrap();
    let mut pager = Pager::open(dir.path().join("p.db"), 10).unwrap();

    let page = pager.get_page(3).unwrap();
    assert!(page.data.iter().all(|&b| b == 0));
    assert_eq!(pager.num_pages(), 4);
    assert_eq!(pager.unused_page_num(), 4);
}

#[test]
fn page_past_the_cap_is_out_of_bounds() {
    let dir = tempdir().unwrap();
    let mut pager = Pager::open(dir.path().join("p.db"), 2).unwrap();

    assert!(pager.get_page(1).is_ok());
    assert!(matches!(
        pager.get_page(2),
        Err(DbError::PageOutOfBounds { page_num: 2, max_pages: 2 })
    ));
}

#[test]
fn allocation_stops_at_the_cap() {
    let dir = tempdir().unwrap();
    let mut pager = Pager::open(dir.path().join("p.db"), 3).unwrap();

    assert_eq!(pager.allocate_page().unwrap(), 0);
    assert_eq!(pager.allocate_page().unwrap(), 1);
    assert_eq!(pager.allocate_page().unwrap(), 2);
    assert!(matches!(
        pager.allocate_page(),
        Err(DbError::CapacityExhausted { max_pages: 3 })
    ));
}

#[test]
fn close_writes_pages_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.db");

    let mut pager = Pager::open(&path, 10).unwrap();
    pager.get_page(0).unwrap().data[0] = 0xab;
    pager.get_page(2).unwrap().data[PAGE_SIZE - 1] = 0xcd;
    pager.close().unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), 3 * PAGE_SIZE as u64);

    let mut pager = Pager::open(&path, 10).unwrap();
    assert_eq!(pager.num_pages(), 3);
    assert_eq!(pager.get_page(0).unwrap().data[0], 0xab);
    assert_eq!(pager.get_page(2).unwrap().data[PAGE_SIZE - 1], 0xcd);
    assert!(pager.get_page(1).unwrap().data.iter().all(|&b| b == 0));
}

#[test]
fn flush_of_uncached_page_fails() {
    let dir = tempdir().unwrap();
    let mut pager = Pager::open(dir.path().join("p.db"), 10).unwrap();
    assert!(matches!(pager.flush_page(5), Err(DbError::Corrupt(_))));
}

#[test]
fn partial_page_file_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.db");
    fs::write(&path, vec![0u8; PAGE_SIZE + 100]).unwrap();

    assert!(matches!(Pager::open(&path, 10), Err(DbError::Corrupt(_))));
}

#[test]
fn file_larger_than_cap_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.db");
    fs::write(&path, vec![0u8; 4 * PAGE_SIZE]).unwrap();

    assert!(matches!(Pager::open(&path, 3), Err(DbError::Corrupt(_))));
}

#[test]
fn partial_flush_writes_only_the_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.db");
    let mut pager = Pager::open(&path, 10).unwrap();

    pager.get_page(0).unwrap().data.fill(0x11);
    pager.flush_page(0).unwrap();
    pager.get_page(1).unwrap().data.fill(0x22);
    pager.flush(1, 100).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), PAGE_SIZE + 100);
    assert!(bytes[..PAGE_SIZE].iter().all(|&b| b == 0x11));
    assert!(bytes[PAGE_SIZE..].iter().all(|&b| b == 0x22));

    // Close writes the whole page, so the file is page aligned again.
    pager.close().unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 2 * PAGE_SIZE as u64);

    let mut pager = Pager::open(&path, 10).unwrap();
    assert_eq!(pager.num_pages(), 2);
    assert!(pager.get_page(1).unwrap().data.iter().all(|&b| b == 0x22));
}

#[test]
fn flush_larger_than_a_page_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.db");
    let mut pager = Pager::open(&path, 10).unwrap();
    pager.get_page(0).unwrap();

    assert!(matches!(
        pager.flush(0, PAGE_SIZE + 1),
        Err(DbError::InvalidValue(_))
    ));
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}
