use types::{Reg, SegmentId, SegmentKind};
use vm::segment::{DynMem, Node, Segment};
use vm::SegmentManager;

#[test]
fn test_segment_ids_start_after_null() {
    let mut heap = SegmentManager::new();
    let first = heap.allocate(SegmentKind::Dynmem).expect("segment");
    let second = heap.allocate(SegmentKind::Hunk).expect("segment");
    assert_eq!(first, SegmentId(1));
    assert_eq!(second, SegmentId(2));
    assert!(heap.get(SegmentId(0)).is_none());
    assert_eq!(heap.kind_of(second), Some(SegmentKind::Hunk));
}

#[test]
fn test_freed_segment_is_invalid_and_table_keeps_its_length() {
    let mut heap = SegmentManager::new();
    let a = heap.allocate(SegmentKind::Dynmem).expect("segment");
    let b = heap.allocate(SegmentKind::Dynmem).expect("segment");
    let len = heap.table_len();

    assert!(heap.free(a).is_some());
    assert!(heap.get(a).is_none());
    assert!(heap.free(a).is_none(), "double free is a no-op");
    assert_eq!(heap.table_len(), len);
    assert!(heap.is_live(b));

    let reused = heap.allocate(SegmentKind::Lists).expect("segment");
    assert_eq!(reused, a, "freed ids are reused once torn down");
    assert_eq!(heap.kind_of(reused), Some(SegmentKind::Lists));
}

#[test]
fn test_out_of_range_lookups_are_none() {
    let heap = SegmentManager::new();
    assert!(heap.get(SegmentId(500)).is_none());
    assert!(heap.object(Reg::ptr(SegmentId(500), 0)).is_none());
    assert!(heap.list(Reg::int(3)).is_none());
}

#[test]
fn test_pools_share_a_segment_until_full() {
    let mut heap = SegmentManager::new();
    let a = heap.allocate_list().expect("list");
    let b = heap.allocate_list().expect("list");
    assert_eq!(a.segment(), b.segment());
    assert_ne!(a, b);

    let node = heap.allocate_node(Node::new(Reg::int(1), Reg::int(1))).expect("node");
    assert_ne!(node.segment(), a.segment());
    assert_eq!(heap.node(node).map(|n| n.value), Some(Reg::int(1)));

    assert!(heap.free_list(a).is_some());
    assert!(heap.list(a).is_none());
    assert!(heap.list(b).is_some());
}

#[test]
fn test_insert_at_rebuilds_table_shape() {
    let mut heap = SegmentManager::with_table_len(6);
    assert_eq!(heap.table_len(), 6);
    assert!(heap.insert_at(SegmentId(4), Segment::Dynmem(DynMem::new("scratch", 8))));
    assert!(!heap.insert_at(SegmentId(4), Segment::Dynmem(DynMem::new("again", 8))));
    assert!(!heap.insert_at(SegmentId(0), Segment::Dynmem(DynMem::new("null", 8))));
    assert!(heap.insert_at(SegmentId(9), Segment::Dynmem(DynMem::new("grown", 2))));
    assert_eq!(heap.table_len(), 10);

    let fresh = heap.allocate(SegmentKind::Hunk).expect("segment");
    assert_eq!(fresh, SegmentId(1));
}

#[test]
fn test_describe_and_dump() {
    let mut heap = SegmentManager::new();
    let id = heap
        .insert(Segment::Dynmem(DynMem::new("palette", 4)))
        .expect("segment");
    let listing = heap.describe();
    assert!(listing.contains("dynmem"));
    assert!(listing.contains("'palette'"));
    let dump = heap.dump(id).expect("dump");
    assert_eq!(dump.trim(), "0000: 00000000");
}
