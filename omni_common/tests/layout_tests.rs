//! Layout descriptor tests.
//!
//! The segment image is a cross-process contract with a compiled C++
//! producer: these tests pin every offset and size, check the descriptor
//! tables against the compiled structs, and check the block offsets.

use core::mem::{align_of, size_of};
use omni_common::shm::layout::*;

/// Assert that a descriptor table is ordered, contiguous and covers the
/// whole struct (no hidden padding anywhere).
fn assert_contiguous(fields: &[FieldSpec], struct_size: usize, what: &str) {
    let mut cursor = 0;
    for field in fields {
        assert_eq!(
            field.offset, cursor,
            "{what}.{} starts at {} but previous field ended at {cursor}",
            field.name, field.offset
        );
        cursor += field.size;
    }
    assert_eq!(cursor, struct_size, "{what}: fields do not cover the struct");
}

#[test]
fn struct_sizes_match_producer() {
    assert_eq!(size_of::<Vector3d>(), 24);
    assert_eq!(size_of::<OmniState>(), 512);
    assert_eq!(size_of::<JointState>(), 56);
    assert_eq!(size_of::<ButtonEvent>(), 8);
    assert_eq!(size_of::<ReadMessage>(), 576);
    assert_eq!(size_of::<Feedback>(), 48);

    assert_eq!(align_of::<OmniState>(), 8);
    assert_eq!(align_of::<ReadMessage>(), 8);
    assert_eq!(align_of::<ButtonEvent>(), 4);
}

#[test]
fn descriptors_are_contiguous() {
    assert_contiguous(VECTOR3D_FIELDS, size_of::<Vector3d>(), "Vector3d");
    assert_contiguous(OMNI_STATE_FIELDS, size_of::<OmniState>(), "OmniState");
    assert_contiguous(JOINT_STATE_FIELDS, size_of::<JointState>(), "JointState");
    assert_contiguous(BUTTON_EVENT_FIELDS, size_of::<ButtonEvent>(), "ButtonEvent");
    assert_contiguous(READ_MESSAGE_FIELDS, size_of::<ReadMessage>(), "ReadMessage");
    assert_contiguous(FEEDBACK_FIELDS, size_of::<Feedback>(), "Feedback");
}

#[test]
fn omni_state_field_order() {
    let names: Vec<&str> = OMNI_STATE_FIELDS.iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        [
            "position", "velocity", "inp_vel1", "inp_vel2", "inp_vel3", "out_vel1", "out_vel2",
            "out_vel3", "pos_hist1", "pos_hist2", "rot", "joints", "force", "thetas", "buttons",
            "buttons_prev", "lock", "_pad", "lock_pos", "transform",
        ]
    );

    let vectors = OMNI_STATE_FIELDS.iter().take(13);
    for (i, field) in vectors.enumerate() {
        assert_eq!(field.offset, i * 24, "{}", field.name);
        assert_eq!(field.size, 24, "{}", field.name);
    }
}

#[test]
fn omni_state_tail_offsets() {
    let offset = |name: &str| {
        OMNI_STATE_FIELDS
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.offset)
            .unwrap()
    };
    assert_eq!(offset("thetas"), 312);
    assert_eq!(offset("buttons"), 340);
    assert_eq!(offset("buttons_prev"), 348);
    assert_eq!(offset("lock"), 356);
    // C++ bool followed by natural alignment of the next double vector.
    assert_eq!(offset("lock_pos"), 360);
    assert_eq!(offset("transform"), 384);
}

#[test]
fn read_message_concatenation() {
    assert_eq!(READ_MESSAGE_FIELDS[0].offset, 0);
    assert_eq!(READ_MESSAGE_FIELDS[1].offset, size_of::<OmniState>());
    assert_eq!(
        READ_MESSAGE_FIELDS[2].offset,
        size_of::<OmniState>() + size_of::<JointState>()
    );
}

#[test]
fn segment_blocks_do_not_overlap() {
    let write = SegmentLayout::write_range();
    let read = SegmentLayout::read_range();

    assert_eq!(SegmentLayout::READ_OFFSET, size_of::<Feedback>());
    assert_eq!(write.start, 0);
    assert_eq!(write.end, read.start);
    assert!(write.end <= read.start || read.end <= write.start);
    assert_eq!(read.end, SegmentLayout::TOTAL_SIZE);
    assert_eq!(
        SegmentLayout::TOTAL_SIZE,
        size_of::<Feedback>() + size_of::<ReadMessage>()
    );
    assert_eq!(SegmentLayout::TOTAL_SIZE, 624);
}

#[test]
fn field_range_matches_offset_and_size() {
    let lock_pos = OMNI_STATE_FIELDS
        .iter()
        .find(|f| f.name == "lock_pos")
        .unwrap();
    assert_eq!(lock_pos.range(), 360..384);
}
