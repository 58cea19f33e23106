//! Whole-chunk integration tests (SPEC_FULL §B.4): program header
//! construction over a synthetic chunk list, a full dynamic-section tag
//! sequence, and a small two-shard merged string section.

use elf_link_core::chunk::dynamic::{create_dynamic_section, DynamicSectionInputs};
use elf_link_core::chunk::mergeable::MergeableChunk;
use elf_link_core::chunk::phdr::{group_pt_load, segment_flags, SegmentInput};
use elf_link_core::container::{Container, Ctx};
use elf_link_core::elf::dynamic::{DT_NEEDED, DT_NULL, DT_SONAME, DT_STRTAB};
use elf_link_core::elf::section_header::{ShFlags, SHT_PROGBITS};

fn init_log() {
    let _ = stderrlog::new().verbosity(2).init();
}

#[test]
fn pt_load_grouping_splits_on_writability_change() {
    init_log();
    // With --no-rosegment, .text (r-x) and .rodata (r--, no EXECINSTR)
    // both map to R+X and merge into one PT_LOAD; .data (rw-) starts a
    // new PT_LOAD once writability changes.
    let chunks = vec![
        SegmentInput { sh_flags: ShFlags::ALLOC | ShFlags::EXECINSTR, sh_type: SHT_PROGBITS, sh_addr: 0x1000, sh_offset: 0x1000, sh_size: 0x100, sh_addralign: 16 },
        SegmentInput { sh_flags: ShFlags::ALLOC, sh_type: SHT_PROGBITS, sh_addr: 0x1100, sh_offset: 0x1100, sh_size: 0x50, sh_addralign: 16 },
        SegmentInput { sh_flags: ShFlags::ALLOC | ShFlags::WRITE, sh_type: SHT_PROGBITS, sh_addr: 0x2000, sh_offset: 0x1150, sh_size: 0x80, sh_addralign: 16 },
    ];
    let no_rosegment = false;
    let groups = group_pt_load(&chunks, no_rosegment);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].first, 0);
    assert_eq!(groups[0].last, 1);
    assert_eq!(groups[1].first, 2);
    assert_eq!(groups[1].last, 2);

    let text_flags = segment_flags(chunks[0].sh_flags, no_rosegment);
    let data_flags = segment_flags(chunks[2].sh_flags, no_rosegment);
    assert_ne!(text_flags.bits(), data_flags.bits());
}

#[test]
fn dynamic_section_full_tag_sequence_ends_in_null() {
    init_log();
    let inputs = DynamicSectionInputs {
        needed: vec![10, 20],
        soname: Some(5),
        strtab: Some((0x4000, 512)),
        spare_null_count: 1,
        ..Default::default()
    };
    let entries = create_dynamic_section(&inputs);
    let tags: Vec<u64> = entries.entries().iter().map(|e| e.d_tag).collect();

    assert_eq!(tags.iter().filter(|&&t| t == DT_NEEDED).count(), 2);
    assert!(tags.contains(&DT_SONAME));
    assert!(tags.contains(&DT_STRTAB));
    // DT_NULL terminator(s) are the final entries.
    assert_eq!(*tags.last().unwrap(), DT_NULL);

    let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
    let mut buf = vec![0u8; entries.byte_size(ctx)];
    entries.write_to(&mut buf, ctx).unwrap();
}

#[test]
fn two_shard_merged_string_section_dedups_and_packs() {
    init_log();
    let mut chunk = MergeableChunk::new(2);
    chunk.insert(b"alpha\0", 0);
    chunk.insert(b"beta\0", 3);
    chunk.insert(b"alpha\0", 0); // duplicate, dropped
    chunk.insert(b"gamma\0", 0);
    chunk.assign_offsets();

    let total = chunk.total_size();
    assert!(total > 0);
    let mut buf = vec![0xffu8; total];
    chunk.copy_buf(&mut buf).unwrap();
    assert!(buf.windows(6).any(|w| w == b"alpha\0"));
    assert!(buf.windows(5).any(|w| w == b"beta\0"));
    assert!(buf.windows(6).any(|w| w == b"gamma\0"));
}
