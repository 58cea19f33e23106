//! Program header table construction (spec §4.2): PT_LOAD/PT_TLS/
//! PT_NOTE grouping, segment-flag mapping, RELRO eligibility.
//!
//! Not grounded in the teacher (which only ever *reads* program
//! headers for Mach-O/PE-adjacent formats it doesn't have) — built
//! directly from spec §4.2's grouping rules and verified against
//! Concrete scenario 4 (§8) and the TLS `tp_addr` scenarios, which
//! `crate::tls` already implements.

use super::ChunkMeta;
use crate::container::Ctx;
use crate::elf::program_header::{Phdr, PFlags, PT_LOAD, PT_NOTE, PT_TLS};
use crate::elf::section_header::ShFlags;
use crate::tls::{tp_addr, TlsAbi};

/// The subset of a chunk's identity the program-header builder needs;
/// kept separate from the full `Chunk` so this module can be unit
/// tested against synthetic inputs without constructing whole chunks.
#[derive(Debug, Clone, Copy)]
pub struct SegmentInput {
    pub sh_flags: ShFlags,
    pub sh_type: u32,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_addralign: u64,
}

impl SegmentInput {
    fn is_alloc(&self) -> bool {
        self.sh_flags.contains(ShFlags::ALLOC)
    }

    fn is_tls(&self) -> bool {
        self.sh_flags.contains(ShFlags::TLS)
    }

    fn is_nobits(&self) -> bool {
        self.sh_type == crate::elf::section_header::SHT_NOBITS
    }

    fn is_tls_bss(&self) -> bool {
        self.is_tls() && self.is_nobits()
    }
}

/// Segment-flag mapping (spec §4.2): `PF_R` always; `PF_W` iff
/// `SHF_WRITE`; `PF_X` iff `SHF_EXECINSTR`, or (no `SHF_WRITE` and
/// `rosegment` is off) to support `--no-rosegment`.
pub fn segment_flags(sh_flags: ShFlags, rosegment: bool) -> PFlags {
    let mut flags = PFlags::R;
    if sh_flags.contains(ShFlags::WRITE) {
        flags |= PFlags::W;
    }
    let execinstr = sh_flags.contains(ShFlags::EXECINSTR);
    let shares_rosegment = !sh_flags.contains(ShFlags::WRITE) && !rosegment;
    if execinstr || shares_rosegment {
        flags |= PFlags::X;
    }
    flags
}

/// One `PT_LOAD` segment: the range of input chunk indices it covers
/// plus the frozen `p_*` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtLoadGroup {
    pub first: usize,
    pub last: usize,
    pub flags: PFlags,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

/// Greedily groups allocated, non-TLS-BSS chunks into `PT_LOAD`
/// segments per spec §4.2, then stably sorts the groups by `p_vaddr`.
pub fn group_pt_load(chunks: &[SegmentInput], rosegment: bool) -> Vec<PtLoadGroup> {
    let mut groups: Vec<PtLoadGroup> = Vec::new();
    let mut i = 0;
    while i < chunks.len() {
        let c = &chunks[i];
        if !c.is_alloc() || c.is_tls_bss() {
            i += 1;
            continue;
        }
        let flags = segment_flags(c.sh_flags, rosegment);
        let mut last = i;
        let mut filesz = if c.is_nobits() { 0 } else { c.sh_size };
        let mut memsz = c.sh_size;
        let mut j = i + 1;
        while j < chunks.len() {
            let prev = &chunks[last];
            let next = &chunks[j];
            if !next.is_alloc() {
                break;
            }
            if next.is_tls_bss() {
                // TLS-BSS belongs only to PT_TLS (spec §4.2); it never
                // joins a PT_LOAD, so it ends the current run here.
                break;
            }
            let same_flags = segment_flags(next.sh_flags, rosegment) == flags;
            let contiguous = next.sh_offset.wrapping_sub(prev.sh_offset) == next.sh_addr.wrapping_sub(prev.sh_addr);
            if !same_flags || !contiguous {
                break;
            }
            if next.is_nobits() {
                memsz += next.sh_size;
            } else {
                filesz += next.sh_size;
                memsz += next.sh_size;
            }
            last = j;
            j += 1;
        }
        let first_chunk = &chunks[i];
        groups.push(PtLoadGroup {
            first: i,
            last,
            flags,
            p_offset: first_chunk.sh_offset,
            p_vaddr: first_chunk.sh_addr,
            p_filesz: filesz,
            p_memsz: memsz,
            p_align: first_chunk.sh_addralign.max(1),
        });
        i = last + 1;
    }
    groups.sort_by_key(|g| g.p_vaddr);
    groups
}

/// Finds the maximal contiguous run of `SHF_TLS` chunks and computes
/// its `PT_TLS` segment plus `tp_addr` for `abi`.
pub fn group_pt_tls(chunks: &[SegmentInput], abi: TlsAbi) -> Option<(Phdr, u64)> {
    let start = chunks.iter().position(|c| c.is_alloc() && c.is_tls())?;
    let mut end = start;
    while end + 1 < chunks.len() && chunks[end + 1].is_alloc() && chunks[end + 1].is_tls() {
        end += 1;
    }
    let first = &chunks[start];
    let mut filesz = 0u64;
    let mut memsz = 0u64;
    let mut align = first.sh_addralign.max(1);
    for c in &chunks[start..=end] {
        align = align.max(c.sh_addralign.max(1));
        if !c.is_nobits() {
            filesz += c.sh_size;
        }
        memsz += c.sh_size;
    }
    let tls_begin = first.sh_addr;
    let phdr = Phdr {
        p_type: PT_TLS,
        p_flags: PFlags::R.bits(),
        p_offset: first.sh_offset,
        p_vaddr: tls_begin,
        p_paddr: tls_begin,
        p_filesz: filesz,
        p_memsz: memsz,
        p_align: align,
    };
    let addr = tp_addr(abi, tls_begin, memsz, align);
    Some((phdr, addr))
}

/// Maximal runs of `SHT_NOTE & SHF_ALLOC` chunks with identical
/// segment-flag mappings become one `PT_NOTE` each.
pub fn group_pt_note(chunks: &[SegmentInput], rosegment: bool) -> Vec<Phdr> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < chunks.len() {
        let c = &chunks[i];
        if !c.is_alloc() || c.sh_type != crate::elf::section_header::SHT_NOTE {
            i += 1;
            continue;
        }
        let flags = segment_flags(c.sh_flags, rosegment);
        let mut last = i;
        let mut size = c.sh_size;
        let mut j = i + 1;
        while j < chunks.len() {
            let next = &chunks[j];
            if next.is_alloc() && next.sh_type == crate::elf::section_header::SHT_NOTE && segment_flags(next.sh_flags, rosegment) == flags {
                size += next.sh_size;
                last = j;
                j += 1;
            } else {
                break;
            }
        }
        out.push(Phdr {
            p_type: PT_NOTE,
            p_flags: flags.bits(),
            p_offset: c.sh_offset,
            p_vaddr: c.sh_addr,
            p_paddr: c.sh_addr,
            p_filesz: size,
            p_memsz: size,
            p_align: c.sh_addralign.max(1),
        });
        i = last + 1;
    }
    out
}

/// RELRO eligibility (spec §4.2): writable AND one of the listed
/// categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelroInput {
    pub writable: bool,
    pub is_tls: bool,
    pub is_init_fini_array: bool,
    pub is_got: bool,
    pub is_dynamic: bool,
    pub is_relro_padding: bool,
    pub name_is_toc: bool,
    pub name_ends_with_rel_ro: bool,
    pub is_got_plt: bool,
}

pub fn is_relro_eligible(input: &RelroInput, now: bool) -> bool {
    input.writable
        && (input.is_tls
            || input.is_init_fini_array
            || input.is_got
            || input.is_dynamic
            || input.is_relro_padding
            || input.name_is_toc
            || input.name_ends_with_rel_ro
            || (now && input.is_got_plt))
}

/// The `PT_PHDR`/`PT_LOAD`/`PT_TLS`/`PT_NOTE`/... chunk that writes
/// the program header table itself.
#[derive(Debug, Clone, Default)]
pub struct PhdrChunk {
    pub entries: Vec<Phdr>,
}

impl PhdrChunk {
    pub fn new(entries: Vec<Phdr>) -> Self {
        PhdrChunk { entries }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        meta.shdr.sh_size = (self.entries.len() * Phdr::size(ctx)) as u64;
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        let entry = Phdr::size(ctx);
        for (i, p) in self.entries.iter().enumerate() {
            p.write_to(&mut buf[i * entry..(i + 1) * entry], ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(flags: ShFlags, addr: u64, offset: u64, size: u64) -> SegmentInput {
        SegmentInput { sh_flags: flags, sh_type: crate::elf::section_header::SHT_PROGBITS, sh_addr: addr, sh_offset: offset, sh_size: size, sh_addralign: 1 }
    }

    fn tbss_chunk(addr: u64, offset: u64, size: u64) -> SegmentInput {
        SegmentInput { sh_flags: ShFlags::ALLOC | ShFlags::TLS, sh_type: crate::elf::section_header::SHT_NOBITS, sh_addr: addr, sh_offset: offset, sh_size: size, sh_addralign: 1 }
    }

    #[test]
    fn two_contiguous_exec_chunks_merge_into_one_pt_load() {
        let chunks = vec![
            chunk(ShFlags::ALLOC | ShFlags::EXECINSTR, 0x1000, 0x1000, 0x100),
            chunk(ShFlags::ALLOC | ShFlags::EXECINSTR, 0x1100, 0x1100, 0x50),
        ];
        let groups = group_pt_load(&chunks, true);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].p_filesz, 0x150);
    }

    #[test]
    fn inserting_writable_chunk_splits_into_two_pt_loads() {
        let chunks = vec![
            chunk(ShFlags::ALLOC | ShFlags::EXECINSTR, 0x1000, 0x1000, 0x100),
            chunk(ShFlags::ALLOC | ShFlags::WRITE, 0x1100, 0x1100, 0x50),
            chunk(ShFlags::ALLOC | ShFlags::EXECINSTR, 0x1150, 0x1150, 0x50),
        ];
        let groups = group_pt_load(&chunks, true);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn tls_bss_is_excluded_from_pt_load_and_does_not_inflate_memsz() {
        // .data (rw-), .tbss (TLS+NOBITS), .text (r-x): the tbss chunk
        // ends the first group without joining either PT_LOAD, and
        // contributes nothing to p_filesz/p_memsz anywhere.
        let chunks = vec![
            chunk(ShFlags::ALLOC | ShFlags::WRITE, 0x1000, 0x1000, 0x40),
            tbss_chunk(0x1040, 0x1040, 0x1000),
            chunk(ShFlags::ALLOC | ShFlags::EXECINSTR, 0x2040, 0x1040, 0x80),
        ];
        let groups = group_pt_load(&chunks, true);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].last, 0);
        assert_eq!(groups[0].p_memsz, 0x40);
        assert_eq!(groups[1].first, 2);
        assert_eq!(groups[1].p_memsz, 0x80);
    }

    #[test]
    fn segment_flags_no_rosegment_makes_rodata_executable() {
        let flags = segment_flags(ShFlags::ALLOC, false);
        assert!(flags.contains(PFlags::X));
        let flags_with_rosegment = segment_flags(ShFlags::ALLOC, true);
        assert!(!flags_with_rosegment.contains(PFlags::X));
    }

    #[test]
    fn tls_group_computes_x86_64_tp_addr() {
        let mut tls_chunk = chunk(ShFlags::ALLOC | ShFlags::TLS, 0x1000, 0x1000, 0x40);
        tls_chunk.sh_addralign = 16;
        let chunks = vec![tls_chunk];
        let (phdr, addr) = group_pt_tls(&chunks, TlsAbi::TcbBeforeTls).unwrap();
        assert_eq!(phdr.p_memsz, 0x40);
        assert_eq!(addr, 0x1040);
    }

    #[test]
    fn relro_eligibility_requires_writable() {
        let input = RelroInput { writable: false, is_got: true, ..Default::default() };
        assert!(!is_relro_eligible(&input, false));
        let input = RelroInput { writable: true, is_got: true, ..Default::default() };
        assert!(is_relro_eligible(&input, false));
    }

    #[test]
    fn got_plt_only_relro_eligible_with_now() {
        let input = RelroInput { writable: true, is_got_plt: true, ..Default::default() };
        assert!(!is_relro_eligible(&input, false));
        assert!(is_relro_eligible(&input, true));
    }
}
