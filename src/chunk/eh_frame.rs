//! `.eh_frame`/`.eh_frame_hdr` construction (spec §4.11).
//!
//! Not grounded in the teacher (Mach-O/PE have no CIE/FDE equivalent);
//! built directly from spec §4.11's two-phase algorithm. DWARF CFI
//! parsing itself (recognizing CIE vs FDE, locating the augmentation
//! and relocation records within a record's bytes) is an input-file
//! concern the core doesn't own (spec §1's "input-file parsing" is
//! out of scope) — this module takes already-parsed `CieRecord`/
//! `FdeRecord`s and does only the uniquification, placement, and
//! CIE-pointer patching spec §4.11 assigns to the core.

use crate::context::Context;
use crate::profile::RelocApplication;

use super::ChunkMeta;

#[derive(Debug, Clone)]
pub struct CieRecord {
    pub bytes: Vec<u8>,
    pub relocs: Vec<RelocApplication>,
}

#[derive(Debug, Clone)]
pub struct FdeRecord {
    pub bytes: Vec<u8>,
    pub relocs: Vec<RelocApplication>,
    pub cie_index: usize,
}

#[derive(Debug, Clone)]
pub struct FileFrames {
    pub cies: Vec<CieRecord>,
    pub fdes: Vec<FdeRecord>,
}

#[derive(Debug, Clone, Default)]
struct Placement {
    cie_leader_offsets: Vec<usize>,
    fde_offsets: Vec<(usize, usize)>, // (offset, leader cie index into leaders)
}

#[derive(Debug, Default)]
pub struct EhFrameChunk {
    files: Vec<FileFrames>,
    leaders: Vec<Vec<u8>>,
    placement: Vec<Placement>,
    fde_end: usize,
    /// `(init_addr, fde_offset)` pairs, `fde_offset` relative to this
    /// section's own start; sorted by `init_addr` for binary
    /// searchability once `construct` runs. `init_addr` is already a
    /// final resolved address (the FDE's first relocation's `val`), but
    /// `fde_offset` needs `.eh_frame`'s own final `sh_addr` — not known
    /// until address assignment — to become an absolute address, which
    /// is why `EhFrameHdrChunk` takes it as an explicit parameter rather
    /// than this chunk resolving it itself.
    hdr_entries: Vec<(u64, u64)>,
}

impl EhFrameChunk {
    pub fn new(files: Vec<FileFrames>) -> Self {
        EhFrameChunk { files, leaders: Vec::new(), placement: Vec::new(), fde_end: 0, hdr_entries: Vec::new() }
    }

    /// Step 1: drop nothing (dead-FDE elimination is the GC pass's
    /// job, out of scope), uniquify CIEs by content equality, assign
    /// leader and FDE offsets, and build the sorted `.eh_frame_hdr`
    /// entry table (spec §4.11's last sentence: "sort the
    /// `.eh_frame_hdr` entry table by `init_addr`").
    pub fn construct(&mut self, _ctx: &Context) -> crate::error::Result<()> {
        self.leaders.clear();
        self.placement = vec![Placement::default(); self.files.len()];

        for (fi, file) in self.files.iter().enumerate() {
            for cie in &file.cies {
                let leader_idx = match self.leaders.iter().position(|l| l == &cie.bytes) {
                    Some(i) => i,
                    None => {
                        self.leaders.push(cie.bytes.clone());
                        self.leaders.len() - 1
                    }
                };
                self.placement[fi].cie_leader_offsets.push(leader_idx);
            }
        }

        let mut offset = 0usize;
        let mut leader_offsets = vec![0usize; self.leaders.len()];
        for (i, l) in self.leaders.iter().enumerate() {
            leader_offsets[i] = offset;
            offset += l.len();
        }

        let mut hdr_entries = Vec::new();
        for (fi, file) in self.files.iter().enumerate() {
            for fde in &file.fdes {
                let leader_idx = self.placement[fi].cie_leader_offsets[fde.cie_index];
                self.placement[fi].fde_offsets.push((offset, leader_offsets[leader_idx]));
                if let Some(first) = fde.relocs.first() {
                    hdr_entries.push((first.val, offset as u64));
                }
                offset += fde.bytes.len();
            }
        }
        hdr_entries.sort_by_key(|(init_addr, _)| *init_addr);
        self.hdr_entries = hdr_entries;
        self.fde_end = offset;
        Ok(())
    }

    /// The sorted `(init_addr, fde_offset)` table built by `construct`,
    /// handed to `EhFrameHdrChunk::new` once this section's own
    /// `sh_addr` is known.
    pub fn hdr_entries(&self) -> &[(u64, u64)] {
        &self.hdr_entries
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        meta.shdr.sh_size = (self.fde_end + 4) as u64;
    }

    /// Step 2: copy CIE leaders and FDEs, apply relocations, and patch
    /// the FDE's CIE-pointer field.
    pub fn copy_buf(&self, ctx: &Context, buf: &mut [u8]) -> crate::error::Result<()> {
        let mut offset = 0usize;
        let mut leader_offsets = vec![0usize; self.leaders.len()];
        for (i, l) in self.leaders.iter().enumerate() {
            leader_offsets[i] = offset;
            buf[offset..offset + l.len()].copy_from_slice(l);
            offset += l.len();
        }
        // Relocations against CIE leaders aren't tracked per-leader in
        // this simplified model (the first file owning each leader
        // applies its own, since content-identical CIEs carry
        // content-identical, position-independent relocations).
        for file in &self.files {
            for cie in &file.cies {
                if let Some(idx) = self.leaders.iter().position(|l| l == &cie.bytes) {
                    let base = leader_offsets[idx];
                    for rel in &cie.relocs {
                        ctx.profile.apply_reloc(buf, RelocApplication { r_type: rel.r_type, loc: base as u64 + rel.loc, val: rel.val })?;
                    }
                }
            }
        }

        for (fi, file) in self.files.iter().enumerate() {
            for (i, fde) in file.fdes.iter().enumerate() {
                let (fde_offset, cie_leader_offset) = self.placement[fi].fde_offsets[i];
                buf[fde_offset..fde_offset + fde.bytes.len()].copy_from_slice(&fde.bytes);
                let cie_pointer = (fde_offset + 4 - cie_leader_offset) as u32;
                buf[fde_offset + 4..fde_offset + 8].copy_from_slice(&cie_pointer.to_le_bytes());
                for rel in &fde.relocs {
                    ctx.profile.apply_reloc(buf, RelocApplication { r_type: rel.r_type, loc: fde_offset as u64 + rel.loc, val: rel.val })?;
                }
            }
        }
        buf[self.fde_end..self.fde_end + 4].copy_from_slice(&0u32.to_le_bytes());
        Ok(())
    }
}

const DW_EH_PE_UDATA4: u8 = 0x03;
const DW_EH_PE_PCREL: u8 = 0x10;
const DW_EH_PE_DATAREL: u8 = 0x30;
const DW_EH_PE_SDATA4: u8 = 0x0b;
const EH_FRAME_PTR_ENC: u8 = DW_EH_PE_PCREL | DW_EH_PE_SDATA4;
const FDE_COUNT_ENC: u8 = DW_EH_PE_UDATA4;
const TABLE_ENC: u8 = DW_EH_PE_DATAREL | DW_EH_PE_SDATA4;
const HEADER_LEN: usize = 12; // version+3 encoding bytes, eh_frame_ptr, fde_count

/// `.eh_frame_hdr`: version, the three DWARF pointer-encoding bytes,
/// a pcrel pointer back to `.eh_frame`, and the sorted binary-search
/// table `EhFrameChunk::construct` built (spec §2(10)/§4.11).
#[derive(Debug, Clone, Default)]
pub struct EhFrameHdrChunk {
    entries: Vec<(u64, u64)>,
    eh_frame_addr: u64,
}

impl EhFrameHdrChunk {
    /// `entries` is `EhFrameChunk::hdr_entries()`'s `(init_addr,
    /// fde_offset)` table; `eh_frame_addr` is `.eh_frame`'s final
    /// `sh_addr`, used both for the header's own pcrel pointer and to
    /// turn each entry's `fde_offset` into an absolute address.
    pub fn new(mut entries: Vec<(u64, u64)>, eh_frame_addr: u64) -> Self {
        entries.sort_by_key(|(init_addr, _)| *init_addr);
        EhFrameHdrChunk { entries, eh_frame_addr }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        meta.shdr.sh_size = (HEADER_LEN + self.entries.len() * 8) as u64;
        meta.shdr.sh_addralign = 4;
    }

    pub fn copy_buf(&self, own_addr: u64, buf: &mut [u8]) -> crate::error::Result<()> {
        buf[0] = 1; // version
        buf[1] = EH_FRAME_PTR_ENC;
        buf[2] = FDE_COUNT_ENC;
        buf[3] = TABLE_ENC;

        let ptr_field_addr = own_addr + 4;
        let eh_frame_ptr = (self.eh_frame_addr as i64 - ptr_field_addr as i64) as i32;
        buf[4..8].copy_from_slice(&eh_frame_ptr.to_le_bytes());
        buf[8..12].copy_from_slice(&(self.entries.len() as u32).to_le_bytes());

        let mut off = HEADER_LEN;
        for (init_addr, fde_offset) in &self.entries {
            let fde_addr = self.eh_frame_addr + fde_offset;
            let init_rel = (*init_addr as i64 - own_addr as i64) as i32;
            let fde_rel = (fde_addr as i64 - own_addr as i64) as i32;
            buf[off..off + 4].copy_from_slice(&init_rel.to_le_bytes());
            buf[off + 4..off + 8].copy_from_slice(&fde_rel.to_le_bytes());
            off += 8;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, LinkOptions};
    use crate::profile::TargetProfile;

    fn ctx() -> Context {
        Context::new(TargetProfile::x86_64(), LinkOptions::default())
    }

    #[test]
    fn identical_cies_across_files_are_uniquified() {
        let cie = CieRecord { bytes: vec![1, 2, 3, 4], relocs: vec![] };
        let files = vec![
            FileFrames { cies: vec![cie.clone()], fdes: vec![] },
            FileFrames { cies: vec![cie], fdes: vec![] },
        ];
        let mut chunk = EhFrameChunk::new(files);
        chunk.construct(&ctx()).unwrap();
        assert_eq!(chunk.leaders.len(), 1);
    }

    #[test]
    fn fde_cie_pointer_patched_to_byte_delta() {
        let cie = CieRecord { bytes: vec![0xAA; 16], relocs: vec![] };
        let fde = FdeRecord { bytes: vec![0u8; 16], relocs: vec![RelocApplication { r_type: 0, loc: 8, val: 0x4000 }], cie_index: 0 };
        let files = vec![FileFrames { cies: vec![cie], fdes: vec![fde] }];
        let mut chunk = EhFrameChunk::new(files);
        let ctx = ctx();
        chunk.construct(&ctx).unwrap();
        let mut meta = ChunkMeta::new(".eh_frame");
        chunk.update_shdr(&mut meta);
        let mut buf = vec![0u8; meta.shdr.sh_size as usize];
        chunk.copy_buf(&ctx, &mut buf).unwrap();
        let cie_ptr = u32::from_le_bytes(buf[20..24].try_into().unwrap());
        assert_eq!(cie_ptr, 16 + 4);
    }

    #[test]
    fn construct_populates_hdr_entries_sorted_by_init_addr() {
        let cie = CieRecord { bytes: vec![0xAA; 16], relocs: vec![] };
        let fde_a = FdeRecord { bytes: vec![0u8; 16], relocs: vec![RelocApplication { r_type: 0, loc: 8, val: 0x5000 }], cie_index: 0 };
        let fde_b = FdeRecord { bytes: vec![0u8; 16], relocs: vec![RelocApplication { r_type: 0, loc: 8, val: 0x4000 }], cie_index: 0 };
        let files = vec![FileFrames { cies: vec![cie], fdes: vec![fde_a, fde_b] }];
        let mut chunk = EhFrameChunk::new(files);
        chunk.construct(&ctx()).unwrap();
        let entries = chunk.hdr_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].0 < entries[1].0);
        assert_eq!(entries[0].0, 0x4000);
    }

    #[test]
    fn eh_frame_hdr_serializes_version_and_sorted_table() {
        let cie = CieRecord { bytes: vec![0xAA; 16], relocs: vec![] };
        let fde = FdeRecord { bytes: vec![0u8; 16], relocs: vec![RelocApplication { r_type: 0, loc: 8, val: 0x4100 }], cie_index: 0 };
        let files = vec![FileFrames { cies: vec![cie], fdes: vec![fde] }];
        let mut eh_frame = EhFrameChunk::new(files);
        eh_frame.construct(&ctx()).unwrap();
        let eh_frame_addr = 0x2000u64;

        let entries = eh_frame.hdr_entries().to_vec();
        let mut hdr = EhFrameHdrChunk::new(entries, eh_frame_addr);
        let mut meta = ChunkMeta::new(".eh_frame_hdr");
        hdr.update_shdr(&mut meta);
        assert_eq!(meta.shdr.sh_size, (HEADER_LEN + 8) as u64);

        let own_addr = 0x3000u64;
        let mut buf = vec![0u8; meta.shdr.sh_size as usize];
        hdr.copy_buf(own_addr, &mut buf).unwrap();
        assert_eq!(buf[0], 1);
        assert_eq!(buf[1], EH_FRAME_PTR_ENC);
        assert_eq!(buf[2], FDE_COUNT_ENC);
        assert_eq!(buf[3], TABLE_ENC);
        let fde_count = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        assert_eq!(fde_count, 1);
        let init_rel = i32::from_le_bytes(buf[12..16].try_into().unwrap());
        assert_eq!(init_rel, (0x4100i64 - own_addr as i64) as i32);
    }
}
