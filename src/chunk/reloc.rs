//! `.rel.dyn`/`.rel.plt`/`.relr.dyn`/per-section `.rela.<name>` chunks
//! (spec §4.7).

use super::ChunkMeta;
use crate::container::Ctx;
use crate::elf::rela::{Rel, Rela};

/// Sort rank (spec §4.7): `R_RELATIVE` first, `R_IRELATIVE` last,
/// everything else in between, then by symbol index, then by address.
fn rank(r_type: u32, r_relative: u32, r_irelative: u32) -> u8 {
    if r_type == r_relative {
        0
    } else if r_type == r_irelative {
        2
    } else {
        1
    }
}

/// One relocation plus the type-rank inputs needed to sort it; kept
/// separate from `Rela` so the sort can be profile-parameterized
/// without threading `TargetProfile` through `elf::rela`.
#[derive(Debug, Clone, Copy)]
pub struct RelocEntry {
    pub r_offset: u64,
    pub r_sym: u32,
    pub r_type: u32,
    pub r_addend: i64,
}

/// Sorts relocations per spec §4.7's rationale: `R_IRELATIVE` last so
/// `__rel_iplt_start/end` spans only ifunc relocations; groups
/// same-symbol relocations together; keeps `R_RELATIVE` contiguous so
/// it can be optionally packed with RELR.
pub fn sort_relocations(entries: &mut [RelocEntry], r_relative: u32, r_irelative: u32) {
    crate::parallel::parallel_sort(entries, |a, b| {
        let ra = rank(a.r_type, r_relative, r_irelative);
        let rb = rank(b.r_type, r_relative, r_irelative);
        ra.cmp(&rb).then(a.r_sym.cmp(&b.r_sym)).then(a.r_offset.cmp(&b.r_offset))
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocWireFormat {
    Rel,
    Rela,
}

#[derive(Debug, Clone, Default)]
pub struct RelocChunk {
    pub entries: Vec<RelocEntry>,
    pub format: Option<RelocWireFormat>,
    pub dynsym_shndx: u32,
}

impl RelocChunk {
    pub fn new(format: RelocWireFormat, dynsym_shndx: u32) -> Self {
        RelocChunk { entries: Vec::new(), format: Some(format), dynsym_shndx }
    }

    fn entsize(&self, ctx: Ctx) -> usize {
        match self.format {
            Some(RelocWireFormat::Rel) => Rel::size(ctx),
            Some(RelocWireFormat::Rela) => Rela::size(ctx),
            None => 0,
        }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        let entsize = self.entsize(ctx);
        meta.shdr.sh_size = (self.entries.len() * entsize) as u64;
        meta.shdr.sh_link = self.dynsym_shndx;
        meta.shdr.sh_entsize = entsize as u64;
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        let entsize = self.entsize(ctx);
        for (i, e) in self.entries.iter().enumerate() {
            let slot = &mut buf[i * entsize..(i + 1) * entsize];
            match self.format {
                Some(RelocWireFormat::Rel) => {
                    Rel { r_offset: e.r_offset, r_sym: e.r_sym, r_type: e.r_type }.write_to(slot, ctx)?;
                }
                Some(RelocWireFormat::Rela) => {
                    Rela { r_offset: e.r_offset, r_sym: e.r_sym, r_type: e.r_type, r_addend: e.r_addend }.write_to(slot, ctx)?;
                }
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irelative_sorts_last_and_relative_sorts_first() {
        const R_GLOB_DAT: u32 = 6;
        const R_RELATIVE: u32 = 8;
        const R_IRELATIVE: u32 = 37;
        let mut entries = vec![
            RelocEntry { r_offset: 10, r_sym: 1, r_type: R_IRELATIVE, r_addend: 0 },
            RelocEntry { r_offset: 20, r_sym: 2, r_type: R_GLOB_DAT, r_addend: 0 },
            RelocEntry { r_offset: 5, r_sym: 0, r_type: R_RELATIVE, r_addend: 0 },
        ];
        sort_relocations(&mut entries, R_RELATIVE, R_IRELATIVE);
        assert_eq!(entries[0].r_type, R_RELATIVE);
        assert_eq!(entries[2].r_type, R_IRELATIVE);
    }

    #[test]
    fn update_shdr_tracks_entsize_and_link() {
        let ctx = Ctx::new(crate::container::Container::Big, scroll::Endian::Little);
        let mut chunk = RelocChunk::new(RelocWireFormat::Rela, 4);
        chunk.entries.push(RelocEntry { r_offset: 0, r_sym: 0, r_type: 0, r_addend: 0 });
        let mut meta = ChunkMeta::new(".rela.dyn");
        chunk.update_shdr(&mut meta, ctx);
        assert_eq!(meta.shdr.sh_link, 4);
        assert_eq!(meta.shdr.sh_entsize, 24);
    }
}
