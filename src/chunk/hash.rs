//! `.hash`/`.gnu.hash` chunk (spec §4.5), dispatching on
//! `context::HashStyle`.

use super::ChunkMeta;
use crate::container::Ctx;
use crate::context::HashStyle;
use crate::elf::gnu_hash::GnuHashTable;
use crate::elf::sysv_hash::SysvHashTable;

#[derive(Debug, Clone)]
pub enum HashChunk {
    Sysv(SysvHashTable),
    Gnu(GnuHashTable),
}

impl HashChunk {
    /// `names` is every `.dynsym` entry (including the reserved
    /// undefined slot) in final order; `exported_names`/`symoffset`
    /// describe only the exported suffix `.gnu.hash` indexes.
    pub fn build(style: HashStyle, names: &[&str], exported_names: &[&str], symoffset: u32, word_bits: u32) -> Vec<Self> {
        let mut chunks = Vec::new();
        if matches!(style, HashStyle::Sysv | HashStyle::Both) {
            chunks.push(HashChunk::Sysv(SysvHashTable::build(names)));
        }
        if matches!(style, HashStyle::Gnu | HashStyle::Both) {
            chunks.push(HashChunk::Gnu(GnuHashTable::build(exported_names, symoffset, word_bits)));
        }
        chunks
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        meta.shdr.sh_size = match self {
            HashChunk::Sysv(t) => t.byte_size() as u64,
            HashChunk::Gnu(t) => t.byte_size(ctx) as u64,
        };
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        match self {
            HashChunk::Sysv(t) => {
                t.write_to(buf, ctx)?;
            }
            HashChunk::Gnu(t) => {
                t.write_to(buf, ctx)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    #[test]
    fn both_style_builds_two_chunks() {
        let names = ["", "a", "b"];
        let chunks = HashChunk::build(HashStyle::Both, &names, &["a", "b"], 1, 64);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn gnu_chunk_update_shdr_matches_write_to() {
        let mut chunk = HashChunk::Gnu(crate::elf::gnu_hash::GnuHashTable::build(&["a", "b"], 1, 64));
        let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
        let mut meta = ChunkMeta::new(".gnu.hash");
        chunk.update_shdr(&mut meta, ctx);
        let mut buf = vec![0u8; meta.shdr.sh_size as usize];
        chunk.copy_buf(ctx, &mut buf).unwrap();
    }
}
