//! `.strtab`/`.shstrtab`/`.dynstr` chunk wrapper (spec §4.3).
//!
//! All three varieties share one content-addressed builder
//! (`elf::strtab::StrtabBuilder`); this wrapper just adapts it to the
//! chunk protocol. `.strtab`'s per-chunk subranges (spec §4.3: "per-file
//! and per-chunk subranges are preassigned") are tracked by callers via
//! `ChunkMeta::strtab_offset`/`strtab_size`, not by this chunk itself.

use super::ChunkMeta;
use crate::elf::strtab::StrtabBuilder;

#[derive(Debug, Clone, Default)]
pub struct StrtabChunk {
    pub builder: StrtabBuilder,
}

impl StrtabChunk {
    pub fn new() -> Self {
        StrtabChunk { builder: StrtabBuilder::new() }
    }

    pub fn intern(&mut self, s: &str) -> u32 {
        self.builder.intern(s)
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        meta.shdr.sh_size = self.builder.len() as u64;
    }

    pub fn copy_buf(&self, buf: &mut [u8]) -> crate::error::Result<()> {
        buf.copy_from_slice(self.builder.data());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interned_strings_land_at_reported_size() {
        let mut chunk = StrtabChunk::new();
        chunk.intern("foo");
        chunk.intern("bar");
        let mut meta = ChunkMeta::new(".strtab");
        chunk.update_shdr(&mut meta);
        let mut buf = vec![0u8; meta.shdr.sh_size as usize];
        chunk.copy_buf(&mut buf).unwrap();
        assert_eq!(buf.len(), chunk.builder.data().len());
    }
}
