//! RELRO-padding marker chunk (SPEC_FULL §C, grounded on mold's
//! `RelroPaddingSection`): a zero-sized, zero-content chunk that exists
//! only so `PT_GNU_RELRO`'s upper bound can be rounded up to a page
//! boundary without extending any real section's `sh_size`.

use super::ChunkMeta;

#[derive(Debug, Clone, Copy, Default)]
pub struct RelroPaddingChunk {
    pub padding_size: usize,
}

impl RelroPaddingChunk {
    pub fn new(padding_size: usize) -> Self {
        RelroPaddingChunk { padding_size }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        meta.shdr.sh_size = self.padding_size as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_shdr_reports_padding_as_section_size() {
        let mut chunk = RelroPaddingChunk::new(0x1000);
        let mut meta = ChunkMeta::new(".relro_padding");
        chunk.update_shdr(&mut meta);
        assert_eq!(meta.shdr.sh_size, 0x1000);
    }
}
