//! Section header table chunk (spec §4.1 component 1).

use super::ChunkMeta;
use crate::container::Ctx;
use crate::elf::section_header::Shdr;

#[derive(Debug, Clone, Default)]
pub struct ShdrTableChunk {
    pub entries: Vec<Shdr>,
}

impl ShdrTableChunk {
    pub fn new(entries: Vec<Shdr>) -> Self {
        ShdrTableChunk { entries }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        meta.shdr.sh_size = (self.entries.len() * Shdr::size(ctx)) as u64;
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        let entry = Shdr::size(ctx);
        for (i, s) in self.entries.iter().enumerate() {
            s.write_to(&mut buf[i * entry..(i + 1) * entry], ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    #[test]
    fn size_matches_entry_count_times_class_width() {
        let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
        let mut chunk = ShdrTableChunk::new(vec![Shdr::default(); 5]);
        let mut meta = ChunkMeta::new(String::new());
        chunk.update_shdr(&mut meta, ctx);
        assert_eq!(meta.shdr.sh_size, 5 * 64);
    }
}
