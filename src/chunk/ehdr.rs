//! The ELF file header chunk (spec §4.1 component 1, §6).

use super::ChunkMeta;
use crate::container::Ctx;
use crate::elf::header::Ehdr;

#[derive(Debug, Clone)]
pub struct EhdrChunk {
    pub ehdr: Ehdr,
}

impl EhdrChunk {
    pub fn new(ctx: Ctx, e_type: u16, e_machine: u16) -> Self {
        EhdrChunk { ehdr: Ehdr::new(ctx, e_type, e_machine) }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        meta.shdr.sh_size = Ehdr::size(ctx) as u64;
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        self.ehdr.write_to(buf, ctx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    #[test]
    fn update_shdr_sets_size_to_class_width() {
        let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
        let mut chunk = EhdrChunk::new(ctx, crate::elf::header::ET_EXEC, crate::elf::constants_header::EM_X86_64);
        let mut meta = ChunkMeta::new(String::new());
        chunk.update_shdr(&mut meta, ctx);
        assert_eq!(meta.shdr.sh_size, 64);
    }
}
