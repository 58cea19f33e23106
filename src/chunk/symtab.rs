//! `.symtab`/`.dynsym` chunk (spec §4.4).
//!
//! Layout order for `.symtab`: NUL, section symbols, linker-synthesized
//! locals, per-file locals, per-file globals (objects), per-file
//! globals (DSOs). `.dynsym` uses the stable sort
//! `symbol::SymbolTable::dynsym_order` and additionally needs
//! `sh_info` set to the first non-local index (spec §4.4).

use super::ChunkMeta;
use crate::container::Ctx;
use crate::elf::sym::Sym;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymtabKind {
    Symtab,
    Dynsym,
}

#[derive(Debug, Clone)]
pub struct SymtabChunk {
    pub kind: SymtabKind,
    /// Final, already-ordered symbol records (NUL entry included at
    /// index 0).
    pub entries: Vec<Sym>,
    /// Index of the first non-local symbol (`sh_info`, spec §4.4).
    pub first_global: u32,
    pub strtab_shndx: u32,
}

impl SymtabChunk {
    pub fn new(kind: SymtabKind, strtab_shndx: u32) -> Self {
        SymtabChunk { kind, entries: vec![Sym::default()], first_global: 1, strtab_shndx }
    }

    pub fn push(&mut self, sym: Sym) {
        self.entries.push(sym);
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        meta.shdr.sh_size = (self.entries.len() * Sym::size(ctx)) as u64;
        meta.shdr.sh_link = self.strtab_shndx;
        meta.shdr.sh_info = self.first_global;
        meta.shdr.sh_entsize = Sym::size(ctx) as u64;
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        let entry = Sym::size(ctx);
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
    fn nul_entry_is_always_present() {
        let chunk = SymtabChunk::new(SymtabKind::Symtab, 3);
        assert_eq!(chunk.entries.len(), 1);
        assert_eq!(chunk.entries[0], Sym::default());
    }

    #[test]
    fn update_shdr_sets_link_and_info_and_entsize() {
        let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
        let mut chunk = SymtabChunk::new(SymtabKind::Dynsym, 7);
        chunk.push(Sym { st_name: 1, ..Default::default() });
        chunk.first_global = 1;
        let mut meta = ChunkMeta::new(".dynsym");
        chunk.update_shdr(&mut meta, ctx);
        assert_eq!(meta.shdr.sh_link, 7);
        assert_eq!(meta.shdr.sh_info, 1);
        assert_eq!(meta.shdr.sh_entsize, 24);
        assert_eq!(meta.shdr.sh_size, 2 * 24);
    }
}
