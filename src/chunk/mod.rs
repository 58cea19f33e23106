//! The chunk family: one tagged variant per output ELF section or
//! synthetic stream (spec §2's capability table, Design Notes §9).
//!
//! Design Notes §9 calls out the teacher's polymorphic-virtual-function
//! chunk hierarchy and recommends, for a closed and compile-time-known
//! chunk set, a tagged variant dispatched by match instead of dynamic
//! dispatch. `ChunkKind` is that tagged variant; `Chunk` wraps it with
//! the identity fields every chunk carries regardless of kind.

pub mod compressed;
pub mod dynamic;
pub mod ehdr;
pub mod eh_frame;
pub mod gdb_index;
pub mod got;
pub mod hash;
pub mod interp;
pub mod mergeable;
pub mod notes;
pub mod output_section;
pub mod phdr;
pub mod reloc;
pub mod relro_padding;
pub mod shdr;
pub mod strtab;
pub mod symtab;
pub mod version;

use crate::context::Context;
use crate::elf::section_header::Shdr;

/// Fields every chunk carries (spec §3's **Chunk**), regardless of kind.
#[derive(Debug, Clone, Default)]
pub struct ChunkMeta {
    pub name: String,
    /// 1-based section index; 0 for chunks absent from the section
    /// header table (program headers, the RELRO-padding marker).
    pub shndx: u32,
    pub shdr: Shdr,

    /// Parallel-fill bookkeeping for chunks that contribute to
    /// `.symtab`/`.strtab` (spec §4.4): the byte subrange of `.strtab`
    /// this chunk's local-symbol names occupy, and the symbol-index
    /// subrange of `.symtab` its local symbols occupy.
    pub strtab_offset: usize,
    pub strtab_size: usize,
    pub local_symtab_idx: u32,
    pub num_local_symtab: u32,

    /// RELR candidate byte offsets collected by `construct_relr`
    /// (spec §4.7).
    pub relr: Vec<u64>,
}

impl ChunkMeta {
    pub fn new(name: impl Into<String>) -> Self {
        ChunkMeta { name: name.into(), ..Default::default() }
    }
}

/// One output ELF section or program-header-table element.
#[derive(Debug)]
pub struct Chunk {
    pub meta: ChunkMeta,
    pub kind: ChunkKind,
}

/// The closed set of chunk kinds this core knows how to build
/// (spec §2, component list).
#[derive(Debug)]
pub enum ChunkKind {
    Ehdr(ehdr::EhdrChunk),
    Phdr(phdr::PhdrChunk),
    ShdrTable(shdr::ShdrTableChunk),
    Strtab(strtab::StrtabChunk),
    Symtab(symtab::SymtabChunk),
    Hash(hash::HashChunk),
    Got(got::GotChunk),
    Reloc(reloc::RelocChunk),
    OutputSection(output_section::OutputSectionChunk),
    Mergeable(mergeable::MergeableChunk),
    Dynamic(dynamic::DynamicChunk),
    EhFrame(eh_frame::EhFrameChunk),
    EhFrameHdr(eh_frame::EhFrameHdrChunk),
    GdbIndex(gdb_index::GdbIndexChunk),
    Version(version::VersionChunk),
    Compressed(compressed::CompressedChunk),
    Notes(notes::NotesChunk),
    RelroPadding(relro_padding::RelroPaddingChunk),
    Interp(interp::InterpChunk),
}

impl Chunk {
    /// Step 1 of the protocol (spec §4.1): optional, builds internal
    /// auxiliary structures. Must not depend on `sh_addr`.
    pub fn construct(&mut self, ctx: &Context) -> crate::error::Result<()> {
        match &mut self.kind {
            ChunkKind::EhFrame(c) => c.construct(ctx),
            ChunkKind::GdbIndex(c) => c.construct(ctx),
            ChunkKind::Version(c) => c.construct(ctx),
            ChunkKind::Mergeable(c) => c.construct(ctx),
            _ => Ok(()),
        }
    }

    /// Step 2: sets `sh_size`/`sh_link`/`sh_info`/`sh_entsize`/
    /// `sh_addralign`. Pure function of upstream-frozen state.
    pub fn update_shdr(&mut self, ctx: &Context) -> crate::error::Result<()> {
        let ctx_word = ctx.ctx();
        match &mut self.kind {
            ChunkKind::Ehdr(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::Phdr(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::ShdrTable(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::Strtab(c) => c.update_shdr(&mut self.meta),
            ChunkKind::Symtab(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::Hash(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::Got(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::Reloc(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::OutputSection(c) => c.update_shdr(&mut self.meta),
            ChunkKind::Mergeable(c) => c.update_shdr(&mut self.meta),
            ChunkKind::Dynamic(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::EhFrame(c) => c.update_shdr(&mut self.meta),
            ChunkKind::EhFrameHdr(c) => c.update_shdr(&mut self.meta),
            ChunkKind::GdbIndex(c) => c.update_shdr(&mut self.meta),
            ChunkKind::Version(c) => c.update_shdr(&mut self.meta),
            ChunkKind::Compressed(c) => c.update_shdr(&mut self.meta),
            ChunkKind::Notes(c) => c.update_shdr(&mut self.meta, ctx_word),
            ChunkKind::RelroPadding(c) => c.update_shdr(&mut self.meta),
            ChunkKind::Interp(c) => c.update_shdr(&mut self.meta),
        }
        Ok(())
    }

    /// Step 4: writes bytes into `out[sh_offset..sh_offset+sh_size]`.
    pub fn copy_buf(&self, ctx: &Context, out: &mut [u8]) -> crate::error::Result<()> {
        let off = self.meta.shdr.sh_offset as usize;
        let size = self.meta.shdr.sh_size as usize;
        if size == 0 {
            return Ok(());
        }
        let buf = &mut out[off..off + size];
        let ctx_word = ctx.ctx();
        match &self.kind {
            ChunkKind::Ehdr(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::Phdr(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::ShdrTable(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::Strtab(c) => c.copy_buf(buf),
            ChunkKind::Symtab(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::Hash(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::Got(c) => c.copy_buf(ctx, buf),
            ChunkKind::Reloc(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::OutputSection(c) => c.copy_buf(buf),
            ChunkKind::Mergeable(c) => c.copy_buf(buf),
            ChunkKind::Dynamic(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::EhFrame(c) => c.copy_buf(ctx, buf),
            ChunkKind::EhFrameHdr(c) => c.copy_buf(self.meta.shdr.sh_addr, buf),
            ChunkKind::GdbIndex(c) => c.copy_buf(buf),
            ChunkKind::Version(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::Compressed(c) => c.copy_buf(buf),
            ChunkKind::Notes(c) => c.copy_buf(ctx_word, buf),
            ChunkKind::RelroPadding(_) => Ok(()),
            ChunkKind::Interp(c) => c.copy_buf(buf),
        }
    }
}
