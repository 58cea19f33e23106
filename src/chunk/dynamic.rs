//! `.dynamic` chunk (spec §4.10): assembles the ordered `DT_*` tag
//! sequence and wraps `elf::dynamic::DynamicEntries` for sizing/write.

use super::ChunkMeta;
use crate::container::Ctx;
use crate::elf::dynamic::*;

/// Every input `create_dynamic_section` (spec §4.10) needs to build
/// the exhaustive, ordered tag set. Each field is `None`/empty when
/// the corresponding feature is absent from this link.
#[derive(Debug, Clone, Default)]
pub struct DynamicSectionInputs {
    pub needed: Vec<u32>,
    pub runpath_or_rpath: Option<(bool, u32)>,
    pub soname: Option<u32>,
    pub auxiliary: Vec<u32>,
    pub filter: Vec<u32>,
    pub rel_or_rela: Option<(bool, u64, u64, u64)>,
    pub relr: Option<(u64, u64, u64)>,
    pub jmprel: Option<(u64, u64, u64)>,
    pub pltgot: Option<u64>,
    pub symtab: Option<u64>,
    pub strtab: Option<(u64, u64)>,
    pub init_array: Option<(u64, u64)>,
    pub fini_array: Option<(u64, u64)>,
    pub preinit_array: Option<(u64, u64)>,
    pub versym: Option<u64>,
    pub verneed: Option<(u64, u64)>,
    pub verdef: Option<(u64, u64)>,
    pub init: Option<u64>,
    pub fini: Option<u64>,
    pub hash: Option<u64>,
    pub gnu_hash: Option<u64>,
    pub textrel: bool,
    pub flags: Option<u64>,
    pub flags_1: Option<u64>,
    pub ppc64_glink: Option<u64>,
    pub debug_for_executable: bool,
    pub spare_null_count: usize,
}

/// Builds the exhaustive ordered tag sequence of spec §4.10.
pub fn create_dynamic_section(inputs: &DynamicSectionInputs) -> DynamicEntries {
    let mut entries = DynamicEntries::new(inputs.spare_null_count);

    for &off in &inputs.needed {
        entries.push(DT_NEEDED, off as u64);
    }
    if let Some((new_dtags, off)) = inputs.runpath_or_rpath {
        entries.push(if new_dtags { DT_RUNPATH } else { DT_RPATH }, off as u64);
    }
    if let Some(off) = inputs.soname {
        entries.push(DT_SONAME, off as u64);
    }
    for &off in &inputs.auxiliary {
        entries.push(DT_AUXILIARY, off as u64);
    }
    for &off in &inputs.filter {
        entries.push(DT_FILTER, off as u64);
    }
    if let Some((is_rela, addr, size, ent)) = inputs.rel_or_rela {
        if is_rela {
            entries.push(DT_RELA, addr);
            entries.push(DT_RELASZ, size);
            entries.push(DT_RELAENT, ent);
        } else {
            entries.push(DT_REL, addr);
            entries.push(DT_RELSZ, size);
            entries.push(DT_RELENT, ent);
        }
    }
    if let Some((addr, size, ent)) = inputs.relr {
        entries.push(DT_RELR, addr);
        entries.push(DT_RELRSZ, size);
        entries.push(DT_RELRENT, ent);
    }
    if let Some((addr, size, rel_kind)) = inputs.jmprel {
        entries.push(DT_JMPREL, addr);
        entries.push(DT_PLTRELSZ, size);
        entries.push(DT_PLTREL, rel_kind);
    }
    if let Some(addr) = inputs.pltgot {
        entries.push(DT_PLTGOT, addr);
    }
    if let Some(addr) = inputs.symtab {
        entries.push(DT_SYMTAB, addr);
        entries.push(DT_SYMENT, crate::elf::sym::SIZEOF_SYM64 as u64);
    }
    if let Some((addr, size)) = inputs.strtab {
        entries.push(DT_STRTAB, addr);
        entries.push(DT_STRSZ, size);
    }
    if let Some((addr, size)) = inputs.init_array {
        entries.push(DT_INIT_ARRAY, addr);
        entries.push(DT_INIT_ARRAYSZ, size);
    }
    if let Some((addr, size)) = inputs.preinit_array {
        entries.push(DT_PREINIT_ARRAY, addr);
        entries.push(DT_PREINIT_ARRAYSZ, size);
    }
    if let Some((addr, size)) = inputs.fini_array {
        entries.push(DT_FINI_ARRAY, addr);
        entries.push(DT_FINI_ARRAYSZ, size);
    }
    if let Some(addr) = inputs.versym {
        entries.push(DT_VERSYM, addr);
    }
    if let Some((addr, num)) = inputs.verneed {
        entries.push(DT_VERNEED, addr);
        entries.push(DT_VERNEEDNUM, num);
    }
    if let Some((addr, num)) = inputs.verdef {
        entries.push(DT_VERDEF, addr);
        entries.push(DT_VERDEFNUM, num);
    }
    if let Some(addr) = inputs.init {
        entries.push(DT_INIT, addr);
    }
    if let Some(addr) = inputs.fini {
        entries.push(DT_FINI, addr);
    }
    if let Some(addr) = inputs.hash {
        entries.push(DT_HASH, addr);
    }
    if let Some(addr) = inputs.gnu_hash {
        entries.push(DT_GNU_HASH, addr);
    }
    if inputs.textrel {
        entries.push(DT_TEXTREL, 0);
    }
    if let Some(flags) = inputs.flags {
        entries.push(DT_FLAGS, flags);
    }
    if let Some(flags_1) = inputs.flags_1 {
        entries.push(DT_FLAGS_1, flags_1);
    }
    if let Some(addr) = inputs.ppc64_glink {
        entries.push(DT_PPC64_GLINK, addr);
    }
    if inputs.debug_for_executable {
        entries.push(DT_DEBUG, 0);
    }
    entries
}

#[derive(Debug, Clone, Default)]
pub struct DynamicChunk {
    pub entries: DynamicEntries,
}

impl DynamicChunk {
    pub fn new(inputs: &DynamicSectionInputs) -> Self {
        DynamicChunk { entries: create_dynamic_section(inputs) }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        meta.shdr.sh_size = self.entries.byte_size(ctx) as u64;
        meta.shdr.sh_entsize = Dyn::size(ctx) as u64;
    }

    /// `copy_buf` recomputes the tag sequence and writes it, asserting
    /// the size is unchanged from `update_shdr` (spec §4.10).
    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        let expected = self.entries.byte_size(ctx);
        if buf.len() != expected {
            return Err(crate::error::Error::invariant(
                "dynamic_section",
                format!("tag sequence size changed between update_shdr ({expected}) and copy_buf ({})", buf.len()),
            ));
        }
        self.entries.write_to(buf, ctx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    #[test]
    fn order_places_needed_before_soname_before_strtab() {
        let inputs = DynamicSectionInputs {
            needed: vec![5, 9],
            soname: Some(20),
            strtab: Some((0x1000, 200)),
            ..Default::default()
        };
        let entries = create_dynamic_section(&inputs);
        let tags: Vec<u64> = entries.entries().iter().map(|e| e.d_tag).collect();
        let needed_pos = tags.iter().position(|&t| t == DT_NEEDED).unwrap();
        let soname_pos = tags.iter().position(|&t| t == DT_SONAME).unwrap();
        let strtab_pos = tags.iter().position(|&t| t == DT_STRTAB).unwrap();
        assert!(needed_pos < soname_pos);
        assert!(soname_pos < strtab_pos);
    }

    #[test]
    fn copy_buf_matches_update_shdr_size() {
        let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
        let inputs = DynamicSectionInputs { soname: Some(3), spare_null_count: 2, ..Default::default() };
        let mut chunk = DynamicChunk::new(&inputs);
        let mut meta = ChunkMeta::new(".dynamic");
        chunk.update_shdr(&mut meta, ctx);
        let mut buf = vec![0u8; meta.shdr.sh_size as usize];
        chunk.copy_buf(ctx, &mut buf).unwrap();
    }
}
