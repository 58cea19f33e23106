//! `DT_*`/`DF_*`/`DF_1_*` constants and the unified `Dyn` record.
//!
//! Named `dynamic` rather than the gABI's own `d_tag` mnemonic because
//! `dyn` is a reserved keyword. Carries the entry-order builder for
//! `chunk::dynamic` (spec §4.10): that chunk calls
//! [`DynamicEntries::push`] in the exhaustive tag order the spec
//! requires and relies on [`DynamicEntries::byte_size`] being stable
//! between `update_shdr` and `copy_buf`.

use crate::container::Ctx;
use scroll::Pwrite;

pub const DT_NULL: u64 = 0;
pub const DT_NEEDED: u64 = 1;
pub const DT_PLTRELSZ: u64 = 2;
pub const DT_PLTGOT: u64 = 3;
pub const DT_HASH: u64 = 4;
pub const DT_STRTAB: u64 = 5;
pub const DT_SYMTAB: u64 = 6;
pub const DT_RELA: u64 = 7;
pub const DT_RELASZ: u64 = 8;
pub const DT_RELAENT: u64 = 9;
pub const DT_STRSZ: u64 = 10;
pub const DT_SYMENT: u64 = 11;
pub const DT_INIT: u64 = 12;
pub const DT_FINI: u64 = 13;
pub const DT_SONAME: u64 = 14;
pub const DT_RPATH: u64 = 15;
pub const DT_SYMBOLIC: u64 = 16;
pub const DT_REL: u64 = 17;
pub const DT_RELSZ: u64 = 18;
pub const DT_RELENT: u64 = 19;
pub const DT_PLTREL: u64 = 20;
pub const DT_DEBUG: u64 = 21;
pub const DT_TEXTREL: u64 = 22;
pub const DT_JMPREL: u64 = 23;
pub const DT_BIND_NOW: u64 = 24;
pub const DT_INIT_ARRAY: u64 = 25;
pub const DT_FINI_ARRAY: u64 = 26;
pub const DT_INIT_ARRAYSZ: u64 = 27;
pub const DT_FINI_ARRAYSZ: u64 = 28;
pub const DT_RUNPATH: u64 = 29;
pub const DT_FLAGS: u64 = 30;
pub const DT_PREINIT_ARRAY: u64 = 32;
pub const DT_PREINIT_ARRAYSZ: u64 = 33;
pub const DT_NUM: u64 = 34;
pub const DT_LOOS: u64 = 0x6000000d;
pub const DT_HIOS: u64 = 0x6ffff000;
pub const DT_LOPROC: u64 = 0x70000000;
pub const DT_HIPROC: u64 = 0x7fffffff;
pub const DT_VERSYM: u64 = 0x6ffffff0;
pub const DT_RELACOUNT: u64 = 0x6ffffff9;
pub const DT_RELCOUNT: u64 = 0x6ffffffa;
pub const DT_GNU_HASH: u64 = 0x6ffffef5;
pub const DT_VERDEF: u64 = 0x6ffffffc;
pub const DT_VERDEFNUM: u64 = 0x6ffffffd;
pub const DT_VERNEED: u64 = 0x6ffffffe;
pub const DT_VERNEEDNUM: u64 = 0x6fffffff;
pub const DT_FLAGS_1: u64 = 0x6ffffffb;
pub const DT_AUXILIARY: u64 = 0x7ffffffd;
pub const DT_FILTER: u64 = 0x7fffffff;
/// GNU/Linux RELR packed relocations (spec §4.7/§8).
pub const DT_RELR: u64 = 0x6fffffba;
pub const DT_RELRSZ: u64 = 0x6fffffb9;
pub const DT_RELRENT: u64 = 0x6fffffbb;
/// PowerPC64 `.glink` entry point, a target-specific tag (spec §4.10).
pub const DT_PPC64_GLINK: u64 = 0x70000000;

#[inline]
pub fn tag_to_str(tag: u64) -> &'static str {
    match tag {
        DT_NULL => "DT_NULL",
        DT_NEEDED => "DT_NEEDED",
        DT_PLTRELSZ => "DT_PLTRELSZ",
        DT_PLTGOT => "DT_PLTGOT",
        DT_HASH => "DT_HASH",
        DT_STRTAB => "DT_STRTAB",
        DT_SYMTAB => "DT_SYMTAB",
        DT_RELA => "DT_RELA",
        DT_RELASZ => "DT_RELASZ",
        DT_RELAENT => "DT_RELAENT",
        DT_STRSZ => "DT_STRSZ",
        DT_SYMENT => "DT_SYMENT",
        DT_INIT => "DT_INIT",
        DT_FINI => "DT_FINI",
        DT_SONAME => "DT_SONAME",
        DT_RPATH => "DT_RPATH",
        DT_SYMBOLIC => "DT_SYMBOLIC",
        DT_REL => "DT_REL",
        DT_RELSZ => "DT_RELSZ",
        DT_RELENT => "DT_RELENT",
        DT_PLTREL => "DT_PLTREL",
        DT_DEBUG => "DT_DEBUG",
        DT_TEXTREL => "DT_TEXTREL",
        DT_JMPREL => "DT_JMPREL",
        DT_BIND_NOW => "DT_BIND_NOW",
        DT_INIT_ARRAY => "DT_INIT_ARRAY",
        DT_FINI_ARRAY => "DT_FINI_ARRAY",
        DT_INIT_ARRAYSZ => "DT_INIT_ARRAYSZ",
        DT_FINI_ARRAYSZ => "DT_FINI_ARRAYSZ",
        DT_RUNPATH => "DT_RUNPATH",
        DT_FLAGS => "DT_FLAGS",
        DT_PREINIT_ARRAY => "DT_PREINIT_ARRAY",
        DT_PREINIT_ARRAYSZ => "DT_PREINIT_ARRAYSZ",
        DT_NUM => "DT_NUM",
        DT_LOOS => "DT_LOOS",
        DT_HIOS => "DT_HIOS",
        DT_LOPROC => "DT_LOPROC",
        DT_HIPROC => "DT_HIPROC",
        DT_VERSYM => "DT_VERSYM",
        DT_RELACOUNT => "DT_RELACOUNT",
        DT_RELCOUNT => "DT_RELCOUNT",
        DT_GNU_HASH => "DT_GNU_HASH",
        DT_VERDEF => "DT_VERDEF",
        DT_VERDEFNUM => "DT_VERDEFNUM",
        DT_VERNEED => "DT_VERNEED",
        DT_VERNEEDNUM => "DT_VERNEEDNUM",
        DT_FLAGS_1 => "DT_FLAGS_1",
        DT_AUXILIARY => "DT_AUXILIARY",
        DT_FILTER => "DT_FILTER",
        DT_RELR => "DT_RELR",
        DT_RELRSZ => "DT_RELRSZ",
        DT_RELRENT => "DT_RELRENT",
        _ => "UNKNOWN_TAG",
    }
}

pub const DF_ORIGIN: u64 = 0x0000_0001;
pub const DF_SYMBOLIC: u64 = 0x0000_0002;
pub const DF_TEXTREL: u64 = 0x0000_0004;
pub const DF_BIND_NOW: u64 = 0x0000_0008;
pub const DF_STATIC_TLS: u64 = 0x0000_0010;

pub const DF_1_NOW: u64 = 0x0000_0001;
pub const DF_1_GLOBAL: u64 = 0x0000_0002;
pub const DF_1_GROUP: u64 = 0x0000_0004;
pub const DF_1_NODELETE: u64 = 0x0000_0008;
pub const DF_1_LOADFLTR: u64 = 0x0000_0010;
pub const DF_1_INITFIRST: u64 = 0x0000_0020;
pub const DF_1_NOOPEN: u64 = 0x0000_0040;
pub const DF_1_ORIGIN: u64 = 0x0000_0080;
pub const DF_1_DIRECT: u64 = 0x0000_0100;
pub const DF_1_TRANS: u64 = 0x0000_0200;
pub const DF_1_INTERPOSE: u64 = 0x0000_0400;
pub const DF_1_NODEFLIB: u64 = 0x0000_0800;
pub const DF_1_NODUMP: u64 = 0x0000_1000;
pub const DF_1_CONFALT: u64 = 0x0000_2000;
pub const DF_1_ENDFILTEE: u64 = 0x0000_4000;
pub const DF_1_DISPRELDNE: u64 = 0x0000_8000;
pub const DF_1_DISPRELPND: u64 = 0x0001_0000;
pub const DF_1_NODIRECT: u64 = 0x0002_0000;
pub const DF_1_IGNMULDEF: u64 = 0x0004_0000;
pub const DF_1_NOKSYMS: u64 = 0x0008_0000;
pub const DF_1_NOHDR: u64 = 0x0010_0000;
pub const DF_1_EDITED: u64 = 0x0020_0000;
pub const DF_1_NORELOC: u64 = 0x0040_0000;
pub const DF_1_SYMINTPOSE: u64 = 0x0080_0000;
pub const DF_1_GLOBAUDIT: u64 = 0x0100_0000;
pub const DF_1_SINGLETON: u64 = 0x0200_0000;

pub const SIZEOF_DYN32: usize = 8;
pub const SIZEOF_DYN64: usize = 16;

/// One `(d_tag, d_un)` entry. `d_un` is a union of `d_val`/`d_ptr` on
/// disk; both are plain integers here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dyn {
    pub d_tag: u64,
    pub d_un: u64,
}

impl Dyn {
    pub fn size(ctx: Ctx) -> usize {
        if ctx.is_64() { SIZEOF_DYN64 } else { SIZEOF_DYN32 }
    }

    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let mut off = 0usize;
        if ctx.is_64() {
            buf.gwrite_with(self.d_tag, &mut off, ctx.le)?;
            buf.gwrite_with(self.d_un, &mut off, ctx.le)?;
        } else {
            buf.gwrite_with(self.d_tag as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.d_un as u32, &mut off, ctx.le)?;
        }
        Ok(off)
    }
}

/// Builds the ordered `(tag, value)` sequence of spec §4.10 and
/// serializes it, recording `byte_size()` for the
/// `update_shdr`/`copy_buf` size-stability assertion.
#[derive(Debug, Default, Clone)]
pub struct DynamicEntries {
    entries: Vec<Dyn>,
    spare_null_count: usize,
}

impl DynamicEntries {
    pub fn new(spare_null_count: usize) -> Self {
        DynamicEntries { entries: Vec::new(), spare_null_count }
    }

    pub fn push(&mut self, tag: u64, value: u64) {
        self.entries.push(Dyn { d_tag: tag, d_un: value });
    }

    pub fn entries(&self) -> &[Dyn] {
        &self.entries
    }

    /// Total entry count including the terminating and spare `DT_NULL`s.
    pub fn entry_count(&self) -> usize {
        self.entries.len() + 1 + self.spare_null_count
    }

    pub fn byte_size(&self, ctx: Ctx) -> usize {
        self.entry_count() * Dyn::size(ctx)
    }

    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let entsize = Dyn::size(ctx);
        let mut off = 0usize;
        for d in &self.entries {
            d.write_to(&mut buf[off..off + entsize], ctx)?;
            off += entsize;
        }
        for _ in 0..(1 + self.spare_null_count) {
            Dyn::default().write_to(&mut buf[off..off + entsize], ctx)?;
            off += entsize;
        }
        Ok(off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use scroll::Endian;

    #[test]
    fn byte_size_matches_write_to_output() {
        let ctx = Ctx::new(Container::Big, Endian::Little);
        let mut entries = DynamicEntries::new(2);
        entries.push(DT_NEEDED, 4);
        entries.push(DT_SYMTAB, 0x1000);
        entries.push(DT_NULL, 0);
        let mut buf = vec![0u8; entries.byte_size(ctx)];
        let written = entries.write_to(&mut buf, ctx).unwrap();
        assert_eq!(written, entries.byte_size(ctx));
    }

    #[test]
    fn spare_nulls_padded() {
        let ctx = Ctx::new(Container::Little, Endian::Little);
        let entries = DynamicEntries::new(3);
        assert_eq!(entries.entry_count(), 4);
        assert_eq!(entries.byte_size(ctx), 4 * SIZEOF_DYN32);
    }
}
