//! Section header constants (`SHN_*`/`SHT_*`/`SHF_*`) and the unified
//! `Shdr` record (spec §3, "Chunk" essential attributes; spec §6).

use bitflags::bitflags;
use crate::container::Ctx;
use scroll::Pwrite;

/// Undefined section.
pub const SHN_UNDEF: u32 = 0;
/// Start of reserved indices.
pub const SHN_LORESERVE: u32 = 0xff00;
/// Start of processor-specific.
pub const SHN_LOPROC: u32 = 0xff00;
/// Order section before all others (Solaris).
pub const SHN_BEFORE: u32 = 0xff00;
/// Order section after all others (Solaris).
pub const SHN_AFTER: u32 = 0xff01;
/// End of processor-specific.
pub const SHN_HIPROC: u32 = 0xff1f;
/// Start of OS-specific.
pub const SHN_LOOS: u32 = 0xff20;
/// End of OS-specific.
pub const SHN_HIOS: u32 = 0xff3f;
/// Associated symbol is absolute.
pub const SHN_ABS: u32 = 0xfff1;
/// Associated symbol is common.
pub const SHN_COMMON: u32 = 0xfff2;
/// Index is in extra table.
pub const SHN_XINDEX: u32 = 0xffff;
/// End of reserved indices.
pub const SHN_HIRESERVE: u32 = 0xffff;

// === Legal values for sh_type (section type). ===
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_HASH: u32 = 5;
pub const SHT_DYNAMIC: u32 = 6;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
pub const SHT_SHLIB: u32 = 10;
pub const SHT_DYNSYM: u32 = 11;
pub const SHT_INIT_ARRAY: u32 = 14;
pub const SHT_FINI_ARRAY: u32 = 15;
pub const SHT_PREINIT_ARRAY: u32 = 16;
pub const SHT_GROUP: u32 = 17;
pub const SHT_SYMTAB_SHNDX: u32 = 18;
pub const SHT_NUM: u32 = 19;
pub const SHT_LOOS: u32 = 0x60000000;
pub const SHT_GNU_ATTRIBUTES: u32 = 0x6ffffff5;
pub const SHT_GNU_HASH: u32 = 0x6ffffff6;
pub const SHT_GNU_LIBLIST: u32 = 0x6ffffff7;
pub const SHT_CHECKSUM: u32 = 0x6ffffff8;
pub const SHT_LOSUNW: u32 = 0x6ffffffa;
pub const SHT_SUNW_MOVE: u32 = 0x6ffffffa;
pub const SHT_SUNW_COMDAT: u32 = 0x6ffffffb;
pub const SHT_SUNW_SYMINFO: u32 = 0x6ffffffc;
pub const SHT_GNU_VERDEF: u32 = 0x6ffffffd;
pub const SHT_GNU_VERNEED: u32 = 0x6ffffffe;
pub const SHT_GNU_VERSYM: u32 = 0x6fffffff;
pub const SHT_HISUNW: u32 = 0x6fffffff;
pub const SHT_HIOS: u32 = 0x6fffffff;
pub const SHT_LOPROC: u32 = 0x70000000;
pub const SHT_HIPROC: u32 = 0x7fffffff;
pub const SHT_LOUSER: u32 = 0x80000000;
pub const SHT_HIUSER: u32 = 0x8fffffff;

bitflags! {
    /// `sh_flags` (section flags). A `bitflags` type, per the
    /// `novafacing-elf` pack member's convention for ELF bit sets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ShFlags: u64 {
        const WRITE = 1 << 0;
        const ALLOC = 1 << 1;
        const EXECINSTR = 1 << 2;
        const MERGE = 1 << 4;
        const STRINGS = 1 << 5;
        const INFO_LINK = 1 << 6;
        const LINK_ORDER = 1 << 7;
        const OS_NONCONFORMING = 1 << 8;
        const GROUP = 1 << 9;
        const TLS = 1 << 10;
        const COMPRESSED = 1 << 11;
    }
}

pub fn sht_to_str(sht: u32) -> &'static str {
    match sht {
        SHT_NULL => "SHT_NULL",
        SHT_PROGBITS => "SHT_PROGBITS",
        SHT_SYMTAB => "SHT_SYMTAB",
        SHT_STRTAB => "SHT_STRTAB",
        SHT_RELA => "SHT_RELA",
        SHT_HASH => "SHT_HASH",
        SHT_DYNAMIC => "SHT_DYNAMIC",
        SHT_NOTE => "SHT_NOTE",
        SHT_NOBITS => "SHT_NOBITS",
        SHT_REL => "SHT_REL",
        SHT_SHLIB => "SHT_SHLIB",
        SHT_DYNSYM => "SHT_DYNSYM",
        SHT_INIT_ARRAY => "SHT_INIT_ARRAY",
        SHT_FINI_ARRAY => "SHT_FINI_ARRAY",
        SHT_PREINIT_ARRAY => "SHT_PREINIT_ARRAY",
        SHT_GROUP => "SHT_GROUP",
        SHT_SYMTAB_SHNDX => "SHT_SYMTAB_SHNDX",
        SHT_NUM => "SHT_NUM",
        SHT_LOOS => "SHT_LOOS",
        SHT_GNU_ATTRIBUTES => "SHT_GNU_ATTRIBUTES",
        SHT_GNU_HASH => "SHT_GNU_HASH",
        SHT_GNU_LIBLIST => "SHT_GNU_LIBLIST",
        SHT_CHECKSUM => "SHT_CHECKSUM",
        SHT_SUNW_MOVE => "SHT_SUNW_MOVE",
        SHT_SUNW_COMDAT => "SHT_SUNW_COMDAT",
        SHT_SUNW_SYMINFO => "SHT_SUNW_SYMINFO",
        SHT_GNU_VERDEF => "SHT_GNU_VERDEF",
        SHT_GNU_VERNEED => "SHT_GNU_VERNEED",
        SHT_GNU_VERSYM => "SHT_GNU_VERSYM",
        SHT_LOPROC => "SHT_LOPROC",
        SHT_HIPROC => "SHT_HIPROC",
        SHT_LOUSER => "SHT_LOUSER",
        SHT_HIUSER => "SHT_HIUSER",
        _ => "UNKNOWN_SHT",
    }
}

/// Size in bytes of a section header, per word size.
pub const SIZEOF_SHDR32: usize = 40;
pub const SIZEOF_SHDR64: usize = 64;

/// A section header, widened to `u64` fields (spec §3 `Chunk.shdr`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Shdr {
    pub fn size(ctx: Ctx) -> usize {
        if ctx.is_64() { SIZEOF_SHDR64 } else { SIZEOF_SHDR32 }
    }

    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.sh_name, &mut off, ctx.le)?;
        buf.gwrite_with(self.sh_type, &mut off, ctx.le)?;
        if ctx.is_64() {
            buf.gwrite_with(self.sh_flags, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_addr, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_offset, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_size, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_link, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_info, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_addralign, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_entsize, &mut off, ctx.le)?;
        } else {
            buf.gwrite_with(self.sh_flags as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_addr as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_offset as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_size as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_link, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_info, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_addralign as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.sh_entsize as u32, &mut off, ctx.le)?;
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
    fn shdr_write_size_matches_class() {
        let ctx64 = Ctx::new(Container::Big, Endian::Little);
        let ctx32 = Ctx::new(Container::Little, Endian::Little);
        let shdr = Shdr { sh_name: 1, sh_type: SHT_PROGBITS, sh_flags: ShFlags::ALLOC.bits(), ..Default::default() };
        let mut b64 = vec![0u8; Shdr::size(ctx64)];
        let mut b32 = vec![0u8; Shdr::size(ctx32)];
        assert_eq!(shdr.write_to(&mut b64, ctx64).unwrap(), SIZEOF_SHDR64);
        assert_eq!(shdr.write_to(&mut b32, ctx32).unwrap(), SIZEOF_SHDR32);
    }
}
