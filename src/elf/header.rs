//! ELF file header: `e_ident` constants and the unified `Ehdr` record.
//!
//! The teacher (`m4b-goblin`) generates a 32-bit and a 64-bit `Header`
//! struct from the same macro and reads whichever one matches the
//! input. Per design notes §9 ("narrow word abstraction" in place of
//! template-per-target duplication) this core keeps a single `Ehdr`
//! with `u64` fields and converts down to 32 bits only in
//! [`Ehdr::write_to`], which is what `chunk::ehdr` calls from
//! `copy_buf`.

use crate::container::Ctx;
use scroll::{Pwrite, Pread};

/// No file type.
pub const ET_NONE: u16 = 0;
/// Relocatable file.
pub const ET_REL: u16 = 1;
/// Executable file.
pub const ET_EXEC: u16 = 2;
/// Shared object file.
pub const ET_DYN: u16 = 3;
/// Core file.
pub const ET_CORE: u16 = 4;
/// Number of defined types.
pub const ET_NUM: u16 = 5;

/// The ELF magic number.
pub const ELFMAG: &[u8; 4] = b"\x7FELF";
/// SELF (Security-enhanced ELF) magic number.
pub const SELFMAG: usize = 4;

/// File class byte index.
pub const EI_CLASS: usize = 4;
/// Invalid class.
pub const ELFCLASSNONE: u8 = 0;
/// 32-bit objects.
pub const ELFCLASS32: u8 = 1;
/// 64-bit objects.
pub const ELFCLASS64: u8 = 2;

/// Data encoding byte index.
pub const EI_DATA: usize = 5;
/// 2's complement, little endian.
pub const ELFDATA2LSB: u8 = 1;
/// 2's complement, big endian.
pub const ELFDATA2MSB: u8 = 2;
/// OS/ABI identification byte index.
pub const EI_OSABI: usize = 7;
/// Number of bytes in `e_ident`.
pub const SIZEOF_IDENT: usize = 16;

/// Size of the 32-bit ELF header.
pub const SIZEOF_EHDR32: usize = 52;
/// Size of the 64-bit ELF header.
pub const SIZEOF_EHDR64: usize = 64;

#[inline]
pub fn et_to_str(et: u16) -> &'static str {
    match et {
        ET_NONE => "NONE",
        ET_REL => "REL",
        ET_EXEC => "EXEC",
        ET_DYN => "DYN",
        ET_CORE => "CORE",
        ET_NUM => "NUM",
        _ => "UNKNOWN_ET",
    }
}

/// The ELF file header, widened to native `u64` fields regardless of
/// target class. `e_entry`/`e_phoff`/`e_shoff` are the only
/// width-dependent fields on disk; everything else is already fixed
/// width in the gABI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ehdr {
    pub e_ident: [u8; SIZEOF_IDENT],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Ehdr {
    pub fn new(ctx: Ctx, e_type: u16, e_machine: u16) -> Self {
        let mut e_ident = [0u8; SIZEOF_IDENT];
        e_ident[0..SELFMAG].copy_from_slice(ELFMAG);
        e_ident[EI_CLASS] = if ctx.is_64() { ELFCLASS64 } else { ELFCLASS32 };
        e_ident[EI_DATA] = if ctx.is_little_endian() { ELFDATA2LSB } else { ELFDATA2MSB };
        e_ident[6] = 1; // EV_CURRENT
        Ehdr {
            e_ident,
            e_type,
            e_machine,
            e_version: 1,
            e_ehsize: if ctx.is_64() { SIZEOF_EHDR64 as u16 } else { SIZEOF_EHDR32 as u16 },
            ..Default::default()
        }
    }

    pub fn size(ctx: Ctx) -> usize {
        if ctx.is_64() { SIZEOF_EHDR64 } else { SIZEOF_EHDR32 }
    }

    /// Writes the header into `buf` honoring `ctx`'s word size and
    /// endianness; used by `chunk::ehdr::Ehdr::copy_buf`.
    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite(&self.e_ident[..], &mut off)?;
        buf.gwrite_with(self.e_type, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_machine, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_version, &mut off, ctx.le)?;
        if ctx.is_64() {
            buf.gwrite_with(self.e_entry, &mut off, ctx.le)?;
            buf.gwrite_with(self.e_phoff, &mut off, ctx.le)?;
            buf.gwrite_with(self.e_shoff, &mut off, ctx.le)?;
        } else {
            buf.gwrite_with(self.e_entry as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.e_phoff as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.e_shoff as u32, &mut off, ctx.le)?;
        }
        buf.gwrite_with(self.e_flags, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_ehsize, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_phentsize, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_phnum, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_shentsize, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_shnum, &mut off, ctx.le)?;
        buf.gwrite_with(self.e_shstrndx, &mut off, ctx.le)?;
        Ok(off)
    }

    /// Round-trips bytes written by `write_to` back into an `Ehdr`;
    /// used by tests that check byte-exactness of the header writer.
    pub fn parse(buf: &[u8], ctx: Ctx) -> scroll::Result<Self> {
        let mut off = 0usize;
        let mut e_ident = [0u8; SIZEOF_IDENT];
        e_ident.copy_from_slice(&buf[off..off + SIZEOF_IDENT]);
        off += SIZEOF_IDENT;
        let e_type: u16 = buf.gread_with(&mut off, ctx.le)?;
        let e_machine: u16 = buf.gread_with(&mut off, ctx.le)?;
        let e_version: u32 = buf.gread_with(&mut off, ctx.le)?;
        let (e_entry, e_phoff, e_shoff) = if ctx.is_64() {
            let a: u64 = buf.gread_with(&mut off, ctx.le)?;
            let b: u64 = buf.gread_with(&mut off, ctx.le)?;
            let c: u64 = buf.gread_with(&mut off, ctx.le)?;
            (a, b, c)
        } else {
            let a: u32 = buf.gread_with(&mut off, ctx.le)?;
            let b: u32 = buf.gread_with(&mut off, ctx.le)?;
            let c: u32 = buf.gread_with(&mut off, ctx.le)?;
            (a as u64, b as u64, c as u64)
        };
        let e_flags: u32 = buf.gread_with(&mut off, ctx.le)?;
        let e_ehsize: u16 = buf.gread_with(&mut off, ctx.le)?;
        let e_phentsize: u16 = buf.gread_with(&mut off, ctx.le)?;
        let e_phnum: u16 = buf.gread_with(&mut off, ctx.le)?;
        let e_shentsize: u16 = buf.gread_with(&mut off, ctx.le)?;
        let e_shnum: u16 = buf.gread_with(&mut off, ctx.le)?;
        let e_shstrndx: u16 = buf.gread_with(&mut off, ctx.le)?;
        Ok(Ehdr {
            e_ident, e_type, e_machine, e_version, e_entry, e_phoff, e_shoff, e_flags,
            e_ehsize, e_phentsize, e_phnum, e_shentsize, e_shnum, e_shstrndx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use scroll::Endian;

    #[test]
    fn round_trips_64_le() {
        let ctx = Ctx::new(Container::Big, Endian::Little);
        let mut h = Ehdr::new(ctx, ET_DYN, 62 /* EM_X86_64 */);
        h.e_entry = 0x401000;
        h.e_phoff = 64;
        h.e_shoff = 0x2000;
        h.e_phnum = 7;
        h.e_shnum = 30;
        let mut buf = vec![0u8; Ehdr::size(ctx)];
        let n = h.write_to(&mut buf, ctx).unwrap();
        assert_eq!(n, SIZEOF_EHDR64);
        let back = Ehdr::parse(&buf, ctx).unwrap();
        assert_eq!(back.e_entry, 0x401000);
        assert_eq!(back.e_phoff, 64);
        assert_eq!(back.e_shoff, 0x2000);
        assert_eq!(&back.e_ident[0..4], ELFMAG);
    }

    #[test]
    fn round_trips_32_be() {
        let ctx = Ctx::new(Container::Little, Endian::Big);
        let mut h = Ehdr::new(ctx, ET_EXEC, 8 /* EM_MIPS */);
        h.e_entry = 0x8048000;
        let mut buf = vec![0u8; Ehdr::size(ctx)];
        h.write_to(&mut buf, ctx).unwrap();
        let back = Ehdr::parse(&buf, ctx).unwrap();
        assert_eq!(back.e_entry, 0x8048000);
        assert_eq!(back.e_ehsize, SIZEOF_EHDR32 as u16);
    }
}
