//! `PT_*`/`PF_*` constants and the unified `Phdr` record, plus the
//! PT_LOAD/PT_NOTE/PT_TLS grouping logic of spec §4.2.

use bitflags::bitflags;
use crate::container::Ctx;
use scroll::Pwrite;

/// Program header table entry unused
pub const PT_NULL: u32 = 0;
/// Loadable program segment
pub const PT_LOAD: u32 = 1;
/// Dynamic linking information
pub const PT_DYNAMIC: u32 = 2;
/// Program interpreter
pub const PT_INTERP: u32 = 3;
/// Auxiliary information
pub const PT_NOTE: u32 = 4;
/// Reserved
pub const PT_SHLIB: u32 = 5;
/// Entry for header table itself
pub const PT_PHDR: u32 = 6;
/// Thread-local storage segment
pub const PT_TLS: u32 = 7;
/// Number of defined types
pub const PT_NUM: u32 = 8;
/// Start of OS-specific
pub const PT_LOOS: u32 = 0x60000000;
/// GCC .eh_frame_hdr segment
pub const PT_GNU_EH_FRAME: u32 = 0x6474e550;
/// Indicates stack executability
pub const PT_GNU_STACK: u32 = 0x6474e551;
/// Read-only after relocation
pub const PT_GNU_RELRO: u32 = 0x6474e552;
/// ARM exception unwind table
pub const PT_ARM_EXIDX: u32 = 0x70000001;
/// End of OS-specific
pub const PT_HIOS: u32 = 0x6fffffff;
/// Start of processor-specific
pub const PT_LOPROC: u32 = 0x70000000;
/// End of processor-specific
pub const PT_HIPROC: u32 = 0x7fffffff;

bitflags! {
    /// `p_flags` (segment permissions). Spec §4.2's segment-flag
    /// mapping: `PF_R` always; `PF_W` iff `SHF_WRITE`; `PF_X` iff
    /// `SHF_EXECINSTR`, or (no `SHF_WRITE` and `--no-rosegment`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PFlags: u32 {
        const X = 1 << 0;
        const W = 1 << 1;
        const R = 1 << 2;
    }
}

pub fn pt_to_str(pt: u32) -> &'static str {
    match pt {
        PT_NULL => "PT_NULL",
        PT_LOAD => "PT_LOAD",
        PT_DYNAMIC => "PT_DYNAMIC",
        PT_INTERP => "PT_INTERP",
        PT_NOTE => "PT_NOTE",
        PT_SHLIB => "PT_SHLIB",
        PT_PHDR => "PT_PHDR",
        PT_TLS => "PT_TLS",
        PT_NUM => "PT_NUM",
        PT_LOOS => "PT_LOOS",
        PT_GNU_EH_FRAME => "PT_GNU_EH_FRAME",
        PT_GNU_STACK => "PT_GNU_STACK",
        PT_GNU_RELRO => "PT_GNU_RELRO",
        PT_ARM_EXIDX => "PT_ARM_EXIDX",
        PT_HIOS => "PT_HIOS",
        PT_LOPROC => "PT_LOPROC",
        PT_HIPROC => "PT_HIPROC",
        _ => "UNKNOWN_PT",
    }
}

pub const SIZEOF_PHDR32: usize = 32;
pub const SIZEOF_PHDR64: usize = 56;

/// A program header / segment descriptor, `u64`-widened (see
/// `elf::header::Ehdr` for the rationale).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Phdr {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl Phdr {
    pub fn size(ctx: Ctx) -> usize {
        if ctx.is_64() { SIZEOF_PHDR64 } else { SIZEOF_PHDR32 }
    }

    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let mut off = 0usize;
        if ctx.is_64() {
            buf.gwrite_with(self.p_type, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_flags, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_offset, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_vaddr, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_paddr, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_filesz, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_memsz, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_align, &mut off, ctx.le)?;
        } else {
            buf.gwrite_with(self.p_type, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_offset as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_vaddr as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_paddr as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_filesz as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_memsz as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_flags, &mut off, ctx.le)?;
            buf.gwrite_with(self.p_align as u32, &mut off, ctx.le)?;
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
    fn phdr_roundtrip_sizes() {
        let ctx = Ctx::new(Container::Big, Endian::Little);
        let p = Phdr { p_type: PT_LOAD, p_flags: (PFlags::R | PFlags::X).bits(), p_vaddr: 0x1000, p_filesz: 0x200, ..Default::default() };
        let mut buf = vec![0u8; Phdr::size(ctx)];
        assert_eq!(p.write_to(&mut buf, ctx).unwrap(), SIZEOF_PHDR64);
    }
}
