//! Symbol versioning: `.gnu.version`, `.gnu.version_r`, `.gnu.version_d`
//! write-side construction (spec §4.13).
//!
//! Record layouts (`ElfVerneed`/`ElfVernaux`/`ElfVerdef`/`ElfVerdaux`)
//! are unchanged from the gABI and from the teacher's read-side
//! `symver.rs`; this module only adds the builders `chunk::version`
//! needs, since the core writes versioned binaries rather than
//! resolving symbols against them.

use crate::elf::sysv_hash::elf_hash;
use scroll::Pwrite;

/// Reserved version index: local binding, never leaves the object.
pub const VER_NDX_LOCAL: u16 = 0;
/// Reserved version index: global, unversioned.
pub const VER_NDX_GLOBAL: u16 = 1;
/// Reserved version indices below this value are never assigned to a
/// real version (spec §4.13's `veridx` numbering starts here).
pub const VER_NDX_LAST_RESERVED: u16 = 1;
/// High bit of a `.gnu.version` entry: symbol is hidden from linking.
pub const VERSYM_HIDDEN: u16 = 0x8000;

/// Marks the base entry of `.gnu.version_d` (spec §4.13).
pub const VER_FLG_BASE: u16 = 0x1;
/// Marks a weak version dependency in `.gnu.version_r`.
pub const VER_FLG_WEAK: u16 = 0x2;

pub const VER_DEF_CURRENT: u16 = 1;
pub const VER_NEED_CURRENT: u16 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElfVerneed {
    pub vn_version: u16,
    pub vn_cnt: u16,
    pub vn_file: u32,
    pub vn_aux: u32,
    pub vn_next: u32,
}

impl ElfVerneed {
    pub const SIZE: usize = 16;
    pub fn write_to(&self, buf: &mut [u8], le: scroll::Endian) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.vn_version, &mut off, le)?;
        buf.gwrite_with(self.vn_cnt, &mut off, le)?;
        buf.gwrite_with(self.vn_file, &mut off, le)?;
        buf.gwrite_with(self.vn_aux, &mut off, le)?;
        buf.gwrite_with(self.vn_next, &mut off, le)?;
        Ok(off)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElfVernaux {
    pub vna_hash: u32,
    pub vna_flags: u16,
    pub vna_other: u16,
    pub vna_name: u32,
    pub vna_next: u32,
}

impl ElfVernaux {
    pub const SIZE: usize = 16;
    pub fn write_to(&self, buf: &mut [u8], le: scroll::Endian) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.vna_hash, &mut off, le)?;
        buf.gwrite_with(self.vna_flags, &mut off, le)?;
        buf.gwrite_with(self.vna_other, &mut off, le)?;
        buf.gwrite_with(self.vna_name, &mut off, le)?;
        buf.gwrite_with(self.vna_next, &mut off, le)?;
        Ok(off)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElfVerdef {
    pub vd_version: u16,
    pub vd_flags: u16,
    pub vd_ndx: u16,
    pub vd_cnt: u16,
    pub vd_hash: u32,
    pub vd_aux: u32,
    pub vd_next: u32,
}

impl ElfVerdef {
    pub const SIZE: usize = 20;
    pub fn write_to(&self, buf: &mut [u8], le: scroll::Endian) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.vd_version, &mut off, le)?;
        buf.gwrite_with(self.vd_flags, &mut off, le)?;
        buf.gwrite_with(self.vd_ndx, &mut off, le)?;
        buf.gwrite_with(self.vd_cnt, &mut off, le)?;
        buf.gwrite_with(self.vd_hash, &mut off, le)?;
        buf.gwrite_with(self.vd_aux, &mut off, le)?;
        buf.gwrite_with(self.vd_next, &mut off, le)?;
        Ok(off)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElfVerdaux {
    pub vda_name: u32,
    pub vda_next: u32,
}

impl ElfVerdaux {
    pub const SIZE: usize = 8;
    pub fn write_to(&self, buf: &mut [u8], le: scroll::Endian) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.vda_name, &mut off, le)?;
        buf.gwrite_with(self.vda_next, &mut off, le)?;
        Ok(off)
    }
}

/// One used version of a needed DSO, to become a `Vernaux` entry.
#[derive(Debug, Clone)]
pub struct NeededVersion {
    pub name_off: u32,
    pub version_index: u16,
}

/// One DSO with versions this link uses, to become a `Verneed` entry
/// plus its chain of `Vernaux`es.
#[derive(Debug, Clone)]
pub struct NeededFile {
    pub file_name_off: u32,
    pub versions: Vec<NeededVersion>,
}

/// Builds the `.gnu.version_r` byte stream: one `Verneed` per needed
/// file followed by its `Vernaux` chain, per spec §4.13.
pub fn build_version_r(files: &[NeededFile], le: scroll::Endian) -> Vec<u8> {
    let mut out = Vec::new();
    let n = files.len();
    for (i, file) in files.iter().enumerate() {
        let is_last_file = i + 1 == n;
        let vn_cnt = file.versions.len() as u16;
        let verneed = ElfVerneed {
            vn_version: VER_NEED_CURRENT,
            vn_cnt,
            vn_file: file.file_name_off,
            vn_aux: ElfVerneed::SIZE as u32,
            vn_next: if is_last_file { 0 } else { (ElfVerneed::SIZE + file.versions.len() * ElfVernaux::SIZE) as u32 },
        };
        let mut rec = vec![0u8; ElfVerneed::SIZE];
        verneed.write_to(&mut rec, le).expect("fixed-size record");
        out.extend_from_slice(&rec);

        let vn = file.versions.len();
        for (j, v) in file.versions.iter().enumerate() {
            let is_last_aux = j + 1 == vn;
            // name is not resolvable here without the string table; caller
            // passes a pre-interned offset via NeededVersion::name_off is
            // unused above, vna_name below refers to the version string.
            let vernaux = ElfVernaux {
                vna_hash: 0, // filled by caller once the version string is known
                vna_flags: 0,
                vna_other: v.version_index,
                vna_name: v.name_off,
                vna_next: if is_last_aux { 0 } else { ElfVernaux::SIZE as u32 },
            };
            let mut rec = vec![0u8; ElfVernaux::SIZE];
            vernaux.write_to(&mut rec, le).expect("fixed-size record");
            out.extend_from_slice(&rec);
        }
    }
    out
}

/// Computes `vna_hash`/`vd_hash` for a version string (spec §4.13: "hash
/// field = elf_hash(version_string)").
pub fn version_hash(version_string: &str) -> u32 {
    elf_hash(version_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verneed_record_sizes_match_gabi() {
        assert_eq!(ElfVerneed::SIZE, 16);
        assert_eq!(ElfVernaux::SIZE, 16);
        assert_eq!(ElfVerdef::SIZE, 20);
        assert_eq!(ElfVerdaux::SIZE, 8);
    }

    #[test]
    fn build_version_r_chains_multiple_files() {
        let files = vec![
            NeededFile { file_name_off: 1, versions: vec![NeededVersion { name_off: 10, version_index: 2 }] },
            NeededFile { file_name_off: 2, versions: vec![
                NeededVersion { name_off: 20, version_index: 3 },
                NeededVersion { name_off: 30, version_index: 4 },
            ]},
        ];
        let bytes = build_version_r(&files, scroll::Endian::Little);
        let expected_len = ElfVerneed::SIZE + ElfVernaux::SIZE + ElfVerneed::SIZE + 2 * ElfVernaux::SIZE;
        assert_eq!(bytes.len(), expected_len);
    }
}
