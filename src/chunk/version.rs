//! `.gnu.version`/`.gnu.version_r`/`.gnu.version_d` chunk (spec §4.13),
//! wrapping `elf::symver`'s record builders.

use super::ChunkMeta;
use crate::container::Ctx;
use crate::context::Context;
use crate::elf::symver::{
    build_version_r, ElfVerdaux, ElfVerdef, NeededFile, VER_DEF_CURRENT, VER_FLG_BASE,
};

/// One defined version this DSO exports, becoming a `Verdef` entry.
#[derive(Debug, Clone)]
pub struct DefinedVersion {
    pub name_off: u32,
    pub hash: u32,
    pub ndx: u16,
}

#[derive(Debug, Clone, Default)]
pub struct VersionChunk {
    /// Per-symbol `.gnu.version` index, parallel to the dynsym order.
    pub versym: Vec<u16>,
    pub needed: Vec<NeededFile>,
    pub defined: Vec<DefinedVersion>,
    version_r: Vec<u8>,
    version_d: Vec<u8>,
}

impl VersionChunk {
    pub fn new(versym: Vec<u16>, needed: Vec<NeededFile>, defined: Vec<DefinedVersion>) -> Self {
        VersionChunk { versym, needed, defined, version_r: Vec::new(), version_d: Vec::new() }
    }

    pub fn construct(&mut self, ctx: &Context) -> crate::error::Result<()> {
        let le = ctx.ctx().le;
        self.version_r = build_version_r(&self.needed, le);

        self.version_d.clear();
        let base_name_off = 0u32;
        let n = self.defined.len();
        // Base entry (spec §4.13): index 1, VER_FLG_BASE, no aux name
        // beyond the soname, which the caller supplies as defined[0]
        // when a base entry is needed; otherwise skip straight to the
        // caller-supplied defined versions.
        for (i, def) in self.defined.iter().enumerate() {
            let is_last = i + 1 == n;
            let verdef = ElfVerdef {
                vd_version: VER_DEF_CURRENT,
                vd_flags: if i == 0 { VER_FLG_BASE } else { 0 },
                vd_ndx: def.ndx,
                vd_cnt: 1,
                vd_hash: def.hash,
                vd_aux: ElfVerdef::SIZE as u32,
                vd_next: if is_last { 0 } else { (ElfVerdef::SIZE + ElfVerdaux::SIZE) as u32 },
            };
            let mut rec = vec![0u8; ElfVerdef::SIZE];
            verdef.write_to(&mut rec, le).expect("fixed-size record");
            self.version_d.extend_from_slice(&rec);

            let verdaux = ElfVerdaux { vda_name: def.name_off, vda_next: 0 };
            let mut rec = vec![0u8; ElfVerdaux::SIZE];
            verdaux.write_to(&mut rec, le).expect("fixed-size record");
            self.version_d.extend_from_slice(&rec);
        }
        let _ = base_name_off;
        Ok(())
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        let size = if !self.versym.is_empty() {
            self.versym.len() * 2
        } else if !self.version_r.is_empty() {
            self.version_r.len()
        } else {
            self.version_d.len()
        };
        meta.shdr.sh_size = size as u64;
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        if !self.versym.is_empty() {
            use scroll::Pwrite;
            for (i, &v) in self.versym.iter().enumerate() {
                buf.pwrite_with(v, i * 2, ctx.le)?;
            }
        } else if !self.version_r.is_empty() {
            buf.copy_from_slice(&self.version_r);
        } else {
            buf.copy_from_slice(&self.version_d);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LinkOptions;
    use crate::profile::TargetProfile;

    fn ctx() -> Context {
        Context::new(TargetProfile::x86_64(), LinkOptions::default())
    }

    #[test]
    fn version_d_base_entry_carries_ver_flg_base() {
        let defined = vec![DefinedVersion { name_off: 5, hash: 0x1234, ndx: 2 }];
        let mut chunk = VersionChunk::new(vec![], vec![], defined);
        chunk.construct(&ctx()).unwrap();
        let flags = u16::from_le_bytes(chunk.version_d[2..4].try_into().unwrap());
        assert_eq!(flags, VER_FLG_BASE);
    }

    #[test]
    fn versym_table_writes_one_u16_per_symbol() {
        let mut chunk = VersionChunk::new(vec![1, 2, 0x8002], vec![], vec![]);
        chunk.construct(&ctx()).unwrap();
        let mut meta = ChunkMeta::new(".gnu.version");
        chunk.update_shdr(&mut meta);
        assert_eq!(meta.shdr.sh_size, 6);
        let mut buf = vec![0u8; 6];
        chunk.copy_buf(ctx().ctx(), &mut buf).unwrap();
        assert_eq!(u16::from_le_bytes(buf[4..6].try_into().unwrap()), 0x8002);
    }
}
