//! `.hash` (classic SysV hash table) write-side construction (spec §4.5).

use crate::container::Ctx;
use scroll::Pwrite;

/// Classic ELF hash function (spec §4.5): `elf_hash`.
pub fn elf_hash(symbol: &str) -> u32 {
    let mut h: u32 = 0;
    for &c in symbol.as_bytes() {
        h = (h << 4).wrapping_add(c as u32);
        let g = h & 0xf000_0000;
        if g != 0 {
            h ^= g >> 24;
        }
        h &= !g;
    }
    h
}

/// A `.hash` table: 2-word header `(nbucket, nchain)`, then `nbucket`
/// bucket indices, then `nchain` chain links — one per dynamic symbol,
/// index 0 reserved for the undefined symbol.
#[derive(Debug, Clone)]
pub struct SysvHashTable {
    nbucket: u32,
    buckets: Vec<u32>,
    chains: Vec<u32>,
}

impl SysvHashTable {
    /// `names` covers every dynamic symbol, in final `.dynsym` order,
    /// including the reserved `SHN_UNDEF` slot at index 0.
    pub fn build(names: &[&str]) -> Self {
        let nchain = names.len() as u32;
        let nbucket = (names.len().max(1) as u32).max(1);
        let mut buckets = vec![0u32; nbucket as usize];
        let mut chains = vec![0u32; nchain as usize];
        for (i, name) in names.iter().enumerate() {
            if i == 0 {
                continue;
            }
            let h = elf_hash(name) % nbucket;
            chains[i] = buckets[h as usize];
            buckets[h as usize] = i as u32;
        }
        SysvHashTable { nbucket, buckets, chains }
    }

    pub fn byte_size(&self) -> usize {
        (2 + self.buckets.len() + self.chains.len()) * 4
    }

    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.nbucket, &mut off, ctx.le)?;
        buf.gwrite_with(self.chains.len() as u32, &mut off, ctx.le)?;
        for &b in &self.buckets {
            buf.gwrite_with(b, &mut off, ctx.le)?;
        }
        for &c in &self.chains {
            buf.gwrite_with(c, &mut off, ctx.le)?;
        }
        Ok(off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elf_hash_empty_is_zero() {
        assert_eq!(elf_hash(""), 0);
    }

    #[test]
    fn build_round_trips_size() {
        let names = ["", "printf", "malloc"];
        let table = SysvHashTable::build(&names);
        let ctx = Ctx::new(crate::container::Container::Big, scroll::Endian::Little);
        let mut buf = vec![0u8; table.byte_size()];
        assert_eq!(table.write_to(&mut buf, ctx).unwrap(), table.byte_size());
    }
}
