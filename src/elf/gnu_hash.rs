//! `.gnu.hash` write-side construction (spec §4.5).
//!
//! The lookup-side bloom/bucket/chain walk this is a mirror of comes
//! from the teacher's `elf::_64::gnu_hash::GnuHash`; this module only
//! needs to build the table, not search it, since the core emits
//! binaries rather than loading them.

use crate::container::Ctx;
use crate::word::word_size;

/// GNU hash function (djb_hash, spec §4.5): `h = h*33 + c`.
pub fn hash(symbol: &str) -> u32 {
    let mut h: u32 = 5381;
    for &b in symbol.as_bytes() {
        h = h.wrapping_mul(33).wrapping_add(b as u32);
    }
    h
}

/// A `.gnu.hash` table, laid out exactly as it will be written:
/// 4-word header, bloom filter words, bucket array, hash-value array.
#[derive(Debug, Clone)]
pub struct GnuHashTable {
    pub num_buckets: u32,
    pub symoffset: u32,
    pub bloom_shift: u32,
    bloom: Vec<u64>,
    buckets: Vec<u32>,
    /// Hash values for exported symbols starting at `symoffset`, with
    /// the low bit set on the last symbol of each bucket's chain.
    chain_hashes: Vec<u32>,
}

impl GnuHashTable {
    /// `names` are the names of the exported dynamic symbols, already
    /// in final `.dynsym` order (spec §4.4's stable sort puts
    /// exported symbols last, bucketed by `hash % num_buckets`), and
    /// `symoffset` is the index of the first exported symbol in
    /// `.dynsym`.
    pub fn build(names: &[&str], symoffset: u32, word_bits: u32) -> Self {
        let num_exported = names.len();
        let num_buckets = (num_exported.max(1) as u32).next_power_of_two().max(1);
        let bloom_size = {
            let min_bits = (num_exported * 12).max(1);
            let words_needed = min_bits.div_ceil(word_bits as usize);
            words_needed.next_power_of_two().max(1)
        };
        let bloom_shift = 5;

        let hashes: Vec<u32> = names.iter().map(|n| hash(n)).collect();
        let mut bloom = vec![0u64; bloom_size];
        for &h in &hashes {
            let word_idx = ((h / word_bits) as usize) % bloom_size;
            let h2 = h >> bloom_shift;
            bloom[word_idx] |= 1u64 << (h % word_bits);
            bloom[word_idx] |= 1u64 << (h2 % word_bits);
        }

        let mut buckets = vec![0u32; num_buckets as usize];
        let mut chain_hashes = vec![0u32; num_exported];
        for (i, &h) in hashes.iter().enumerate() {
            let b = (h as usize) % (num_buckets as usize);
            if buckets[b] == 0 {
                buckets[b] = symoffset + i as u32;
            }
            chain_hashes[i] = h & !1;
        }
        // Mark the last entry of each bucket's chain.
        for b in 0..num_buckets as usize {
            let mut last = None;
            for (i, &h) in hashes.iter().enumerate() {
                if (h as usize) % (num_buckets as usize) == b {
                    last = Some(i);
                }
            }
            if let Some(i) = last {
                chain_hashes[i] |= 1;
            }
        }

        GnuHashTable { num_buckets, symoffset, bloom_shift, bloom, buckets, chain_hashes }
    }

    pub fn byte_size(&self, ctx: Ctx) -> usize {
        let ws = word_size(ctx);
        16 + self.bloom.len() * ws + self.buckets.len() * 4 + self.chain_hashes.len() * 4
    }

    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        use scroll::Pwrite;
        let mut off = 0usize;
        buf.gwrite_with(self.num_buckets, &mut off, ctx.le)?;
        buf.gwrite_with(self.symoffset, &mut off, ctx.le)?;
        buf.gwrite_with(self.bloom.len() as u32, &mut off, ctx.le)?;
        buf.gwrite_with(self.bloom_shift, &mut off, ctx.le)?;
        for w in &self.bloom {
            crate::word::push_word_at(buf, &mut off, *w, ctx)?;
        }
        for &b in &self.buckets {
            buf.gwrite_with(b, &mut off, ctx.le)?;
        }
        for &h in &self.chain_hashes {
            buf.gwrite_with(h, &mut off, ctx.le)?;
        }
        Ok(off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_djb_reference() {
        // djb_hash("") == 5381
        assert_eq!(hash(""), 5381);
    }

    #[test]
    fn build_sizes_table_consistently() {
        let names = ["printf", "malloc", "free"];
        let table = GnuHashTable::build(&names, 2, 64);
        let ctx = Ctx::new(crate::container::Container::Big, scroll::Endian::Little);
        let mut buf = vec![0u8; table.byte_size(ctx)];
        assert_eq!(table.write_to(&mut buf, ctx).unwrap(), table.byte_size(ctx));
    }
}
