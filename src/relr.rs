//! `.relr.dyn` address+bitmap packing (spec §4.7, scenarios 1-2 of §8).
//!
//! Grounded directly on the algorithm as stated in the spec rather
//! than on any teacher file — the teacher repo predates RELR (it has
//! no Mach-O/PE equivalent) — so this module is built straight from
//! spec §4.7's encoding description and verified against its two
//! worked examples.

/// Encodes a sorted, deduplicated, word-aligned offset list into the
/// alternating address/bitmap RELR word stream.
///
/// `w` is the target word size in bytes (4 or 8). Panics if any
/// offset is not a multiple of `w`, or if `offsets` is not sorted
/// ascending — both are preconditions the layout pass guarantees
/// before handing offsets to `construct_relr`.
pub fn encode_relr(offsets: &[u64], w: u64) -> Vec<u64> {
    assert!(w == 4 || w == 8, "relr word size must be 4 or 8, got {w}");
    let num_bits = 8 * w - 1;
    let max_delta = num_bits * w;

    let mut out = Vec::new();
    let mut i = 0;
    let n = offsets.len();
    let mut prev: Option<u64> = None;
    while i < n {
        let base = offsets[i];
        assert!(base % w == 0, "relr offset {base} is not {w}-aligned");
        if let Some(p) = prev {
            assert!(base >= p, "relr offsets must be sorted ascending");
        }
        out.push(base);
        prev = Some(base);
        i += 1;

        let mut cur_base = base;
        loop {
            let mut bitmap: u64 = 0;
            let mut advanced = false;
            while i < n {
                let off = offsets[i];
                if off <= cur_base || off > cur_base + max_delta {
                    break;
                }
                let delta = off - cur_base;
                assert!(delta % w == 0, "relr offset {off} is not {w}-aligned relative to base {cur_base}");
                let bit = delta / w - 1;
                bitmap |= 1u64 << bit;
                prev = Some(off);
                i += 1;
                advanced = true;
            }
            if advanced {
                out.push((bitmap << 1) | 1);
                cur_base += max_delta;
            } else {
                break;
            }
        }
    }
    out
}

/// Inverse of `encode_relr`, used to verify the round-trip invariant
/// from spec §8.
pub fn decode_relr(words: &[u64], w: u64) -> Vec<u64> {
    let num_bits = 8 * w - 1;
    let max_delta = num_bits * w;

    let mut out = Vec::new();
    let mut cur_base = 0u64;
    for &word in words {
        if word & 1 == 0 {
            cur_base = word;
            out.push(word);
        } else {
            let bitmap = word >> 1;
            for bit in 0..num_bits {
                if bitmap & (1u64 << bit) != 0 {
                    out.push(cur_base + (bit + 1) * w);
                }
            }
            cur_base += max_delta;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_cluster_matches_spec_scenario_1() {
        let offsets = [16u64, 24, 32, 40, 48, 56, 64, 72];
        let words = encode_relr(&offsets, 8);
        assert_eq!(words, vec![16, (0b0111_1111u64 << 1) | 1]);
    }

    #[test]
    fn sparse_pair_matches_spec_scenario_2() {
        let offsets = [16u64, 1024];
        let words = encode_relr(&offsets, 8);
        assert_eq!(words, vec![16, 1024]);
    }

    #[test]
    fn round_trips_arbitrary_offsets() {
        let offsets: Vec<u64> = (0..40).map(|i| 0x1000 + i * 8).collect();
        let words = encode_relr(&offsets, 8);
        let decoded = decode_relr(&words, 8);
        assert_eq!(decoded, offsets);
    }

    #[test]
    fn round_trips_32_bit_word_size() {
        let offsets = [100u64 * 4, 101 * 4, 102 * 4, 500 * 4];
        let words = encode_relr(&offsets, 4);
        let decoded = decode_relr(&words, 4);
        assert_eq!(decoded, offsets);
    }
}
