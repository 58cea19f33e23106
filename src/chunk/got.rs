//! GOT / `.got.plt` / PLT / `.plt.got` family (spec §4.6).
//!
//! Per-symbol slot allocation is additive: each `add_*_symbol` appends
//! to a per-chunk list and grows `sh_size` by one word (two for
//! TLS-GD/TLSDESC pairs). `get_entries` then synthesizes one
//! `GotEntry` per slot from the symbol-kind table in spec §4.6.

use super::ChunkMeta;
use crate::container::Ctx;
use crate::context::Context;
use crate::symbol::SymbolId;
use crate::word::{push_word, word_size};

/// GOT slot kinds (spec §4.6's table), driving `get_entries`' dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GotSlotKind {
    Imported,
    Ifunc,
    PicRelative,
    LinkTimeFilled,
    TlsGdStatic,
    TlsGdDynamic,
    TlsDesc,
    GotTpImported,
    GotTpShared,
    GotTpExecutable,
    TlsLdStatic,
    TlsLdDynamic,
}

#[derive(Debug, Clone, Copy)]
pub struct GotSlot {
    pub sym: SymbolId,
    pub kind: GotSlotKind,
    /// Resolved symbol address (link-time), used by the kinds that
    /// fill the slot directly instead of relying on a dynamic reloc.
    pub addr: u64,
    pub tls_begin: u64,
    pub tp_addr: u64,
}

/// One materialized GOT entry: slot index, raw word contents, and the
/// dynamic relocation to emit for it (if any).
#[derive(Debug, Clone, Copy)]
pub struct GotEntry {
    pub idx: usize,
    pub val: u64,
    /// `0` (`R_NONE`-equivalent) means link-time fill only.
    pub r_type: u32,
    pub sym: Option<SymbolId>,
}

impl GotEntry {
    /// RELR candidacy (spec §3's **GotEntry**, §4.7): the slot's
    /// relocation is the target's `R_RELATIVE` and its address is
    /// word-aligned. Anything else (`R_GLOB_DAT`, `R_IRELATIVE`,
    /// `R_TPOFF`, ...) needs its own dynamic relocation and is never
    /// RELR-eligible even at a word-aligned offset.
    pub fn is_relr_candidate(&self, byte_offset: u64, word: u64, r_relative: u32) -> bool {
        self.r_type == r_relative && byte_offset % word == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct GotChunk {
    slots: Vec<GotSlot>,
}

impl GotChunk {
    pub fn new() -> Self {
        GotChunk::default()
    }

    /// Appends a slot; TLS-GD/TLSDESC kinds occupy two words.
    pub fn add_symbol(&mut self, slot: GotSlot) {
        self.slots.push(slot);
    }

    fn slot_words(kind: GotSlotKind) -> usize {
        matches!(kind, GotSlotKind::TlsGdStatic | GotSlotKind::TlsGdDynamic | GotSlotKind::TlsDesc | GotSlotKind::TlsLdDynamic) as usize + 1
    }

    pub fn num_words(&self) -> usize {
        self.slots.iter().map(|s| Self::slot_words(s.kind)).sum()
    }

    /// Synthesizes one or two `GotEntry`s per slot (spec §4.6's table),
    /// `profile.r_*` supplying the per-target relocation type numbers.
    pub fn get_entries(&self, profile: &crate::profile::TargetProfile) -> Vec<GotEntry> {
        let mut out = Vec::new();
        let mut idx = 0usize;
        for slot in &self.slots {
            match slot.kind {
                GotSlotKind::Imported => {
                    out.push(GotEntry { idx, val: 0, r_type: profile.r_glob_dat, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::Ifunc => {
                    out.push(GotEntry { idx, val: slot.addr, r_type: profile.r_irelative, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::PicRelative => {
                    out.push(GotEntry { idx, val: slot.addr, r_type: profile.r_relative, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::LinkTimeFilled => {
                    out.push(GotEntry { idx, val: slot.addr, r_type: 0, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::TlsGdStatic => {
                    out.push(GotEntry { idx, val: 1, r_type: 0, sym: Some(slot.sym) });
                    out.push(GotEntry {
                        idx: idx + 1,
                        val: slot.addr.wrapping_sub(slot.tls_begin).wrapping_sub(profile.tls_dtv_offset as u64),
                        r_type: 0,
                        sym: Some(slot.sym),
                    });
                    idx += 2;
                }
                GotSlotKind::TlsGdDynamic => {
                    out.push(GotEntry { idx, val: 0, r_type: profile.r_dtpmod, sym: Some(slot.sym) });
                    out.push(GotEntry { idx: idx + 1, val: 0, r_type: profile.r_dtpoff, sym: Some(slot.sym) });
                    idx += 2;
                }
                GotSlotKind::TlsDesc => {
                    out.push(GotEntry { idx, val: 0, r_type: profile.r_tlsdesc, sym: Some(slot.sym) });
                    out.push(GotEntry { idx: idx + 1, val: 0, r_type: 0, sym: None });
                    idx += 2;
                }
                GotSlotKind::GotTpImported => {
                    out.push(GotEntry { idx, val: 0, r_type: profile.r_tpoff, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::GotTpShared => {
                    out.push(GotEntry { idx, val: slot.addr.wrapping_sub(slot.tls_begin), r_type: profile.r_tpoff, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::GotTpExecutable => {
                    out.push(GotEntry { idx, val: slot.addr.wrapping_sub(slot.tp_addr), r_type: 0, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::TlsLdStatic => {
                    out.push(GotEntry { idx, val: 1, r_type: 0, sym: Some(slot.sym) });
                    idx += 1;
                }
                GotSlotKind::TlsLdDynamic => {
                    out.push(GotEntry { idx, val: 0, r_type: profile.r_dtpmod, sym: Some(slot.sym) });
                    idx += 1;
                }
            }
        }
        out
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, ctx: Ctx) {
        meta.shdr.sh_size = (self.num_words() * word_size(ctx)) as u64;
    }

    /// Sorted, word-aligned `R_RELATIVE` slot addresses (spec §3's
    /// **GotEntry**, §4.7), ready to feed `relr::encode_relr` once
    /// `got_addr` (this chunk's final `sh_addr`) is known.
    pub fn relr_candidate_offsets(&self, profile: &crate::profile::TargetProfile, ctx: Ctx, got_addr: u64) -> Vec<u64> {
        let w = word_size(ctx) as u64;
        let mut offsets: Vec<u64> = self
            .get_entries(profile)
            .into_iter()
            .filter_map(|e| {
                let addr = got_addr + e.idx as u64 * w;
                e.is_relr_candidate(addr, w, profile.r_relative).then_some(addr)
            })
            .collect();
        offsets.sort_unstable();
        offsets
    }

    pub fn copy_buf(&self, ctx: &Context, buf: &mut [u8]) -> crate::error::Result<()> {
        let mut scratch = Vec::with_capacity(buf.len());
        for entry in self.get_entries(&ctx.profile) {
            push_word(&mut scratch, entry.val, ctx.ctx());
        }
        buf.copy_from_slice(&scratch);
        Ok(())
    }
}

/// `.got.plt`[0] = `.dynamic` address, `[1]=[2]=0` reserved, `[3..]` =
/// PLT header address (spec §4.6), except PPC64 where the loader fills
/// it.
pub fn got_plt_header(dynamic_addr: u64, plt_header_addr: u64, num_plt_entries: usize, is_ppc64: bool) -> Vec<u64> {
    let mut words = vec![dynamic_addr, 0, 0];
    for _ in 0..num_plt_entries {
        words.push(if is_ppc64 { 0 } else { plt_header_addr });
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imported_symbol_emits_glob_dat() {
        let profile = crate::profile::TargetProfile::x86_64();
        let mut chunk = GotChunk::new();
        let sym = SymbolId(0);
        chunk.add_symbol(GotSlot { sym, kind: GotSlotKind::Imported, addr: 0, tls_begin: 0, tp_addr: 0 });
        let entries = chunk.get_entries(&profile);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].r_type, profile.r_glob_dat);
        assert_eq!(entries[0].val, 0);
    }

    #[test]
    fn tlsgd_static_slot_occupies_two_words() {
        let mut chunk = GotChunk::new();
        let sym = SymbolId(0);
        chunk.add_symbol(GotSlot { sym, kind: GotSlotKind::TlsGdStatic, addr: 0x1040, tls_begin: 0x1000, tp_addr: 0 });
        assert_eq!(chunk.num_words(), 2);
    }

    #[test]
    fn relr_candidate_requires_relative_reloc_and_word_alignment() {
        const R_RELATIVE: u32 = 8;
        const R_GLOB_DAT: u32 = 6;
        let relative = GotEntry { idx: 0, val: 0, r_type: R_RELATIVE, sym: None };
        assert!(relative.is_relr_candidate(0x1000, 8, R_RELATIVE));
        assert!(!relative.is_relr_candidate(0x1004, 8, R_RELATIVE));
        let glob_dat = GotEntry { idx: 0, val: 0, r_type: R_GLOB_DAT, sym: None };
        assert!(!glob_dat.is_relr_candidate(0x1000, 8, R_RELATIVE));
    }

    #[test]
    fn relr_candidate_offsets_excludes_non_relative_slots() {
        let profile = crate::profile::TargetProfile::x86_64();
        let mut chunk = GotChunk::new();
        chunk.add_symbol(GotSlot { sym: SymbolId(0), kind: GotSlotKind::PicRelative, addr: 0x4000, tls_begin: 0, tp_addr: 0 });
        chunk.add_symbol(GotSlot { sym: SymbolId(1), kind: GotSlotKind::Imported, addr: 0, tls_begin: 0, tp_addr: 0 });
        let ctx = Ctx::new(crate::container::Container::Big, scroll::Endian::Little);
        let offsets = chunk.relr_candidate_offsets(&profile, ctx, 0x2000);
        assert_eq!(offsets, vec![0x2000]);
    }

    #[test]
    fn got_plt_header_layout_matches_spec() {
        let words = got_plt_header(0x2000, 0x3000, 2, false);
        assert_eq!(words, vec![0x2000, 0, 0, 0x3000, 0x3000]);
    }
}
