//! The target-parameterized integer abstraction named in spec §3.
//!
//! Internally every address and word-sized quantity is carried as a
//! native `u64`; the `Ctx` (word size + endianness) is only consulted
//! at the point a value is written into the output buffer. This is
//! the "narrow word abstraction" called for in design notes §9, used
//! in place of the teacher's per-width macro-generated struct family.

use crate::container::Ctx;
use scroll::ctx::TryIntoCtx;
use scroll::Pwrite;

/// An address or word-sized quantity, native width regardless of target.
pub type Word = u64;

/// Truncates a native `Word` to the target's pointer width and writes
/// it into `buf` at `offset`, honoring `ctx`'s endianness.
pub fn write_word(buf: &mut [u8], offset: usize, value: Word, ctx: Ctx) -> scroll::Result<usize> {
    if ctx.is_64() {
        buf.pwrite_with(value, offset, ctx.le)
    } else {
        let truncated = value as u32;
        buf.pwrite_with(truncated, offset, ctx.le)
    }
}

/// Width in bytes of a `Word` under `ctx`.
#[inline]
pub fn word_size(ctx: Ctx) -> usize {
    ctx.word_size()
}

/// Helper for chunks that need to append a word-as-bytes to a `Vec<u8>`
/// scratch buffer (GOT/PLT content assembly before the final memcpy).
pub fn push_word(out: &mut Vec<u8>, value: Word, ctx: Ctx) {
    let start = out.len();
    out.resize(start + word_size(ctx), 0);
    write_word(&mut out[start..], 0, value, ctx).expect("word_size sized buffer");
}

/// Writes a word at `*offset` and advances `offset` by `word_size(ctx)`,
/// mirroring scroll's `gwrite_with` calling convention for the chunks
/// that interleave words with fixed-width fields (e.g. `.gnu.hash`'s
/// bloom filter words, which are pointer-sized but sit between 32-bit
/// header fields).
pub fn push_word_at(buf: &mut [u8], offset: &mut usize, value: Word, ctx: Ctx) -> scroll::Result<()> {
    write_word(buf, *offset, value, ctx)?;
    *offset += word_size(ctx);
    Ok(())
}

pub trait PwriteWord {
    fn pwrite_word(&mut self, value: Word, offset: usize, ctx: Ctx) -> scroll::Result<usize>;
}

impl PwriteWord for [u8] {
    fn pwrite_word(&mut self, value: Word, offset: usize, ctx: Ctx) -> scroll::Result<usize> {
        write_word(self, offset, value, ctx)
    }
}

// Keep scroll's TryIntoCtx in scope for call sites that write raw u32/u64
// fields (e_flags, sh_link, ...) directly via `pwrite_with`.
#[allow(unused_imports)]
use TryIntoCtx as _TryIntoCtx;
