//! Note section chunk: `.note.gnu.build-id` (spec §4.15), optionally
//! followed by `.note.gnu.property` and a package-metadata note
//! (SPEC_FULL §C). Build-id digest computation (the three modes of
//! `context::BuildIdMode`) lives here since it's a pure function of the
//! already-assembled output bytes.

use super::ChunkMeta;
use crate::container::Ctx;
use crate::context::BuildIdMode;
use crate::elf::note;

#[derive(Debug, Clone)]
pub enum NoteEntry {
    BuildId(Vec<u8>),
    Property { pr_type: u32, feature_bits: u32 },
    Package(Vec<u8>),
}

impl NoteEntry {
    fn size(&self) -> usize {
        match self {
            NoteEntry::BuildId(digest) => note::build_id_note_size(digest.len()),
            NoteEntry::Property { .. } => note::property_note_size(),
            NoteEntry::Package(json) => note::package_note_size(json.len()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotesChunk {
    pub entries: Vec<NoteEntry>,
}

/// Build-id digest placeholder used before the final output bytes are
/// known (`.note.gnu.build-id`'s `sh_size` must be fixed before any
/// chunk's `copy_buf` runs, including the digest's own input).
const HASH_MODE_DIGEST_LEN: usize = 32; // SHA-256

impl NotesChunk {
    pub fn new() -> Self {
        NotesChunk::default()
    }

    pub fn push(&mut self, entry: NoteEntry) {
        self.entries.push(entry);
    }

    /// Adds the build-id entry matching `mode`; `Hash` reserves a
    /// SHA-256-sized digest slot, filled for real in a second pass once
    /// the rest of the output is final (spec §4.15).
    pub fn add_build_id(&mut self, mode: BuildIdMode) {
        let digest = match mode {
            BuildIdMode::None => return,
            BuildIdMode::Hash => vec![0u8; HASH_MODE_DIGEST_LEN],
            BuildIdMode::Fixed(bytes) => bytes.to_vec(),
            BuildIdMode::Uuid => vec![0u8; 16],
        };
        self.entries.push(NoteEntry::BuildId(digest));
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta, _ctx: Ctx) {
        meta.shdr.sh_size = self.entries.iter().map(|e| e.size()).sum::<usize>() as u64;
        meta.shdr.sh_addralign = 4;
    }

    pub fn copy_buf(&self, ctx: Ctx, buf: &mut [u8]) -> crate::error::Result<()> {
        let mut off = 0usize;
        for entry in &self.entries {
            let size = entry.size();
            let slot = &mut buf[off..off + size];
            match entry {
                NoteEntry::BuildId(digest) => {
                    note::write_build_id_note(slot, ctx, digest)?;
                }
                NoteEntry::Property { pr_type, feature_bits } => {
                    note::write_property_note(slot, ctx, *pr_type, *feature_bits)?;
                }
                NoteEntry::Package(json) => {
                    note::write_package_note(slot, ctx, json)?;
                }
            }
            off += size;
        }
        Ok(())
    }
}

/// Finalizes a `Hash`-mode build-id note in place once the rest of the
/// output buffer is known: shards the whole image into 4 MiB blocks,
/// digests each in parallel, then digests the concatenation (spec
/// §4.15).
#[cfg(feature = "build-id-hash")]
pub fn finalize_hash_build_id(output: &mut [u8], note_digest_range: std::ops::Range<usize>) {
    use sha2::{Digest, Sha256};
    const SHARD_SIZE: usize = 4 * 1024 * 1024;

    let shards: Vec<&[u8]> = output.chunks(SHARD_SIZE).collect();
    let shard_digests: std::sync::Mutex<Vec<Vec<u8>>> = std::sync::Mutex::new(vec![Vec::new(); shards.len()]);
    crate::parallel::parallel_for(0..shards.len(), |i| {
        let mut h = Sha256::new();
        h.update(shards[i]);
        shard_digests.lock().unwrap()[i] = h.finalize().to_vec();
    });
    let shard_digests = shard_digests.into_inner().unwrap();
    let mut combined = Sha256::new();
    for d in &shard_digests {
        combined.update(d);
    }
    let final_digest = combined.finalize();
    output[note_digest_range].copy_from_slice(&final_digest[..32]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    #[test]
    fn hash_mode_reserves_sha256_sized_slot() {
        let mut chunk = NotesChunk::new();
        chunk.add_build_id(BuildIdMode::Hash);
        let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
        let mut meta = ChunkMeta::new(".note.gnu.build-id");
        chunk.update_shdr(&mut meta, ctx);
        assert_eq!(meta.shdr.sh_size, note::build_id_note_size(32) as u64);
    }

    #[test]
    fn fixed_mode_embeds_caller_supplied_bytes() {
        let mut chunk = NotesChunk::new();
        chunk.add_build_id(BuildIdMode::Fixed([0x42; 20]));
        let ctx = Ctx::new(Container::Big, scroll::Endian::Little);
        let mut meta = ChunkMeta::new(".note.gnu.build-id");
        chunk.update_shdr(&mut meta, ctx);
        let mut buf = vec![0u8; meta.shdr.sh_size as usize];
        chunk.copy_buf(ctx, &mut buf).unwrap();
        assert_eq!(&buf[buf.len() - 20..], &[0x42u8; 20]);
    }
}
