//! Compressed section wrapper (spec §4.14): a `Chdr` header followed by
//! the compressed payload, `SHF_COMPRESSED` set on the section flags
//! and `sh_addralign` forced to 1.

use super::ChunkMeta;
use crate::container::Ctx;
use crate::elf::section_header::ShFlags;
use scroll::Pwrite;

pub const ELFCOMPRESS_ZLIB: u32 = 1;
pub const ELFCOMPRESS_ZSTD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgo {
    Zlib,
    Zstd,
}

/// `Elf64_Chdr`/`Elf32_Chdr` (spec §4.14).
#[derive(Debug, Clone, Copy, Default)]
pub struct Chdr {
    pub ch_type: u32,
    pub ch_size: u64,
    pub ch_addralign: u64,
}

impl Chdr {
    pub fn size(ctx: Ctx) -> usize {
        if ctx.is_64() { 24 } else { 12 }
    }

    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.ch_type, &mut off, ctx.le)?;
        if ctx.is_64() {
            buf.gwrite_with(0u32, &mut off, ctx.le)?; // ch_reserved
            buf.gwrite_with(self.ch_size, &mut off, ctx.le)?;
            buf.gwrite_with(self.ch_addralign, &mut off, ctx.le)?;
        } else {
            buf.gwrite_with(self.ch_size as u32, &mut off, ctx.le)?;
            buf.gwrite_with(self.ch_addralign as u32, &mut off, ctx.le)?;
        }
        Ok(off)
    }
}

#[derive(Debug, Clone)]
pub struct CompressedChunk {
    pub algo: CompressionAlgo,
    pub uncompressed: Vec<u8>,
    pub uncompressed_align: u64,
    compressed: Vec<u8>,
}

impl CompressedChunk {
    pub fn new(algo: CompressionAlgo, uncompressed: Vec<u8>, uncompressed_align: u64) -> Self {
        CompressedChunk { algo, uncompressed, uncompressed_align, compressed: Vec::new() }
    }

    fn compress(&self) -> Vec<u8> {
        match self.algo {
            #[cfg(feature = "zlib")]
            CompressionAlgo::Zlib => {
                use flate2::write::ZlibEncoder;
                use flate2::Compression;
                use std::io::Write;
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(&self.uncompressed).expect("in-memory write");
                enc.finish().expect("in-memory write")
            }
            #[cfg(not(feature = "zlib"))]
            CompressionAlgo::Zlib => self.uncompressed.clone(),
            #[cfg(feature = "zstd")]
            CompressionAlgo::Zstd => zstd::stream::encode_all(&self.uncompressed[..], 0).expect("in-memory write"),
            #[cfg(not(feature = "zstd"))]
            CompressionAlgo::Zstd => self.uncompressed.clone(),
        }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        self.compressed = self.compress();
        meta.shdr.sh_flags |= ShFlags::COMPRESSED.bits();
        meta.shdr.sh_addralign = 1;
    }

    pub fn copy_buf(&self, buf: &mut [u8]) -> crate::error::Result<()> {
        let ctx = crate::container::Ctx::new(crate::container::Container::Big, scroll::Endian::Little);
        let hdr = Chdr {
            ch_type: match self.algo {
                CompressionAlgo::Zlib => ELFCOMPRESS_ZLIB,
                CompressionAlgo::Zstd => ELFCOMPRESS_ZSTD,
            },
            ch_size: self.uncompressed.len() as u64,
            ch_addralign: self.uncompressed_align,
        };
        let hdr_size = Chdr::size(ctx);
        hdr.write_to(&mut buf[..hdr_size], ctx)?;
        buf[hdr_size..hdr_size + self.compressed.len()].copy_from_slice(&self.compressed);
        Ok(())
    }

    pub fn total_size(&self, ctx: Ctx) -> usize {
        Chdr::size(ctx) + self.compressed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_flag_and_addralign_are_set() {
        let mut chunk = CompressedChunk::new(CompressionAlgo::Zlib, vec![0u8; 4096], 8);
        let mut meta = ChunkMeta::new(".debug_info");
        chunk.update_shdr(&mut meta);
        assert!(meta.shdr.sh_flags & ShFlags::COMPRESSED.bits() as u64 != 0);
        assert_eq!(meta.shdr.sh_addralign, 1);
    }

    #[test]
    fn header_records_uncompressed_size_and_alignment() {
        let ctx = Ctx::new(crate::container::Container::Big, scroll::Endian::Little);
        let chunk = CompressedChunk::new(CompressionAlgo::Zlib, vec![0xAAu8; 100], 16);
        let hdr = Chdr { ch_type: ELFCOMPRESS_ZLIB, ch_size: 100, ch_addralign: 16 };
        let mut buf = vec![0u8; Chdr::size(ctx)];
        hdr.write_to(&mut buf, ctx).unwrap();
        assert_eq!(u32::from_le_bytes(buf[0..4].try_into().unwrap()), ELFCOMPRESS_ZLIB);
        let _ = chunk;
    }
}
