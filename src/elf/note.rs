//! Note record header and the GNU note kinds this core emits: build-id
//! (spec §4.15), the AArch64/x86 property note, and the gold-style
//! package metadata note (SPEC_FULL §C).

use crate::container::Ctx;
use scroll::Pwrite;

pub const NT_GNU_ABI_TAG: u32 = 1;
pub const ELF_NOTE_ABI: u32 = NT_GNU_ABI_TAG;
pub const ELF_NOTE_OS_LINUX: u32 = 0;
pub const ELF_NOTE_OS_GNU: u32 = 1;
pub const ELF_NOTE_OS_SOLARIS2: u32 = 2;
pub const ELF_NOTE_OS_FREEBSD: u32 = 3;

pub const NT_GNU_HWCAP: u32 = 2;
/// Build ID bits as generated by `ld --build-id`; the descriptor is any
/// nonzero number of bytes.
pub const NT_GNU_BUILD_ID: u32 = 3;
pub const NT_GNU_GOLD_VERSION: u32 = 4;
/// AArch64/x86 program property note (spec §4.15, SPEC_FULL §C).
pub const NT_GNU_PROPERTY_TYPE_0: u32 = 5;
/// gold/lld package-metadata note, JSON descriptor.
pub const NT_FDO_PACKAGING_METADATA: u32 = 0xcafe1a7e;

/// `GNU_PROPERTY_X86_FEATURE_1_AND` feature bits.
pub const GNU_PROPERTY_X86_FEATURE_1_AND: u32 = 0xc0000002;
/// `GNU_PROPERTY_AARCH64_FEATURE_1_AND` feature bits.
pub const GNU_PROPERTY_AARCH64_FEATURE_1_AND: u32 = 0xc0000000;

pub fn type_to_str(n_type: u32) -> &'static str {
    match n_type {
        NT_GNU_ABI_TAG => "NT_GNU_ABI_TAG",
        NT_GNU_HWCAP => "NT_GNU_HWCAP",
        NT_GNU_BUILD_ID => "NT_GNU_BUILD_ID",
        NT_GNU_GOLD_VERSION => "NT_GNU_GOLD_VERSION",
        NT_GNU_PROPERTY_TYPE_0 => "NT_GNU_PROPERTY_TYPE_0",
        NT_FDO_PACKAGING_METADATA => "NT_FDO_PACKAGING_METADATA",
        _ => "NT_UNKNOWN",
    }
}

/// Note record header. The gABI defines a 64-bit variant too, but every
/// producer in practice (GNU ld, gold, lld, mold) emits the 4-byte
/// field layout regardless of ELF class, so this is the only `Nhdr`
/// the core needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nhdr {
    pub n_namesz: u32,
    pub n_descsz: u32,
    pub n_type: u32,
}

pub const SIZEOF_NHDR: usize = 12;

impl Nhdr {
    pub fn write_to(&self, buf: &mut [u8], ctx: Ctx) -> scroll::Result<usize> {
        let mut off = 0usize;
        buf.gwrite_with(self.n_namesz, &mut off, ctx.le)?;
        buf.gwrite_with(self.n_descsz, &mut off, ctx.le)?;
        buf.gwrite_with(self.n_type, &mut off, ctx.le)?;
        Ok(off)
    }
}

fn aligned_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Serializes a `name\0`-padded, 4-byte-aligned note: header + name +
/// descriptor, each padded to a 4-byte boundary per the gABI.
fn write_note(buf: &mut [u8], ctx: Ctx, name: &[u8], n_type: u32, desc: &[u8]) -> scroll::Result<usize> {
    let namesz = name.len() + 1;
    let hdr = Nhdr { n_namesz: namesz as u32, n_descsz: desc.len() as u32, n_type };
    let mut off = hdr.write_to(buf, ctx)?;
    buf[off..off + name.len()].copy_from_slice(name);
    off += name.len();
    buf[off] = 0;
    off += 1;
    off = SIZEOF_NHDR + aligned_len(namesz);
    let desc_start = off;
    buf[desc_start..desc_start + desc.len()].copy_from_slice(desc);
    off += desc.len();
    Ok(aligned_len(off))
}

/// Serialized size of a note with the given name and descriptor
/// lengths, header included.
pub fn note_size(name_len: usize, desc_len: usize) -> usize {
    aligned_len(SIZEOF_NHDR + aligned_len(name_len + 1) + desc_len)
}

/// `.note.gnu.build-id`: `"GNU\0"` name, digest descriptor (spec §4.15).
pub fn write_build_id_note(buf: &mut [u8], ctx: Ctx, digest: &[u8]) -> scroll::Result<usize> {
    write_note(buf, ctx, b"GNU", NT_GNU_BUILD_ID, digest)
}

pub fn build_id_note_size(digest_len: usize) -> usize {
    note_size(3, digest_len)
}

/// `.note.gnu.property`: `"GNU\0"` name, one `(pr_type, pr_datasz,
/// pr_data)` property entry carrying the feature bitmask.
pub fn write_property_note(buf: &mut [u8], ctx: Ctx, pr_type: u32, feature_bits: u32) -> scroll::Result<usize> {
    let mut desc = [0u8; 16];
    let mut off = 0usize;
    desc.gwrite_with(pr_type, &mut off, ctx.le).map_err(|e: scroll::Error| e)?;
    desc.gwrite_with(4u32, &mut off, ctx.le)?;
    desc.gwrite_with(feature_bits, &mut off, ctx.le)?;
    desc.gwrite_with(0u32, &mut off, ctx.le)?; // pad to 8-byte alignment
    write_note(buf, ctx, b"GNU", NT_GNU_PROPERTY_TYPE_0, &desc[..off])
}

pub fn property_note_size() -> usize {
    note_size(3, 16)
}

/// A `gold`/`lld`-style package-metadata note; descriptor is a raw JSON
/// byte string the caller has already serialized.
pub fn write_package_note(buf: &mut [u8], ctx: Ctx, json: &[u8]) -> scroll::Result<usize> {
    write_note(buf, ctx, b"FDO", NT_FDO_PACKAGING_METADATA, json)
}

pub fn package_note_size(json_len: usize) -> usize {
    note_size(3, json_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use scroll::Endian;

    #[test]
    fn build_id_note_roundtrips_header() {
        let ctx = Ctx::new(Container::Big, Endian::Little);
        let digest = [0xaau8; 20];
        let size = build_id_note_size(digest.len());
        let mut buf = vec![0u8; size];
        let written = write_build_id_note(&mut buf, ctx, &digest).unwrap();
        assert_eq!(written, size);
        assert_eq!(&buf[0..4], &4u32.to_le_bytes());
        assert_eq!(&buf[4..8], &20u32.to_le_bytes());
        assert_eq!(&buf[8..12], &NT_GNU_BUILD_ID.to_le_bytes());
        assert_eq!(&buf[12..15], b"GNU");
    }

    #[test]
    fn property_note_has_expected_size() {
        let ctx = Ctx::new(Container::Big, Endian::Little);
        let mut buf = vec![0u8; property_note_size()];
        let written = write_property_note(&mut buf, ctx, GNU_PROPERTY_X86_FEATURE_1_AND, 0b11).unwrap();
        assert_eq!(written, property_note_size());
    }
}
