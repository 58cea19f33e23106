//! Driver-facing configuration (SPEC_FULL §B.3).
//!
//! `LinkOptions` is the subset of driver configuration the
//! output-chunk core actually reads; CLI parsing and driver
//! orchestration stay out of scope (spec §1). This mirrors the
//! teacher's pattern of threading one options/context record through
//! the whole crate (Design Notes: "Global `Context` passed to almost
//! every function").

use crate::profile::TargetProfile;

/// `.note.gnu.build-id` generation mode (spec §4.15/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildIdMode {
    #[default]
    None,
    /// Deterministic digest (SHA-1/SHA-256) of the output's contents.
    Hash,
    /// Fixed content, e.g. supplied explicitly by the driver.
    Fixed([u8; 20]),
    /// A fresh random id, not reproducible across links.
    Uuid,
}

/// `--hash-style` (spec §4.5): which hash table(s) to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashStyle {
    Sysv,
    #[default]
    Gnu,
    Both,
}

/// Plain data record, constructed by the (out-of-scope) driver and
/// borrowed by every chunk for the duration of one link.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    pub pie: bool,
    pub shared: bool,
    /// `--emit-relocs`.
    pub relocatable: bool,
    /// `-z now`: resolve all bindings eagerly, no lazy PLT.
    pub now: bool,
    /// `--no-rosegment`: don't split a read-only PT_LOAD from the
    /// executable one.
    pub no_rosegment: bool,
    pub pack_relative_relocs: bool,
    pub enable_new_dtags: bool,
    pub build_id: BuildIdMode,
    pub compress_debug_sections: bool,
    pub gdb_index: bool,
    pub hash_style: HashStyle,
    /// Extra `DT_NULL` entries left in the dynamic section for
    /// post-link rewriting (spec §4.10).
    pub spare_dynamic_null_count: usize,
    /// Sizes `MergedSection`'s shard count and the `.gdb_index` hash
    /// map (SPEC_FULL §C), following the original's
    /// `get_cpu_count()`-derived sizing instead of a hardcoded constant.
    pub shard_count: usize,
}

impl LinkOptions {
    pub fn rosegment(&self) -> bool {
        !self.no_rosegment
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        LinkOptions {
            pie: false,
            shared: false,
            relocatable: false,
            now: false,
            no_rosegment: false,
            pack_relative_relocs: false,
            enable_new_dtags: true,
            build_id: BuildIdMode::default(),
            compress_debug_sections: false,
            gdb_index: false,
            hash_style: HashStyle::default(),
            spare_dynamic_null_count: 0,
            shard_count: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

/// The full driver-facing context: target profile plus link options,
/// threaded by shared reference through `construct`/`update_shdr`/
/// `copy_buf`.
#[derive(Debug, Clone)]
pub struct Context {
    pub profile: TargetProfile,
    pub options: LinkOptions,
}

impl Context {
    pub fn new(profile: TargetProfile, options: LinkOptions) -> Self {
        Context { profile, options }
    }

    pub fn ctx(&self) -> crate::container::Ctx {
        self.profile.ctx()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_enable_new_dtags_and_rosegment() {
        let opts = LinkOptions::default();
        assert!(opts.enable_new_dtags);
        assert!(opts.rosegment());
        assert!(opts.shard_count >= 1);
    }

    #[test]
    fn no_rosegment_flips_rosegment_query() {
        let mut opts = LinkOptions::default();
        opts.no_rosegment = true;
        assert!(!opts.rosegment());
    }
}
