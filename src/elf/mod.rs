//! On-disk ELF record shapes and the `chunk`-level constants that
//! reference them.
//!
//! Every submodule owns one gABI structure: the raw constants it
//! defines, a unified `u64`-widened record struct, and a
//! `write_to(buf, ctx)` method that narrows to the target word size at
//! serialization time (spec Design Notes §9).

pub mod constants_header;
pub mod header;
pub mod section_header;
pub mod program_header;
pub mod sym;
pub mod dynamic;
pub mod rela;
pub mod rela_aarch64;
pub mod note;
pub mod gnu_hash;
pub mod sysv_hash;
pub mod symver;
pub mod strtab;

pub use header::Ehdr;
pub use section_header::Shdr;
pub use program_header::Phdr;
pub use sym::Sym;
pub use dynamic::Dyn;
pub use rela::{Rel, Rela};
pub use note::Nhdr;
pub use strtab::{Strtab, StrtabBuilder};
