//! Error taxonomy for the output-chunk core (spec §7).
//!
//! Replaces the teacher's unmaintained `quick_error!` invocation (not
//! present in the teacher's own dependency table) with `thiserror`,
//! the idiom the rest of the retrieval pack (`novafacing-elf`) already
//! uses for ELF-shaped errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Scroll(#[from] scroll::Error),

    /// A fatal input inconsistency: malformed DWARF, an impossible
    /// alignment, a cycle in CIE uniquification. Carries a diagnostic
    /// naming the offending chunk or input file.
    #[error("malformed input in {stage}: {reason}")]
    Malformed { stage: &'static str, reason: String },

    /// An internal invariant that should be unreachable in correct
    /// code (dynamic-section size changed between `update_shdr` and
    /// `copy_buf`, a chunk's byte range not disjoint from another's).
    /// This indicates a linker bug, not bad user input.
    #[error("internal invariant violated in {stage}: {reason}")]
    Invariant { stage: &'static str, reason: String },
}

impl Error {
    pub fn malformed(stage: &'static str, reason: impl Into<String>) -> Self {
        let err = Error::Malformed { stage, reason: reason.into() };
        log_fatal(&err);
        err
    }

    pub fn invariant(stage: &'static str, reason: impl Into<String>) -> Self {
        let err = Error::Invariant { stage, reason: reason.into() };
        log_fatal(&err);
        err
    }
}

#[cfg(feature = "log")]
fn log_fatal(err: &Error) {
    log::error!("{err}");
}

#[cfg(not(feature = "log"))]
fn log_fatal(_err: &Error) {}

pub type Result<T> = std::result::Result<T, Error>;
