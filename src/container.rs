//! Word size and endianness context threaded through every chunk.
//!
//! Mirrors the `Ctx` used throughout the teacher crate's `mach`/`pe`
//! readers (`crate::container::Ctx`): a small copyable record carrying
//! the two axes every on-disk ELF record depends on. The core keeps
//! `Addr`/`Word` as native `u64` in memory (see `crate::word`) and only
//! consults `Ctx` at the point bytes are actually emitted.

use scroll::Endian;

/// 32- or 64-bit object container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Little,
    Big,
}

impl Container {
    #[inline]
    pub fn is_big(self) -> bool {
        matches!(self, Container::Big)
    }

    #[inline]
    pub fn pointer_size(self) -> usize {
        match self {
            Container::Little => 4,
            Container::Big => 8,
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::Big
    }
}

/// Combination of container (word width) and byte-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ctx {
    pub container: Container,
    pub le: Endian,
}

impl Ctx {
    pub fn new(container: Container, le: Endian) -> Self {
        Ctx { container, le }
    }

    #[inline]
    pub fn is_64(&self) -> bool {
        self.container.is_big()
    }

    #[inline]
    pub fn is_little_endian(&self) -> bool {
        self.le.is_little()
    }

    #[inline]
    pub fn word_size(&self) -> usize {
        self.container.pointer_size()
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Ctx {
            container: Container::Big,
            le: Endian::Little,
        }
    }
}

impl From<Container> for Ctx {
    fn from(container: Container) -> Self {
        Ctx { container, le: Endian::Little }
    }
}
