//! String tables: a byte-offset read side for parsing existing input,
//! and a content-addressed write-side builder for `.strtab`/`.dynstr`
//! (spec §4.3). All three tables share this builder; they differ only
//! in which names get interned into them.

use core::fmt;
use core::str;
use std::borrow::Cow;
use std::collections::HashMap;

/// A string table format indexed by byte offsets (not member index).
pub struct Strtab<'a> {
    bytes: Cow<'a, [u8]>,
    delim: u8,
}

#[inline(always)]
fn get_str(idx: usize, bytes: &[u8], delim: u8) -> &str {
    let mut i = idx;
    let len = bytes.len();
    if i >= len {
        return "";
    }
    let mut byte = bytes[i];
    if byte == delim {
        return "";
    }
    while byte != delim && i < len {
        byte = bytes[i];
        i += 1;
    }
    if i < len || bytes[i - 1] == delim {
        i -= 1;
    }
    str::from_utf8(&bytes[idx..i]).unwrap()
}

impl<'a> Default for Strtab<'a> {
    fn default() -> Strtab<'static> {
        Strtab { bytes: Cow::Owned(vec![]), delim: 0x0 }
    }
}

impl<'a> fmt::Debug for Strtab<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "delim: {:?} {:?}", self.delim as char, str::from_utf8(&self.bytes))
    }
}

impl<'a> Strtab<'a> {
    pub fn new(bytes: &'a [u8], delim: u8) -> Self {
        Strtab { bytes: Cow::Borrowed(bytes), delim }
    }

    pub fn get(&'a self, idx: usize) -> &'a str {
        get_str(idx, &self.bytes, self.delim)
    }

    pub fn to_vec(&self) -> Vec<String> {
        let len = self.bytes.len();
        let mut strings = Vec::new();
        let mut i = 0;
        while i < len {
            let string = self.get(i);
            i += string.len() + 1;
            strings.push(string.to_string());
        }
        strings
    }
}

/// Content-addressed string pool builder. All three string-bearing
/// chunks (`.shstrtab`, `.strtab`, `.dynstr`) use one of these: offset
/// 0 is always the empty string, and a name already present as a
/// trailing suffix of an interned string is reused rather than
/// duplicated (e.g. interning `"bar"` after `"foobar"` returns an
/// offset into the existing bytes).
#[derive(Debug, Clone)]
pub struct StrtabBuilder {
    bytes: Vec<u8>,
    /// Maps an interned string to its offset, for exact-match reuse.
    offsets: HashMap<String, u32>,
}

impl StrtabBuilder {
    pub fn new() -> Self {
        StrtabBuilder { bytes: vec![0], offsets: HashMap::new() }
    }

    /// Interns `s`, returning its byte offset. Exact duplicates are
    /// deduplicated via the offset map; suffix sharing (a name that is
    /// the tail of an already-interned longer name) is also detected.
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&off) = self.offsets.get(s) {
            return off;
        }
        if let Some(off) = self.find_suffix(s) {
            self.offsets.insert(s.to_string(), off);
            return off;
        }
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        self.offsets.insert(s.to_string(), offset);
        offset
    }

    fn find_suffix(&self, s: &str) -> Option<u32> {
        let needle = s.as_bytes();
        if self.bytes.len() < needle.len() + 1 {
            return None;
        }
        let start = self.bytes.len() - needle.len() - 1;
        if self.bytes[start + needle.len()] == 0 && &self.bytes[start..start + needle.len()] == needle {
            let preceded_by_boundary = start == 0 || self.bytes[start - 1] == 0;
            if preceded_by_boundary {
                return Some(start as u32);
            }
        }
        None
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.len() <= 1
    }
}

impl Default for StrtabBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_always_offset_zero() {
        let mut b = StrtabBuilder::new();
        assert_eq!(b.intern(""), 0);
    }

    #[test]
    fn exact_duplicate_reused() {
        let mut b = StrtabBuilder::new();
        let a = b.intern("foo");
        let b2 = b.intern("foo");
        assert_eq!(a, b2);
    }

    #[test]
    fn suffix_of_previous_string_is_shared() {
        let mut b = StrtabBuilder::new();
        let foobar = b.intern("foobar");
        let bar = b.intern("bar");
        assert_eq!(bar as usize, foobar as usize + 3);
    }

    #[test]
    fn strtab_get_round_trips() {
        let mut b = StrtabBuilder::new();
        b.intern("printf");
        b.intern("memmove");
        let strtab = Strtab::new(b.data(), 0);
        assert_eq!(strtab.get(0), "");
        assert_eq!(strtab.get(1), "printf");
    }

    #[test]
    fn to_vec_matches_goblin_teacher_fixture() {
        let bytes = b"\0printf\0memmove\0busta";
        let strtab = Strtab::new(bytes, 0);
        let vec = strtab.to_vec();
        assert_eq!(vec, vec!["", "printf", "memmove", "busta"]);
    }
}
