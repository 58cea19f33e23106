//! `.gdb_index` (spec §4.12). Not grounded in the teacher (no Mach-O/PE
//! analogue); built from spec §4.12's description of gdb's own index
//! format, taken as-is per the Open Question recorded in DESIGN.md.
//!
//! Little-endian regardless of host, per spec §4.12.

use super::ChunkMeta;
use crate::context::Context;

pub const GDB_INDEX_VERSION: u32 = 8;

#[derive(Debug, Clone, Copy)]
pub struct CuEntry {
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct AddressAreaEntry {
    pub low: u64,
    pub high: u64,
    pub cu_index: u32,
}

/// One symbol's CU-attribute list before packing into the constant
/// pool (spec §4.12's "attr" vector, one `u32` per (cu_index, kind)).
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub cu_attrs: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct GdbIndexChunk {
    pub cus: Vec<CuEntry>,
    pub areas: Vec<AddressAreaEntry>,
    pub symbols: Vec<SymbolEntry>,

    hash_table: Vec<(u32, u32, u32)>, // (hash, name_offset, cu_vector_offset), 0 = empty slot
    constant_pool: Vec<u8>,
}

/// gdb's own `.gdb_index` symbol hash (`dwarf2read.c`'s
/// `mapped_index_string_hash`): case-folded so `Foo`/`foo` probe the
/// same bucket, not djb2.
fn gdb_index_hash(s: &str) -> u32 {
    let mut h: u32 = 0;
    for b in s.bytes() {
        h = h.wrapping_mul(67).wrapping_add(b.to_ascii_lowercase() as u32).wrapping_sub(113);
    }
    h
}

impl GdbIndexChunk {
    pub fn new() -> Self {
        GdbIndexChunk::default()
    }

    pub fn add_cu(&mut self, offset: u64, length: u64) {
        self.cus.push(CuEntry { offset, length });
    }

    pub fn add_area(&mut self, low: u64, high: u64, cu_index: u32) {
        self.areas.push(AddressAreaEntry { low, high, cu_index });
    }

    pub fn add_symbol(&mut self, name: impl Into<String>, cu_attrs: Vec<u32>) {
        self.symbols.push(SymbolEntry { name: name.into(), cu_attrs });
    }

    /// Builds the symbol hash table (double-hashing, `step = (hash &
    /// mask) | 1`, spec §4.12) and the constant pool (CU-vectors then
    /// names, as gdb's reader expects).
    pub fn construct(&mut self, _ctx: &Context) -> crate::error::Result<()> {
        let num_slots = (self.symbols.len() * 4 / 3).next_power_of_two().max(4);
        let mask = (num_slots - 1) as u32;
        self.hash_table = vec![(0, 0, 0); num_slots];
        self.constant_pool.clear();

        let mut entries = Vec::with_capacity(self.symbols.len());
        for sym in &self.symbols {
            let cu_vec_offset = self.constant_pool.len() as u32;
            self.constant_pool.extend_from_slice(&(sym.cu_attrs.len() as u32).to_le_bytes());
            for attr in &sym.cu_attrs {
                self.constant_pool.extend_from_slice(&attr.to_le_bytes());
            }
            let name_offset = self.constant_pool.len() as u32;
            self.constant_pool.extend_from_slice(sym.name.as_bytes());
            self.constant_pool.push(0);
            entries.push((gdb_index_hash(&sym.name), name_offset, cu_vec_offset));
        }

        for (hash, name_offset, cu_vec_offset) in entries {
            let mut slot = hash & mask;
            let step = (hash & mask) | 1;
            loop {
                if self.hash_table[slot as usize].1 == 0 && self.hash_table[slot as usize].2 == 0 {
                    self.hash_table[slot as usize] = (hash, name_offset, cu_vec_offset);
                    break;
                }
                slot = (slot.wrapping_add(step)) & mask;
            }
        }
        Ok(())
    }

    fn header_size(&self) -> usize {
        // version, cu_list_off, types_off, addr_off, symtab_off, pool_off
        6 * 4
    }

    fn cu_list_bytes(&self) -> usize {
        self.cus.len() * 16
    }

    fn area_bytes(&self) -> usize {
        self.areas.len() * 20
    }

    fn symtab_bytes(&self) -> usize {
        self.hash_table.len() * 8
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        let size = self.header_size() + self.cu_list_bytes() + self.area_bytes() + self.symtab_bytes() + self.constant_pool.len();
        meta.shdr.sh_size = size as u64;
        meta.shdr.sh_addralign = 1;
    }

    pub fn copy_buf(&self, buf: &mut [u8]) -> crate::error::Result<()> {
        let cu_list_off = self.header_size();
        let types_off = cu_list_off + self.cu_list_bytes();
        let addr_off = types_off; // types list is always empty (spec §4.12)
        let symtab_off = addr_off + self.area_bytes();
        let pool_off = symtab_off + self.symtab_bytes();

        buf[0..4].copy_from_slice(&GDB_INDEX_VERSION.to_le_bytes());
        buf[4..8].copy_from_slice(&(cu_list_off as u32).to_le_bytes());
        buf[8..12].copy_from_slice(&(types_off as u32).to_le_bytes());
        buf[12..16].copy_from_slice(&(addr_off as u32).to_le_bytes());
        buf[16..20].copy_from_slice(&(symtab_off as u32).to_le_bytes());
        buf[20..24].copy_from_slice(&(pool_off as u32).to_le_bytes());

        let mut off = cu_list_off;
        for cu in &self.cus {
            buf[off..off + 8].copy_from_slice(&cu.offset.to_le_bytes());
            buf[off + 8..off + 16].copy_from_slice(&cu.length.to_le_bytes());
            off += 16;
        }

        let mut off = addr_off;
        for area in &self.areas {
            buf[off..off + 8].copy_from_slice(&area.low.to_le_bytes());
            buf[off + 8..off + 16].copy_from_slice(&area.high.to_le_bytes());
            buf[off + 16..off + 20].copy_from_slice(&area.cu_index.to_le_bytes());
            off += 20;
        }

        let mut off = symtab_off;
        for (_, name_offset, cu_vec_offset) in &self.hash_table {
            buf[off..off + 4].copy_from_slice(&name_offset.to_le_bytes());
            buf[off + 4..off + 8].copy_from_slice(&cu_vec_offset.to_le_bytes());
            off += 8;
        }

        buf[pool_off..pool_off + self.constant_pool.len()].copy_from_slice(&self.constant_pool);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LinkOptions;
    use crate::profile::TargetProfile;

    #[test]
    fn empty_index_has_zero_sized_types_and_areas() {
        let mut chunk = GdbIndexChunk::new();
        chunk.add_cu(0, 100);
        let ctx = Context::new(TargetProfile::x86_64(), LinkOptions::default());
        chunk.construct(&ctx).unwrap();
        let mut meta = ChunkMeta::new(".gdb_index");
        chunk.update_shdr(&mut meta);
        let mut buf = vec![0u8; meta.shdr.sh_size as usize];
        chunk.copy_buf(&mut buf).unwrap();
        let version = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        assert_eq!(version, GDB_INDEX_VERSION);
    }

    #[test]
    fn symbol_table_round_trips_name_and_cu_vector_offsets() {
        let mut chunk = GdbIndexChunk::new();
        chunk.add_symbol("main", vec![0x01]);
        chunk.add_symbol("helper", vec![0x01, 0x02]);
        let ctx = Context::new(TargetProfile::x86_64(), LinkOptions::default());
        chunk.construct(&ctx).unwrap();
        assert!(chunk.hash_table.iter().filter(|(h, _, _)| *h != 0).count() >= 2);
    }
}
