//! `.interp`: the NUL-terminated dynamic linker path feeding `PT_INTERP`
//! (spec §4.2, SPEC_FULL §C).

use super::ChunkMeta;

#[derive(Debug, Clone)]
pub struct InterpChunk {
    pub path: Vec<u8>,
}

impl InterpChunk {
    pub fn new(path: impl Into<String>) -> Self {
        let mut path: Vec<u8> = path.into().into_bytes();
        path.push(0);
        InterpChunk { path }
    }

    pub fn update_shdr(&mut self, meta: &mut ChunkMeta) {
        meta.shdr.sh_size = self.path.len() as u64;
    }

    pub fn copy_buf(&self, buf: &mut [u8]) -> crate::error::Result<()> {
        buf.copy_from_slice(&self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_nul_terminated() {
        let mut chunk = InterpChunk::new("/lib64/ld-linux-x86-64.so.2");
        let mut meta = ChunkMeta::new(".interp");
        chunk.update_shdr(&mut meta);
        let mut buf = vec![0xffu8; meta.shdr.sh_size as usize];
        chunk.copy_buf(&mut buf).unwrap();
        assert_eq!(*buf.last().unwrap(), 0);
        assert_eq!(&buf[..27], b"/lib64/ld-linux-x86-64.so.2");
    }
}
