use super::error::BufferError;

/// Translates virtual index values into physical vertex indices.
pub trait IndexResolver {
    /// Changes whenever any translation may have changed.
    fn generation(&self) -> Result<u64, BufferError>;

    /// Translates `indices` into `out` (cleared first). Values that address no
    /// live vertex are written as `0`; returns how many there were.
    fn resolve_into(&self, indices: &[u32], out: &mut Vec<u32>) -> Result<usize, BufferError>;
}

/// Values are already physical.
#[derive(Debug, Copy, Clone, Default)]
pub struct Identity;

impl IndexResolver for Identity {
    fn generation(&self) -> Result<u64, BufferError> {
        Ok(0)
    }

    fn resolve_into(&self, indices: &[u32], out: &mut Vec<u32>) -> Result<usize, BufferError> {
        out.clear();
        out.extend_from_slice(indices);
        Ok(0)
    }
}
