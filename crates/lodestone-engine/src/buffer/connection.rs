use std::sync::Arc;

use bytemuck::Pod;

use super::error::{BufferError, OutOfRangeAccess};
use super::sync::{HandleId, Key, SynchronizedBuffer};

/// Exclusive handle to one element group of a [`SynchronizedBuffer`].
///
/// Created by [`SynchronizedBuffer::connect`]. Not `Clone`: dropping it erases
/// the group, and two owners would erase it twice.
pub struct Connection<T: Pod + Send, const N: usize> {
    buffer: Arc<SynchronizedBuffer<T, N>>,
    handle: HandleId,
    key: Key,
    /// Last resolved position and the buffer generation it was resolved at.
    cached: (u64, usize),
}

impl<T: Pod + Send, const N: usize> Connection<T, N> {
    pub(crate) fn new(
        buffer: Arc<SynchronizedBuffer<T, N>>,
        handle: HandleId,
        key: Key,
        generation: u64,
        position: usize,
    ) -> Self {
        Self {
            buffer,
            handle,
            key,
            cached: (generation, position),
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn buffer(&self) -> &Arc<SynchronizedBuffer<T, N>> {
        &self.buffer
    }

    /// Physical position as of the last update.
    pub fn position(&self) -> usize {
        self.cached.1
    }

    /// Writes this connection's group.
    ///
    /// A group that no longer exists is logged and skipped; only a lock
    /// timeout is returned as an error.
    pub fn update(&mut self, data: [T; N]) -> Result<(), BufferError> {
        let lock = self.buffer.lock_handler(self.handle)?;

        let (generation, position) = self.cached;
        let position = if generation == lock.generation() {
            Some(position)
        } else {
            lock.position_of(self.key)
        };

        let written = match position {
            Some(position) => lock
                .write_at(position, self.key, data)
                .map(|()| (lock.generation(), position)),
            None => Err(OutOfRangeAccess::Key(self.key)),
        };
        drop(lock);

        match written {
            Ok(cached) => self.cached = cached,
            Err(e) => log::warn!("connection update skipped: {e}"),
        }
        Ok(())
    }

    /// Makes virtual indices `[base, base + N)` address this group.
    pub fn bind_index_base(&self, base: u32) -> Result<(), BufferError> {
        self.buffer.bind_index_base(self.key, base)
    }

    /// Copy of this connection's group.
    pub fn get(&self) -> Result<Option<[T; N]>, BufferError> {
        self.buffer.get(self.key)
    }
}

impl<T: Pod + Send, const N: usize> Drop for Connection<T, N> {
    fn drop(&mut self) {
        if let Err(e) = self.buffer.disconnect(self.handle, self.key) {
            log::error!("failed to release buffer group {}: {e}", self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Buf = SynchronizedBuffer<[f32; 2], 4>;

    fn group(v: f32) -> [[f32; 2]; 4] {
        [[v, v]; 4]
    }

    #[test]
    fn update_lands_in_own_slot() {
        let buf = Arc::new(Buf::new());
        let mut a = buf.connect().unwrap();
        let mut b = buf.connect().unwrap();

        a.update(group(1.0)).unwrap();
        b.update(group(2.0)).unwrap();

        assert_eq!(a.get().unwrap(), Some(group(1.0)));
        assert_eq!(b.get().unwrap(), Some(group(2.0)));
    }

    #[test]
    fn compaction_keeps_every_other_group_intact() {
        let buf = Arc::new(Buf::new());
        let mut a = buf.connect().unwrap();
        let mut b = buf.connect().unwrap();
        let mut c = buf.connect().unwrap();
        a.update(group(1.0)).unwrap();
        b.update(group(2.0)).unwrap();
        c.update(group(3.0)).unwrap();

        drop(b);
        c.update(group(30.0)).unwrap();

        assert_eq!(a.get().unwrap(), Some(group(1.0)));
        assert_eq!(c.get().unwrap(), Some(group(30.0)));
        assert_eq!(c.position(), 1);

        let snapshot = buf.read().unwrap();
        let flat: Vec<f32> = snapshot.as_slice().iter().flatten().copied().collect();
        assert_eq!(flat.len(), 16);
        assert!(flat[..8].iter().all(|v| *v == 1.0));
        assert!(flat[8..].iter().all(|v| *v == 30.0));
    }

    #[test]
    fn slot_survives_unrelated_erases() {
        let buf = Arc::new(Buf::new());
        let keep = buf.connect().unwrap();
        let key = keep.key();
        for _ in 0..5 {
            let tmp = buf.connect().unwrap();
            drop(tmp);
        }
        assert_eq!(keep.key(), key);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn drop_erases_group() {
        let buf = Arc::new(Buf::new());
        let a = buf.connect().unwrap();
        let key = a.key();
        drop(a);

        assert!(buf.is_empty());
        assert_eq!(buf.get(key).unwrap(), None);
    }

    #[test]
    fn update_after_external_erase_is_swallowed() {
        let buf = Arc::new(Buf::new());
        let mut a = buf.connect().unwrap();
        buf.erase(a.key()).unwrap();

        assert!(a.update(group(5.0)).is_ok());
        assert!(buf.is_empty());
    }
}
