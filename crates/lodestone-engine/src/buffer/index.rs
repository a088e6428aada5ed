use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::{BufferError, OutOfRangeAccess};
use super::resolve::{Identity, IndexResolver};
use super::upload::{upload, GpuBuffer, UploadKind};

/// Index buffer shared between the producers that reserve indices in it.
pub type SharedIndexBuffer<B> = Arc<parking_lot::Mutex<IndexBuffer<B>>>;

/// Index list with stable ids, uploaded in id order.
///
/// `highest` is a watermark over every value ever inserted; erasing does not
/// lower it, so bases handed out by [`next_base`](Self::next_base) never
/// collide with earlier reservations.
pub struct IndexBuffer<B> {
    values: BTreeMap<u32, u32>,
    next_id: u32,
    highest: Option<u32>,

    backend: B,
    resolver: Option<Arc<dyn IndexResolver + Send + Sync>>,

    scratch: Vec<u32>,
    resolved: Vec<u32>,
    uploaded_generation: Option<u64>,
    dirty: bool,
}

impl<B: GpuBuffer> IndexBuffer<B> {
    /// Values are uploaded as-is.
    pub fn new(backend: B) -> Self {
        Self {
            values: BTreeMap::new(),
            next_id: 0,
            highest: None,
            backend,
            resolver: None,
            scratch: Vec::new(),
            resolved: Vec::new(),
            uploaded_generation: None,
            dirty: false,
        }
    }

    /// Values are virtual and translated through `resolver` on upload.
    pub fn with_resolver(backend: B, resolver: Arc<dyn IndexResolver + Send + Sync>) -> Self {
        Self {
            resolver: Some(resolver),
            ..Self::new(backend)
        }
    }

    pub fn into_shared(self) -> SharedIndexBuffer<B> {
        Arc::new(parking_lot::Mutex::new(self))
    }

    /// Stores `indices` under fresh ids, uploads, and returns the ids.
    pub fn insert<const M: usize>(&mut self, indices: [u32; M]) -> Result<[u32; M], BufferError> {
        let ids = indices.map(|value| {
            let id = self.next_id;
            self.next_id += 1;
            self.values.insert(id, value);
            self.highest = Some(self.highest.map_or(value, |h| h.max(value)));
            id
        });
        self.dirty = true;
        self.update()?;
        Ok(ids)
    }

    /// Overwrites the value behind `id`. Unknown ids are logged and ignored.
    pub fn replace(&mut self, id: u32, value: u32) -> Result<(), BufferError> {
        let Some(slot) = self.values.get_mut(&id) else {
            log::warn!("index replace ignored: {}", OutOfRangeAccess::IndexId(id));
            return Ok(());
        };
        *slot = value;
        self.highest = Some(self.highest.map_or(value, |h| h.max(value)));
        self.dirty = true;
        self.update().map(|_| ())
    }

    /// Removes `ids`. Unknown ids are logged and ignored; `highest` is kept.
    pub fn erase(&mut self, ids: &[u32]) -> Result<(), BufferError> {
        let mut removed = false;
        for &id in ids {
            if self.values.remove(&id).is_some() {
                removed = true;
            } else {
                log::warn!("index erase ignored: {}", OutOfRangeAccess::IndexId(id));
            }
        }
        if !removed {
            return Ok(());
        }
        self.dirty = true;
        self.update().map(|_| ())
    }

    /// Uploads every value in id order through the configured resolver.
    pub fn update(&mut self) -> Result<UploadKind, BufferError> {
        match self.resolver.clone() {
            Some(resolver) => self.upload_through(resolver.as_ref()),
            None => self.upload_through(&Identity),
        }
    }

    /// Uploads through `resolver` unless nothing changed since the last upload.
    pub fn refresh(&mut self, resolver: &dyn IndexResolver) -> Result<UploadKind, BufferError> {
        if !self.dirty && self.uploaded_generation == Some(resolver.generation()?) {
            return Ok(UploadKind::Skipped);
        }
        self.upload_through(resolver)
    }

    fn upload_through(&mut self, resolver: &dyn IndexResolver) -> Result<UploadKind, BufferError> {
        // Generation first: a change racing with the resolve leaves a stale
        // generation behind, which forces the next refresh to upload again.
        let generation = resolver.generation()?;

        self.scratch.clear();
        self.scratch.extend(self.values.values().copied());
        let missing = resolver.resolve_into(&self.scratch, &mut self.resolved)?;
        if missing > 0 {
            log::warn!("{missing} index value(s) address no live vertex; drawing them as vertex 0");
        }

        let kind = upload(&mut self.backend, bytemuck::cast_slice(&self.resolved))?;
        self.uploaded_generation = Some(generation);
        self.dirty = false;
        Ok(kind)
    }

    /// Highest value ever inserted, 0 if none.
    pub fn get_highest(&self) -> u32 {
        self.highest.unwrap_or(0)
    }

    /// First value not yet claimed by any reservation.
    pub fn next_base(&self) -> u32 {
        self.highest.map_or(0, |h| h + 1)
    }

    /// Number of live indices (the draw count).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in id order, before translation.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.values().copied()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{HostBuffer, UploadOp};

    fn ibo() -> IndexBuffer<HostBuffer> {
        IndexBuffer::new(HostBuffer::new())
    }

    // ── ids and watermark ─────────────────────────────────────────────────

    #[test]
    fn insert_returns_sequential_ids() {
        let mut ibo = ibo();
        assert_eq!(ibo.insert([0, 1, 2]).unwrap(), [0, 1, 2]);
        assert_eq!(ibo.insert([2, 3, 0]).unwrap(), [3, 4, 5]);
        assert_eq!(ibo.len(), 6);
    }

    #[test]
    fn next_base_starts_at_zero_and_follows_watermark() {
        let mut ibo = ibo();
        assert_eq!(ibo.next_base(), 0);
        assert_eq!(ibo.get_highest(), 0);

        ibo.insert([0, 1, 2, 2, 3, 0]).unwrap();
        assert_eq!(ibo.get_highest(), 3);
        assert_eq!(ibo.next_base(), 4);
    }

    #[test]
    fn erase_does_not_lower_watermark() {
        let mut ibo = ibo();
        let first = ibo.insert([0, 1, 2]).unwrap();
        let second = ibo.insert([4, 5, 6]).unwrap();
        ibo.erase(&second).unwrap();

        assert_eq!(ibo.next_base(), 7);
        assert_eq!(ibo.values().collect::<Vec<_>>(), vec![0, 1, 2]);
        ibo.erase(&first).unwrap();
        assert!(ibo.is_empty());
        assert_eq!(ibo.next_base(), 7);
    }

    #[test]
    fn replace_unknown_id_is_ignored() {
        let mut ibo = ibo();
        ibo.insert([0, 1]).unwrap();
        ibo.backend_mut().take_ops();

        ibo.replace(9, 5).unwrap();
        assert_eq!(ibo.values().collect::<Vec<_>>(), vec![0, 1]);
        assert!(ibo.backend().ops().is_empty());
    }

    #[test]
    fn replace_overwrites_and_uploads() {
        let mut ibo = ibo();
        let ids = ibo.insert([0, 1]).unwrap();
        ibo.replace(ids[1], 9).unwrap();

        assert_eq!(ibo.backend().to_u32s(), vec![0, 9]);
        assert_eq!(ibo.get_highest(), 9);
    }

    // ── upload sizing ─────────────────────────────────────────────────────

    #[test]
    fn growth_reallocates_then_shrink_writes_sub_range() {
        let mut ibo = ibo();
        let first = ibo.insert([0, 1, 2, 2, 3, 0]).unwrap();
        ibo.insert([4, 5, 6, 6, 7, 4]).unwrap();
        ibo.erase(&first).unwrap();

        assert_eq!(
            ibo.backend().ops(),
            &[
                UploadOp::Reallocate { size: 24 },
                UploadOp::Reallocate { size: 48 },
                UploadOp::Write { offset: 0, len: 24 },
            ]
        );
        assert_eq!(&ibo.backend().to_u32s()[..6], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn unchanged_refresh_is_skipped() {
        let mut ibo = ibo();
        ibo.insert([0, 1, 2]).unwrap();

        assert_eq!(ibo.refresh(&Identity).unwrap(), UploadKind::Skipped);
        assert_eq!(ibo.update().unwrap(), UploadKind::SubRange);
    }
}
