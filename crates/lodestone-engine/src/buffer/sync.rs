use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytemuck::Pod;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::connection::Connection;
use super::error::{BufferError, OutOfRangeAccess};
use super::resolve::IndexResolver;

/// How long any buffer operation waits for the lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Stable identity of one element group. Never reused within a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Key(u64);

impl Key {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index into the advisory lock table. Recycled once its connection is gone.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HandleId(usize);

impl HandleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Change record published by a compacting erase: the group behind `key`
/// moved from physical position `from` to `to`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Relocation {
    pub key: Key,
    pub from: usize,
    pub to: usize,
}

// ── storage ───────────────────────────────────────────────────────────────

struct Store<T, const N: usize> {
    /// Physical order; one group per live key.
    groups: Vec<Mutex<[T; N]>>,
    /// position -> key
    keys: Vec<Key>,
    /// position -> handle allowed to write the group
    owners: Vec<HandleId>,
    /// key -> position
    positions: HashMap<Key, usize>,
    /// virtual index base -> key
    aliases: BTreeMap<u32, Key>,
    next_key: u64,
    generation: u64,
    /// Contiguous copy of `groups` produced by `read()`.
    staging: Vec<T>,
}

impl<T: Pod, const N: usize> Store<T, N> {
    fn new() -> Self {
        Self {
            groups: Vec::new(),
            keys: Vec::new(),
            owners: Vec::new(),
            positions: HashMap::new(),
            aliases: BTreeMap::new(),
            next_key: 0,
            generation: 0,
            staging: Vec::new(),
        }
    }

    fn insert(&mut self, owner: HandleId, data: [T; N]) -> (Key, usize) {
        let key = Key(self.next_key);
        self.next_key += 1;

        let position = self.groups.len();
        self.groups.push(Mutex::new(data));
        self.keys.push(key);
        self.owners.push(owner);
        self.positions.insert(key, position);

        (key, position)
    }

    /// Swap-with-last removal. `None` if the key is not live.
    fn remove(&mut self, key: Key) -> Option<Option<Relocation>> {
        let position = self.positions.remove(&key)?;
        let last = self.groups.len() - 1;

        self.groups.swap_remove(position);
        self.keys.swap_remove(position);
        self.owners.swap_remove(position);
        self.aliases.retain(|_, k| *k != key);
        self.generation += 1;

        if position == last {
            return Some(None);
        }

        let moved = self.keys[position];
        self.positions.insert(moved, position);
        Some(Some(Relocation {
            key: moved,
            from: last,
            to: position,
        }))
    }

    fn pack(&mut self) {
        self.staging.clear();
        self.staging.reserve(self.groups.len() * N);
        for group in &mut self.groups {
            self.staging.extend_from_slice(group.get_mut());
        }
    }

    fn resolve(&self, index: u32) -> Option<u32> {
        let (&base, &key) = self.aliases.range(..=index).next_back()?;
        let offset = index - base;
        if offset as usize >= N {
            return None;
        }
        let position = *self.positions.get(&key)?;
        Some((position * N) as u32 + offset)
    }

    fn resolve_into(&self, indices: &[u32], out: &mut Vec<u32>) -> usize {
        out.clear();
        out.reserve(indices.len());
        let mut missing = 0;
        for &index in indices {
            match self.resolve(index) {
                Some(p) => out.push(p),
                None => {
                    missing += 1;
                    out.push(0);
                }
            }
        }
        missing
    }
}

// ── advisory lock table ───────────────────────────────────────────────────

#[derive(Default)]
struct HandlerTable {
    locked: Vec<bool>,
    free: Vec<usize>,
}

impl HandlerTable {
    fn acquire(&mut self) -> HandleId {
        match self.free.pop() {
            Some(id) => {
                self.locked[id] = false;
                HandleId(id)
            }
            None => {
                self.locked.push(false);
                HandleId(self.locked.len() - 1)
            }
        }
    }

    fn release(&mut self, id: HandleId) {
        if let Some(flag) = self.locked.get_mut(id.0) {
            *flag = false;
            self.free.push(id.0);
        }
    }

    fn set(&mut self, id: HandleId, locked: bool) {
        if let Some(flag) = self.locked.get_mut(id.0) {
            *flag = locked;
        }
    }

    fn busy(&self) -> usize {
        self.locked.iter().filter(|l| **l).count()
    }
}

// ── buffer ────────────────────────────────────────────────────────────────

/// A shared, compacting store of `N`-element groups of `T`.
///
/// Shared through `Arc`; producers hold a [`Connection`] each. The draw path
/// calls [`read`](Self::read) to obtain a packed, locked snapshot for upload.
///
/// A connection dropped while the lock is unavailable queues its group; the
/// next structural operation or snapshot erases it before doing anything
/// else, and only then recycles the handle.
pub struct SynchronizedBuffer<T: Pod, const N: usize> {
    store: RwLock<Store<T, N>>,
    handlers: Mutex<HandlerTable>,
    /// Disconnects whose erase timed out.
    orphans: Mutex<Vec<(HandleId, Key)>>,
    live: AtomicUsize,
    lock_timeout: Duration,
}

impl<T: Pod + Send, const N: usize> SynchronizedBuffer<T, N> {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            store: RwLock::new(Store::new()),
            handlers: Mutex::new(HandlerTable::default()),
            orphans: Mutex::new(Vec::new()),
            live: AtomicUsize::new(0),
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Number of live groups, not counting orphans awaiting erase.
    pub fn len(&self) -> usize {
        let orphans = self.orphans.lock().len();
        self.live.load(Ordering::Acquire).saturating_sub(orphans)
    }

    /// Groups whose connection is gone but which are still stored.
    pub fn orphaned(&self) -> usize {
        self.orphans.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while a structural operation or a snapshot holds the global lock.
    pub fn is_locked(&self) -> bool {
        self.store.is_locked_exclusive()
    }

    /// Number of handles currently inside a per-handle write.
    pub fn busy_handlers(&self) -> usize {
        self.handlers.lock().busy()
    }

    fn timeout(&self, op: &'static str) -> BufferError {
        BufferError::LockTimeout {
            op,
            waited: self.lock_timeout,
            busy: self.busy_handlers(),
        }
    }

    fn write_store(&self, op: &'static str) -> Result<RwLockWriteGuard<'_, Store<T, N>>, BufferError> {
        let mut store = match self.store.try_write() {
            Some(store) => store,
            None => {
                log::trace!("{op}: waiting for {} handler(s) to finish writing", self.busy_handlers());
                self.store
                    .try_write_for(self.lock_timeout)
                    .ok_or_else(|| self.timeout(op))?
            }
        };
        self.erase_orphans(&mut store);
        Ok(store)
    }

    fn erase_orphans(&self, store: &mut Store<T, N>) {
        let orphans = std::mem::take(&mut *self.orphans.lock());
        if orphans.is_empty() {
            return;
        }
        let mut handlers = self.handlers.lock();
        for (handle, key) in orphans {
            if store.remove(key).is_some() {
                log::debug!("erased orphaned group {key}");
            }
            handlers.release(handle);
        }
        drop(handlers);
        self.live.store(store.groups.len(), Ordering::Release);
    }

    fn read_store(&self, op: &'static str) -> Result<RwLockReadGuard<'_, Store<T, N>>, BufferError> {
        self.store
            .try_read_for(self.lock_timeout)
            .ok_or_else(|| self.timeout(op))
    }

    /// Reserves a zeroed group and returns the connection that owns it.
    pub fn connect(self: &Arc<Self>) -> Result<Connection<T, N>, BufferError> {
        let mut store = self.write_store("connect")?;
        let handle = self.handlers.lock().acquire();
        let (key, position) = store.insert(handle, [T::zeroed(); N]);
        let generation = store.generation;
        self.live.store(store.groups.len(), Ordering::Release);
        drop(store);

        log::trace!("connected {key} at position {position} (handle {})", handle.0);
        Ok(Connection::new(Arc::clone(self), handle, key, generation, position))
    }

    /// Enters the advisory lock for `handle` and returns the guard that
    /// performs per-handle writes. Dropping the guard unlocks the handle.
    pub fn lock_handler(&self, handle: HandleId) -> Result<HandlerLock<'_, T, N>, BufferError> {
        let store = self.read_store("lock_handler")?;
        self.handlers.lock().set(handle, true);
        Ok(HandlerLock {
            buffer: self,
            store,
            handle,
        })
    }

    /// Removes the group behind `key`, moving the last group into its place.
    ///
    /// Returns the relocation of the moved group, if any.
    pub fn erase(&self, key: Key) -> Result<Option<Relocation>, BufferError> {
        let mut store = self.write_store("erase")?;
        let relocation = store
            .remove(key)
            .ok_or(OutOfRangeAccess::Key(key))?;
        self.live.store(store.groups.len(), Ordering::Release);
        drop(store);

        match relocation {
            Some(r) => log::trace!("erased {key}; {} moved {} -> {}", r.key, r.from, r.to),
            None => log::trace!("erased {key}"),
        }
        Ok(relocation)
    }

    /// Erases `key` and gives its handle back to the lock table.
    ///
    /// On a lock timeout the pair becomes an orphan: the handle stays taken
    /// and the group is erased by the next operation that gets the lock.
    pub(crate) fn disconnect(&self, handle: HandleId, key: Key) -> Result<Option<Relocation>, BufferError> {
        match self.erase(key) {
            Err(e @ BufferError::LockTimeout { .. }) => {
                log::warn!("deferring erase of {key}: {e}");
                self.orphans.lock().push((handle, key));
                Ok(None)
            }
            result => {
                self.handlers.lock().release(handle);
                result
            }
        }
    }

    /// Makes virtual indices `[base, base + N)` address the group behind `key`.
    pub fn bind_index_base(&self, key: Key, base: u32) -> Result<(), BufferError> {
        let mut store = self.write_store("bind_index_base")?;
        if !store.positions.contains_key(&key) {
            return Err(OutOfRangeAccess::Key(key).into());
        }
        if let Some(previous) = store.aliases.insert(base, key) {
            if previous != key {
                log::warn!("index base {base} rebound from {previous} to {key}");
            }
        }
        store.generation += 1;
        Ok(())
    }

    /// Copy of the group behind `key`.
    pub fn get(&self, key: Key) -> Result<Option<[T; N]>, BufferError> {
        let store = self.read_store("get")?;
        Ok(store.positions.get(&key).map(|&p| *store.groups[p].lock()))
    }

    /// Locks the buffer and packs every group, in physical order, into one
    /// contiguous slice ready for upload.
    ///
    /// Blocks until in-flight handle writes complete. Structural operations
    /// and handle writes wait until the snapshot is dropped.
    pub fn read(&self) -> Result<BufferSnapshot<'_, T, N>, BufferError> {
        let mut store = self.write_store("read")?;
        store.pack();
        Ok(BufferSnapshot { store })
    }
}

impl<T: Pod + Send, const N: usize> Default for SynchronizedBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod + Send, const N: usize> IndexResolver for SynchronizedBuffer<T, N> {
    fn generation(&self) -> Result<u64, BufferError> {
        Ok(self.read_store("generation")?.generation)
    }

    fn resolve_into(&self, indices: &[u32], out: &mut Vec<u32>) -> Result<usize, BufferError> {
        Ok(self.read_store("resolve")?.resolve_into(indices, out))
    }
}

// ── guards ────────────────────────────────────────────────────────────────

/// Advisory lock on one handle, held for the duration of a per-handle write.
pub struct HandlerLock<'a, T: Pod, const N: usize> {
    buffer: &'a SynchronizedBuffer<T, N>,
    store: RwLockReadGuard<'a, Store<T, N>>,
    handle: HandleId,
}

impl<'a, T: Pod + Send, const N: usize> HandlerLock<'a, T, N> {
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn generation(&self) -> u64 {
        self.store.generation
    }

    pub fn position_of(&self, key: Key) -> Option<usize> {
        self.store.positions.get(&key).copied()
    }

    /// Overwrites the group behind `key`, which must belong to this handle.
    pub fn update(&self, key: Key, data: [T; N]) -> Result<(), OutOfRangeAccess> {
        let position = self.position_of(key).ok_or(OutOfRangeAccess::Key(key))?;
        self.write_at(position, key, data)
    }

    /// Overwrites the group at a previously resolved position.
    pub(crate) fn write_at(&self, position: usize, key: Key, data: [T; N]) -> Result<(), OutOfRangeAccess> {
        if self.store.keys.get(position) != Some(&key) {
            return Err(OutOfRangeAccess::Key(key));
        }
        if self.store.owners[position] != self.handle {
            return Err(OutOfRangeAccess::NotOwner {
                key,
                handle: self.handle.0,
            });
        }
        *self.store.groups[position].lock() = data;
        Ok(())
    }

    /// Explicit form of dropping the guard.
    pub fn unlock(self) {}
}

impl<T: Pod, const N: usize> Drop for HandlerLock<'_, T, N> {
    fn drop(&mut self) {
        self.buffer.handlers.lock().set(self.handle, false);
    }
}

/// Locked, packed view of the whole buffer.
///
/// Holds the global lock until dropped.
pub struct BufferSnapshot<'a, T: Pod, const N: usize> {
    store: RwLockWriteGuard<'a, Store<T, N>>,
}

impl<T: Pod, const N: usize> BufferSnapshot<'_, T, N> {
    pub fn as_slice(&self) -> &[T] {
        &self.store.staging
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.store.staging)
    }

    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(self.store.staging.as_slice())
    }

    /// Number of groups in the snapshot.
    pub fn len(&self) -> usize {
        self.store.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.groups.is_empty()
    }

    pub fn position_of(&self, key: Key) -> Option<usize> {
        self.store.positions.get(&key).copied()
    }

    /// Physical element index for a virtual index, if it addresses a live group.
    pub fn resolve(&self, index: u32) -> Option<u32> {
        self.store.resolve(index)
    }
}

impl<T: Pod, const N: usize> IndexResolver for BufferSnapshot<'_, T, N> {
    fn generation(&self) -> Result<u64, BufferError> {
        Ok(self.store.generation)
    }

    fn resolve_into(&self, indices: &[u32], out: &mut Vec<u32>) -> Result<usize, BufferError> {
        Ok(self.store.resolve_into(indices, out))
    }
}
