//! Cross-thread behavior of the shared vertex store.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use lodestone_engine::buffer::{BufferError, SynchronizedBuffer};

type Store = SynchronizedBuffer<u32, 4>;

#[test]
fn writes_through_distinct_connections_do_not_block_each_other() {
    let buffer = Arc::new(Store::with_lock_timeout(Duration::from_millis(500)));
    let a = buffer.connect().unwrap();
    let mut b = buffer.connect().unwrap();

    let held = buffer.lock_handler(a.handle()).unwrap();
    assert_eq!(buffer.busy_handlers(), 1);

    let start = Instant::now();
    thread::scope(|s| {
        s.spawn(|| b.update([1, 2, 3, 4]).unwrap());
    });
    assert!(start.elapsed() < Duration::from_millis(400));

    drop(held);
    assert_eq!(buffer.busy_handlers(), 0);
    assert_eq!(b.get().unwrap(), Some([1, 2, 3, 4]));
}

#[test]
fn snapshot_waits_for_in_flight_write() {
    let buffer = Arc::new(Store::new());
    let conn = buffer.connect().unwrap();
    let (handle, key) = (conn.handle(), conn.key());
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            let lock = buffer.lock_handler(handle).unwrap();
            barrier.wait();
            thread::sleep(Duration::from_millis(100));
            lock.update(key, [7; 4]).unwrap();
        });

        barrier.wait();
        let start = Instant::now();
        let snapshot = buffer.read().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(80));
        assert_eq!(snapshot.as_slice(), &[7, 7, 7, 7]);
    });
}

#[test]
fn snapshot_gives_up_after_the_lock_timeout() {
    let buffer = Arc::new(Store::with_lock_timeout(Duration::from_millis(50)));
    let conn = buffer.connect().unwrap();
    let held = buffer.lock_handler(conn.handle()).unwrap();

    let result = thread::scope(|s| s.spawn(|| buffer.read().map(|snap| snap.len())).join().unwrap());
    match result {
        Err(BufferError::LockTimeout { op, busy, .. }) => {
            assert_eq!(op, "read");
            assert_eq!(busy, 1);
        }
        other => panic!("expected a lock timeout, got {other:?}"),
    }

    drop(held);
    assert!(buffer.read().is_ok());
}

#[test]
fn producers_on_many_threads_each_keep_their_group() {
    let buffer = Arc::new(Store::new());
    let connections: Vec<_> = (0..8).map(|_| buffer.connect().unwrap()).collect();

    // Even producers finish by dropping their connection, which erases the group.
    let kept: Vec<_> = thread::scope(|s| {
        let workers: Vec<_> = connections
            .into_iter()
            .enumerate()
            .map(|(i, mut conn)| {
                s.spawn(move || {
                    for round in 0..50u32 {
                        conn.update([i as u32, round, 0, 0]).unwrap();
                    }
                    conn.update([i as u32; 4]).unwrap();
                    (i % 2 == 1).then_some(conn)
                })
            })
            .collect();
        workers.into_iter().filter_map(|w| w.join().unwrap()).collect()
    });
    assert_eq!(kept.len(), 4);

    let snapshot = buffer.read().unwrap();
    let mut firsts: Vec<u32> = snapshot.as_slice().chunks(4).map(|g| g[0]).collect();
    firsts.sort_unstable();
    assert_eq!(firsts, [1, 3, 5, 7]);
    assert!(snapshot.as_slice().chunks(4).all(|g| g.iter().all(|&v| v == g[0])));
}

#[test]
fn connection_dropped_during_a_long_snapshot_is_still_erased() {
    let buffer = Arc::new(Store::with_lock_timeout(Duration::from_millis(50)));
    let mut kept = buffer.connect().unwrap();
    kept.update([3; 4]).unwrap();
    let doomed = buffer.connect().unwrap();
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            let snapshot = buffer.read().unwrap();
            barrier.wait();
            thread::sleep(Duration::from_millis(150));
            assert_eq!(snapshot.len(), 2);
        });

        barrier.wait();
        s.spawn(move || drop(doomed)).join().unwrap();
    });

    assert_eq!(buffer.len(), 1);
    let snapshot = buffer.read().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.as_slice(), &[3, 3, 3, 3]);
    drop(snapshot);
    assert_eq!(buffer.orphaned(), 0);

    let fresh = buffer.connect().unwrap();
    assert_ne!(fresh.handle(), kept.handle());
    assert_eq!(buffer.len(), 2);
}
