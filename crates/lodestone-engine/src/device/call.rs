//! Call-scoped GPU error attribution.
//!
//! Backends post problems to a thread-local debug channel with [`report`].
//! [`call`] empties the channel, runs one GPU operation, drains whatever was
//! posted meanwhile, and turns the last error into a [`GpuError`] tagged with
//! the caller's source location. Non-error messages are logged.
//!
//! Calls nest: an inner `call` only sees messages posted inside it, and the
//! outer call's pending messages survive it.
//!
//! wgpu's own errors enter the channel through [`capture_device_errors`]; wgpu
//! raises them on the thread that issued the failing operation.

use std::cell::{Cell, RefCell};
use std::panic::Location;
use std::sync::Arc;

use super::error::{DebugMessage, GpuError, Severity};

thread_local! {
    static CHANNEL: RefCell<Vec<DebugMessage>> = const { RefCell::new(Vec::new()) };
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Messages kept per thread between calls; the oldest go first.
const CHANNEL_CAPACITY: usize = 256;

/// Posts a message to the current thread's debug channel.
pub fn report(message: DebugMessage) {
    CHANNEL.with(|c| {
        let mut channel = c.borrow_mut();
        if channel.len() == CHANNEL_CAPACITY {
            let dropped = channel.remove(0);
            log::warn!("GPU debug channel full; dropped: {}", dropped.message);
        }
        channel.push(message);
    });
}

/// Replaces wgpu's panicking default handler: errors from `device` are posted
/// to the debug channel and surface from the enclosing [`call`].
pub fn capture_device_errors(device: &wgpu::Device) {
    device.on_uncaptured_error(Arc::new(|err: wgpu::Error| {
        log::trace!("wgpu error posted: {err}");
        report(DebugMessage::from_wgpu(&err));
    }));
}

fn take_all() -> Vec<DebugMessage> {
    CHANNEL.with(|c| std::mem::take(&mut *c.borrow_mut()))
}

/// Runs `f` as one wrapped GPU call.
#[track_caller]
pub fn call<T>(f: impl FnOnce() -> T) -> Result<T, GpuError> {
    let location = Location::caller();

    let depth = DEPTH.with(|d| {
        let v = d.get();
        d.set(v + 1);
        v
    });

    let outer = take_all();
    if depth == 0 {
        for msg in outer.iter().filter(|m| m.is_error()) {
            log::error!("GPU error outside a wrapped call [{};{}][{}]: {}", msg.source, msg.kind, msg.id, msg.message);
        }
    }

    let out = f();

    let drained = take_all();
    if depth > 0 {
        CHANNEL.with(|c| *c.borrow_mut() = outer);
    }
    DEPTH.with(|d| d.set(depth));

    let mut last_error = None;
    for msg in drained {
        if msg.is_error() {
            if let Some(prev) = last_error.replace(msg) {
                log::debug!("superseded GPU error at {location}: {}", prev.message);
            }
        } else {
            let level = match msg.severity {
                Severity::High => log::Level::Warn,
                Severity::Medium | Severity::Low => log::Level::Info,
                Severity::Notification => log::Level::Debug,
            };
            log::log!(level, "[{location}][{};{};{}][{}]: {}", msg.source, msg.kind, msg.severity, msg.id, msg.message);
        }
    }

    match last_error {
        Some(msg) => Err(GpuError::from_message(msg, location)),
        None => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MessageKind, MessageSource};

    fn note(message: &str) -> DebugMessage {
        DebugMessage {
            source: MessageSource::Api,
            kind: MessageKind::Performance,
            severity: Severity::Low,
            id: 99,
            message: message.to_string(),
        }
    }

    #[test]
    fn clean_call_returns_value() {
        assert_eq!(call(|| 41 + 1).unwrap(), 42);
    }

    #[test]
    fn last_error_wins_and_carries_call_site() {
        let line = line!() + 1;
        let err = call(|| {
            report(DebugMessage::api_error(1, "first"));
            report(note("just a hint"));
            report(DebugMessage::api_error(2, "second"));
        })
        .unwrap_err();

        assert_eq!(err.id, 2);
        assert_eq!(err.message, "second");
        assert_eq!(err.location.line(), line);
        assert!(err.location.file().ends_with("call.rs"));
    }

    #[test]
    fn stale_messages_are_not_attributed_to_the_next_call() {
        report(DebugMessage::api_error(3, "left over"));
        assert!(call(|| ()).is_ok());
    }

    #[test]
    fn nested_call_keeps_outer_messages() {
        let err = call(|| {
            report(DebugMessage::api_error(10, "outer"));
            let inner = call(|| ());
            assert!(inner.is_ok());
        })
        .unwrap_err();
        assert_eq!(err.id, 10);
    }

    #[test]
    fn channel_keeps_only_the_newest_messages() {
        take_all();
        for i in 0..(CHANNEL_CAPACITY as u32 + 5) {
            report(note(&i.to_string()));
        }
        let kept = take_all();
        assert_eq!(kept.len(), CHANNEL_CAPACITY);
        assert_eq!(kept[0].message, "5");
    }

    #[test]
    fn wgpu_error_reported_inside_a_call_fails_it() {
        let err = call(|| {
            report(DebugMessage::from_wgpu(&wgpu::Error::Validation {
                source: Box::new(std::fmt::Error),
                description: "Render pipeline is invalid".to_string(),
            }))
        })
        .unwrap_err();
        assert_eq!(err.id, crate::device::ids::WGPU_VALIDATION);
        assert!(err.to_string().contains("call.rs"));
        assert!(err.to_string().ends_with("Render pipeline is invalid"));
    }

    #[test]
    fn non_error_messages_do_not_fail_the_call() {
        assert!(call(|| report(note("slow path"))).is_ok());
    }
}
