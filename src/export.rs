//! Claim management entry points for foreign callers.
//!
//! Both functions accept any value. An unknown, stale or zero handle is
//! logged and otherwise ignored; there is no error channel back to the
//! caller. Every claim a caller takes (the handle it was given, plus one per
//! `systray_Incref`) must be matched by exactly one `systray_Decref`.

#![allow(non_snake_case)]

use crate::global;
use crate::handle::HandleId;
use tracing::warn;

/// Take an additional claim on a tray.
///
/// # Parameters
///
/// - `handle`: Handle previously handed out by the tray wrapper
///
/// Safe to call from any thread.
#[unsafe(no_mangle)]
pub extern "C" fn systray_Incref(handle: u64) {
    let id = HandleId::from_raw(handle);
    let Some(registry) = global::current() else {
        warn!(handle = %id, "incref before tray registry exists");
        return;
    };
    if let Err(e) = registry.incref(id) {
        warn!(handle = %id, error = %e, "ignoring foreign incref");
    }
}

/// Give up one claim on a tray. The tray is destroyed when its last claim
/// is released.
///
/// # Parameters
///
/// - `handle`: Handle previously handed out by the tray wrapper
///
/// Safe to call from any thread.
#[unsafe(no_mangle)]
pub extern "C" fn systray_Decref(handle: u64) {
    let id = HandleId::from_raw(handle);
    let Some(registry) = global::current() else {
        warn!(handle = %id, "decref before tray registry exists");
        return;
    };
    if let Err(e) = registry.decref(id) {
        warn!(handle = %id, error = %e, "ignoring foreign decref");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use crate::tray::{NativeTray, Systray};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct CountingTray(Arc<AtomicUsize>);

    impl NativeTray for CountingTray {
        fn destroy(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_bogus_handles_are_ignored() {
        let _guard = test_support::lock();
        let registry = global::get_or_init();
        global::shutdown();

        systray_Incref(0);
        systray_Decref(0);
        systray_Incref(0xdead_beef);
        systray_Decref(0xdead_beef);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_foreign_claims_keep_tray_alive() {
        let _guard = test_support::lock();
        let registry = global::get_or_init();
        global::shutdown();

        let destroyed = Arc::new(AtomicUsize::new(0));
        let systray = Systray::new_in_process(CountingTray(Arc::clone(&destroyed)));
        let raw = systray.handle().as_raw();

        systray_Incref(raw);
        assert_eq!(registry.refcount(systray.handle()), Some(2));
        drop(systray);
        assert_eq!(registry.len(), 1);
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);

        systray_Decref(raw);
        assert!(registry.is_empty());
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);

        // Extra release from a confused caller.
        systray_Decref(raw);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_foreign_threads_balance_claims() {
        let _guard = test_support::lock();
        let registry = global::get_or_init();
        global::shutdown();

        let destroyed = Arc::new(AtomicUsize::new(0));
        let systray = Systray::new_in_process(CountingTray(Arc::clone(&destroyed)));
        let raw = systray.handle().as_raw();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        systray_Incref(raw);
                        systray_Decref(raw);
                    }
                });
            }
        });
        assert_eq!(registry.refcount(systray.handle()), Some(1));

        drop(systray);
        assert!(registry.is_empty());
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }
}
