//! Foreign handle registry for the systray tray-icon wrapper.
//!
//! A tray is created on the Rust side through [`Systray`], which registers
//! the platform object and receives an opaque 64-bit handle. That handle is
//! what foreign callers (Go, C, Crystal, anything with a C FFI) hold. They
//! extend and release the tray's lifetime through two exported functions
//! and never see a pointer.
//!
//! # Thread Safety
//!
//! Every operation, Rust or C, may be called from any thread. See
//! [`registry`] for the locking scheme.
//!
//! # Memory Management
//!
//! - A handle handed out with [`Systray::share`] carries one claim, which
//!   must be released with `systray_Decref`
//! - Each `systray_Incref` takes one more claim, released the same way
//! - The owning [`Systray`] holds its own claim and releases it on drop
//! - The tray is destroyed when the last claim goes, or when the process
//!   registry is drained by [`global::shutdown`]
//!
//! # Configuration
//!
//! The process registry reads JSON from `SYSTRAY_REGISTRY_CONFIG`, e.g.
//! `{"id_strategy": "sequential", "initial_capacity": 4}`.

pub mod config;
pub mod error;
mod export;
pub mod global;
pub mod handle;
pub mod registry;
pub mod tray;

// Re-export the public surface
pub use config::{CONFIG_ENV_VAR, RegistryConfig};
pub use error::{RegistryError, Result};
pub use export::{systray_Decref, systray_Incref};
pub use handle::{HandleId, HandleIdGenerator, IdStrategy};
pub use registry::{HandleRegistry, RefEntry, Release};
pub use tray::{NativeTray, Systray, TrayObject, TrayRegistry};


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tray {
        destroyed: Arc<AtomicUsize>,
    }

    impl NativeTray for Tray {
        fn destroy(&self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_create_share_and_release() {
        let _guard = test_support::lock();
        let registry = global::get_or_init();
        global::shutdown();

        let destroyed = Arc::new(AtomicUsize::new(0));
        let systray = Systray::new_in_process(Tray {
            destroyed: Arc::clone(&destroyed),
        });
        let handle = systray.share().unwrap();
        assert_ne!(handle, 0);

        // The foreign side takes one more claim of its own.
        systray_Incref(handle);
        assert_eq!(registry.refcount(systray.handle()), Some(3));

        drop(systray);
        systray_Decref(handle);
        assert_eq!(registry.len(), 1);
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);

        systray_Decref(handle);
        assert_eq!(registry.len(), 0);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_destroys_outstanding_trays() {
        let _guard = test_support::lock();
        global::get_or_init();
        global::shutdown();

        let destroyed = Arc::new(AtomicUsize::new(0));
        let trays: Vec<_> = (0..3)
            .map(|_| {
                Systray::new_in_process(Tray {
                    destroyed: Arc::clone(&destroyed),
                })
            })
            .collect();
        systray_Incref(trays[0].handle().as_raw());

        assert_eq!(global::shutdown(), 3);
        assert_eq!(destroyed.load(Ordering::SeqCst), 3);

        // Late releases after the drain are no-ops.
        systray_Decref(trays[0].handle().as_raw());
        drop(trays);
        assert_eq!(destroyed.load(Ordering::SeqCst), 3);
    }
}
