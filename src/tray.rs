//! Owning wrapper around a platform tray object.

use crate::error::{RegistryError, Result};
use crate::global;
use crate::handle::HandleId;
use crate::registry::{HandleRegistry, RefEntry};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A platform tray implementation.
///
/// Rendering, click handling and menus live entirely behind this trait; the
/// registry only keeps the object alive while someone holds a claim.
pub trait NativeTray: Send + Sync {
    /// Release platform resources. Called exactly once, when the last claim
    /// on the tray is released.
    fn destroy(&self) {}
}

/// Registry entry payload: the boxed platform tray.
pub struct TrayObject {
    native: Box<dyn NativeTray>,
}

impl TrayObject {
    pub fn new(native: impl NativeTray + 'static) -> Self {
        Self {
            native: Box::new(native),
        }
    }

    pub fn native(&self) -> &dyn NativeTray {
        self.native.as_ref()
    }
}

impl Drop for TrayObject {
    fn drop(&mut self) {
        self.native.destroy();
    }
}

impl fmt::Debug for TrayObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrayObject").finish_non_exhaustive()
    }
}

/// Registry holding tray objects.
pub type TrayRegistry = HandleRegistry<TrayObject>;

/// Public handle to a registered tray.
///
/// Construction registers the tray and holds the implicit first claim;
/// dropping the wrapper gives that claim back. Foreign callers that were
/// handed a handle through [`share`](Self::share) keep the tray alive with
/// their own claims, independent of this wrapper.
pub struct Systray {
    id: HandleId,
    registry: Arc<TrayRegistry>,
}

impl Systray {
    /// Register `native` in `registry`.
    pub fn new(registry: Arc<TrayRegistry>, native: impl NativeTray + 'static) -> Self {
        let id = registry.add(TrayObject::new(native));
        Self { id, registry }
    }

    /// Register `native` in the process registry, constructing it on first
    /// use.
    pub fn new_in_process(native: impl NativeTray + 'static) -> Self {
        Self::new(global::get_or_init(), native)
    }

    /// The tray's handle. Does not take a claim.
    pub fn handle(&self) -> HandleId {
        self.id
    }

    /// Take a claim on behalf of a foreign caller and return the raw handle
    /// to give it. The caller owes exactly one `systray_Decref` for it.
    pub fn share(&self) -> Result<u64> {
        self.registry.incref(self.id)?;
        Ok(self.id.as_raw())
    }

    /// The tracked entry, if still registered. `None` only after the
    /// registry was drained underneath this wrapper.
    pub fn native(&self) -> Option<Arc<RefEntry<TrayObject>>> {
        self.registry.get(self.id)
    }

    pub fn registry(&self) -> &Arc<TrayRegistry> {
        &self.registry
    }
}

impl Drop for Systray {
    fn drop(&mut self) {
        match self.registry.decref(self.id) {
            Ok(_) => {}
            // Drained at shutdown while this wrapper was still alive.
            Err(RegistryError::UnknownHandle(_)) => {
                debug!(handle = %self.id, "tray already drained");
            }
            Err(e) => warn!(handle = %self.id, error = %e, "tray release failed"),
        }
    }
}

impl fmt::Debug for Systray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Systray").field("id", &self.id).finish()
    }
}
