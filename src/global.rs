//! The process tray registry.
//!
//! Constructed once, either explicitly through [`init`] or lazily on first
//! use, and drained by [`shutdown`]. Code that can take the registry as an
//! `Arc` should; the exported C entry points are the only callers that need
//! to find it without being handed one.

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::tray::TrayRegistry;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{info, warn};

static PROCESS_REGISTRY: OnceCell<Arc<TrayRegistry>> = OnceCell::new();

/// Construct the process registry from `config`.
///
/// Fails with [`RegistryError::AlreadyInitialized`] if it already exists.
pub fn init(config: &RegistryConfig) -> Result<Arc<TrayRegistry>> {
    let registry = Arc::new(TrayRegistry::with_config(config));
    PROCESS_REGISTRY
        .set(Arc::clone(&registry))
        .map_err(|_| RegistryError::AlreadyInitialized)?;
    info!(id_strategy = ?config.id_strategy, "process tray registry initialized");
    Ok(registry)
}

/// Construct the process registry from `SYSTRAY_REGISTRY_CONFIG`.
pub fn init_from_env() -> Result<Arc<TrayRegistry>> {
    init(&RegistryConfig::from_env()?)
}

/// The process registry, constructing it from the environment on first use.
/// A malformed environment config falls back to defaults.
pub fn get_or_init() -> Arc<TrayRegistry> {
    let registry = PROCESS_REGISTRY.get_or_init(|| {
        let config = RegistryConfig::from_env().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring registry config from environment");
            RegistryConfig::default()
        });
        info!(id_strategy = ?config.id_strategy, "process tray registry initialized");
        Arc::new(TrayRegistry::with_config(&config))
    });
    Arc::clone(registry)
}

/// The process registry, if it has been constructed.
pub fn registry() -> Option<Arc<TrayRegistry>> {
    PROCESS_REGISTRY.get().cloned()
}

/// Borrow the process registry without touching its `Arc` count.
pub(crate) fn current() -> Option<&'static TrayRegistry> {
    PROCESS_REGISTRY.get().map(Arc::as_ref)
}

/// Drain the process registry, releasing every tracked tray. Returns how
/// many were still live. Handles issued before this call become unknown.
pub fn shutdown() -> usize {
    let Some(registry) = current() else {
        return 0;
    };
    let drained = registry.drain();
    info!(drained, "process tray registry drained");
    drained
}
