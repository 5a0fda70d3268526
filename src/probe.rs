//! Capability probe.
//!
//! Decides once whether the rendering surface can load handles as documents,
//! which fixes how HTML is delivered:
//!
//! ```text
//! Uninitialized --ready()--> Probing --ok--> Ready(strategy)
//!                               |
//!                               +--err--> Uninitialized (error returned to caller)
//! ```
//!
//! HTML requests await [`CapabilityProbe::ready`]; the strategy is never
//! readable before the check has settled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::content::mime::types;
use crate::error::ServeError;
use crate::registry::HandleRegistry;

/// How HTML reaches the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServingStrategy {
    /// Register the markup under a handle and hand out the handle
    HandleUrl,
    /// Hand out the markup itself for in-place injection
    InlineMarkup,
}

impl ServingStrategy {
    pub fn uses_handles(self) -> bool {
        self == Self::HandleUrl
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::HandleUrl => "handle",
            Self::InlineMarkup => "inline",
        }
    }
}

impl From<bool> for ServingStrategy {
    fn from(supports_handles: bool) -> Self {
        if supports_handles {
            Self::HandleUrl
        } else {
            Self::InlineMarkup
        }
    }
}

/// Observable probe state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    Uninitialized,
    Probing,
    Ready(ServingStrategy),
}

/// The rendering surface being probed.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Can the surface load a generated handle as a top-level document?
    async fn supports_handle_documents(&self) -> Result<bool>;
}

/// Surface with a known answer (configured strategy).
#[derive(Debug, Clone, Copy)]
pub struct FixedSurface(pub bool);

#[async_trait]
impl Surface for FixedSurface {
    async fn supports_handle_documents(&self) -> Result<bool> {
        Ok(self.0)
    }
}

/// Surface that loads handles straight from the registry.
///
/// Registers a probe document, resolves it back through its handle and
/// removes it again.
pub struct RegistrySurface {
    registry: Arc<HandleRegistry>,
}

impl RegistrySurface {
    const PROBE_PATH: &'static str = "/.live-preview/probe.html";
    const PROBE_BODY: &'static str = "<!doctype html><title>probe</title>";

    pub fn new(registry: Arc<HandleRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Surface for RegistrySurface {
    async fn supports_handle_documents(&self) -> Result<bool> {
        let handle = self
            .registry
            .replace(Self::PROBE_PATH, Self::PROBE_BODY, types::HTML);
        let loaded = self
            .registry
            .payload_of(&handle)
            .is_some_and(|payload| payload.mime == types::HTML && &*payload.body == Self::PROBE_BODY);
        self.registry.invalidate(Self::PROBE_PATH);
        Ok(loaded)
    }
}

/// Marks a surface check as running until dropped, including when the
/// waiting future is cancelled.
struct ProbingFlag<'a>(&'a AtomicBool);

impl<'a> ProbingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ProbingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One-shot serving strategy detection.
pub struct CapabilityProbe {
    surface: Arc<dyn Surface>,
    strategy: OnceCell<ServingStrategy>,
    probing: AtomicBool,
}

impl CapabilityProbe {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            surface,
            strategy: OnceCell::new(),
            probing: AtomicBool::new(false),
        }
    }

    /// Probe with a fixed answer.
    pub fn fixed(strategy: ServingStrategy) -> Self {
        Self::new(Arc::new(FixedSurface(strategy.uses_handles())))
    }

    /// Wait for the serving strategy, running the surface check if needed.
    ///
    /// Concurrent callers share one in-flight check. A failed check leaves the
    /// strategy unset and is reported to every waiting caller's own call.
    pub async fn ready(&self) -> Result<ServingStrategy, ServeError> {
        self.strategy
            .get_or_try_init(|| async {
                let supported = {
                    let _probing = ProbingFlag::raise(&self.probing);
                    self.surface.supports_handle_documents().await
                };

                match supported {
                    Ok(supported) => {
                        let strategy = ServingStrategy::from(supported);
                        crate::log!("probe"; "serving html as {}", strategy.name());
                        Ok(strategy)
                    }
                    Err(e) => {
                        crate::log!("error"; "capability probe failed: {:#}", e);
                        Err(ServeError::Probe(e.into()))
                    }
                }
            })
            .await
            .copied()
    }

    /// Strategy if the probe has settled.
    pub fn strategy(&self) -> Option<ServingStrategy> {
        self.strategy.get().copied()
    }

    pub fn state(&self) -> StrategyState {
        match self.strategy.get() {
            Some(strategy) => StrategyState::Ready(*strategy),
            None if self.probing.load(Ordering::SeqCst) => StrategyState::Probing,
            None => StrategyState::Uninitialized,
        }
    }
}
