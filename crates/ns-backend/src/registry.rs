//! Backend descriptors and the startup registry.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::{Backend, BackendError, BackendInit, BackendResult, Capabilities, NullBackend};

/// Builds a backend from its supplied inputs.
pub type BackendConstructor = fn(&BackendInit<'_>) -> eyre::Result<Box<dyn Backend>>;

/// A registered backend kind.
#[derive(Clone)]
pub struct BackendDescriptor {
    id: String,
    capabilities: Capabilities,
    construct: BackendConstructor,
}

impl BackendDescriptor {
    pub fn new(id: impl Into<String>, capabilities: Capabilities, construct: BackendConstructor) -> Self {
        Self {
            id: id.into(),
            capabilities,
            construct,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Start an initialiser requesting this backend's capabilities.
    pub const fn initializer<'a>(&self) -> BackendInit<'a> {
        BackendInit::new(self.capabilities)
    }

    /// Run the constructor and hand back a ready backend.
    ///
    /// Errors and panics raised by the constructor are both turned into
    /// [`BackendError::Fault`]; this is the only place a backend panic is
    /// caught.
    pub fn finalize(&self, init: BackendInit<'_>) -> BackendResult<Box<dyn Backend>> {
        let missing = init.missing();
        if !missing.is_empty() {
            return Err(BackendError::MissingCapability {
                id: self.id.clone(),
                missing,
            });
        }

        let built = panic::catch_unwind(AssertUnwindSafe(|| (self.construct)(&init)));
        let backend = match built {
            Ok(Ok(backend)) => backend,
            Ok(Err(err)) => {
                warn!(backend = %self.id, "backend initialisation failed: {err:#}");
                return Err(BackendError::Fault(format!("{err:#}")));
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!(backend = %self.id, "backend initialisation panicked: {msg}");
                return Err(BackendError::Fault(msg));
            }
        };

        if !backend.is_valid() {
            return Err(BackendError::NotReady(self.id.clone()));
        }

        debug!(backend = %self.id, "backend finalised");
        Ok(backend)
    }
}

impl core::fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "backend panicked during initialisation".to_string()
    }
}

/// Ordered list of backend kinds, built once at startup and passed by
/// reference to whoever compiles simulations.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<BackendDescriptor>,
}

impl BackendRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the backends that ship with this crate.
    #[must_use]
    pub fn with_builtin() -> Self {
        Self {
            backends: vec![NullBackend::descriptor()],
        }
    }

    /// Append a backend kind. Ids are matched exactly and must be unique.
    pub fn register(&mut self, descriptor: BackendDescriptor) -> BackendResult<()> {
        if self.get(descriptor.id()).is_some() {
            return Err(BackendError::DuplicateId(descriptor.id));
        }
        self.backends.push(descriptor);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BackendDescriptor> {
        self.backends.iter().find(|b| b.id == id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(BackendDescriptor::id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
