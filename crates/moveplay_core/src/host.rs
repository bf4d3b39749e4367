//! Host application surface.
//!
//! # Responsibility
//! - Initialize logging and the event bridge before anything else runs.
//! - Expose project listing, creation, opening and removal to the host.
//!
//! # Invariants
//! - `Playground::setup` is the only constructor, so no project operation
//!   can run before the event observer is wired.
//! - Runtime failures reach the host unchanged.

use crate::config::SetupOptions;
use crate::core_version;
use crate::event::bridge::{EventBridge, Subscription};
use crate::logging::{init_logging, LoggingError};
use crate::model::project::{ProjectId, ProjectInfo};
use crate::runtime::{Runtime, RuntimeError};
use crate::service::project::{ProjectFacade, ProjectResult};
use crate::service::registry::{ProjectRegistry, RegistryResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors from `Playground::setup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    Logging(LoggingError),
    /// Runtime refused the notification sink.
    Runtime(RuntimeError),
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging setup failed: {err}"),
            Self::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

impl From<LoggingError> for SetupError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<RuntimeError> for SetupError {
    fn from(value: RuntimeError) -> Self {
        Self::Runtime(value)
    }
}

/// Initialized session over one Runtime.
pub struct Playground {
    runtime: Arc<dyn Runtime>,
    registry: ProjectRegistry,
    subscription: Subscription,
}

impl Playground {
    /// Sets up logging (when configured) and attaches the event observer.
    pub async fn setup(
        runtime: Arc<dyn Runtime>,
        options: SetupOptions,
    ) -> Result<Self, SetupError> {
        if let Some(logging) = options.logging.as_ref() {
            init_logging(logging)?;
        }
        let subscription = EventBridge::attach(runtime.as_ref(), options.on_event).await?;
        info!(
            "event=playground_setup module=host status=ok observer={}",
            subscription.is_attached()
        );
        Ok(Self {
            registry: ProjectRegistry::new(Arc::clone(&runtime)),
            runtime,
            subscription,
        })
    }

    /// Wrapper and Runtime version in one line.
    pub async fn version(&self) -> String {
        format!(
            "v{}(moveplay wrapper {})",
            core_version(),
            self.runtime.version().await
        )
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    pub async fn projects(&self) -> RegistryResult<Vec<ProjectInfo>> {
        self.registry.list().await
    }

    /// Creates a project; fails with `DuplicateName` when it exists.
    pub async fn create_project(&self, name: &str) -> ProjectResult<ProjectFacade> {
        ProjectFacade::create(Arc::clone(&self.runtime), name).await
    }

    /// Opens a project by name, creating it when unknown.
    pub async fn open_project(&self, name: &str) -> ProjectResult<ProjectFacade> {
        ProjectFacade::open(Arc::clone(&self.runtime), name).await
    }

    pub async fn open_project_by_id(&self, id: ProjectId) -> ProjectResult<ProjectFacade> {
        ProjectFacade::open(Arc::clone(&self.runtime), id).await
    }

    pub async fn remove_project(&self, id: ProjectId) -> RegistryResult<()> {
        self.registry.remove(id).await
    }

    /// Drops the Runtime's compiled-code cache.
    pub async fn clear_cache(&self) -> Result<(), RuntimeError> {
        self.runtime.clear_cache().await?;
        info!("event=cache_clear module=host status=ok");
        Ok(())
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Stops event delivery for the rest of the session.
    pub fn detach_events(&self) {
        self.subscription.detach();
    }
}
