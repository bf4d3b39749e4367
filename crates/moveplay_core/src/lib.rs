//! Orchestration core for the moveplay project workspace.
//! Named projects, a virtual project filesystem and an event relay in front
//! of an opaque execution Runtime.

pub mod config;
pub mod event;
pub mod host;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod service;

pub use config::{LoggingConfig, SetupOptions};
pub use event::bridge::{EventBridge, EventObserver, Subscription};
pub use host::{Playground, SetupError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventDecodeError, RawNotification};
pub use model::node::{Directory, File, FsNode, NodeId, NodeState, ROOT_DIR_ID};
pub use model::project::{ProjectId, ProjectInfo, ProjectRef};
pub use runtime::{MemoryRuntime, NotificationSink, Runtime, RuntimeError, RuntimeResult};
pub use service::project::{CanonicalDir, ProjectError, ProjectFacade, ProjectResult};
pub use service::registry::{ProjectRegistry, RegistryError, RegistryResult};
pub use service::vfs::{FsError, FsResult, VirtualFilesystem};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
