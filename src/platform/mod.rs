//! Platform abstraction and registry.
//!
//! A platform is one backend implementation of the host integration layer
//! (one per server runtime the toolkit is loaded into). Backends register
//! themselves with the [`PlatformManager`], which elects the first one as
//! primary. The primary supplies configuration, receives command
//! registration and backs the legacy [`ServerInterface`].

pub mod adapter;
pub mod config;
pub mod manager;

use std::sync::Arc;

pub use adapter::{ServerInterface, ServerInterfaceAdapter};
pub use config::{ConfigurationSource, FixedConfiguration, LocalConfiguration};
pub use manager::{PlatformManager, Registration, VersionSkew};

use crate::world::ItemType;

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no platform has been registered")]
    NoPlatform,
    #[error("platform rejected: {0}")]
    Rejected(#[from] PlatformRejection),
}

/// Raised by a [`CommandRegistrar`] that refuses a platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{platform}: {reason}")]
pub struct PlatformRejection {
    pub platform: String,
    pub reason: String,
}

/// A backend implementation of the host integration layer.
///
/// Platforms are compared by identity (`Arc` pointer), never by value.
pub trait Platform: Send + Sync {
    /// Human-readable backend name used in log output.
    fn name(&self) -> &str;

    /// Toolkit protocol version this backend was built against.
    fn version(&self) -> &str;

    /// The backend's own version string.
    fn platform_version(&self) -> &str;

    /// Backend-supplied settings.
    fn configuration(&self) -> Arc<dyn ConfigurationSource>;

    fn resolve_item(&self, name: &str) -> Option<ItemType>;

    fn is_valid_mob_type(&self, kind: &str) -> bool;

    fn worlds(&self) -> Vec<String>;

    fn reload(&self);

    /// This platform as a native [`ServerInterface`], if it implements one.
    ///
    /// The default returns `None`, in which case the registry wraps the
    /// platform in a [`ServerInterfaceAdapter`].
    fn native_server_interface(self: Arc<Self>) -> Option<Arc<dyn ServerInterface>> {
        None
    }
}

/// Command registration collaborator.
///
/// Receives the primary platform when one is elected, and is told to tear
/// down when the primary goes away.
///
/// Called without the registry lock held: implementations may read the
/// registry (`configuration`, `primary_platform`, ...) but must not
/// register another platform from inside `register`.
pub trait CommandRegistrar: Send + Sync {
    /// Register the toolkit's commands with `platform`.
    fn register(&self, platform: &Arc<dyn Platform>) -> Result<(), PlatformRejection>;

    /// Remove previously registered commands. Always succeeds.
    fn unregister(&self);
}

/// Identity comparison for shared platforms.
pub(crate) fn same_platform(a: &Arc<dyn Platform>, b: &Arc<dyn Platform>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
