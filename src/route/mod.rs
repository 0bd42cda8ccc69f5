//! Interaction routing.
//!
//! [`Router`] turns host events into selection-wand, navigation-wand or
//! bound-tool actions. Checks run in a fixed order per event kind: wand
//! handling always comes first and short-circuits, so a wand never falls
//! through to ordinary tool dispatch.
//!
//! - [`interact`]: block interactions (`Hit` / `Open`)
//! - [`input`]: generic input (`Primary` / `Secondary`)
//!
//! Permission denial and disabled features are silent: the event is left
//! unconsumed so the host's default behavior runs. Failed wand actions
//! are reported to the actor and still consume the event.

pub mod input;
pub mod interact;

use std::sync::Arc;

use crate::event::EventDispatch;
use crate::platform::{PlatformManager, RegistryError, ServerInterface};
use crate::session::SessionManager;

/// Routing errors surfaced to the host dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// A tool was about to run but no platform backs the server interface.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Routes block interactions and player input for one toolkit instance.
pub struct Router {
    platforms: Arc<PlatformManager>,
    sessions: Arc<dyn SessionManager>,
}

impl Router {
    pub fn new(platforms: Arc<PlatformManager>, sessions: Arc<dyn SessionManager>) -> Self {
        Self {
            platforms,
            sessions,
        }
    }

    /// Register both entry points with the host's handler table.
    pub fn install(self: &Arc<Self>, dispatch: &mut EventDispatch) {
        let router = Arc::clone(self);
        dispatch.on_block_interact(move |event| router.handle_block_interact(event));
        let router = Arc::clone(self);
        dispatch.on_player_input(move |event| router.handle_player_input(event));
    }

    /// Server interface handed to tools. Resolved only when a tool runs.
    fn server(&self) -> Result<Arc<dyn ServerInterface>, RouteError> {
        Ok(self.platforms.server_interface()?)
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    //! Shared setup for router tests.

    use std::sync::Arc;

    use super::Router;
    use crate::platform::{FixedConfiguration, LocalConfiguration, PlatformManager};
    use crate::sim::{RecordingRegistrar, SimPlatform, SimSession, SimSessionManager};

    pub struct Fixture {
        pub platforms: Arc<PlatformManager>,
        pub sessions: Arc<SimSessionManager>,
        pub router: Router,
    }

    impl Fixture {
        /// A router backed by one registered platform with `config`.
        pub fn with_config(config: LocalConfiguration) -> Self {
            let fixture = Self::unregistered();
            fixture
                .platforms
                .register(SimPlatform::builder("sim").config(config).build())
                .unwrap();
            fixture
        }

        pub fn new() -> Self {
            Self::with_config(LocalConfiguration::default())
        }

        /// A router with no platform registered.
        pub fn unregistered() -> Self {
            let platforms = Arc::new(PlatformManager::new(
                RecordingRegistrar::new(),
                Arc::new(FixedConfiguration::default()),
            ));
            let sessions = SimSessionManager::new();
            let router = Router::new(Arc::clone(&platforms), sessions.clone());
            Self {
                platforms,
                sessions,
                router,
            }
        }

        pub fn session(&self, name: &str) -> Arc<SimSession> {
            self.sessions.session(name)
        }
    }

    /// Address of a session as recorded by `ScriptedTool`.
    pub fn addr(session: &Arc<SimSession>) -> usize {
        Arc::as_ptr(session) as *const () as usize
    }
}
