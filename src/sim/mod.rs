//! In-memory reference host.
//!
//! Implements every collaborator trait the registry and routers consume:
//! platforms, actors, sessions, region selectors, the command registrar
//! and tools. Backs the `replay` command and the unit tests. All state
//! lives behind `Mutex`/atomics so the types can be shared across
//! threads like real host objects.

pub mod actor;
pub mod platform;
pub mod session;
pub mod tool;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use actor::{ActorMessage, SimConsole, SimPlayer};
pub use platform::{RecordingRegistrar, SimPlatform};
pub use session::{CuboidSelector, SimSession, SimSessionManager};
pub use tool::{ScriptedTool, ToolAction};

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
