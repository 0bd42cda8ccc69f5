//! Session collaborator traits.
//!
//! Sessions, selectors and the session manager are owned and synchronized
//! by the host. Every method takes `&self`; implementations use interior
//! mutability.

use std::sync::Arc;

use crate::actor::Actor;
use crate::tool::{BlockTool, BoundTool};
use crate::world::{BlockVector, ItemType};

/// Looks up (or lazily creates) the session for an actor.
pub trait SessionManager: Send + Sync {
    /// Always succeeds for a valid actor.
    fn get(&self, actor: &dyn Actor) -> Arc<dyn Session>;
}

/// Per-actor editing state.
pub trait Session: Send + Sync {
    /// Whether wand clicks should drive the selection.
    fn is_tool_control_enabled(&self) -> bool;

    /// Whether the super-pickaxe is switched on.
    fn has_super_pickaxe(&self) -> bool;

    /// The super-pickaxe tool, bound independently of the item table.
    fn super_pickaxe(&self) -> Option<Arc<dyn BlockTool>>;

    /// Tool bound to `item`, if any.
    fn tool(&self, item: ItemType) -> Option<BoundTool>;

    /// Region selector for the given world.
    fn region_selector(&self, world: &str) -> Arc<dyn RegionSelector>;
}

/// Tracks an in-progress region selection.
pub trait RegionSelector: Send + Sync {
    /// Set the primary point. Returns `true` if the selection changed.
    fn select_primary(&self, point: BlockVector) -> bool;

    /// Set the secondary point. Returns `true` if the selection changed.
    fn select_secondary(&self, point: BlockVector) -> bool;

    /// Tell the actor about the new primary point.
    fn explain_primary_selection(&self, actor: &dyn Actor, session: &dyn Session, point: BlockVector);

    /// Tell the actor about the new secondary point.
    fn explain_secondary_selection(
        &self,
        actor: &dyn Actor,
        session: &dyn Session,
        point: BlockVector,
    );
}
