//! Actor capability interface.
//!
//! A single trait covers everything the routers ask of whoever caused an
//! event: identity, permissions, the held item, ray tracing, movement and
//! messaging. Non-player actors (consoles, command blocks) report
//! `is_player() == false` and are ignored by block-interaction routing.

use crate::world::{ItemType, Location};

/// Permission required to set selection points with the wand.
pub const PERM_SELECTION_POS: &str = "worldedit.selection.pos";
/// Permission required to jump with the navigation wand.
pub const PERM_NAVIGATION_JUMPTO: &str = "worldedit.navigation.jumpto.tool";
/// Permission required to pass through walls with the navigation wand.
pub const PERM_NAVIGATION_THRU: &str = "worldedit.navigation.thru.tool";

/// Something that can cause an event: a player, console or other source.
///
/// `Send + Sync` because the host delivers events from its own worker
/// threads and actors are shared with the session manager.
pub trait Actor: Send + Sync {
    /// Display name, also the key sessions are stored under.
    fn name(&self) -> &str;

    /// Whether this actor is a player present in a world.
    fn is_player(&self) -> bool;

    /// Whether this actor can drive bound tools (super-pickaxe, block and
    /// trace tools). Players on minimal backends may not.
    fn supports_advanced_tools(&self) -> bool;

    fn has_permission(&self, permission: &str) -> bool;

    /// Item currently held in the main hand.
    fn item_in_hand(&self) -> ItemType;

    /// Name of the world the actor is in.
    fn world(&self) -> String;

    /// Whether the held item is a pickaxe-class item.
    fn is_holding_pickaxe(&self) -> bool {
        self.item_in_hand().is_pickaxe()
    }

    /// First solid block along the line of sight within `range` blocks.
    fn solid_block_trace(&self, range: i32) -> Option<Location>;

    /// Move the actor to the nearest free position at or above `near`.
    fn find_free_position(&self, near: &Location);

    /// Move the actor through the wall in front of them.
    ///
    /// Returns `false` if there was nothing to pass through within `range`.
    fn pass_through_forward_wall(&self, range: i32) -> bool;

    fn print(&self, message: &str);

    fn print_error(&self, message: &str);
}
