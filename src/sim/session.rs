//! Reference sessions, session manager and cuboid selector.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::actor::Actor;
use crate::session::{RegionSelector, Session, SessionManager};
use crate::tool::{BlockTool, BoundTool};
use crate::world::{BlockVector, ItemType};

/// Sessions keyed by actor name, created on first use.
#[derive(Default)]
pub struct SimSessionManager {
    sessions: Mutex<HashMap<String, Arc<SimSession>>>,
}

impl SimSessionManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The session for `name`, created if absent.
    pub fn session(&self, name: &str) -> Arc<SimSession> {
        let mut sessions = lock(&self.sessions);
        Arc::clone(
            sessions
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(SimSession::default())),
        )
    }
}

impl SessionManager for SimSessionManager {
    fn get(&self, actor: &dyn Actor) -> Arc<dyn Session> {
        self.session(actor.name())
    }
}

/// Per-actor state: tool table, super-pickaxe and one selector per world.
pub struct SimSession {
    tool_control: AtomicBool,
    super_pickaxe_enabled: AtomicBool,
    super_pickaxe: Mutex<Option<Arc<dyn BlockTool>>>,
    tools: Mutex<HashMap<ItemType, BoundTool>>,
    selectors: Mutex<HashMap<String, Arc<CuboidSelector>>>,
    tool_lookups: AtomicUsize,
}

impl Default for SimSession {
    fn default() -> Self {
        Self {
            tool_control: AtomicBool::new(true),
            super_pickaxe_enabled: AtomicBool::new(false),
            super_pickaxe: Mutex::new(None),
            tools: Mutex::new(HashMap::new()),
            selectors: Mutex::new(HashMap::new()),
            tool_lookups: AtomicUsize::new(0),
        }
    }
}

impl SimSession {
    pub fn set_tool_control(&self, enabled: bool) {
        self.tool_control.store(enabled, Ordering::SeqCst);
    }

    /// Bind `tool` to `item`, replacing any previous binding.
    pub fn bind(&self, item: ItemType, tool: BoundTool) {
        lock(&self.tools).insert(item, tool);
    }

    pub fn unbind(&self, item: ItemType) -> Option<BoundTool> {
        lock(&self.tools).remove(&item)
    }

    /// Set the super-pickaxe tool and switch it on.
    pub fn enable_super_pickaxe(&self, tool: Arc<dyn BlockTool>) {
        *lock(&self.super_pickaxe) = Some(tool);
        self.super_pickaxe_enabled.store(true, Ordering::SeqCst);
    }

    /// Switch the super-pickaxe off, keeping the tool.
    pub fn disable_super_pickaxe(&self) {
        self.super_pickaxe_enabled.store(false, Ordering::SeqCst);
    }

    /// Number of `tool()` lookups served.
    pub fn tool_lookups(&self) -> usize {
        self.tool_lookups.load(Ordering::SeqCst)
    }

    /// Typed access to the selector for `world`.
    pub fn selector(&self, world: &str) -> Arc<CuboidSelector> {
        let mut selectors = lock(&self.selectors);
        Arc::clone(
            selectors
                .entry(world.to_owned())
                .or_insert_with(|| Arc::new(CuboidSelector::default())),
        )
    }
}

impl Session for SimSession {
    fn is_tool_control_enabled(&self) -> bool {
        self.tool_control.load(Ordering::SeqCst)
    }

    fn has_super_pickaxe(&self) -> bool {
        self.super_pickaxe_enabled.load(Ordering::SeqCst)
    }

    fn super_pickaxe(&self) -> Option<Arc<dyn BlockTool>> {
        lock(&self.super_pickaxe).clone()
    }

    fn tool(&self, item: ItemType) -> Option<BoundTool> {
        self.tool_lookups.fetch_add(1, Ordering::SeqCst);
        lock(&self.tools).get(&item).cloned()
    }

    fn region_selector(&self, world: &str) -> Arc<dyn RegionSelector> {
        self.selector(world)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Points {
    primary: Option<BlockVector>,
    secondary: Option<BlockVector>,
}

impl Points {
    fn volume(&self) -> Option<u64> {
        let (a, b) = (self.primary?, self.secondary?);
        let span = |p: i32, q: i32| u64::from((p - q).unsigned_abs()) + 1;
        Some(span(a.x, b.x) * span(a.y, b.y) * span(a.z, b.z))
    }
}

/// Two-corner cuboid selection.
#[derive(Debug, Default)]
pub struct CuboidSelector {
    points: Mutex<Points>,
    explanations: AtomicUsize,
}

impl CuboidSelector {
    pub fn primary(&self) -> Option<BlockVector> {
        lock(&self.points).primary
    }

    pub fn secondary(&self) -> Option<BlockVector> {
        lock(&self.points).secondary
    }

    /// Number of explain calls received.
    pub fn explanations(&self) -> usize {
        self.explanations.load(Ordering::SeqCst)
    }

    fn explain(&self, actor: &dyn Actor, which: &str, point: BlockVector) {
        self.explanations.fetch_add(1, Ordering::SeqCst);
        let message = match lock(&self.points).volume() {
            Some(volume) => format!("{which} position set to {point} ({volume})."),
            None => format!("{which} position set to {point}."),
        };
        actor.print(&message);
    }
}

impl RegionSelector for CuboidSelector {
    fn select_primary(&self, point: BlockVector) -> bool {
        let mut points = lock(&self.points);
        let changed = points.primary != Some(point);
        points.primary = Some(point);
        changed
    }

    fn select_secondary(&self, point: BlockVector) -> bool {
        let mut points = lock(&self.points);
        let changed = points.secondary != Some(point);
        points.secondary = Some(point);
        changed
    }

    fn explain_primary_selection(&self, actor: &dyn Actor, _session: &dyn Session, point: BlockVector) {
        self.explain(actor, "First", point);
    }

    fn explain_secondary_selection(
        &self,
        actor: &dyn Actor,
        _session: &dyn Session,
        point: BlockVector,
    ) {
        self.explain(actor, "Second", point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ActorMessage, SimPlayer};

    #[test]
    fn sessions_are_created_once_per_name() {
        let manager = SimSessionManager::new();
        let a = manager.session("alice");
        let b = manager.session("alice");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &manager.session("bob")));
    }

    #[test]
    fn selector_reports_change() {
        let selector = CuboidSelector::default();
        assert!(selector.select_primary(BlockVector::new(1, 2, 3)));
        assert!(!selector.select_primary(BlockVector::new(1, 2, 3)));
        assert!(selector.select_secondary(BlockVector::new(1, 2, 3)));
        assert_eq!(selector.primary(), Some(BlockVector::new(1, 2, 3)));
    }

    #[test]
    fn explanation_includes_volume_once_complete() {
        let player = SimPlayer::builder("alice").build();
        let session = SimSession::default();
        let selector = CuboidSelector::default();

        selector.select_primary(BlockVector::new(0, 0, 0));
        selector.explain_primary_selection(player.as_ref(), &session, BlockVector::new(0, 0, 0));
        selector.select_secondary(BlockVector::new(1, 1, 1));
        selector.explain_secondary_selection(player.as_ref(), &session, BlockVector::new(1, 1, 1));

        assert_eq!(
            player.messages(),
            vec![
                ActorMessage::Info("First position set to (0, 0, 0).".into()),
                ActorMessage::Info("Second position set to (1, 1, 1) (8).".into()),
            ]
        );
        assert_eq!(selector.explanations(), 2);
    }

    #[test]
    fn tool_control_defaults_on() {
        let session = SimSession::default();
        assert!(session.is_tool_control_enabled());
        session.set_tool_control(false);
        assert!(!session.is_tool_control_enabled());
        assert!(!session.has_super_pickaxe());
    }
}
