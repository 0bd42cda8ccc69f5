//! Reference actors: a scripted player and a console.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::actor::Actor;
use crate::world::{BlockVector, ItemType, Location};

/// A message delivered to an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorMessage {
    Info(String),
    Error(String),
}

/// A player whose surroundings are scripted instead of simulated.
///
/// There is no terrain: the block in sight is whatever `look_at` last set,
/// and a wall is ahead iff `set_wall_ahead(true)` was called.
pub struct SimPlayer {
    name: String,
    world: String,
    advanced_tools: bool,
    permissions: Mutex<HashSet<String>>,
    hand: Mutex<ItemType>,
    position: Mutex<BlockVector>,
    target: Mutex<Option<BlockVector>>,
    wall_ahead: AtomicBool,
    traces: AtomicUsize,
    messages: Mutex<Vec<ActorMessage>>,
}

impl SimPlayer {
    pub fn builder(name: impl Into<String>) -> SimPlayerBuilder {
        SimPlayerBuilder {
            name: name.into(),
            world: "world".to_owned(),
            advanced_tools: true,
            permissions: HashSet::new(),
            hand: ItemType::AIR,
            position: BlockVector::default(),
        }
    }

    pub fn hold(&self, item: ItemType) {
        *lock(&self.hand) = item;
    }

    pub fn grant(&self, permission: impl Into<String>) {
        lock(&self.permissions).insert(permission.into());
    }

    pub fn revoke(&self, permission: &str) {
        lock(&self.permissions).remove(permission);
    }

    /// Set the solid block in the line of sight (`None` for open sky).
    pub fn look_at(&self, target: Option<BlockVector>) {
        *lock(&self.target) = target;
    }

    pub fn set_wall_ahead(&self, wall: bool) {
        self.wall_ahead.store(wall, Ordering::SeqCst);
    }

    pub fn position(&self) -> BlockVector {
        *lock(&self.position)
    }

    /// Number of solid-block traces performed.
    pub fn trace_count(&self) -> usize {
        self.traces.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<ActorMessage> {
        lock(&self.messages).clone()
    }

    /// Drain and return every message received so far.
    pub fn take_messages(&self) -> Vec<ActorMessage> {
        std::mem::take(&mut *lock(&self.messages))
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.messages)
            .iter()
            .filter_map(|m| match m {
                ActorMessage::Error(text) => Some(text.clone()),
                ActorMessage::Info(_) => None,
            })
            .collect()
    }

    fn distance_to(&self, target: BlockVector) -> f64 {
        let here = self.position();
        let dx = f64::from(target.x - here.x);
        let dy = f64::from(target.y - here.y);
        let dz = f64::from(target.z - here.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Builder for [`SimPlayer`].
pub struct SimPlayerBuilder {
    name: String,
    world: String,
    advanced_tools: bool,
    permissions: HashSet<String>,
    hand: ItemType,
    position: BlockVector,
}

impl SimPlayerBuilder {
    pub fn world(mut self, world: impl Into<String>) -> Self {
        self.world = world.into();
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn holding(mut self, item: ItemType) -> Self {
        self.hand = item;
        self
    }

    pub fn at(mut self, position: BlockVector) -> Self {
        self.position = position;
        self
    }

    /// A player on a backend without bound-tool support.
    pub fn basic_tools_only(mut self) -> Self {
        self.advanced_tools = false;
        self
    }

    pub fn build(self) -> Arc<SimPlayer> {
        Arc::new(SimPlayer {
            name: self.name,
            world: self.world,
            advanced_tools: self.advanced_tools,
            permissions: Mutex::new(self.permissions),
            hand: Mutex::new(self.hand),
            position: Mutex::new(self.position),
            target: Mutex::new(None),
            wall_ahead: AtomicBool::new(false),
            traces: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        })
    }
}

impl Actor for SimPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_player(&self) -> bool {
        true
    }

    fn supports_advanced_tools(&self) -> bool {
        self.advanced_tools
    }

    fn has_permission(&self, permission: &str) -> bool {
        lock(&self.permissions).contains(permission)
    }

    fn item_in_hand(&self) -> ItemType {
        *lock(&self.hand)
    }

    fn world(&self) -> String {
        self.world.clone()
    }

    fn solid_block_trace(&self, range: i32) -> Option<Location> {
        self.traces.fetch_add(1, Ordering::SeqCst);
        let target = (*lock(&self.target))?;
        if self.distance_to(target) > f64::from(range) {
            return None;
        }
        Some(Location::new(self.world.clone(), target))
    }

    fn find_free_position(&self, near: &Location) {
        // No terrain: the block above the hit is always free.
        let free = BlockVector::new(near.position.x, near.position.y + 1, near.position.z);
        *lock(&self.position) = free;
        self.print(&format!("Moved to {free}."));
    }

    fn pass_through_forward_wall(&self, range: i32) -> bool {
        if range <= 0 || !self.wall_ahead.swap(false, Ordering::SeqCst) {
            return false;
        }
        let mut position = lock(&self.position);
        position.x += 2;
        true
    }

    fn print(&self, message: &str) {
        lock(&self.messages).push(ActorMessage::Info(message.to_owned()));
    }

    fn print_error(&self, message: &str) {
        lock(&self.messages).push(ActorMessage::Error(message.to_owned()));
    }
}

/// A console: has every permission, holds nothing, is not in a world.
pub struct SimConsole {
    name: String,
    messages: Mutex<Vec<ActorMessage>>,
}

impl SimConsole {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn take_messages(&self) -> Vec<ActorMessage> {
        std::mem::take(&mut *lock(&self.messages))
    }
}

impl Actor for SimConsole {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_player(&self) -> bool {
        false
    }

    fn supports_advanced_tools(&self) -> bool {
        false
    }

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }

    fn item_in_hand(&self) -> ItemType {
        ItemType::AIR
    }

    fn world(&self) -> String {
        String::new()
    }

    fn solid_block_trace(&self, _range: i32) -> Option<Location> {
        None
    }

    fn find_free_position(&self, _near: &Location) {}

    fn pass_through_forward_wall(&self, _range: i32) -> bool {
        false
    }

    fn print(&self, message: &str) {
        lock(&self.messages).push(ActorMessage::Info(message.to_owned()));
    }

    fn print_error(&self, message: &str) {
        lock(&self.messages).push(ActorMessage::Error(message.to_owned()));
    }
}
