//! Host events and the explicit handler table they are dispatched through.
//!
//! Events are created by the host per signal, passed by `&mut` to every
//! registered handler in registration order, then discarded. A handler
//! marks an event consumed to suppress the host's default behavior.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::actor::Actor;
use crate::route::RouteError;
use crate::world::Location;

/// Kind of block interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    /// Left-click style.
    Hit,
    /// Right-click style.
    Open,
}

/// Kind of generic input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Primary,
    Secondary,
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hit => "hit",
            Self::Open => "open",
        })
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        })
    }
}

/// An actor interacted with a block.
pub struct BlockInteractEvent {
    pub cause: Arc<dyn Actor>,
    pub location: Location,
    pub interaction: Interaction,
    /// Set by a handler to suppress the host's default behavior.
    pub consumed: bool,
}

impl BlockInteractEvent {
    pub fn new(cause: Arc<dyn Actor>, location: Location, interaction: Interaction) -> Self {
        Self {
            cause,
            location,
            interaction,
            consumed: false,
        }
    }
}

/// A player pressed a primary or secondary input.
pub struct PlayerInputEvent {
    pub player: Arc<dyn Actor>,
    pub input: InputType,
    /// Set by a handler to suppress the host's default behavior.
    pub consumed: bool,
}

impl PlayerInputEvent {
    pub fn new(player: Arc<dyn Actor>, input: InputType) -> Self {
        Self {
            player,
            input,
            consumed: false,
        }
    }
}

type BlockInteractHandler =
    Box<dyn Fn(&mut BlockInteractEvent) -> Result<(), RouteError> + Send + Sync>;
type PlayerInputHandler = Box<dyn Fn(&mut PlayerInputEvent) -> Result<(), RouteError> + Send + Sync>;

/// Host-side handler table.
///
/// Handlers are registered explicitly and run in registration order.
/// A failing handler is logged and the remaining handlers still run.
#[derive(Default)]
pub struct EventDispatch {
    block_interact: Vec<BlockInteractHandler>,
    player_input: Vec<PlayerInputHandler>,
}

impl EventDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_block_interact<F>(&mut self, handler: F)
    where
        F: Fn(&mut BlockInteractEvent) -> Result<(), RouteError> + Send + Sync + 'static,
    {
        self.block_interact.push(Box::new(handler));
    }

    pub fn on_player_input<F>(&mut self, handler: F)
    where
        F: Fn(&mut PlayerInputEvent) -> Result<(), RouteError> + Send + Sync + 'static,
    {
        self.player_input.push(Box::new(handler));
    }

    /// Deliver a block interaction. Returns whether it ended up consumed.
    pub fn post_block_interact(&self, event: &mut BlockInteractEvent) -> bool {
        for handler in &self.block_interact {
            if let Err(e) = handler(event) {
                tracing::error!(
                    actor = event.cause.name(),
                    interaction = %event.interaction,
                    error = %e,
                    "block interaction handler failed"
                );
            }
        }
        event.consumed
    }

    /// Deliver a player input. Returns whether it ended up consumed.
    pub fn post_player_input(&self, event: &mut PlayerInputEvent) -> bool {
        for handler in &self.player_input {
            if let Err(e) = handler(event) {
                tracing::error!(
                    actor = event.player.name(),
                    input = %event.input,
                    error = %e,
                    "player input handler failed"
                );
            }
        }
        event.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RegistryError;
    use crate::sim::SimPlayer;
    use crate::world::BlockVector;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hit() -> BlockInteractEvent {
        BlockInteractEvent::new(
            SimPlayer::builder("alice").build(),
            Location::new("world", BlockVector::new(0, 64, 0)),
            Interaction::Hit,
        )
    }

    #[test]
    fn failing_handler_does_not_stop_dispatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatch = EventDispatch::new();

        dispatch.on_block_interact(|_| Err(RegistryError::NoPlatform.into()));
        let counter = Arc::clone(&calls);
        dispatch.on_block_interact(move |event| {
            counter.fetch_add(1, Ordering::SeqCst);
            event.consumed = true;
            Ok(())
        });

        let mut event = hit();
        assert!(dispatch.post_block_interact(&mut event));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unhandled_events_stay_unconsumed() {
        let dispatch = EventDispatch::new();
        let mut event = PlayerInputEvent::new(SimPlayer::builder("alice").build(), InputType::Primary);
        assert!(!dispatch.post_player_input(&mut event));
    }

    #[test]
    fn interaction_kinds_parse_lowercase() {
        let kind: Interaction = serde_json::from_str(r#""open""#).unwrap();
        assert_eq!(kind, Interaction::Open);
        let input: InputType = serde_json::from_str(r#""secondary""#).unwrap();
        assert_eq!(input, InputType::Secondary);
    }
}
