//! Generic input routing.
//!
//! `Primary`: navigation wand jumps to the block in sight, otherwise the
//! secondary action of a bound double-action trace tool.
//!
//! `Secondary`: navigation wand passes through the wall ahead, otherwise
//! the primary action of a bound trace tool.

use std::sync::Arc;

use crate::actor::{Actor, PERM_NAVIGATION_JUMPTO, PERM_NAVIGATION_THRU};
use crate::event::{InputType, PlayerInputEvent};
use crate::platform::LocalConfiguration;
use crate::tool::{BoundTool, Tool, TraceTool};

use super::{RouteError, Router};

/// Fixed reach of the pass-through action, in blocks.
pub const PASS_THROUGH_RANGE: i32 = 40;

const NO_BLOCK_IN_SIGHT: &str = "No block in sight (or too far)!";
const NOTHING_TO_PASS: &str = "Nothing to pass through!";

impl Router {
    /// Entry point for player input.
    pub fn handle_player_input(&self, event: &mut PlayerInputEvent) -> Result<(), RouteError> {
        let actor = Arc::clone(&event.player);
        let config = self.platforms.configuration().current();

        match event.input {
            InputType::Primary => self.primary_input(event, actor.as_ref(), &config),
            InputType::Secondary => self.secondary_input(event, actor.as_ref(), &config),
        }
    }

    fn primary_input(
        &self,
        event: &mut PlayerInputEvent,
        actor: &dyn Actor,
        config: &LocalConfiguration,
    ) -> Result<(), RouteError> {
        if holding_navigation_wand(actor, config) {
            if actor.has_permission(PERM_NAVIGATION_JUMPTO) {
                match actor.solid_block_trace(config.navigation_wand_max_distance) {
                    Some(hit) => {
                        tracing::debug!(actor = actor.name(), %hit, "navigation jump");
                        actor.find_free_position(&hit);
                    }
                    None => actor.print_error(NO_BLOCK_IN_SIGHT),
                }
                event.consumed = true;
            }
            return Ok(());
        }

        if !actor.supports_advanced_tools() {
            return Ok(());
        }

        let session = self.sessions.get(actor);
        if let Some(BoundTool::DoubleActionTrace(tool)) = session.tool(actor.item_in_hand()) {
            if tool.can_use(actor) {
                let server = self.server()?;
                tool.act_secondary(server.as_ref(), config, actor, session.as_ref());
                event.consumed = true;
            }
        }
        Ok(())
    }

    fn secondary_input(
        &self,
        event: &mut PlayerInputEvent,
        actor: &dyn Actor,
        config: &LocalConfiguration,
    ) -> Result<(), RouteError> {
        if holding_navigation_wand(actor, config) {
            if actor.has_permission(PERM_NAVIGATION_THRU) {
                if !actor.pass_through_forward_wall(PASS_THROUGH_RANGE) {
                    actor.print_error(NOTHING_TO_PASS);
                }
                event.consumed = true;
            }
            return Ok(());
        }

        if !actor.supports_advanced_tools() {
            return Ok(());
        }

        let session = self.sessions.get(actor);
        match session.tool(actor.item_in_hand()) {
            Some(BoundTool::Trace(tool)) if tool.can_use(actor) => {
                let server = self.server()?;
                tool.act_primary(server.as_ref(), config, actor, session.as_ref());
                event.consumed = true;
            }
            Some(BoundTool::DoubleActionTrace(tool)) if tool.can_use(actor) => {
                let server = self.server()?;
                tool.act_primary(server.as_ref(), config, actor, session.as_ref());
                event.consumed = true;
            }
            _ => {}
        }
        Ok(())
    }
}

/// The navigation wand only counts while a positive distance is configured;
/// otherwise the item is routed like any other.
fn holding_navigation_wand(actor: &dyn Actor, config: &LocalConfiguration) -> bool {
    actor.item_in_hand() == config.navigation_wand && config.navigation_enabled()
}
