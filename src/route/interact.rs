//! Block interaction routing.
//!
//! `Hit`: selection wand sets the primary point, otherwise the
//! super-pickaxe, otherwise the secondary action of a bound
//! double-action block tool.
//!
//! `Open`: selection wand sets the secondary point, otherwise the primary
//! action of a bound block tool.

use std::sync::Arc;

use crate::actor::{Actor, PERM_SELECTION_POS};
use crate::event::{BlockInteractEvent, Interaction};
use crate::platform::LocalConfiguration;
use crate::session::Session;
use crate::tool::{BlockTool, BoundTool, Tool};
use crate::world::ItemType;

use super::{RouteError, Router};

impl Router {
    /// Entry point for block interactions. Ignores non-player causes.
    pub fn handle_block_interact(&self, event: &mut BlockInteractEvent) -> Result<(), RouteError> {
        let actor = Arc::clone(&event.cause);
        if !actor.is_player() {
            tracing::trace!(actor = actor.name(), "ignoring interaction from non-player");
            return Ok(());
        }

        let session = self.sessions.get(actor.as_ref());
        let config = self.platforms.configuration().current();
        let held = actor.item_in_hand();

        match event.interaction {
            Interaction::Hit => self.hit(event, actor.as_ref(), session.as_ref(), &config, held),
            Interaction::Open => self.open(event, actor.as_ref(), session.as_ref(), &config, held),
        }
    }

    fn hit(
        &self,
        event: &mut BlockInteractEvent,
        actor: &dyn Actor,
        session: &dyn Session,
        config: &LocalConfiguration,
        held: ItemType,
    ) -> Result<(), RouteError> {
        if held == config.wand_item {
            if selection_allowed(actor, session) {
                let point = event.location.position;
                let selector = session.region_selector(&actor.world());
                if selector.select_primary(point) {
                    selector.explain_primary_selection(actor, session, point);
                }
                tracing::debug!(actor = actor.name(), %point, "primary selection point");
                event.consumed = true;
            }
            return Ok(());
        }

        if !actor.supports_advanced_tools() {
            return Ok(());
        }

        if actor.is_holding_pickaxe() && session.has_super_pickaxe() {
            if let Some(pickaxe) = session.super_pickaxe().filter(|p| p.can_use(actor)) {
                let server = self.server()?;
                event.consumed =
                    pickaxe.act_primary(server.as_ref(), config, actor, session, &event.location);
                tracing::debug!(actor = actor.name(), consumed = event.consumed, "super-pickaxe");
                return Ok(());
            }
        }

        if let Some(BoundTool::DoubleActionBlock(tool)) = session.tool(held) {
            if tool.can_use(actor) {
                let server = self.server()?;
                tool.act_secondary(server.as_ref(), config, actor, session, &event.location);
                event.consumed = true;
            }
        }
        Ok(())
    }

    fn open(
        &self,
        event: &mut BlockInteractEvent,
        actor: &dyn Actor,
        session: &dyn Session,
        config: &LocalConfiguration,
        held: ItemType,
    ) -> Result<(), RouteError> {
        if held == config.wand_item {
            if selection_allowed(actor, session) {
                let point = event.location.position;
                let selector = session.region_selector(&actor.world());
                if selector.select_secondary(point) {
                    selector.explain_secondary_selection(actor, session, point);
                }
                tracing::debug!(actor = actor.name(), %point, "secondary selection point");
                event.consumed = true;
            }
            return Ok(());
        }

        if !actor.supports_advanced_tools() {
            return Ok(());
        }

        match session.tool(held) {
            Some(BoundTool::Block(tool)) if tool.can_use(actor) => {
                let server = self.server()?;
                tool.act_primary(server.as_ref(), config, actor, session, &event.location);
                event.consumed = true;
            }
            Some(BoundTool::DoubleActionBlock(tool)) if tool.can_use(actor) => {
                let server = self.server()?;
                tool.act_primary(server.as_ref(), config, actor, session, &event.location);
                event.consumed = true;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Tool control and the selection permission gate the wand. Both failures
/// are silent.
fn selection_allowed(actor: &dyn Actor, session: &dyn Session) -> bool {
    session.is_tool_control_enabled() && actor.has_permission(PERM_SELECTION_POS)
}
