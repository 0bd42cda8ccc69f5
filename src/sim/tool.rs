//! Scripted tool that records how it was invoked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::actor::Actor;
use crate::platform::{LocalConfiguration, ServerInterface};
use crate::session::Session;
use crate::tool::{
    BlockTool, BoundTool, DoubleActionBlockTool, DoubleActionTraceTool, Tool, ToolKind, TraceTool,
};
use crate::world::Location;

/// One recorded tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAction {
    BlockPrimary { actor: String, clicked: Location },
    BlockSecondary { actor: String, clicked: Location },
    TracePrimary { actor: String },
    TraceSecondary { actor: String },
}

/// A tool of any kind with a configurable outcome.
///
/// Binds as the [`BoundTool`] variant matching its [`ToolKind`]. Every
/// action reports `succeeds` and is recorded together with the address
/// of the session it was called with.
pub struct ScriptedTool {
    kind: ToolKind,
    usable: AtomicBool,
    succeeds: AtomicBool,
    actions: Mutex<Vec<(ToolAction, usize)>>,
}

impl ScriptedTool {
    pub fn new(kind: ToolKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            usable: AtomicBool::new(true),
            succeeds: AtomicBool::new(true),
            actions: Mutex::new(Vec::new()),
        })
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn set_usable(&self, usable: bool) {
        self.usable.store(usable, Ordering::SeqCst);
    }

    /// Value every action reports back to the router.
    pub fn set_succeeds(&self, succeeds: bool) {
        self.succeeds.store(succeeds, Ordering::SeqCst);
    }

    pub fn actions(&self) -> Vec<ToolAction> {
        lock(&self.actions).iter().map(|(a, _)| a.clone()).collect()
    }

    /// Session addresses each action was called with, in order.
    pub fn session_addrs(&self) -> Vec<usize> {
        lock(&self.actions).iter().map(|(_, s)| *s).collect()
    }

    /// This tool wrapped in the variant its kind calls for.
    pub fn bound(self: &Arc<Self>) -> BoundTool {
        let tool = Arc::clone(self);
        match self.kind {
            ToolKind::Block => BoundTool::Block(tool),
            ToolKind::DoubleActionBlock => BoundTool::DoubleActionBlock(tool),
            ToolKind::Trace => BoundTool::Trace(tool),
            ToolKind::DoubleActionTrace => BoundTool::DoubleActionTrace(tool),
        }
    }

    fn record(&self, action: ToolAction, session: &dyn Session) -> bool {
        let addr = session as *const dyn Session as *const () as usize;
        tracing::debug!(kind = %self.kind, ?action, "scripted tool invoked");
        lock(&self.actions).push((action, addr));
        self.succeeds.load(Ordering::SeqCst)
    }
}

impl Tool for ScriptedTool {
    fn can_use(&self, _actor: &dyn Actor) -> bool {
        self.usable.load(Ordering::SeqCst)
    }
}

impl BlockTool for ScriptedTool {
    fn act_primary(
        &self,
        _server: &dyn ServerInterface,
        _config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
        clicked: &Location,
    ) -> bool {
        let action = ToolAction::BlockPrimary {
            actor: actor.name().to_owned(),
            clicked: clicked.clone(),
        };
        self.record(action, session)
    }
}

impl DoubleActionBlockTool for ScriptedTool {
    fn act_secondary(
        &self,
        _server: &dyn ServerInterface,
        _config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
        clicked: &Location,
    ) -> bool {
        let action = ToolAction::BlockSecondary {
            actor: actor.name().to_owned(),
            clicked: clicked.clone(),
        };
        self.record(action, session)
    }
}

impl TraceTool for ScriptedTool {
    fn act_primary(
        &self,
        _server: &dyn ServerInterface,
        _config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
    ) -> bool {
        let action = ToolAction::TracePrimary {
            actor: actor.name().to_owned(),
        };
        self.record(action, session)
    }
}

impl DoubleActionTraceTool for ScriptedTool {
    fn act_secondary(
        &self,
        _server: &dyn ServerInterface,
        _config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
    ) -> bool {
        let action = ToolAction::TraceSecondary {
            actor: actor.name().to_owned(),
        };
        self.record(action, session)
    }
}
