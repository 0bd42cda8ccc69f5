//! Tool capability traits and the tagged [`BoundTool`] wrapper.
//!
//! A session binds one tool per item. Routers never test concrete types;
//! they match on the [`BoundTool`] variant and call only the operations
//! that variant carries.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::actor::Actor;
use crate::platform::ServerInterface;
use crate::platform::config::LocalConfiguration;
use crate::session::Session;
use crate::world::Location;

/// Capability shared by every tool.
pub trait Tool: Send + Sync {
    /// Whether `actor` is allowed to use this tool.
    fn can_use(&self, actor: &dyn Actor) -> bool;
}

/// A tool acting on a clicked block.
pub trait BlockTool: Tool {
    /// Right-click style action. Returns `true` if it took effect.
    fn act_primary(
        &self,
        server: &dyn ServerInterface,
        config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
        clicked: &Location,
    ) -> bool;
}

/// A block tool with an additional left-click style action.
pub trait DoubleActionBlockTool: BlockTool {
    fn act_secondary(
        &self,
        server: &dyn ServerInterface,
        config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
        clicked: &Location,
    ) -> bool;
}

/// A tool acting on whatever the actor is looking at.
pub trait TraceTool: Tool {
    fn act_primary(
        &self,
        server: &dyn ServerInterface,
        config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
    ) -> bool;
}

/// A trace tool with an additional secondary action.
pub trait DoubleActionTraceTool: TraceTool {
    fn act_secondary(
        &self,
        server: &dyn ServerInterface,
        config: &LocalConfiguration,
        actor: &dyn Actor,
        session: &dyn Session,
    ) -> bool;
}

/// Variant tag of a [`BoundTool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Block,
    DoubleActionBlock,
    Trace,
    DoubleActionTrace,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Block => "block",
            Self::DoubleActionBlock => "double-action block",
            Self::Trace => "trace",
            Self::DoubleActionTrace => "double-action trace",
        };
        f.write_str(name)
    }
}

/// A tool as bound in a session, tagged with its capability set.
#[derive(Clone)]
pub enum BoundTool {
    Block(Arc<dyn BlockTool>),
    DoubleActionBlock(Arc<dyn DoubleActionBlockTool>),
    Trace(Arc<dyn TraceTool>),
    DoubleActionTrace(Arc<dyn DoubleActionTraceTool>),
}

impl BoundTool {
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Block(_) => ToolKind::Block,
            Self::DoubleActionBlock(_) => ToolKind::DoubleActionBlock,
            Self::Trace(_) => ToolKind::Trace,
            Self::DoubleActionTrace(_) => ToolKind::DoubleActionTrace,
        }
    }

    pub fn can_use(&self, actor: &dyn Actor) -> bool {
        match self {
            Self::Block(t) => t.can_use(actor),
            Self::DoubleActionBlock(t) => t.can_use(actor),
            Self::Trace(t) => t.can_use(actor),
            Self::DoubleActionTrace(t) => t.can_use(actor),
        }
    }
}

impl fmt::Debug for BoundTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundTool").field(&self.kind()).finish()
    }
}
