//! Replay script operations.
//!
//! One JSON object per line, tagged by `op`:
//!
//! ```text
//! {"op":"platform","name":"bukkit","version":"6.0"}
//! {"op":"player","name":"alice","permissions":["worldedit.selection.pos"],"hand":271}
//! {"op":"interact","actor":"alice","kind":"hit","at":[1,64,1]}
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::event::{InputType, Interaction};
use crate::platform::LocalConfiguration;
use crate::tool::ToolKind;
use crate::world::ItemType;

fn yes() -> bool {
    true
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}

fn default_platform_version() -> String {
    "sim".to_owned()
}

fn default_world() -> String {
    "world".to_owned()
}

/// A single script line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Create and register a platform.
    Platform(PlatformDecl),
    /// Unregister a previously created platform by name.
    Unregister { name: String },
    /// Create a player.
    Player(PlayerDecl),
    /// Create a non-player actor.
    Console { name: String },
    Hold { player: String, item: ItemType },
    Grant { player: String, permission: String },
    Revoke { player: String, permission: String },
    /// Bind a scripted tool to an item in the player's session.
    Bind {
        player: String,
        item: ItemType,
        tool: ToolKind,
        #[serde(default = "yes")]
        usable: bool,
        #[serde(default = "yes")]
        succeeds: bool,
    },
    Unbind { player: String, item: ItemType },
    /// Switch the super-pickaxe on (binding a scripted block tool) or off.
    #[serde(rename = "superpickaxe")]
    SuperPickaxe {
        player: String,
        enabled: bool,
        #[serde(default = "yes")]
        succeeds: bool,
    },
    ToolControl { player: String, enabled: bool },
    /// Script what the player sees: the block in sight and whether a wall
    /// is directly ahead.
    Look {
        player: String,
        #[serde(default)]
        target: Option<[i32; 3]>,
        #[serde(default)]
        wall: bool,
    },
    /// Raise a block interaction.
    Interact {
        actor: String,
        kind: Interaction,
        at: [i32; 3],
        #[serde(default)]
        world: Option<String>,
    },
    /// Raise a player input.
    Input { actor: String, kind: InputType },
    /// Print registry state and the active configuration.
    Status,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlatformDecl {
    pub name: String,
    /// Toolkit protocol version.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_platform_version")]
    pub platform_version: String,
    /// Inline settings. Ignored when `config_file` is set.
    #[serde(default)]
    pub config: Option<LocalConfiguration>,
    /// Load settings from a JSON file instead.
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    #[serde(default)]
    pub worlds: Vec<String>,
    /// Expose the platform as a native server interface.
    #[serde(default)]
    pub native: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerDecl {
    pub name: String,
    #[serde(default = "default_world")]
    pub world: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub hand: Option<ItemType>,
    #[serde(default)]
    pub at: Option<[i32; 3]>,
    #[serde(default = "yes")]
    pub advanced_tools: bool,
}
