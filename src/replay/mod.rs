//! Replay harness. Drives the registry and routers from a script.
//!
//! Reads JSON-lines [`Op`]s from a file or stdin, applies each to an
//! in-memory host built from the [`sim`](crate::sim) reference types, and
//! prints what happened: registration outcomes, whether each event was
//! consumed, and every message the acting player received.
//!
//! Blank lines and lines starting with `#` are skipped.

pub mod script;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use crate::actor::Actor;
use crate::event::{BlockInteractEvent, EventDispatch, PlayerInputEvent};
use crate::platform::config::{ConfigError, FileConfiguration};
use crate::platform::{
    CommandRegistrar, ConfigurationSource, FixedConfiguration, Platform, PlatformManager,
    Registration, RegistryError,
};
use crate::route::Router;
use crate::sim::{
    ActorMessage, RecordingRegistrar, ScriptedTool, SimConsole, SimPlatform, SimPlayer,
    SimSessionManager,
};
use crate::tool::ToolKind;
use crate::world::{BlockVector, Location};

pub use script::{Op, PlatformDecl, PlayerDecl};

/// Longest accepted script line, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Replay errors.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("read error: {0}")]
    Read(#[from] LinesCodecError),
    #[error("invalid op: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("platform already exists: {0}")]
    DuplicatePlatform(String),
    #[error("unknown actor: {0}")]
    UnknownActor(String),
    #[error("not a player: {0}")]
    NotAPlayer(String),
    #[error("actor already exists: {0}")]
    DuplicateActor(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        source: Box<ReplayError>,
    },
}

/// Counters reported at the end of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub ops: usize,
    pub events: usize,
    pub consumed: usize,
    pub errors: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ops, {} events ({} consumed), {} errors",
            self.ops, self.events, self.consumed, self.errors
        )
    }
}

/// Options for [`execute`].
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Script file; stdin when `None`.
    pub script: Option<PathBuf>,
    /// Default configuration file used while no platform is registered.
    pub config: Option<PathBuf>,
    /// Platforms whose command registration is refused.
    pub reject: Vec<String>,
    /// Log failed ops and continue instead of stopping.
    pub keep_going: bool,
}

/// Run a replay with the given options, printing output to stdout.
pub async fn execute(options: ReplayOptions) -> Result<Summary, ReplayError> {
    let default_config: Arc<dyn ConfigurationSource> = match &options.config {
        Some(path) => {
            let source = FileConfiguration::new(path);
            source.load()?;
            Arc::new(source)
        }
        None => Arc::new(FixedConfiguration::default()),
    };
    let mut replay = Replay::new(RecordingRegistrar::rejecting(options.reject), default_config);

    let reader: Box<dyn AsyncRead + Unpin + Send> = match options.script {
        Some(path) => match tokio::fs::File::open(&path).await {
            Ok(file) => Box::new(file),
            Err(source) => return Err(ReplayError::Open { path, source }),
        },
        None => Box::new(tokio::io::stdin()),
    };

    run(reader, &mut replay, options.keep_going, |line| println!("{line}")).await
}

/// Feed every script line from `reader` into `replay`, passing output
/// lines to `emit`.
pub async fn run<R, F>(
    reader: R,
    replay: &mut Replay,
    keep_going: bool,
    mut emit: F,
) -> Result<Summary, ReplayError>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let mut number = 0usize;

    while let Some(line) = lines.next().await {
        let line = line?;
        number += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match replay.apply_line(trimmed) {
            Ok(output) => output.iter().for_each(|l| emit(l.as_str())),
            Err(e) if keep_going => {
                tracing::warn!(line = number, error = %e, "op failed, continuing");
                replay.summary.errors += 1;
                emit(&format!("line {number}: error: {e}"));
            }
            Err(e) => {
                return Err(ReplayError::Line {
                    line: number,
                    source: Box::new(e),
                });
            }
        }
    }

    Ok(replay.summary)
}

/// An in-memory host with the router installed.
pub struct Replay {
    platforms: Arc<PlatformManager>,
    sessions: Arc<SimSessionManager>,
    dispatch: EventDispatch,
    registered: HashMap<String, Arc<dyn Platform>>,
    players: HashMap<String, Arc<SimPlayer>>,
    consoles: HashMap<String, Arc<SimConsole>>,
    summary: Summary,
}

impl Replay {
    pub fn new(
        commands: Arc<dyn CommandRegistrar>,
        default_config: Arc<dyn ConfigurationSource>,
    ) -> Self {
        let platforms = Arc::new(PlatformManager::new(commands, default_config));
        let sessions = SimSessionManager::new();
        let router = Arc::new(Router::new(Arc::clone(&platforms), sessions.clone()));
        let mut dispatch = EventDispatch::new();
        router.install(&mut dispatch);

        Self {
            platforms,
            sessions,
            dispatch,
            registered: HashMap::new(),
            players: HashMap::new(),
            consoles: HashMap::new(),
            summary: Summary::default(),
        }
    }

    pub fn platforms(&self) -> &Arc<PlatformManager> {
        &self.platforms
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Parse and apply one script line.
    pub fn apply_line(&mut self, line: &str) -> Result<Vec<String>, ReplayError> {
        let op: Op = serde_json::from_str(line)?;
        self.apply(op)
    }

    /// Apply one op, returning the lines it printed.
    pub fn apply(&mut self, op: Op) -> Result<Vec<String>, ReplayError> {
        let output = match op {
            Op::Platform(decl) => self.add_platform(decl)?,
            Op::Unregister { name } => {
                let platform = self
                    .registered
                    .remove(&name)
                    .ok_or_else(|| ReplayError::UnknownPlatform(name.clone()))?;
                if self.platforms.unregister(&platform) {
                    vec![format!("platform {name} unregistered")]
                } else {
                    vec![format!("platform {name} was not registered")]
                }
            }
            Op::Player(decl) => self.add_player(decl)?,
            Op::Console { name } => {
                self.ensure_new_actor(&name)?;
                self.consoles.insert(name.clone(), SimConsole::new(&name));
                vec![format!("console {name} created")]
            }
            Op::Hold { player, item } => {
                self.player(&player)?.hold(item);
                Vec::new()
            }
            Op::Grant { player, permission } => {
                self.player(&player)?.grant(permission);
                Vec::new()
            }
            Op::Revoke { player, permission } => {
                self.player(&player)?.revoke(&permission);
                Vec::new()
            }
            Op::Bind {
                player,
                item,
                tool,
                usable,
                succeeds,
            } => {
                self.player(&player)?;
                let scripted = ScriptedTool::new(tool);
                scripted.set_usable(usable);
                scripted.set_succeeds(succeeds);
                self.sessions.session(&player).bind(item, scripted.bound());
                vec![format!("{player}: bound {tool} tool to {item}")]
            }
            Op::Unbind { player, item } => {
                self.player(&player)?;
                self.sessions.session(&player).unbind(item);
                Vec::new()
            }
            Op::SuperPickaxe {
                player,
                enabled,
                succeeds,
            } => {
                self.player(&player)?;
                let session = self.sessions.session(&player);
                if enabled {
                    let pickaxe = ScriptedTool::new(ToolKind::Block);
                    pickaxe.set_succeeds(succeeds);
                    session.enable_super_pickaxe(pickaxe);
                } else {
                    session.disable_super_pickaxe();
                }
                Vec::new()
            }
            Op::ToolControl { player, enabled } => {
                self.player(&player)?;
                self.sessions.session(&player).set_tool_control(enabled);
                Vec::new()
            }
            Op::Look {
                player,
                target,
                wall,
            } => {
                let player = self.player(&player)?;
                player.look_at(target.map(BlockVector::from));
                player.set_wall_ahead(wall);
                Vec::new()
            }
            Op::Interact {
                actor,
                kind,
                at,
                world,
            } => {
                let cause = self.actor(&actor)?;
                let world = world.unwrap_or_else(|| cause.world());
                let location = Location::new(world, BlockVector::from(at));
                let mut event = BlockInteractEvent::new(cause, location.clone(), kind);
                let consumed = self.dispatch.post_block_interact(&mut event);
                let mut output = vec![format!(
                    "interact {actor} {kind} {location}: {}",
                    outcome(consumed)
                )];
                self.record_event(consumed, &actor, &mut output);
                output
            }
            Op::Input { actor, kind } => {
                let player = self.actor(&actor)?;
                let mut event = PlayerInputEvent::new(player, kind);
                let consumed = self.dispatch.post_player_input(&mut event);
                let mut output = vec![format!("input {actor} {kind}: {}", outcome(consumed))];
                self.record_event(consumed, &actor, &mut output);
                output
            }
            Op::Status => self.status(),
        };
        self.summary.ops += 1;
        Ok(output)
    }

    fn add_platform(&mut self, decl: PlatformDecl) -> Result<Vec<String>, ReplayError> {
        // Platforms are addressed by name in later ops.
        if self.registered.contains_key(&decl.name) {
            return Err(ReplayError::DuplicatePlatform(decl.name));
        }
        let mut builder = SimPlatform::builder(&decl.name)
            .version(&decl.version)
            .platform_version(&decl.platform_version);
        if let Some(path) = decl.config_file {
            let source = FileConfiguration::new(path);
            source.load()?;
            builder = builder.config_source(Arc::new(source));
        } else if let Some(config) = decl.config {
            builder = builder.config(config);
        }
        for world in decl.worlds {
            builder = builder.world(world);
        }
        if decl.native {
            builder = builder.native_server_interface();
        }

        let platform: Arc<dyn Platform> = builder.build();
        let line = match self.platforms.register(Arc::clone(&platform))? {
            Registration::Primary => format!("platform {} registered (primary)", decl.name),
            Registration::Secondary { skew: None } => {
                format!("platform {} registered", decl.name)
            }
            Registration::Secondary { skew: Some(skew) } => format!(
                "platform {} registered (toolkit v{} differs from primary {} v{})",
                decl.name, skew.version, skew.primary, skew.primary_version
            ),
        };
        self.registered.insert(decl.name, platform);
        Ok(vec![line])
    }

    fn add_player(&mut self, decl: PlayerDecl) -> Result<Vec<String>, ReplayError> {
        self.ensure_new_actor(&decl.name)?;
        let mut builder = SimPlayer::builder(&decl.name).world(&decl.world);
        for permission in decl.permissions {
            builder = builder.permission(permission);
        }
        if let Some(item) = decl.hand {
            builder = builder.holding(item);
        }
        if let Some(at) = decl.at {
            builder = builder.at(BlockVector::from(at));
        }
        if !decl.advanced_tools {
            builder = builder.basic_tools_only();
        }
        let line = format!("player {} created in {}", decl.name, decl.world);
        self.players.insert(decl.name, builder.build());
        Ok(vec![line])
    }

    fn ensure_new_actor(&self, name: &str) -> Result<(), ReplayError> {
        if self.players.contains_key(name) || self.consoles.contains_key(name) {
            return Err(ReplayError::DuplicateActor(name.to_owned()));
        }
        Ok(())
    }

    fn player(&self, name: &str) -> Result<Arc<SimPlayer>, ReplayError> {
        if let Some(player) = self.players.get(name) {
            return Ok(Arc::clone(player));
        }
        if self.consoles.contains_key(name) {
            return Err(ReplayError::NotAPlayer(name.to_owned()));
        }
        Err(ReplayError::UnknownActor(name.to_owned()))
    }

    fn actor(&self, name: &str) -> Result<Arc<dyn Actor>, ReplayError> {
        if let Some(player) = self.players.get(name) {
            return Ok(player.clone());
        }
        if let Some(console) = self.consoles.get(name) {
            return Ok(console.clone());
        }
        Err(ReplayError::UnknownActor(name.to_owned()))
    }

    /// Count the event and append the messages the actor received.
    fn record_event(&mut self, consumed: bool, actor: &str, output: &mut Vec<String>) {
        self.summary.events += 1;
        if consumed {
            self.summary.consumed += 1;
        }

        let messages = match (self.players.get(actor), self.consoles.get(actor)) {
            (Some(player), _) => player.take_messages(),
            (None, Some(console)) => console.take_messages(),
            (None, None) => Vec::new(),
        };
        output.extend(messages.into_iter().map(|m| match m {
            ActorMessage::Info(text) => format!("  {actor}: {text}"),
            ActorMessage::Error(text) => format!("  {actor}: error: {text}"),
        }));
    }

    fn status(&self) -> Vec<String> {
        let names: Vec<String> = self
            .platforms
            .platforms()
            .iter()
            .map(|p| p.name().to_owned())
            .collect();
        let primary = self
            .platforms
            .primary_platform()
            .map_or_else(|| "none".to_owned(), |p| p.name().to_owned());
        let config = self.platforms.configuration().current();

        vec![
            format!("platforms: [{}]", names.join(", ")),
            format!("primary: {primary}"),
            format!(
                "config: wand {} navigation {} max distance {}",
                config.wand_item, config.navigation_wand, config.navigation_wand_max_distance
            ),
        ]
    }
}

fn outcome(consumed: bool) -> &'static str {
    if consumed { "consumed" } else { "passed" }
}
