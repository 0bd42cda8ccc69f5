//! Reference platform and command registrar.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::lock;
use crate::platform::{
    CommandRegistrar, ConfigurationSource, FixedConfiguration, LocalConfiguration, Platform,
    PlatformRejection, ServerInterface,
};
use crate::world::ItemType;

const MOB_TYPES: &[&str] = &[
    "pig", "cow", "sheep", "chicken", "zombie", "skeleton", "creeper", "spider",
];

/// Item names known to the reference platform.
fn item_by_name(name: &str) -> Option<ItemType> {
    let item = match name.to_ascii_lowercase().as_str() {
        "air" => ItemType::AIR,
        "wood_axe" | "wooden_axe" => ItemType::WOOD_AXE,
        "compass" => ItemType::COMPASS,
        "wood_pickaxe" | "wooden_pickaxe" => ItemType::WOOD_PICKAXE,
        "stone_pickaxe" => ItemType::STONE_PICKAXE,
        "iron_pickaxe" => ItemType::IRON_PICKAXE,
        "gold_pickaxe" | "golden_pickaxe" => ItemType::GOLD_PICKAXE,
        "diamond_pickaxe" => ItemType::DIAMOND_PICKAXE,
        other => return other.parse().ok().map(ItemType),
    };
    Some(item)
}

/// A platform with fixed metadata and an in-memory world list.
pub struct SimPlatform {
    name: String,
    version: String,
    platform_version: String,
    config: Arc<dyn ConfigurationSource>,
    worlds: Vec<String>,
    native: bool,
    reloads: AtomicUsize,
}

impl SimPlatform {
    pub fn builder(name: impl Into<String>) -> SimPlatformBuilder {
        SimPlatformBuilder {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            platform_version: "sim".to_owned(),
            config: None,
            worlds: Vec::new(),
            native: false,
        }
    }

    /// Number of `reload` calls received, natively or through an adapter.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

/// Builder for [`SimPlatform`].
pub struct SimPlatformBuilder {
    name: String,
    version: String,
    platform_version: String,
    config: Option<Arc<dyn ConfigurationSource>>,
    worlds: Vec<String>,
    native: bool,
}

impl SimPlatformBuilder {
    /// Toolkit protocol version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn platform_version(mut self, version: impl Into<String>) -> Self {
        self.platform_version = version.into();
        self
    }

    pub fn config(self, settings: LocalConfiguration) -> Self {
        self.config_source(Arc::new(FixedConfiguration::new(settings)))
    }

    pub fn config_source(mut self, source: Arc<dyn ConfigurationSource>) -> Self {
        self.config = Some(source);
        self
    }

    pub fn world(mut self, world: impl Into<String>) -> Self {
        self.worlds.push(world.into());
        self
    }

    /// Expose the platform as its own [`ServerInterface`] instead of
    /// going through the adapter.
    pub fn native_server_interface(mut self) -> Self {
        self.native = true;
        self
    }

    pub fn build(self) -> Arc<SimPlatform> {
        Arc::new(SimPlatform {
            name: self.name,
            version: self.version,
            platform_version: self.platform_version,
            config: self
                .config
                .unwrap_or_else(|| Arc::new(FixedConfiguration::default())),
            worlds: self.worlds,
            native: self.native,
            reloads: AtomicUsize::new(0),
        })
    }
}

impl Platform for SimPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn platform_version(&self) -> &str {
        &self.platform_version
    }

    fn configuration(&self) -> Arc<dyn ConfigurationSource> {
        Arc::clone(&self.config)
    }

    fn resolve_item(&self, name: &str) -> Option<ItemType> {
        item_by_name(name)
    }

    fn is_valid_mob_type(&self, kind: &str) -> bool {
        MOB_TYPES.contains(&kind)
    }

    fn worlds(&self) -> Vec<String> {
        self.worlds.clone()
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.config.load() {
            tracing::warn!(platform = %self.name, error = %e, "configuration reload failed");
        }
    }

    fn native_server_interface(self: Arc<Self>) -> Option<Arc<dyn ServerInterface>> {
        if self.native { Some(self) } else { None }
    }
}

impl ServerInterface for SimPlatform {
    fn resolve_item(&self, name: &str) -> Option<ItemType> {
        item_by_name(name)
    }

    fn is_valid_mob_type(&self, kind: &str) -> bool {
        MOB_TYPES.contains(&kind)
    }

    fn worlds(&self) -> Vec<String> {
        self.worlds.clone()
    }

    fn reload(&self) {
        Platform::reload(self);
    }
}

/// Command registrar that records calls and can refuse named platforms.
#[derive(Default)]
pub struct RecordingRegistrar {
    rejected: HashSet<String>,
    registered: Mutex<Vec<String>>,
    unregisters: AtomicUsize,
}

impl RecordingRegistrar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A registrar that rejects every platform named in `names`.
    pub fn rejecting<I, S>(names: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            rejected: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        })
    }

    /// Names of platforms commands were registered with, in call order.
    pub fn registered(&self) -> Vec<String> {
        lock(&self.registered).clone()
    }

    pub fn unregister_count(&self) -> usize {
        self.unregisters.load(Ordering::SeqCst)
    }
}

impl CommandRegistrar for RecordingRegistrar {
    fn register(&self, platform: &Arc<dyn Platform>) -> Result<(), PlatformRejection> {
        if self.rejected.contains(platform.name()) {
            return Err(PlatformRejection {
                platform: platform.name().to_owned(),
                reason: "incompatible command schema".to_owned(),
            });
        }
        tracing::info!(platform = platform.name(), "commands registered");
        lock(&self.registered).push(platform.name().to_owned());
        Ok(())
    }

    fn unregister(&self) {
        tracing::info!("commands unregistered");
        self.unregisters.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_names_and_ids_resolve() {
        assert_eq!(item_by_name("Diamond_Pickaxe"), Some(ItemType::DIAMOND_PICKAXE));
        assert_eq!(item_by_name("345"), Some(ItemType::COMPASS));
        assert_eq!(item_by_name("banana"), None);
    }

    #[test]
    fn native_flag_controls_server_interface() {
        let plain = SimPlatform::builder("plain").build();
        assert!(plain.native_server_interface().is_none());

        let native = SimPlatform::builder("native").native_server_interface().build();
        assert!(native.native_server_interface().is_some());
    }

    #[test]
    fn reload_reloads_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let source = Arc::new(crate::platform::config::FileConfiguration::new(&path));
        let platform = SimPlatform::builder("bukkit")
            .config_source(source.clone())
            .build();

        std::fs::write(&path, r#"{"wand_item": 280}"#).unwrap();
        Platform::reload(platform.as_ref());

        assert_eq!(platform.reload_count(), 1);
        assert_eq!(platform.configuration().current().wand_item, ItemType(280));
    }

    #[test]
    fn registrar_rejects_named_platforms() {
        let registrar = RecordingRegistrar::rejecting(["sponge"]);
        let sponge: Arc<dyn Platform> = SimPlatform::builder("sponge").build();
        let bukkit: Arc<dyn Platform> = SimPlatform::builder("bukkit").build();

        let err = registrar.register(&sponge).unwrap_err();
        assert_eq!(err.platform, "sponge");
        registrar.register(&bukkit).unwrap();
        assert_eq!(registrar.registered(), vec!["bukkit"]);
    }
}
