//! Legacy server-interface facade.
//!
//! Older toolkit code talks to a [`ServerInterface`]. Platforms that do not
//! implement it natively are wrapped in a [`ServerInterfaceAdapter`] that
//! forwards each call to the equivalent [`Platform`] method.

use std::sync::Arc;

use super::Platform;
use crate::world::ItemType;

/// Server-facing operations used by tools.
pub trait ServerInterface: Send + Sync {
    /// Resolve an item by name (e.g. `"diamond_pickaxe"`).
    fn resolve_item(&self, name: &str) -> Option<ItemType>;

    /// Whether `kind` names a spawnable mob type.
    fn is_valid_mob_type(&self, kind: &str) -> bool;

    /// Names of the loaded worlds.
    fn worlds(&self) -> Vec<String>;

    /// Reload backend-side state (configuration and the like).
    fn reload(&self);
}

/// Forwards [`ServerInterface`] calls to a wrapped [`Platform`].
pub struct ServerInterfaceAdapter {
    platform: Arc<dyn Platform>,
}

impl ServerInterfaceAdapter {
    /// Wrap `platform` as a [`ServerInterface`].
    pub fn adapt(platform: Arc<dyn Platform>) -> Arc<dyn ServerInterface> {
        Arc::new(Self { platform })
    }
}

impl ServerInterface for ServerInterfaceAdapter {
    fn resolve_item(&self, name: &str) -> Option<ItemType> {
        self.platform.resolve_item(name)
    }

    fn is_valid_mob_type(&self, kind: &str) -> bool {
        self.platform.is_valid_mob_type(kind)
    }

    fn worlds(&self) -> Vec<String> {
        self.platform.worlds()
    }

    fn reload(&self) {
        self.platform.reload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPlatform;

    #[test]
    fn adapter_forwards_to_platform() {
        let platform = SimPlatform::builder("forge")
            .world("overworld")
            .world("nether")
            .build();
        let server = ServerInterfaceAdapter::adapt(platform.clone());

        assert_eq!(server.worlds(), vec!["overworld", "nether"]);
        assert_eq!(server.resolve_item("wood_axe"), Some(ItemType::WOOD_AXE));
        assert_eq!(server.resolve_item("no_such_item"), None);
        assert!(server.is_valid_mob_type("pig"));
        assert!(!server.is_valid_mob_type("dragonfly"));

        server.reload();
        assert_eq!(platform.reload_count(), 1);
    }
}
