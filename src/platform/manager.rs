//! Platform registry: registration, primary election, version skew.
//!
//! A single mutex guards both the platform list and the primary
//! reference so that readers never observe a primary that is not in the
//! list, or a list change without its primary change.
//!
//! The command registrar is always called with the mutex released, so a
//! registrar may read the registry from its callback. While a call is in
//! flight, registrations that would elect a primary wait for it.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use super::{
    CommandRegistrar, ConfigurationSource, Platform, RegistryError, ServerInterface,
    ServerInterfaceAdapter, same_platform,
};

/// Two registered platforms disagree on the toolkit version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSkew {
    pub platform: String,
    pub platform_version: String,
    pub version: String,
    pub primary: String,
    pub primary_platform_version: String,
    pub primary_version: String,
}

impl fmt::Display for VersionSkew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "platform version mismatch: {} v{} is trying to register toolkit v{} \
             but the primary platform, {} v{}, uses toolkit v{}; things may break, \
             keep toolkit versions in sync",
            self.platform,
            self.platform_version,
            self.version,
            self.primary,
            self.primary_platform_version,
            self.primary_version,
        )
    }
}

/// Outcome of a successful [`PlatformManager::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The platform was elected primary and received command registration.
    Primary,
    /// Another platform is primary. `skew` is set when the toolkit
    /// versions differ.
    Secondary { skew: Option<VersionSkew> },
}

#[derive(Default)]
struct RegistryState {
    /// Insertion order. Duplicates are kept.
    platforms: Vec<Arc<dyn Platform>>,
    /// Always a member of `platforms` when set.
    primary: Option<Arc<dyn Platform>>,
    /// A command registrar call is running outside the lock.
    registrar_busy: bool,
}

/// An in-flight command registrar call.
///
/// Clears `registrar_busy` when finished, or when dropped during a panic
/// in the registrar.
struct RegistrarCall<'a> {
    manager: &'a PlatformManager,
    finished: bool,
}

impl<'a> RegistrarCall<'a> {
    /// Re-take the lock, clear the busy flag and wake waiting registrations.
    /// The returned guard lets the caller commit before anyone else runs.
    fn finish(mut self) -> MutexGuard<'a, RegistryState> {
        self.finished = true;
        self.manager.release_registrar()
    }
}

impl Drop for RegistrarCall<'_> {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.manager.release_registrar());
        }
    }
}

/// Registry of active platforms.
///
/// Thread-safe. Every accessor takes the same lock, so a primary swap is
/// observed atomically by concurrent event dispatch.
pub struct PlatformManager {
    state: Mutex<RegistryState>,
    registrar_idle: Condvar,
    commands: Arc<dyn CommandRegistrar>,
    default_config: Arc<dyn ConfigurationSource>,
}

impl PlatformManager {
    /// Create an empty registry.
    ///
    /// `default_config` is returned by [`configuration`](Self::configuration)
    /// while no platform is registered.
    pub fn new(
        commands: Arc<dyn CommandRegistrar>,
        default_config: Arc<dyn ConfigurationSource>,
    ) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            registrar_idle: Condvar::new(),
            commands,
            default_config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the registrar busy and release the lock for the call.
    fn begin_registrar_call(&self, mut state: MutexGuard<'_, RegistryState>) -> RegistrarCall<'_> {
        state.registrar_busy = true;
        drop(state);
        RegistrarCall {
            manager: self,
            finished: false,
        }
    }

    fn release_registrar(&self) -> MutexGuard<'_, RegistryState> {
        let mut state = self.lock();
        state.registrar_busy = false;
        self.registrar_idle.notify_all();
        state
    }

    /// Register a platform.
    ///
    /// The first platform becomes primary and is handed to the command
    /// registrar. If the registrar rejects it the platform is not added.
    /// Later platforms are appended without changing the primary; a
    /// toolkit version mismatch is logged once and reported in the
    /// returned [`Registration`].
    pub fn register(&self, platform: Arc<dyn Platform>) -> Result<Registration, RegistryError> {
        tracing::debug!(
            platform = platform.name(),
            version = platform.version(),
            "got request to register platform"
        );

        let mut state = self.lock();
        // Another election or teardown is in flight; its outcome decides
        // whether this platform is primary.
        while state.registrar_busy && state.primary.is_none() {
            state = self
                .registrar_idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let Some(primary) = state.primary.clone() else {
            let call = self.begin_registrar_call(state);
            let result = self.commands.register(&platform);
            let mut state = call.finish();
            if let Err(rejection) = result {
                tracing::debug!(platform = platform.name(), error = %rejection, "registration rejected");
                return Err(rejection.into());
            }
            state.platforms.push(Arc::clone(&platform));
            state.primary = Some(platform);
            return Ok(Registration::Primary);
        };

        state.platforms.push(Arc::clone(&platform));

        if primary.version() == platform.version() {
            return Ok(Registration::Secondary { skew: None });
        }

        let skew = VersionSkew {
            platform: platform.name().to_owned(),
            platform_version: platform.platform_version().to_owned(),
            version: platform.version().to_owned(),
            primary: primary.name().to_owned(),
            primary_platform_version: primary.platform_version().to_owned(),
            primary_version: primary.version().to_owned(),
        };
        tracing::warn!(
            platform = %skew.platform,
            version = %skew.version,
            primary = %skew.primary,
            primary_version = %skew.primary_version,
            "{skew}"
        );
        Ok(Registration::Secondary { skew: Some(skew) })
    }

    /// Unregister a platform. Returns whether it was registered.
    ///
    /// Removing the primary clears it and tears down command registration.
    /// No other platform is promoted.
    pub fn unregister(&self, platform: &Arc<dyn Platform>) -> bool {
        let mut state = self.lock();
        let Some(index) = state
            .platforms
            .iter()
            .position(|p| same_platform(p, platform))
        else {
            return false;
        };
        state.platforms.remove(index);
        tracing::debug!(platform = platform.name(), "unregistering platform");

        let was_primary = state
            .primary
            .as_ref()
            .is_some_and(|primary| same_platform(primary, platform));
        if was_primary {
            state.primary = None;
            let call = self.begin_registrar_call(state);
            self.commands.unregister();
            drop(call.finish());
        }
        true
    }

    /// Snapshot of the registered platforms in registration order.
    pub fn platforms(&self) -> Vec<Arc<dyn Platform>> {
        self.lock().platforms.clone()
    }

    /// The current primary platform, if any.
    pub fn primary_platform(&self) -> Option<Arc<dyn Platform>> {
        self.lock().primary.clone()
    }

    /// Configuration of the primary platform, or the default configuration
    /// when none is registered.
    pub fn configuration(&self) -> Arc<dyn ConfigurationSource> {
        match self.primary_platform() {
            Some(platform) => platform.configuration(),
            None => Arc::clone(&self.default_config),
        }
    }

    /// The primary platform.
    pub fn platform(&self) -> Result<Arc<dyn Platform>, RegistryError> {
        self.primary_platform().ok_or(RegistryError::NoPlatform)
    }

    /// The primary platform as a legacy [`ServerInterface`].
    pub fn server_interface(&self) -> Result<Arc<dyn ServerInterface>, RegistryError> {
        let platform = self.platform()?;
        match Arc::clone(&platform).native_server_interface() {
            Some(native) => Ok(native),
            None => Ok(ServerInterfaceAdapter::adapt(platform)),
        }
    }
}

impl fmt::Debug for PlatformManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let names: Vec<&str> = state.platforms.iter().map(|p| p.name()).collect();
        f.debug_struct("PlatformManager")
            .field("platforms", &names)
            .field("primary", &state.primary.as_ref().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak, mpsc};
    use std::time::Duration;

    use crate::platform::PlatformRejection;
    use crate::platform::config::{FixedConfiguration, LocalConfiguration};
    use crate::sim::{RecordingRegistrar, SimPlatform};
    use crate::world::ItemType;

    fn manager() -> (PlatformManager, Arc<RecordingRegistrar>) {
        let registrar = RecordingRegistrar::new();
        let manager = PlatformManager::new(
            registrar.clone(),
            Arc::new(FixedConfiguration::default()),
        );
        (manager, registrar)
    }

    fn platform(name: &str, version: &str) -> Arc<dyn Platform> {
        SimPlatform::builder(name).version(version).build()
    }

    fn is(a: &Arc<dyn Platform>, b: &Arc<dyn Platform>) -> bool {
        same_platform(a, b)
    }

    /// In-memory sink for formatted log output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Run `f` with WARN-level log output captured.
    fn capture_warnings(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    // -- Registration --

    #[test]
    fn first_platform_becomes_primary() {
        let (m, registrar) = manager();
        let p = platform("bukkit", "6.0");

        assert_eq!(m.register(p.clone()).unwrap(), Registration::Primary);
        assert!(is(&m.primary_platform().unwrap(), &p));
        assert_eq!(registrar.registered(), vec!["bukkit"]);
        assert_eq!(m.platforms().len(), 1);
    }

    #[test]
    fn second_platform_keeps_primary() {
        let (m, registrar) = manager();
        let first = platform("bukkit", "6.0");
        let second = platform("forge", "6.0");
        m.register(first.clone()).unwrap();

        let outcome = m.register(second.clone()).unwrap();
        assert_eq!(outcome, Registration::Secondary { skew: None });
        assert!(is(&m.primary_platform().unwrap(), &first));
        assert_eq!(registrar.registered(), vec!["bukkit"]);

        let names: Vec<String> = m.platforms().iter().map(|p| p.name().to_owned()).collect();
        assert_eq!(names, vec!["bukkit", "forge"]);
    }

    #[test]
    fn rejected_platform_is_not_added() {
        let registrar = RecordingRegistrar::rejecting(["sponge"]);
        let m = PlatformManager::new(registrar.clone(), Arc::new(FixedConfiguration::default()));

        let err = m.register(platform("sponge", "6.0")).unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(ref r) if r.platform == "sponge"));
        assert!(m.platforms().is_empty());
        assert!(m.primary_platform().is_none());

        // A later platform can still become primary.
        assert_eq!(m.register(platform("bukkit", "6.0")).unwrap(), Registration::Primary);
    }

    #[test]
    fn duplicate_registration_is_kept() {
        let (m, _) = manager();
        let p = platform("bukkit", "6.0");
        m.register(p.clone()).unwrap();
        m.register(p.clone()).unwrap();
        assert_eq!(m.platforms().len(), 2);
    }

    #[test]
    fn version_mismatch_is_reported() {
        let (m, _) = manager();
        m.register(SimPlatform::builder("bukkit").version("6.0").platform_version("1.7.10").build())
            .unwrap();

        let outcome = m
            .register(SimPlatform::builder("forge").version("5.9").platform_version("10.13").build())
            .unwrap();

        let Registration::Secondary { skew: Some(skew) } = outcome else {
            panic!("expected a version skew, got {outcome:?}");
        };
        assert_eq!(skew.version, "5.9");
        assert_eq!(skew.primary_version, "6.0");
        assert_eq!(skew.platform_version, "10.13");
        assert_eq!(skew.primary_platform_version, "1.7.10");
        assert_eq!(m.platforms().len(), 2);
    }

    #[test]
    fn version_mismatch_logs_exactly_one_warning() {
        let (m, _) = manager();
        let logs = capture_warnings(|| {
            m.register(platform("bukkit", "6.0")).unwrap();
            m.register(platform("forge", "5.9")).unwrap();
        });

        assert_eq!(logs.matches("WARN").count(), 1, "logs: {logs}");
        assert!(logs.contains("v6.0"));
        assert!(logs.contains("v5.9"));
        assert!(logs.contains("bukkit"));
        assert!(logs.contains("forge"));
    }

    #[test]
    fn matching_versions_log_nothing() {
        let (m, _) = manager();
        let logs = capture_warnings(|| {
            m.register(platform("bukkit", "6.0")).unwrap();
            m.register(platform("forge", "6.0")).unwrap();
        });
        assert!(logs.is_empty(), "logs: {logs}");
    }

    // -- Unregistration --

    #[test]
    fn unregister_unknown_returns_false() {
        let (m, registrar) = manager();
        let p = platform("bukkit", "6.0");
        m.register(p.clone()).unwrap();

        assert!(!m.unregister(&platform("forge", "6.0")));
        assert_eq!(m.platforms().len(), 1);
        assert!(is(&m.primary_platform().unwrap(), &p));
        assert_eq!(registrar.unregister_count(), 0);
    }

    #[test]
    fn unregister_primary_clears_it() {
        let (m, registrar) = manager();
        let first = platform("bukkit", "6.0");
        let second = platform("forge", "6.0");
        m.register(first.clone()).unwrap();
        m.register(second.clone()).unwrap();

        assert!(m.unregister(&first));
        assert!(m.primary_platform().is_none());
        assert_eq!(registrar.unregister_count(), 1);
        // No auto-promotion.
        assert_eq!(m.platforms().len(), 1);
        assert!(matches!(m.platform(), Err(RegistryError::NoPlatform)));
    }

    #[test]
    fn unregister_secondary_keeps_primary() {
        let (m, registrar) = manager();
        let first = platform("bukkit", "6.0");
        let second = platform("forge", "6.0");
        m.register(first.clone()).unwrap();
        m.register(second.clone()).unwrap();

        assert!(m.unregister(&second));
        assert!(is(&m.primary_platform().unwrap(), &first));
        assert_eq!(registrar.unregister_count(), 0);
    }

    #[test]
    fn next_registration_after_primary_removal_becomes_primary() {
        let (m, registrar) = manager();
        let first = platform("bukkit", "6.0");
        let second = platform("forge", "6.0");
        m.register(first.clone()).unwrap();
        m.unregister(&first);

        assert_eq!(m.register(second.clone()).unwrap(), Registration::Primary);
        assert!(is(&m.primary_platform().unwrap(), &second));
        assert_eq!(registrar.registered(), vec!["bukkit", "forge"]);
    }

    #[test]
    fn platforms_is_a_snapshot() {
        let (m, _) = manager();
        m.register(platform("bukkit", "6.0")).unwrap();

        let mut snapshot = m.platforms();
        snapshot.clear();
        assert_eq!(m.platforms().len(), 1);
    }

    // -- Configuration and platform access --

    #[test]
    fn empty_registry_uses_default_configuration() {
        let (m, _) = manager();
        let config = m.configuration();
        config.load().unwrap();
        assert_eq!(config.current(), LocalConfiguration::default());
        assert!(matches!(m.platform(), Err(RegistryError::NoPlatform)));
        assert!(matches!(m.server_interface(), Err(RegistryError::NoPlatform)));
    }

    #[test]
    fn primary_supplies_configuration() {
        let (m, _) = manager();
        let settings = LocalConfiguration {
            wand_item: ItemType(280),
            ..LocalConfiguration::default()
        };
        m.register(SimPlatform::builder("bukkit").config(settings.clone()).build())
            .unwrap();
        assert_eq!(m.configuration().current(), settings);
    }

    #[test]
    fn server_interface_wraps_plain_platform() {
        let (m, _) = manager();
        m.register(SimPlatform::builder("bukkit").world("world").build())
            .unwrap();
        let server = m.server_interface().unwrap();
        assert_eq!(server.worlds(), vec!["world"]);
    }

    #[test]
    fn server_interface_uses_native_implementation() {
        let (m, _) = manager();
        let native = SimPlatform::builder("legacy").native_server_interface().build();
        m.register(native.clone()).unwrap();

        let server = m.server_interface().unwrap();
        let expected: Arc<dyn ServerInterface> = native;
        assert!(std::ptr::addr_eq(Arc::as_ptr(&server), Arc::as_ptr(&expected)));
    }

    /// Registrar that reads the registry back from inside its callbacks.
    #[derive(Default)]
    struct ReadingRegistrar {
        manager: OnceLock<Weak<PlatformManager>>,
        /// Primary and wand item seen from each callback.
        seen: Mutex<Vec<(Option<String>, ItemType)>>,
    }

    impl ReadingRegistrar {
        fn observe(&self) {
            let manager = self.manager.get().and_then(Weak::upgrade).unwrap();
            let primary = manager.primary_platform().map(|p| p.name().to_owned());
            let wand = manager.configuration().current().wand_item;
            self.seen.lock().unwrap().push((primary, wand));
        }
    }

    impl CommandRegistrar for ReadingRegistrar {
        fn register(&self, _platform: &Arc<dyn Platform>) -> Result<(), PlatformRejection> {
            self.observe();
            Ok(())
        }

        fn unregister(&self) {
            self.observe();
        }
    }

    #[test]
    fn registrar_can_read_registry_from_callbacks() {
        let registrar = Arc::new(ReadingRegistrar::default());
        let m = Arc::new(PlatformManager::new(
            registrar.clone(),
            Arc::new(FixedConfiguration::default()),
        ));
        registrar.manager.set(Arc::downgrade(&m)).unwrap();

        let (done, finished) = mpsc::channel();
        let worker = Arc::clone(&m);
        std::thread::spawn(move || {
            let p = platform("bukkit", "6.0");
            let outcome = worker.register(p.clone()).unwrap();
            assert!(worker.unregister(&p));
            done.send(outcome).unwrap();
        });

        let outcome = finished
            .recv_timeout(Duration::from_secs(3))
            .expect("registrar callback blocked on the registry");
        assert_eq!(outcome, Registration::Primary);
        // Neither callback sees the platform as primary yet (register) or
        // any more (unregister); both fall back to the default settings.
        assert_eq!(
            *registrar.seen.lock().unwrap(),
            vec![(None, ItemType::WOOD_AXE), (None, ItemType::WOOD_AXE)]
        );
    }

    /// Registrar that holds `register` open until told to continue.
    struct GatedRegistrar {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
        calls: AtomicUsize,
    }

    impl CommandRegistrar for GatedRegistrar {
        fn register(&self, _platform: &Arc<dyn Platform>) -> Result<(), PlatformRejection> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(())
        }

        fn unregister(&self) {}
    }

    #[test]
    fn registration_waits_for_pending_election() {
        let (entered_tx, entered) = mpsc::channel();
        let (release, release_rx) = mpsc::channel();
        let registrar = Arc::new(GatedRegistrar {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
            calls: AtomicUsize::new(0),
        });
        let m = Arc::new(PlatformManager::new(
            registrar.clone(),
            Arc::new(FixedConfiguration::default()),
        ));

        let first = {
            let m = Arc::clone(&m);
            std::thread::spawn(move || m.register(platform("bukkit", "6.0")).unwrap())
        };
        entered.recv_timeout(Duration::from_secs(3)).unwrap();

        let second = {
            let m = Arc::clone(&m);
            std::thread::spawn(move || m.register(platform("forge", "6.0")).unwrap())
        };

        // Readers are not blocked by the in-flight registrar call.
        assert_eq!(m.configuration().current(), LocalConfiguration::default());
        assert!(m.primary_platform().is_none());
        std::thread::sleep(Duration::from_millis(50));
        assert!(m.platforms().is_empty());

        release.send(()).unwrap();
        assert_eq!(first.join().unwrap(), Registration::Primary);
        assert_eq!(second.join().unwrap(), Registration::Secondary { skew: None });
        assert_eq!(registrar.calls.load(Ordering::SeqCst), 1);
        assert_eq!(m.primary_platform().unwrap().name(), "bukkit");
    }

    #[test]
    fn concurrent_registration_keeps_single_primary() {
        let (m, registrar) = manager();
        let m = Arc::new(m);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let m = Arc::clone(&m);
                std::thread::spawn(move || {
                    m.register(platform(&format!("p{i}"), "6.0")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(m.platforms().len(), 8);
        assert_eq!(registrar.registered().len(), 1);
        let primary = m.primary_platform().unwrap();
        assert!(m.platforms().iter().any(|p| is(p, &primary)));
    }
}
