//! Service lifecycle and the lookup facade
//!
//! ```text
//!   Inactive ──start──▶ Starting ──load ok──▶ Active ──stop──▶ Stopping ──▶ Inactive
//!                          │
//!                          └──cancel / error──▶ Inactive
//! ```
//!
//! A load builds a complete [`GeoSnapshot`] off to the side and then
//! publishes it with one atomic pointer swap. Lookups read whatever
//! snapshot is published at that moment without taking a lock; a lookup
//! that already holds the old snapshot finishes on it even if `stop`
//! runs concurrently.
//!
//! ```rust,no_run
//! use geoprefix::{GeoConfig, GeoService, Resolution};
//!
//! let service = GeoService::configure(GeoConfig::new("/var/lib/geoip", Resolution::City))?;
//! let handle = service.start_background()?;
//! handle.wait()?;
//!
//! if let Some(entity) = service.lookup("81.2.69.160".parse().unwrap()) {
//!     println!("{:?}", entity.country_iso_code());
//! }
//! # Ok::<(), geoprefix::GeoError>(())
//! ```

use crate::config::{GeoConfig, InputFiles};
use crate::entity::GeoEntity;
use crate::error::{GeoError, Result};
use crate::loader::{GeoSnapshot, LoadReport, Loader};
use crate::schema::Resolution;
use arc_swap::ArcSwapOption;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// Lifecycle state of a [`GeoService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServiceState {
    /// Nothing loaded
    Inactive = 0,
    /// A load is in progress
    Starting = 1,
    /// A snapshot is published and lookups are served
    Active = 2,
    /// The snapshot is being released
    Stopping = 3,
}

impl ServiceState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ServiceState::Starting,
            2 => ServiceState::Active,
            3 => ServiceState::Stopping,
            _ => ServiceState::Inactive,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Inactive => "inactive",
            ServiceState::Starting => "starting",
            ServiceState::Active => "active",
            ServiceState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Runs a load off the caller's thread
pub trait TaskSpawner: Send + Sync {
    /// Run `task` to completion somewhere else
    fn spawn(&self, name: &str, task: Box<dyn FnOnce() + Send + 'static>) -> std::io::Result<()>;
}

/// Spawns a named OS thread per task
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, name: &str, task: Box<dyn FnOnce() + Send + 'static>) -> std::io::Result<()> {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(task)
            .map(|_| ())
    }
}

/// Completion of a background load
pub struct LoadHandle {
    rx: Receiver<Result<LoadReport>>,
}

impl LoadHandle {
    fn worker_gone() -> GeoError {
        GeoError::Io("load worker exited without reporting".to_string())
    }

    /// Block until the load finishes
    pub fn wait(self) -> Result<LoadReport> {
        self.rx.recv().unwrap_or_else(|_| Err(Self::worker_gone()))
    }

    /// Wait up to `timeout`; `None` if the load is still running
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<LoadReport>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(Self::worker_gone())),
        }
    }
}

struct Shared {
    config: GeoConfig,
    state: AtomicU8,
    /// Cancel flag of the running load; set exactly while `Starting`
    cancel: Mutex<Option<Arc<AtomicBool>>>,
    snapshot: ArcSwapOption<GeoSnapshot>,
    report: ArcSwapOption<LoadReport>,
}

impl Shared {
    fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ServiceState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn current_cancel(&self) -> MutexGuard<'_, Option<Arc<AtomicBool>>> {
        self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validate inputs and move Inactive -> Starting with a fresh cancel flag
    fn begin_start(&self) -> Result<(InputFiles, Arc<AtomicBool>)> {
        let files = self.config.validate()?;

        let mut current = self.current_cancel();
        self.state
            .compare_exchange(
                ServiceState::Inactive as u8,
                ServiceState::Starting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|actual| {
                GeoError::InvalidState(format!(
                    "cannot start while {}",
                    ServiceState::from_u8(actual)
                ))
            })?;
        let cancel = Arc::new(AtomicBool::new(false));
        *current = Some(Arc::clone(&cancel));
        Ok((files, cancel))
    }

    /// Leave Starting and retire the load's cancel flag
    fn end_start(&self, state: ServiceState) {
        let mut current = self.current_cancel();
        *current = None;
        self.set_state(state);
    }

    /// Load, then publish on success; always leaves Starting
    fn run_load(&self, files: &InputFiles, cancel: &AtomicBool) -> Result<LoadReport> {
        let result = Loader::new(&self.config, files, cancel)
            .load()
            .and_then(|loaded| {
                // A cancel that lands after the last row still wins
                if cancel.load(Ordering::Acquire) {
                    Err(GeoError::Canceled)
                } else {
                    Ok(loaded)
                }
            });

        match result {
            Ok((snapshot, report)) => {
                self.snapshot.store(Some(Arc::new(snapshot)));
                self.report.store(Some(Arc::new(report.clone())));
                self.end_start(ServiceState::Active);
                info!(
                    data_dir = %self.config.data_dir.display(),
                    nodes = report.node_count,
                    "Geolocation snapshot published"
                );
                Ok(report)
            }
            Err(GeoError::Canceled) => {
                self.end_start(ServiceState::Inactive);
                info!("Geolocation load canceled");
                Err(GeoError::Canceled)
            }
            Err(e) => {
                self.end_start(ServiceState::Inactive);
                error!(error = %e, "Geolocation load failed");
                Err(e)
            }
        }
    }
}

/// IP geolocation service
///
/// Cloning is cheap; clones share state, so one clone can load while
/// others serve lookups.
#[derive(Clone)]
pub struct GeoService {
    shared: Arc<Shared>,
    spawner: Arc<dyn TaskSpawner>,
}

impl fmt::Debug for GeoService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoService")
            .field("data_dir", &self.shared.config.data_dir)
            .field("resolution", &self.shared.config.resolution)
            .field("state", &self.state())
            .finish()
    }
}

impl GeoService {
    /// Validate `config` and create an inactive service
    pub fn configure(config: GeoConfig) -> Result<Self> {
        Self::with_spawner(config, Arc::new(ThreadSpawner))
    }

    /// Like [`GeoService::configure`], running background loads on `spawner`
    pub fn with_spawner(config: GeoConfig, spawner: Arc<dyn TaskSpawner>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: AtomicU8::new(ServiceState::Inactive as u8),
                cancel: Mutex::new(None),
                snapshot: ArcSwapOption::empty(),
                report: ArcSwapOption::empty(),
            }),
            spawner,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        self.shared.state()
    }

    /// True once a snapshot is published and until `stop`
    pub fn available(&self) -> bool {
        self.state() == ServiceState::Active
    }

    /// Resolution the service loads
    pub fn resolution(&self) -> Resolution {
        self.shared.config.resolution
    }

    /// The configuration the service was created with
    pub fn config(&self) -> &GeoConfig {
        &self.shared.config
    }

    /// Report of the load behind the published snapshot
    pub fn last_report(&self) -> Option<Arc<LoadReport>> {
        self.shared.report.load_full()
    }

    /// Load on the calling thread and publish the result
    pub fn start(&self) -> Result<LoadReport> {
        let (files, cancel) = self.shared.begin_start()?;
        self.shared.run_load(&files, &cancel)
    }

    /// Load on the spawner and return immediately
    ///
    /// Configuration problems and a service that is not inactive are
    /// reported here, before anything is spawned.
    pub fn start_background(&self) -> Result<LoadHandle> {
        let (files, cancel) = self.shared.begin_start()?;
        let (tx, rx) = bounded(1);
        let shared = Arc::clone(&self.shared);

        let spawned = self.spawner.spawn(
            "geoprefix-load",
            Box::new(move || {
                let result = shared.run_load(&files, &cancel);
                let _ = tx.send(result);
            }),
        );

        if let Err(e) = spawned {
            self.shared.end_start(ServiceState::Inactive);
            return Err(GeoError::Io(format!("Failed to spawn load worker: {}", e)));
        }
        Ok(LoadHandle { rx })
    }

    /// Ask a running load to give up; no effect outside `Starting`
    pub fn cancel_start(&self) {
        if let Some(cancel) = self.shared.current_cancel().as_ref() {
            cancel.store(true, Ordering::Release);
        }
    }

    /// Release the published snapshot
    ///
    /// Stopping an inactive service is a no-op. Stopping during a load is
    /// refused; cancel it instead.
    pub fn stop(&self) -> Result<()> {
        match self.shared.state.compare_exchange(
            ServiceState::Active as u8,
            ServiceState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.shared.snapshot.store(None);
                self.shared.report.store(None);
                self.shared.set_state(ServiceState::Inactive);
                info!("Geolocation snapshot released");
                Ok(())
            }
            Err(current) if current == ServiceState::Inactive as u8 => Ok(()),
            Err(current) => Err(GeoError::InvalidState(format!(
                "cannot stop while {}",
                ServiceState::from_u8(current)
            ))),
        }
    }

    /// Geolocate an address
    ///
    /// `None` while the service is not active. Otherwise always an entity,
    /// with `block` unset when no network contains the address.
    pub fn lookup(&self, address: IpAddr) -> Option<GeoEntity> {
        if !self.available() {
            return None;
        }
        let guard = self.shared.snapshot.load();
        let snapshot = (*guard).as_ref()?;

        let block = snapshot.index.lookup(address).cloned();
        let location = block
            .as_ref()
            .and_then(|b| b.location_key())
            .and_then(|id| snapshot.locations.get(id.as_str()))
            .cloned();

        Some(GeoEntity {
            address,
            block,
            location,
        })
    }

    /// Parse `query` as an address and geolocate it
    pub fn lookup_str(&self, query: &str) -> Result<Option<GeoEntity>> {
        let address: IpAddr = query
            .trim()
            .parse()
            .map_err(|_| GeoError::InvalidAddress(query.to_string()))?;
        Ok(self.lookup(address))
    }
}
