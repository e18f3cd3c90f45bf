//! Cache lifecycle: reconciliation guard, cold-start warmer, shared cell
//!
//! The membership cache is either restored from a snapshot or rebuilt by
//! paginating the authoritative store. Exactly one initialization sequence
//! runs at a time; concurrent callers join the in-flight attempt and all
//! observe the same outcome.
//!
//! # Lifecycle states
//!
//! ```text
//!                  initialize()           restore ok / warm ok / empty fallback
//! Uninitialized ──────────────► Initializing ──────────────► Ready
//!       ▲                            │                         │
//!       │        hard failure        │                         │
//!       └────────────────────────────┘◄────── reinitialize() ──┘
//! ```
//!
//! A failed cold-start scan does not fail startup: the guard installs an
//! empty filter at the configured capacity and the allocator simply loses
//! the optimization until the next reinitialize.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{snapshot, BloomFilter, CacheConfig, FilterStats};
use crate::error::{AllocError, ConfigError, SnapshotError};
use crate::metrics::Metrics;
use crate::ports::{AuthoritativeStore, SnapshotStore};

/// Cache lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No filter installed; every check goes to the authority
    Uninitialized,
    /// One initialization sequence is in flight
    Initializing,
    /// Filter installed and serving queries
    Ready,
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheState::Uninitialized => write!(f, "uninitialized"),
            CacheState::Initializing => write!(f, "initializing"),
            CacheState::Ready => write!(f, "ready"),
        }
    }
}

/// Process-wide shared membership filter with dirty tracking
///
/// Queries and inserts are synchronous and non-suspending; each insert is
/// atomic with respect to the bit vector, so an external timeout can abort
/// a surrounding operation without leaving the filter half-updated.
pub struct MembershipCell {
    filter: RwLock<Option<BloomFilter>>,
    dirty: AtomicBool,
}

impl MembershipCell {
    pub(crate) fn new() -> Self {
        Self {
            filter: RwLock::new(None),
            dirty: AtomicBool::new(false),
        }
    }

    /// Whether a filter is currently installed
    pub fn is_loaded(&self) -> bool {
        self.filter.read().is_some()
    }

    /// Query the filter; `None` while no filter is installed, in which
    /// case callers must treat the name as "maybe absent" and ask the
    /// authority
    pub fn may_contain(&self, name: &str) -> Option<bool> {
        self.filter.read().as_ref().map(|f| f.may_contain(name))
    }

    /// Insert a name, marking the cell dirty when bits flipped
    ///
    /// A no-op returning `false` while no filter is installed.
    pub fn insert(&self, name: &str) -> bool {
        let mut guard = self.filter.write();
        match guard.as_mut() {
            Some(filter) => {
                let newly_set = filter.insert(name);
                if newly_set {
                    self.dirty.store(true, Ordering::Release);
                }
                newly_set
            }
            None => false,
        }
    }

    /// Read-only stats of the installed filter
    pub fn stats(&self) -> Option<FilterStats> {
        self.filter.read().as_ref().map(BloomFilter::stats)
    }

    /// Whether un-persisted inserts exist
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    fn install(&self, filter: BloomFilter) {
        *self.filter.write() = Some(filter);
        self.dirty.store(false, Ordering::Release);
    }

    fn discard(&self) {
        *self.filter.write() = None;
        self.dirty.store(false, Ordering::Release);
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn encode(&self) -> Option<Result<String, SnapshotError>> {
        self.filter.read().as_ref().map(snapshot::encode)
    }
}

/// Builds a fresh filter by paginating the authoritative store
///
/// Used on cold start (no snapshot, or snapshot decode failure) and on
/// explicit reinitialization after out-of-band data changes.
pub struct CacheWarmer<'a, A> {
    authority: &'a A,
    config: &'a CacheConfig,
}

impl<'a, A: AuthoritativeStore> CacheWarmer<'a, A> {
    pub fn new(authority: &'a A, config: &'a CacheConfig) -> Self {
        Self { authority, config }
    }

    /// Scan the authority and build a populated filter
    ///
    /// The filter is sized at `max(configured capacity, row_count *
    /// warm_headroom)` so growth after the scan does not immediately
    /// degrade the false positive rate. Pages are inserted as they
    /// arrive; a page shorter than the page size terminates the scan.
    pub async fn build(&self) -> Result<BloomFilter, AllocError> {
        let row_count = self.authority.count_all().await?;
        let sized = ((row_count as f64) * self.config.warm_headroom).ceil() as usize;
        let capacity = self.config.capacity.max(sized);
        let mut filter = BloomFilter::with_rate(capacity, self.config.error_rate)?;

        let mut offset = 0u64;
        let mut total = 0usize;
        loop {
            let page = self
                .authority
                .list_page(offset, self.config.page_size)
                .await?;
            let fetched = page.len();
            total += fetched;
            filter.insert_bulk(page.iter().map(|name| name.to_lowercase()));
            offset += fetched as u64;

            if fetched < self.config.page_size {
                break;
            }
        }

        info!(rows = total, capacity, "cold-start scan complete");
        Ok(filter)
    }
}

/// Outcome slot handed to an initialization caller
enum InitSlot {
    AlreadyReady,
    Leader(broadcast::Sender<bool>),
    Follower(broadcast::Receiver<bool>),
}

struct InitState {
    state: CacheState,
    outcome_tx: Option<broadcast::Sender<bool>>,
}

/// Single-flight lifecycle wrapper around the shared membership cell
///
/// Owns the restore-or-rebuild sequence, the snapshot flush, and the
/// explicit reinitialize/shutdown operations. The allocator consumes the
/// cell this guard manages; it never drives initialization itself.
pub struct ReconciliationGuard<A, S> {
    authority: Arc<A>,
    snapshots: Arc<S>,
    cell: Arc<MembershipCell>,
    config: CacheConfig,
    metrics: Arc<Metrics>,
    init: Mutex<InitState>,
}

impl<A, S> ReconciliationGuard<A, S>
where
    A: AuthoritativeStore,
    S: SnapshotStore,
{
    /// Create a guard over the given collaborators
    ///
    /// Fails only on an invalid configuration.
    pub fn new(
        authority: Arc<A>,
        snapshots: Arc<S>,
        config: CacheConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_metrics(authority, snapshots, config, Arc::new(Metrics::new()))
    }

    /// Create a guard sharing an externally owned metrics collector
    pub fn with_metrics(
        authority: Arc<A>,
        snapshots: Arc<S>,
        config: CacheConfig,
        metrics: Arc<Metrics>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            authority,
            snapshots,
            cell: Arc::new(MembershipCell::new()),
            config,
            metrics,
            init: Mutex::new(InitState {
                state: CacheState::Uninitialized,
                outcome_tx: None,
            }),
        })
    }

    /// The shared cell this guard manages
    pub fn cell(&self) -> Arc<MembershipCell> {
        Arc::clone(&self.cell)
    }

    /// The shared metrics collector
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// The configuration this guard was constructed with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> CacheState {
        self.init.lock().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == CacheState::Ready
    }

    fn acquire_slot(&self) -> InitSlot {
        let mut st = self.init.lock();
        match st.state {
            CacheState::Ready => InitSlot::AlreadyReady,
            CacheState::Initializing => match &st.outcome_tx {
                Some(tx) => InitSlot::Follower(tx.subscribe()),
                // Initializing always carries a sender; treat a missing one
                // as a finished attempt rather than deadlocking a caller
                None => InitSlot::AlreadyReady,
            },
            CacheState::Uninitialized => {
                let (tx, _rx) = broadcast::channel(1);
                st.outcome_tx = Some(tx.clone());
                st.state = CacheState::Initializing;
                InitSlot::Leader(tx)
            }
        }
    }

    /// Bring the cache to `Ready`, joining any attempt already in flight
    ///
    /// N concurrent callers produce exactly one cold-start scan; all of
    /// them observe the same outcome.
    pub async fn initialize(&self) -> Result<(), AllocError> {
        match self.acquire_slot() {
            InitSlot::AlreadyReady => Ok(()),
            InitSlot::Leader(tx) => {
                let outcome = self.run_initialization().await;
                let became_ready = outcome.is_ok();
                {
                    let mut st = self.init.lock();
                    st.state = if became_ready {
                        CacheState::Ready
                    } else {
                        CacheState::Uninitialized
                    };
                    st.outcome_tx = None;
                }
                let _ = tx.send(became_ready);
                outcome
            }
            InitSlot::Follower(mut rx) => match rx.recv().await {
                Ok(true) => Ok(()),
                Ok(false) => Err(AllocError::Init(
                    "shared initialization attempt failed".to_string(),
                )),
                Err(_) => Err(AllocError::Init(
                    "initialization attempt ended without an outcome".to_string(),
                )),
            },
        }
    }

    async fn run_initialization(&self) -> Result<(), AllocError> {
        // (1) fast path: restore the last snapshot
        if let Some(filter) = self.try_restore().await {
            info!(
                items = filter.item_count(),
                size_bits = filter.size_bits(),
                "membership cache restored from snapshot"
            );
            self.cell.install(filter);
            self.metrics.record_snapshot_restored();
            return Ok(());
        }

        // (2) cold start: rebuild from the authority
        let warmer = CacheWarmer::new(self.authority.as_ref(), &self.config);
        match warmer.build().await {
            Ok(filter) => {
                info!(items = filter.item_count(), "membership cache rebuilt");
                self.cell.install(filter);
                self.metrics.record_warmup();

                // (3) persist the fresh snapshot, best effort
                self.cell.mark_dirty();
                self.flush_if_dirty().await;
                Ok(())
            }
            Err(err) => {
                // (4) stay available: an empty cache loses the optimization,
                // not correctness
                warn!(error = %err, "cold-start scan failed, serving with an empty cache");
                let filter = BloomFilter::with_rate(self.config.capacity, self.config.error_rate)?;
                self.cell.install(filter);
                Ok(())
            }
        }
    }

    async fn try_restore(&self) -> Option<BloomFilter> {
        if !self.snapshots.is_connected().await {
            debug!("snapshot store not connected, skipping restore");
            return None;
        }
        match self.snapshots.get(&self.config.snapshot_key).await {
            Ok(Some(blob)) => match snapshot::decode(&blob) {
                Ok(filter) => Some(filter),
                Err(err) => {
                    warn!(error = %err, "snapshot decode failed, falling back to rebuild");
                    None
                }
            },
            Ok(None) => {
                debug!("no snapshot on record");
                None
            }
            Err(err) => {
                warn!(error = %err, "snapshot restore failed, falling back to rebuild");
                None
            }
        }
    }

    /// Persist the current filter if it carries un-persisted inserts
    ///
    /// Idempotent; invoked after accepted allocations and at shutdown.
    /// Persistence failures re-mark the cell dirty and are logged, never
    /// surfaced: a missed snapshot only costs a future cold-start rebuild.
    pub async fn flush_if_dirty(&self) {
        if !self.cell.take_dirty() {
            return;
        }
        let blob = match self.cell.encode() {
            Some(Ok(blob)) => blob,
            Some(Err(err)) => {
                warn!(error = %err, "snapshot encode failed");
                self.cell.mark_dirty();
                return;
            }
            None => return,
        };
        match self.snapshots.set(&self.config.snapshot_key, blob).await {
            Ok(true) => {
                self.metrics.record_snapshot_persisted();
                debug!("snapshot persisted");
            }
            Ok(false) => {
                self.cell.mark_dirty();
                warn!("snapshot write rejected, will retry on next flush");
            }
            Err(err) => {
                self.cell.mark_dirty();
                warn!(error = %err, "snapshot persist failed, will retry on next flush");
            }
        }
    }

    /// Discard the current cache and state, then re-run the full sequence
    ///
    /// Used for maintenance after out-of-band data changes. Joins any
    /// in-flight attempt first so two scans never overlap.
    pub async fn reinitialize(&self) -> Result<(), AllocError> {
        let _ = self.initialize().await;
        {
            let mut st = self.init.lock();
            st.state = CacheState::Uninitialized;
        }
        self.cell.discard();
        info!("membership cache discarded for reinitialization");
        self.initialize().await
    }

    /// Best-effort snapshot flush; failure is logged, not propagated
    pub async fn shutdown(&self) {
        self.flush_if_dirty().await;
        debug!("shutdown flush complete");
    }
}
