//! Username allocation service
//!
//! Orchestrates the membership cache and the authoritative store to hand
//! out guaranteed-unique usernames and ranked availability suggestions.
//! The cache is advisory; the store's existence answer is the only thing
//! that ever accepts a name.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::domain::normalize::normalize;
use crate::error::{AllocError, StoreError};
use crate::metrics::Metrics;
use crate::ports::{AllocatorApi, AuthoritativeStore, SnapshotStore};
use crate::service::lifecycle::{MembershipCell, ReconciliationGuard};
use crate::service::strategies::{encode_base36, random_suffix, Strategy};

/// Length of the random suffix appended during allocation retries
const RETRY_SUFFIX_LEN: usize = 5;

/// Outcome of one availability check
enum Verdict {
    Available,
    Taken,
}

/// Allocates collision-free usernames over a shared membership cache
///
/// Holds the only references that see both the cache and the authority,
/// and is the component that reconciles the two: false positives are
/// detected on decisive checks, stale absences are repaired by
/// re-inserting names the store reports taken.
pub struct UsernameAllocator<A, S> {
    authority: Arc<A>,
    guard: Arc<ReconciliationGuard<A, S>>,
    cell: Arc<MembershipCell>,
    metrics: Arc<Metrics>,
    max_username_len: usize,
    rng: Mutex<StdRng>,
}

impl<A, S> UsernameAllocator<A, S>
where
    A: AuthoritativeStore,
    S: SnapshotStore,
{
    /// Create an allocator over the guard's cache cell
    pub fn new(authority: Arc<A>, guard: Arc<ReconciliationGuard<A, S>>) -> Self {
        Self::with_seed(authority, guard, rand::random())
    }

    /// Create an allocator with a fixed random seed
    ///
    /// Candidate generation becomes deterministic and replayable, which is
    /// what tests want.
    pub fn with_seed(authority: Arc<A>, guard: Arc<ReconciliationGuard<A, S>>, seed: u64) -> Self {
        let cell = guard.cell();
        let metrics = guard.metrics();
        let max_username_len = guard.config().max_username_len;
        Self {
            authority,
            guard,
            cell,
            metrics,
            max_username_len,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn normalize_root(&self, base: &str) -> String {
        let mut rng = self.rng.lock();
        normalize(base, self.max_username_len, &mut *rng)
    }

    /// Decisive availability check, used for the literal requested root
    ///
    /// Always consults the authority: a cache "present" the store
    /// contradicts is a detected false positive and the name is available
    /// after all; a cache "absent" the store contradicts means another
    /// instance allocated it, and the cache is converged on the spot.
    async fn probe_decisive(&self, name: &str) -> Result<Verdict, StoreError> {
        let cached = self.cell.may_contain(name);
        match cached {
            Some(true) => self.metrics.record_cache_hit(),
            Some(false) => self.metrics.record_cache_miss(),
            None => {}
        }

        self.metrics.record_authority_check();
        let exists = self.authority.exists_case_insensitive(name).await?;

        match (cached, exists) {
            (Some(true), false) => {
                self.metrics.record_false_positive();
                debug!(name = %name, "cache false positive detected on decisive check");
                Ok(Verdict::Available)
            }
            (Some(false), true) => {
                self.cell.insert(name);
                self.metrics.record_stale_repair();
                Ok(Verdict::Taken)
            }
            (_, true) => Ok(Verdict::Taken),
            (_, false) => Ok(Verdict::Available),
        }
    }

    /// Cheap availability check, used inside generation loops
    ///
    /// A cache "present" is treated as a confirmed collision without an
    /// authority round-trip; on a fresh random candidate that answer is
    /// almost always a false positive, but another suffix costs nothing
    /// while the skipped query is the whole point of the cache. With no
    /// filter installed every name is "maybe absent" and the authority
    /// decides.
    async fn probe_fast(&self, name: &str) -> Result<Verdict, StoreError> {
        let cached = self.cell.may_contain(name);
        if cached == Some(true) {
            self.metrics.record_cache_hit();
            return Ok(Verdict::Taken);
        }
        if cached == Some(false) {
            self.metrics.record_cache_miss();
        }

        self.metrics.record_authority_check();
        let exists = self.authority.exists_case_insensitive(name).await?;
        if exists {
            if cached == Some(false) {
                // stale cache: converge so the next check short-circuits
                self.cell.insert(name);
                self.metrics.record_stale_repair();
            }
            Ok(Verdict::Taken)
        } else {
            Ok(Verdict::Available)
        }
    }

    /// Commit an accepted name: cache it and persist the snapshot
    async fn accept(&self, name: String) -> Result<String, AllocError> {
        self.cell.insert(&name);
        self.metrics.record_allocation();
        // best-effort; failures are logged by the guard and cost nothing
        // beyond a future cold-start rebuild
        self.guard.flush_if_dirty().await;
        Ok(name)
    }
}

#[async_trait]
impl<A, S> AllocatorApi for UsernameAllocator<A, S>
where
    A: AuthoritativeStore + 'static,
    S: SnapshotStore + 'static,
{
    async fn allocate_unique(
        &self,
        base: &str,
        max_random_retries: usize,
    ) -> Result<String, AllocError> {
        let root = self.normalize_root(base);

        // The requested root gets the one decisive check per allocation;
        // a store failure here is surfaced because guessing would risk a
        // duplicate.
        match self.probe_decisive(&root).await? {
            Verdict::Available => return self.accept(root).await,
            Verdict::Taken => {
                debug!(root = %root, "requested name taken, generating variants")
            }
        }

        for attempt in 0..max_random_retries {
            let candidate = {
                let mut rng = self.rng.lock();
                format!("{root}_{}", random_suffix(&mut *rng, RETRY_SUFFIX_LEN))
            };
            match self.probe_fast(&candidate).await {
                Ok(Verdict::Available) => return self.accept(candidate).await,
                Ok(Verdict::Taken) => continue,
                Err(err) => {
                    // conservative: an unverifiable candidate is a taken one
                    warn!(error = %err, attempt, "authority check failed, rejecting candidate");
                    continue;
                }
            }
        }

        // Liveness over strict uniqueness: the millisecond suffix is
        // accepted without a final store round-trip.
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let fallback = format!("{root}_{}", encode_base36(millis));
        warn!(name = %fallback, "retries exhausted, allocating timestamp fallback");
        self.metrics.record_fallback_allocation();
        self.accept(fallback).await
    }

    async fn generate_suggestions(
        &self,
        base: &str,
        max_suggestions: usize,
    ) -> Result<Vec<String>, AllocError> {
        if max_suggestions == 0 {
            return Ok(Vec::new());
        }

        let root = self.normalize_root(base);
        let year = Utc::now().year();

        let mut attempted: HashSet<String> = HashSet::new();
        // the caller only asks because the root itself is taken
        attempted.insert(root.clone());

        let mut accepted: Vec<String> = Vec::new();
        let mut last_store_error: Option<StoreError> = None;
        let mut verified_any = false;

        'strategies: for strategy in Strategy::ALL {
            for _ in 0..strategy.budget() {
                if accepted.len() >= max_suggestions {
                    break 'strategies;
                }
                let candidate = {
                    let mut rng = self.rng.lock();
                    strategy.propose(&root, &mut *rng, year)
                };
                let Some(candidate) = candidate else {
                    // strategy does not apply to this root
                    break;
                };
                if !attempted.insert(candidate.clone()) {
                    continue;
                }
                match self.probe_fast(&candidate).await {
                    Ok(Verdict::Available) => {
                        verified_any = true;
                        accepted.push(candidate);
                    }
                    Ok(Verdict::Taken) => verified_any = true,
                    Err(err) => {
                        debug!(error = %err, candidate = %candidate, "authority check failed, skipping candidate");
                        last_store_error = Some(err);
                    }
                }
            }
        }

        // Partial results are useful; fail only when the store erred and
        // nothing at all could be verified.
        if accepted.is_empty() && !verified_any {
            if let Some(err) = last_store_error {
                return Err(err.into());
            }
        }

        {
            let mut rng = self.rng.lock();
            accepted.shuffle(&mut *rng);
        }
        accepted.truncate(max_suggestions);
        self.metrics.record_suggestions(accepted.len());
        Ok(accepted)
    }
}
