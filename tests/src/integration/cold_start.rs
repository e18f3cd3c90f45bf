//! # Cold Start and Persistence Flows
//!
//! Exercises the full lifecycle through the public API: snapshot restore
//! versus authority rebuild, single-flight initialization under concurrent
//! cold-start pressure, and operation with the persistence adapter
//! unreachable throughout.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use username_alloc::{
        AllocatorApi, AuthoritativeStore, CacheConfig, CacheConfigBuilder, CacheState,
        InMemoryDirectory, InMemorySnapshotStore, ReconciliationGuard, SnapshotStore, StoreError,
        UsernameAllocator, DEFAULT_MAX_RANDOM_RETRIES,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Authority wrapper counting how often the cold-start scan runs
    struct CountingDirectory {
        inner: InMemoryDirectory,
        count_calls: AtomicU64,
        exists_calls: AtomicU64,
    }

    impl CountingDirectory {
        fn new(names: &[String]) -> Self {
            Self {
                inner: InMemoryDirectory::with_names(names.iter().map(String::as_str)),
                count_calls: AtomicU64::new(0),
                exists_calls: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthoritativeStore for CountingDirectory {
        async fn exists_case_insensitive(&self, name: &str) -> Result<bool, StoreError> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.exists_case_insensitive(name).await
        }

        async fn count_all(&self) -> Result<u64, StoreError> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.count_all().await
        }

        async fn list_page(&self, offset: u64, limit: usize) -> Result<Vec<String>, StoreError> {
            self.inner.list_page(offset, limit).await
        }
    }

    fn seeded_names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("resident{:04}", i)).collect()
    }

    fn test_config() -> CacheConfig {
        CacheConfigBuilder::new()
            .capacity(10_000)
            .error_rate(0.01)
            .page_size(1_000)
            .build()
            .expect("valid test config")
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_rebuild_then_restore_across_simulated_restart() {
        let names = seeded_names(2_500);
        let snapshots = Arc::new(InMemorySnapshotStore::new());

        // First process start: no snapshot, rebuild from the authority
        {
            let authority = Arc::new(CountingDirectory::new(&names));
            let guard = ReconciliationGuard::new(
                Arc::clone(&authority),
                Arc::clone(&snapshots),
                test_config(),
            )
            .unwrap();
            guard.initialize().await.expect("first start");

            assert_eq!(authority.count_calls.load(Ordering::SeqCst), 1);
            let cell = guard.cell();
            for name in &names {
                assert_eq!(cell.may_contain(name), Some(true), "{} missing", name);
            }
        }

        // Second process start over the same snapshot store: restore,
        // no table scan
        {
            let authority = Arc::new(CountingDirectory::new(&names));
            let guard = ReconciliationGuard::new(
                Arc::clone(&authority),
                Arc::clone(&snapshots),
                test_config(),
            )
            .unwrap();
            guard.initialize().await.expect("second start");

            assert_eq!(
                authority.count_calls.load(Ordering::SeqCst),
                0,
                "restore must skip the cold-start scan"
            );
            let cell = guard.cell();
            for name in &names {
                assert_eq!(cell.may_contain(name), Some(true), "{} lost in restore", name);
            }
        }
    }

    #[tokio::test]
    async fn test_allocations_survive_restart_via_snapshot() {
        let snapshots = Arc::new(InMemorySnapshotStore::new());
        let authority = Arc::new(InMemoryDirectory::with_names(["resident"]));

        // First run allocates a fresh name, which flushes the snapshot
        {
            let guard = Arc::new(
                ReconciliationGuard::new(
                    Arc::clone(&authority),
                    Arc::clone(&snapshots),
                    test_config(),
                )
                .unwrap(),
            );
            guard.initialize().await.unwrap();
            let allocator =
                UsernameAllocator::with_seed(Arc::clone(&authority), Arc::clone(&guard), 1);
            let name = allocator
                .allocate_unique("brand_new", DEFAULT_MAX_RANDOM_RETRIES)
                .await
                .unwrap();
            assert_eq!(name, "brand_new");
        }

        // Restored cache remembers the allocation without any authority help
        {
            let guard = ReconciliationGuard::new(
                Arc::clone(&authority),
                Arc::clone(&snapshots),
                test_config(),
            )
            .unwrap();
            guard.initialize().await.unwrap();
            assert_eq!(guard.cell().may_contain("brand_new"), Some(true));
        }
    }

    #[tokio::test]
    async fn test_concurrent_cold_start_runs_one_scan() {
        let names = seeded_names(100);
        let authority = Arc::new(CountingDirectory::new(&names));
        let guard = Arc::new(
            ReconciliationGuard::new(
                Arc::clone(&authority),
                Arc::new(InMemorySnapshotStore::new()),
                test_config(),
            )
            .unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..32 {
            let guard = Arc::clone(&guard);
            handles.push(tokio::spawn(async move { guard.initialize().await }));
        }
        for handle in handles {
            handle.await.expect("join").expect("all callers observe Ready");
        }

        assert_eq!(guard.state(), CacheState::Ready);
        assert_eq!(
            authority.count_calls.load(Ordering::SeqCst),
            1,
            "single-flight must deduplicate the cold-start scan"
        );
    }

    #[tokio::test]
    async fn test_persistence_unreachable_throughout_lifecycle() {
        let names = seeded_names(50);
        let snapshots = Arc::new(InMemorySnapshotStore::new());
        snapshots.set_connected(false);

        let authority = Arc::new(CountingDirectory::new(&names));
        let guard = Arc::new(
            ReconciliationGuard::new(
                Arc::clone(&authority),
                Arc::clone(&snapshots),
                test_config(),
            )
            .unwrap(),
        );

        // Initialization still reaches Ready via the warmer
        guard.initialize().await.expect("ready without persistence");
        assert_eq!(guard.state(), CacheState::Ready);

        // Allocation flows keep working; the missed flush is non-fatal
        let allocator = UsernameAllocator::with_seed(Arc::clone(&authority), Arc::clone(&guard), 2);
        let name = allocator
            .allocate_unique("newcomer", DEFAULT_MAX_RANDOM_RETRIES)
            .await
            .unwrap();
        assert_eq!(name, "newcomer");

        // A later cold restart (adapter still unreachable) rebuilds from
        // the authority again without error
        guard.reinitialize().await.expect("reinitialize");
        assert_eq!(guard.state(), CacheState::Ready);
        assert_eq!(authority.count_calls.load(Ordering::SeqCst), 2);
        guard.shutdown().await;
    }

    #[tokio::test]
    async fn test_corrupted_snapshot_store_content_triggers_rebuild() {
        let names = seeded_names(10);
        let snapshots = Arc::new(InMemorySnapshotStore::new());
        snapshots
            .set(&test_config().snapshot_key, "ffffffff".to_string())
            .await
            .unwrap();

        let authority = Arc::new(CountingDirectory::new(&names));
        let guard = ReconciliationGuard::new(
            Arc::clone(&authority),
            Arc::clone(&snapshots),
            test_config(),
        )
        .unwrap();
        guard.initialize().await.expect("decode failure is not fatal");

        assert_eq!(authority.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(guard.cell().may_contain("resident0000"), Some(true));
    }
}
