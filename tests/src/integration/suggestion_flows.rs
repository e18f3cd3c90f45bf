//! # Suggestion Generation Flows
//!
//! Drives `generate_suggestions` against stores in various states: empty,
//! heavily squatted, and failing. Every returned suggestion must be
//! distinct and independently verified available; partial results are the
//! documented degradation, a hard error is reserved for a store that can
//! verify nothing.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use username_alloc::{
        AllocatorApi, AuthoritativeStore, CacheConfigBuilder, InMemoryDirectory,
        InMemorySnapshotStore, ReconciliationGuard, UsernameAllocator, DEFAULT_MAX_SUGGESTIONS,
    };

    type Guard = ReconciliationGuard<InMemoryDirectory, InMemorySnapshotStore>;
    type Allocator = UsernameAllocator<InMemoryDirectory, InMemorySnapshotStore>;

    async fn warmed_stack(names: Vec<String>, seed: u64) -> (Arc<InMemoryDirectory>, Arc<Guard>, Allocator) {
        let authority = Arc::new(InMemoryDirectory::with_names(
            names.iter().map(String::as_str),
        ));
        let config = CacheConfigBuilder::new()
            .capacity(10_000)
            .page_size(500)
            .build()
            .unwrap();
        let guard = Arc::new(
            ReconciliationGuard::new(
                Arc::clone(&authority),
                Arc::new(InMemorySnapshotStore::new()),
                config,
            )
            .unwrap(),
        );
        guard.initialize().await.expect("warm-up");
        let allocator = UsernameAllocator::with_seed(Arc::clone(&authority), Arc::clone(&guard), seed);
        (authority, guard, allocator)
    }

    #[tokio::test]
    async fn test_full_batch_for_a_short_taken_root() {
        let (authority, _, allocator) = warmed_stack(vec!["ab".to_string()], 3).await;

        let suggestions = allocator
            .generate_suggestions("ab", DEFAULT_MAX_SUGGESTIONS)
            .await
            .unwrap();

        assert_eq!(suggestions.len(), DEFAULT_MAX_SUGGESTIONS);
        let distinct: HashSet<&String> = suggestions.iter().collect();
        assert_eq!(distinct.len(), suggestions.len());

        for suggestion in &suggestions {
            assert_ne!(suggestion, "ab");
            assert!(suggestion.len() >= 3, "{} too short", suggestion);
            assert!(
                !authority.exists_case_insensitive(suggestion).await.unwrap(),
                "{} not actually available",
                suggestion
            );
        }
    }

    #[tokio::test]
    async fn test_empty_store_fills_the_batch_without_echoing_the_root() {
        // The caller asks for alternatives to "ab" regardless of why;
        // the root itself must never appear in the answer
        let (_, _, allocator) = warmed_stack(Vec::new(), 7).await;

        let suggestions = allocator
            .generate_suggestions("ab", DEFAULT_MAX_SUGGESTIONS)
            .await
            .unwrap();

        assert_eq!(suggestions.len(), DEFAULT_MAX_SUGGESTIONS);
        for suggestion in &suggestions {
            assert_ne!(suggestion, "ab");
            assert!(suggestion.len() >= 3);
        }
    }

    #[tokio::test]
    async fn test_squatted_namespace_still_yields_alternatives() {
        // Squat the deterministic variants a squatter would grab first:
        // every curated number and word suffix, with and without separator
        let mut squatted = vec!["john".to_string()];
        for n in [1u16, 2, 3, 7, 9, 21, 42, 77, 99, 123] {
            squatted.push(format!("john{}", n));
            squatted.push(format!("john_{}", n));
        }
        for w in [
            "dev", "io", "hq", "app", "pro", "real", "live", "here", "online", "official",
        ] {
            squatted.push(format!("john{}", w));
            squatted.push(format!("john_{}", w));
        }

        let (authority, _, allocator) = warmed_stack(squatted, 41).await;

        let suggestions = allocator
            .generate_suggestions("john", DEFAULT_MAX_SUGGESTIONS)
            .await
            .unwrap();

        assert!(
            !suggestions.is_empty(),
            "random strategies must route around the squatted variants"
        );
        for suggestion in &suggestions {
            assert!(
                !authority.exists_case_insensitive(suggestion).await.unwrap(),
                "{} is squatted",
                suggestion
            );
        }
    }

    #[tokio::test]
    async fn test_suggestions_never_duplicate_within_a_call() {
        let (_, _, allocator) = warmed_stack(vec!["taken".to_string()], 43).await;

        for round in 0..10 {
            let suggestions = allocator
                .generate_suggestions("taken", DEFAULT_MAX_SUGGESTIONS)
                .await
                .unwrap();
            let distinct: HashSet<&String> = suggestions.iter().collect();
            assert_eq!(
                distinct.len(),
                suggestions.len(),
                "duplicates in round {}",
                round
            );
        }
    }

    #[tokio::test]
    async fn test_store_down_mid_call_degrades_to_partial_results() {
        let (authority, _, allocator) = warmed_stack(vec!["gone".to_string()], 47).await;

        // First call with a healthy store fills the batch
        let healthy = allocator
            .generate_suggestions("gone", DEFAULT_MAX_SUGGESTIONS)
            .await
            .unwrap();
        assert_eq!(healthy.len(), DEFAULT_MAX_SUGGESTIONS);

        // With the store failing, nothing can be verified: the operation
        // surfaces a store error instead of emitting unverified names
        authority.set_failing(true);
        let result = allocator
            .generate_suggestions("gone", DEFAULT_MAX_SUGGESTIONS)
            .await;
        assert!(result.is_err(), "unverified suggestions must never be emitted");
    }

    #[tokio::test]
    async fn test_uninitialized_cache_does_not_block_suggestions() {
        // Degraded mode: the guard never initialized, every candidate is
        // "maybe absent" and the authority answers directly
        let authority = Arc::new(InMemoryDirectory::with_names(["solo"]));
        let guard = Arc::new(
            ReconciliationGuard::new(
                Arc::clone(&authority),
                Arc::new(InMemorySnapshotStore::new()),
                CacheConfigBuilder::new().capacity(100).build().unwrap(),
            )
            .unwrap(),
        );
        let allocator = UsernameAllocator::with_seed(Arc::clone(&authority), guard, 53);

        let suggestions = allocator
            .generate_suggestions("solo", DEFAULT_MAX_SUGGESTIONS)
            .await
            .unwrap();
        assert_eq!(suggestions.len(), DEFAULT_MAX_SUGGESTIONS);
        for suggestion in &suggestions {
            assert!(!authority.exists_case_insensitive(suggestion).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_suggestion_metrics_accumulate() {
        let (_, guard, allocator) = warmed_stack(vec!["metric".to_string()], 59).await;

        let first = allocator
            .generate_suggestions("metric", DEFAULT_MAX_SUGGESTIONS)
            .await
            .unwrap();
        let second = allocator
            .generate_suggestions("metric", 3)
            .await
            .unwrap();

        let snapshot = guard.metrics().snapshot();
        assert_eq!(
            snapshot.suggestions_returned,
            (first.len() + second.len()) as u64
        );
        assert!(snapshot.authority_checks > 0);
    }
}
