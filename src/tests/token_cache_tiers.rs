// Drives the three token tiers (memory -> durable store -> issuer) with a manual
// clock, a counting store and a counting issuer.

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::cache::token::{StoredToken, TokenTier};
    use crate::errors::TokenError;
    use crate::helpers::time::{Clock, ManualClock};
    use crate::tests::common::{cache_with, CountingStore, StubIssuer};
    use crate::utils::constants::TOKEN_CACHE_PARAMETER_PATH;

    fn stored(token: &str, expiry: u64) -> String {
        serde_json::to_string(&StoredToken {
            token: token.into(),
            expiry,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn second_call_is_served_from_memory_without_io() {
        let clock = ManualClock::new(1_000);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        let first = cache.get_token().await.unwrap();
        let (gets, puts) = (store.gets(), store.puts());

        let second = cache.get_cached_token().await.unwrap();
        assert_eq!(first, second.value);
        assert_eq!(second.source_tier, TokenTier::Memory);
        assert_eq!(store.gets(), gets, "no durable read on a memory hit");
        assert_eq!(store.puts(), puts, "no durable write on a memory hit");
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn expired_memory_token_is_not_returned() {
        let clock = ManualClock::new(0);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        let first = cache.get_cached_token().await.unwrap();
        clock.set(first.expires_at + 1);
        let gets = store.gets();

        let next = cache.get_token().await.unwrap();
        assert_ne!(next, first.value);
        assert_eq!(store.gets(), gets + 1, "durable tier consulted after memory expiry");
        assert_eq!(issuer.calls(), 2, "durable copy shares the same expiry, so a new token is issued");
    }

    #[tokio::test]
    async fn durable_entry_is_adopted_without_issuing() {
        let clock = ManualClock::new(10_000);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        store.seed(TOKEN_CACHE_PARAMETER_PATH, &stored("from-store", 10_000 + 3_600)).await;
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        let token = cache.get_cached_token().await.unwrap();
        assert_eq!(token.value, "from-store");
        assert_eq!(token.source_tier, TokenTier::DurableStore);
        assert_eq!(token.expires_at, 13_600);
        assert_eq!(issuer.calls(), 0);

        // adopted copy now lives in memory
        let gets = store.gets();
        let again = cache.get_cached_token().await.unwrap();
        assert_eq!(again.source_tier, TokenTier::Memory);
        assert_eq!(store.gets(), gets);
    }

    #[tokio::test]
    async fn full_miss_issues_once_and_fills_both_tiers() {
        let clock = ManualClock::new(500);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        let token = cache.get_cached_token().await.unwrap();
        assert_eq!(token.value, "issued-1");
        assert_eq!(token.source_tier, TokenTier::Issued);
        assert_eq!(issuer.calls(), 1);

        let memory = cache.current().expect("memory tier populated");
        assert_eq!(memory.value, "issued-1");

        let raw = store.peek(TOKEN_CACHE_PARAMETER_PATH).await.expect("durable tier populated");
        let blob: StoredToken = serde_json::from_str(&raw).unwrap();
        assert_eq!(blob.token, "issued-1");
        assert_eq!(blob.expiry, 500 + 86_400 - 60);
    }

    #[tokio::test]
    async fn durable_read_outage_falls_through_to_issuer() {
        let clock = ManualClock::new(0);
        let store = CountingStore::failing_reads();
        let issuer = StubIssuer::new();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        assert_eq!(cache.get_token().await.unwrap(), "issued-1");
        assert_eq!(store.gets(), 1);
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn durable_write_failure_still_returns_fresh_token() {
        let clock = ManualClock::new(0);
        let store = CountingStore::failing_writes();
        let issuer = StubIssuer::new();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        assert_eq!(cache.get_token().await.unwrap(), "issued-1");
        assert_eq!(store.puts(), 1);
        assert_eq!(cache.current().map(|t| t.value).as_deref(), Some("issued-1"));
    }

    #[tokio::test]
    async fn day_long_token_refreshes_one_minute_early() {
        let clock = ManualClock::new(0);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        let issued = cache.get_cached_token().await.unwrap();
        assert_eq!(issued.expires_at, 86_340);

        clock.set(86_339);
        assert_eq!(cache.get_token().await.unwrap(), issued.value);
        assert_eq!(issuer.calls(), 1);

        clock.set(86_341);
        let refreshed = cache.get_cached_token().await.unwrap();
        assert_ne!(refreshed.value, issued.value);
        assert_eq!(refreshed.expires_at, 86_341 + 86_340);
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn issuer_failure_surfaces_and_leaves_memory_empty() {
        let clock = ManualClock::new(0);
        let store = CountingStore::new();
        let issuer = StubIssuer::failing();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, TokenError::CredentialUnavailable(_)));
        assert!(cache.current().is_none());
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn expired_or_malformed_durable_entries_are_skipped() {
        let clock = ManualClock::new(5_000);
        let issuer = StubIssuer::new();

        let expired = CountingStore::new();
        expired.seed(TOKEN_CACHE_PARAMETER_PATH, &stored("stale", 5_000)).await;
        let cache = cache_with(expired.clone(), issuer.clone(), &clock);
        assert_eq!(cache.get_token().await.unwrap(), "issued-1");

        let garbage = CountingStore::new();
        garbage.seed(TOKEN_CACHE_PARAMETER_PATH, "{not json").await;
        let cache = cache_with(garbage.clone(), issuer.clone(), &clock);
        assert_eq!(cache.get_token().await.unwrap(), "issued-2");

        // the bad entry is replaced by the fresh token
        let raw = garbage.peek(TOKEN_CACHE_PARAMETER_PATH).await.unwrap();
        assert!(raw.contains("issued-2"));
    }

    #[tokio::test]
    async fn far_future_durable_expiry_is_rejected_without_overflow() {
        let clock = ManualClock::new(5_000);
        let issuer = StubIssuer::new();

        let overflowing = CountingStore::new();
        overflowing.seed(TOKEN_CACHE_PARAMETER_PATH, &stored("forever", u64::MAX)).await;
        let cache = cache_with(overflowing.clone(), issuer.clone(), &clock);
        let token = cache.get_cached_token().await.unwrap();
        assert_eq!(token.value, "issued-1");
        assert_eq!(token.source_tier, TokenTier::Issued);
        assert_eq!(token.expires_at, 5_000 + 86_400 - 60);

        // one second past a full lifetime is already too far out
        let beyond = CountingStore::new();
        beyond.seed(TOKEN_CACHE_PARAMETER_PATH, &stored("too-long", 5_000 + 86_400 + 1)).await;
        let cache = cache_with(beyond.clone(), issuer.clone(), &clock);
        assert_eq!(cache.get_token().await.unwrap(), "issued-2");

        let raw = overflowing.peek(TOKEN_CACHE_PARAMETER_PATH).await.unwrap();
        assert!(raw.contains("issued-1"));
        assert_eq!(issuer.calls(), 2);
    }

    #[tokio::test]
    async fn durable_expiry_within_one_lifetime_is_adopted() {
        let clock = ManualClock::new(5_000);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        store.seed(TOKEN_CACHE_PARAMETER_PATH, &stored("edge", 5_000 + 86_400)).await;
        let cache = cache_with(store, issuer.clone(), &clock);

        let token = cache.get_cached_token().await.unwrap();
        assert_eq!(token.value, "edge");
        assert_eq!(token.source_tier, TokenTier::DurableStore);
        assert_eq!(issuer.calls(), 0);
    }

    #[tokio::test]
    async fn invalidate_drops_memory_but_keeps_durable_copy() {
        let clock = ManualClock::new(0);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        let cache = cache_with(store.clone(), issuer.clone(), &clock);

        let first = cache.get_token().await.unwrap();
        cache.invalidate();
        assert!(cache.current().is_none());

        let token = cache.get_cached_token().await.unwrap();
        assert_eq!(token.value, first);
        assert_eq!(token.source_tier, TokenTier::DurableStore);
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn second_process_adopts_the_first_ones_token() {
        let clock = ManualClock::new(100);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();

        let cold_start_a = cache_with(store.clone(), issuer.clone(), &clock);
        let cold_start_b = cache_with(store.clone(), issuer.clone(), &clock);

        let a = cold_start_a.get_token().await.unwrap();
        let b = cold_start_b.get_cached_token().await.unwrap();
        assert_eq!(a, b.value);
        assert_eq!(b.source_tier, TokenTier::DurableStore);
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_all_get_a_valid_token() {
        let clock = ManualClock::new(0);
        let store = CountingStore::new();
        let issuer = StubIssuer::new();
        let cache = Arc::new(cache_with(store.clone(), issuer.clone(), &clock));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get_cached_token().await }));
        }
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert!(token.value.starts_with("issued-"));
            assert!(token.is_usable_at(clock.now()));
        }
        // no single-flight: a burst may issue more than once, never zero times
        assert!(issuer.calls() >= 1);
        assert!(cache.current().is_some());
    }
}
