//! Clip fetcher against scripted tools: validation, retry, eviction, output check.

mod common;

use clipfetch_core::fetch::{ClipFetcher, FailureKind, FetchError, FetchEvent, FetchSettings, Stage, DOWNLOADED};
use common::fake_tools::{self, fail, FakeTools, ENCODER, RESOLVER, SSH, TOO_MANY_REQUESTS};
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn invalid_identifier_never_runs_a_process() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new());
    let fetcher = common::fetcher(common::pool(dir.path(), 2, &tools), tools.clone());

    for bad in ["", "short", "abcdefghijkl"] {
        let err = fetcher
            .fetch(bad, 10.0, 15.0, &dir.path().join("out.mp4"))
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidIdentifier(_)));
        assert_eq!(err.kind(), FailureKind::Invalid);
    }
    assert!(tools.calls().is_empty());
}

#[test]
fn successful_fetch_resolves_then_encodes_through_same_proxy() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new());
    let fetcher = common::fetcher(common::pool(dir.path(), 3, &tools), tools.clone());
    let out = dir.path().join("abcdefghijk_000010_000015.mp4");

    let report = fetcher.fetch("abcdefghijk", 10.0, 15.5, &out).unwrap();
    assert!(report.succeeded);
    assert_eq!(report.message, DOWNLOADED);
    assert!(out.exists());

    let resolve = &tools.calls_to(RESOLVER)[0];
    assert_eq!(
        resolve.args[..3],
        ["-f".to_string(), "18".to_string(), "--proxy".to_string()]
    );
    assert_eq!(resolve.args.last().unwrap(), "https://www.youtube.com/watch?v=abcdefghijk");

    let encode = &tools.calls_to(ENCODER)[0];
    let proxy = FakeTools::proxy_of(resolve);
    assert_eq!(report.proxy, proxy);
    assert_eq!(encode.env.len(), 4);
    assert!(encode.env.iter().all(|(_, v)| *v == proxy));
    let args = encode.args.join(" ");
    assert!(args.starts_with("-ss 10 -t 5.5 -i https://media.example/"), "{}", args);
    assert!(args.contains("-c:v libx264 -preset ultrafast -c:a aac -threads 1 -loglevel panic"));
}

#[test]
fn resolution_failing_every_attempt_returns_last_error() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(
        FakeTools::new().with_resolve(|_, n| fail(&format!("ERROR: Video unavailable (attempt {})", n))),
    );
    let pool = common::pool(dir.path(), 3, &tools);
    let fetcher = common::fetcher(pool.clone(), tools.clone());

    let err = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::ResolutionFailed);
    assert_eq!(err.to_string(), "ERROR: Video unavailable (attempt 5)");
    assert_eq!(tools.calls_to(RESOLVER).len(), 5);
    assert!(tools.calls_to(ENCODER).is_empty());
    assert_eq!(pool.len(), 3, "non-429 failures must not evict");
}

#[test]
fn rate_limited_resolution_evicts_each_proxy_it_used() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new().with_resolve(|_, _| fail(TOO_MANY_REQUESTS)));
    let pool = common::pool(dir.path(), 6, &tools);
    let fetcher = common::fetcher(pool.clone(), tools.clone());

    let err = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { stage: Stage::Resolve, .. }));
    assert_eq!(err.kind(), FailureKind::RateLimited);

    let used: Vec<String> = tools.calls_to(RESOLVER).iter().map(FakeTools::proxy_of).collect();
    assert_eq!(used.len(), 5);
    assert_eq!(pool.len(), 1);
    for proxy in &used {
        assert!(!pool.contains(proxy));
    }
    // stop + disable per evicted relay
    assert_eq!(tools.calls_to(SSH).len(), 10);
    let on_disk = std::fs::read_to_string(pool.path()).unwrap();
    assert_eq!(on_disk.lines().count(), 1);
}

#[test]
fn rate_limit_then_recovery_uses_another_proxy() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new().with_resolve(|cmd, n| {
        if n == 1 {
            fail(TOO_MANY_REQUESTS)
        } else {
            fake_tools::ok(&format!("https://media.example/{}.mp4", cmd.args.last().unwrap()))
        }
    }));
    let pool = common::pool(dir.path(), 2, &tools);
    let fetcher = common::fetcher(pool.clone(), tools.clone());

    let report = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap();
    assert!(report.succeeded);

    let resolves = tools.calls_to(RESOLVER);
    let evicted = FakeTools::proxy_of(&resolves[0]);
    assert_ne!(FakeTools::proxy_of(&resolves[1]), evicted);
    assert_eq!(pool.snapshot(), vec![FakeTools::proxy_of(&resolves[1])]);
}

#[test]
fn encode_failure_is_not_retried() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new().with_encode(|_, _| fail("Invalid data found when processing input")));
    let pool = common::pool(dir.path(), 2, &tools);
    let fetcher = common::fetcher(pool.clone(), tools.clone());

    let err = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::EncodeFailed);
    assert_eq!(err.to_string(), "Invalid data found when processing input");
    assert_eq!(tools.calls_to(RESOLVER).len(), 1);
    assert_eq!(tools.calls_to(ENCODER).len(), 1);
    assert_eq!(pool.len(), 2);
}

#[test]
fn rate_limited_encode_evicts_proxy() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(
        FakeTools::new().with_encode(|_, _| fail("[https @ 0x5555] HTTP error 429 Too Many Requests")),
    );
    let pool = common::pool(dir.path(), 2, &tools);
    let fetcher = common::fetcher(pool.clone(), tools.clone());

    let err = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { stage: Stage::Encode, .. }));
    let proxy = FakeTools::proxy_of(&tools.calls_to(RESOLVER)[0]);
    assert!(!pool.contains(&proxy));
    assert_eq!(pool.len(), 1);
    assert_eq!(tools.calls_to(ENCODER).len(), 1);
}

#[test]
fn clean_exit_without_output_is_not_success() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new().with_encode(|_, _| fake_tools::ok("")));
    let fetcher = common::fetcher(common::pool(dir.path(), 1, &tools), tools.clone());

    let report = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap();
    assert!(!report.succeeded);
    assert_eq!(report.message, DOWNLOADED);
}

#[test]
fn exhausted_pool_fails_without_resolving() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new());
    let pool = common::pool(dir.path(), 1, &tools);
    pool.remove("http://10.0.0.1:3128").unwrap();
    let fetcher = common::fetcher(pool, tools.clone());

    let err = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::PoolExhausted);
    assert!(tools.calls_to(RESOLVER).is_empty());
}

#[test]
fn rate_limits_that_drain_the_pool_stay_rate_limited() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new().with_resolve(|_, _| fail(TOO_MANY_REQUESTS)));
    let pool = common::pool(dir.path(), 2, &tools);
    let fetcher = common::fetcher(pool.clone(), tools.clone());

    let err = fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { stage: Stage::Resolve, .. }), "{:?}", err);
    assert_eq!(err.to_string(), TOO_MANY_REQUESTS);
    assert_eq!(tools.calls_to(RESOLVER).len(), 2);
    assert!(pool.is_empty());
}

#[test]
fn attempts_are_reported_as_events() {
    let dir = tempdir().unwrap();
    let tools = Arc::new(FakeTools::new().with_resolve(|cmd, n| {
        if n == 1 {
            fail(TOO_MANY_REQUESTS)
        } else {
            fake_tools::ok(&format!("https://media.example/{}.mp4", cmd.args.last().unwrap()))
        }
    }));
    let pool = common::pool(dir.path(), 2, &tools);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let fetcher = ClipFetcher::new(pool, tools.clone(), FetchSettings::default()).with_events(tx);

    fetcher
        .fetch("abcdefghijk", 0.0, 10.0, &dir.path().join("x.mp4"))
        .unwrap();

    let resolves = tools.calls_to(RESOLVER);
    let first = FakeTools::proxy_of(&resolves[0]);
    let second = FakeTools::proxy_of(&resolves[1]);
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 4, "{:?}", events);
    assert_eq!(
        events[0],
        FetchEvent::UsingProxy {
            identifier: "abcdefghijk".into(),
            proxy: first.clone()
        }
    );
    assert!(matches!(
        &events[1],
        FetchEvent::AttemptFailed { stage: Stage::Resolve, attempt: 1, proxy, .. } if *proxy == first
    ));
    assert_eq!(
        events[3].to_string(),
        format!("abcdefghijk - downloaded - proxy: {}", second)
    );
}
