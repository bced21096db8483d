// tests/runtime_fake_fetcher.rs

use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use loadgate::dag::{Unit, UnitDescriptor};
use loadgate::engine::{LoadCoordinator, Runtime, RuntimeEvent, SessionEvent, SessionHandle};
use loadgate::errors::{LoadError, LoadgateError, Result};
use loadgate::fetch::FetchBackend;
use loadgate_test_utils::builders::{UnitBuilder, units};
use loadgate_test_utils::fake_fetcher::FakeFetcher;
use loadgate_test_utils::{
    drain_events, init_tracing, observer_channel, terminal_events, with_timeout,
};

type TestResult = std::result::Result<(), Box<dyn Error>>;
type Dispatched = Arc<Mutex<Vec<String>>>;

struct Session {
    runtime: Runtime<FakeFetcher>,
    handle: SessionHandle,
    dispatched: Dispatched,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

fn session(
    pairs: &[(&str, &[&str])],
    configure: impl FnOnce(FakeFetcher) -> FakeFetcher,
) -> Session {
    init_tracing();

    let core = LoadCoordinator::new(units(pairs)).expect("valid units");
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let dispatched: Dispatched = Arc::new(Mutex::new(Vec::new()));
    let fetcher = configure(FakeFetcher::new(rt_tx.clone(), Arc::clone(&dispatched)));
    let (obs_tx, events) = observer_channel();

    Session {
        runtime: Runtime::new(core, rt_rx, fetcher).with_observer(obs_tx),
        handle: SessionHandle::new(rt_tx),
        dispatched,
        events,
    }
}

fn position(order: &[String], id: &str) -> usize {
    order
        .iter()
        .position(|d| d == id)
        .unwrap_or_else(|| panic!("{id} was never dispatched"))
}

#[tokio::test]
async fn runtime_loads_diamond_in_dependency_order() -> TestResult {
    let Session {
        runtime,
        dispatched,
        mut events,
        ..
    } = session(
        &[("A", &[]), ("B", &["A"]), ("C", &["B", "D"]), ("D", &["A"])],
        |f| f.spawned(),
    );

    let stats = with_timeout(runtime.run()).await?;
    assert_eq!(stats.units_completed, 4);
    assert_eq!(stats.units_registered, 4);

    let order = dispatched.lock().unwrap().clone();
    assert_eq!(order.len(), 4, "each unit is dispatched exactly once");
    assert!(position(&order, "A") < position(&order, "B"));
    assert!(position(&order, "A") < position(&order, "D"));
    assert!(position(&order, "B") < position(&order, "C"));
    assert!(position(&order, "D") < position(&order, "C"));

    let events = drain_events(&mut events);
    for id in ["A", "B", "C", "D"] {
        let started = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Started { id: s } if s == id))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Finished { id: s } if s == id))
            .count();
        assert_eq!((started, finished), (1, 1), "unit {id}");
    }

    let terminal = terminal_events(&events);
    assert_eq!(terminal.len(), 1);
    assert!(matches!(terminal[0], SessionEvent::AllDone(_)));
    assert!(events.last().is_some_and(SessionEvent::is_terminal));

    Ok(())
}

#[tokio::test]
async fn fetch_failure_ends_session_with_fetch_error() -> TestResult {
    let Session {
        runtime,
        dispatched,
        mut events,
        ..
    } = session(&[("A", &[]), ("B", &["A"])], |f| f.failing("A"));

    let err = with_timeout(runtime.run())
        .await
        .expect_err("session must fail");

    assert_eq!(
        err.as_load_error(),
        Some(&LoadError::Fetch {
            id: "A".into(),
            reason: "simulated fetch failure".into(),
        })
    );
    assert_eq!(*dispatched.lock().unwrap(), vec!["A".to_string()]);

    let events = drain_events(&mut events);
    assert!(!events.iter().any(|e| matches!(e, SessionEvent::AllDone(_))));
    assert_eq!(terminal_events(&events).len(), 1);

    Ok(())
}

#[tokio::test]
async fn duplicate_report_is_a_protocol_error() -> TestResult {
    let Session { runtime, .. } = session(&[("A", &[]), ("B", &[])], |f| f.reporting_twice("A"));

    let err = with_timeout(runtime.run())
        .await
        .expect_err("double report must fail the session");
    assert!(matches!(err.as_load_error(), Some(LoadError::Protocol(_))));

    Ok(())
}

#[tokio::test]
async fn cycle_fails_without_dispatching_anything() -> TestResult {
    let Session {
        runtime,
        dispatched,
        mut events,
        ..
    } = session(&[("A", &["B"]), ("B", &["A"])], |f| f);

    let err = with_timeout(runtime.run()).await.expect_err("cycle");
    assert!(matches!(
        err.as_load_error(),
        Some(LoadError::CycleOrMissingDependency(report)) if report.has_cycle()
    ));
    assert!(dispatched.lock().unwrap().is_empty());

    let events = drain_events(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], SessionEvent::FatalError(_)));

    Ok(())
}

#[tokio::test]
async fn cancel_lets_in_flight_unit_report_then_fails() -> TestResult {
    let Session {
        runtime,
        handle,
        dispatched,
        ..
    } = session(&[("A", &[]), ("B", &["A"])], |f| f.holding("A"));

    let (result, reported) = with_timeout(async {
        tokio::join!(runtime.run(), async {
            handle.cancel().await?;
            handle.finished("A").await
        })
    })
    .await;
    reported?;

    let err = result.expect_err("cancelled session must fail");
    assert_eq!(err.as_load_error(), Some(&LoadError::Cancelled));
    assert_eq!(*dispatched.lock().unwrap(), vec!["A".to_string()]);

    Ok(())
}

#[tokio::test]
async fn held_unit_reported_through_handle_completes_session() -> TestResult {
    let Session {
        runtime, handle, ..
    } = session(&[("A", &[]), ("B", &["A"])], |f| f.holding("A"));

    let (result, reported) = with_timeout(async {
        tokio::join!(runtime.run(), handle.finished("A"))
    })
    .await;
    reported?;

    assert_eq!(result?.units_completed, 2);

    Ok(())
}

/// Accepts every batch and never reports.
struct SilentFetcher;

impl FetchBackend for SilentFetcher {
    fn begin_units(
        &mut self,
        _units: Vec<Unit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async { Ok::<(), LoadgateError>(()) })
    }
}

/// Refuses every batch.
struct RefusingFetcher;

impl FetchBackend for RefusingFetcher {
    fn begin_units(
        &mut self,
        _units: Vec<Unit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async {
            Err::<(), _>(LoadgateError::from(anyhow::anyhow!("backend offline")))
        })
    }
}

#[tokio::test]
async fn closed_channel_is_reported_instead_of_hanging() -> TestResult {
    init_tracing();

    let core = LoadCoordinator::new(units(&[("A", &[])]))?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(4);
    drop(rt_tx);

    let result = with_timeout(Runtime::new(core, rt_rx, SilentFetcher).run()).await;
    assert!(matches!(result, Err(LoadgateError::ChannelClosed(1))));

    Ok(())
}

#[tokio::test]
async fn refused_dispatch_is_reported_as_fetch_failure() -> TestResult {
    init_tracing();

    let core = LoadCoordinator::new(units(&[("A", &[])]))?;
    let (_rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(4);

    let err = with_timeout(Runtime::new(core, rt_rx, RefusingFetcher).run())
        .await
        .expect_err("refused dispatch must fail");

    match err.as_load_error() {
        Some(LoadError::Fetch { id, reason }) => {
            assert_eq!(id, "A");
            assert!(reason.contains("backend offline"));
        }
        other => panic!("expected Fetch error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn batch_wider_than_channel_completes_with_inline_reports() -> TestResult {
    init_tracing();

    let capacity = 64;
    let roots: Vec<String> = (0..=capacity).map(|i| format!("u{i:02}")).collect();
    let mut descriptors: Vec<UnitDescriptor> =
        roots.iter().map(|id| UnitBuilder::new(id).build()).collect();
    descriptors.push(
        roots
            .iter()
            .fold(UnitBuilder::new("zz"), |b, id| b.after(id))
            .build(),
    );

    let core = LoadCoordinator::new(descriptors)?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(capacity);
    let dispatched: Dispatched = Arc::new(Mutex::new(Vec::new()));
    // Default mode sends every report from inside `begin_units`.
    let fetcher = FakeFetcher::new(rt_tx, Arc::clone(&dispatched));

    let stats = with_timeout(Runtime::new(core, rt_rx, fetcher).run()).await?;

    assert_eq!(stats.units_completed, capacity + 2);
    let order = dispatched.lock().unwrap().clone();
    assert_eq!(order.len(), capacity + 2);
    assert_eq!(order.last().map(String::as_str), Some("zz"));

    Ok(())
}

#[tokio::test]
async fn inline_failure_in_wide_batch_still_fails_fast() -> TestResult {
    init_tracing();

    let capacity = 8;
    let descriptors: Vec<UnitDescriptor> = (0..capacity * 3)
        .map(|i| UnitBuilder::new(&format!("u{i:02}")).build())
        .collect();

    let core = LoadCoordinator::new(descriptors)?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(capacity);
    let dispatched: Dispatched = Arc::new(Mutex::new(Vec::new()));
    let fetcher = FakeFetcher::new(rt_tx, Arc::clone(&dispatched)).failing("u20");

    let err = with_timeout(Runtime::new(core, rt_rx, fetcher).run())
        .await
        .expect_err("u20 fails");

    assert!(matches!(
        err.as_load_error(),
        Some(LoadError::Fetch { id, .. }) if id == "u20"
    ));

    Ok(())
}

#[tokio::test]
async fn cancel_after_session_ended_reports_send_error() -> TestResult {
    let Session {
        runtime, handle, ..
    } = session(&[("A", &[])], |f| f);

    with_timeout(runtime.run()).await?;

    // The runtime, and with it the receiver, is gone.
    assert!(handle.cancel().await.is_err());

    Ok(())
}
