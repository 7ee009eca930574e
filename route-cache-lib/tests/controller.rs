//! Debounce, de-duplication and stale-result handling of the controller.

mod common;

use std::time::Duration;

use common::MockProvider;
use common::client;
use common::client_with;
use route_cache::cache::CacheConfig;
use route_cache::controller::ControllerConfig;
use route_cache::controller::RouteCalculationController;
use route_cache::model::PlaceInput;
use route_cache::model::PlaceSelection;
use route_cache::model::RouteOutcome;
use route_cache::throttle::ThrottleConfig;
use tokio::time::Instant;

fn controller(provider: &MockProvider) -> RouteCalculationController {
    RouteCalculationController::new(client(provider), ControllerConfig::default())
}

fn uncached_controller(provider: &MockProvider) -> RouteCalculationController {
    RouteCalculationController::new(
        client_with(provider, CacheConfig::no_cache(), ThrottleConfig::default()),
        ControllerConfig::default(),
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_secs(5)).await;
}

fn dest(name: &str) -> Option<PlaceInput> {
    Some(name.into())
}

#[tokio::test(start_paused = true)]
async fn test_rapid_changes_collapse_into_one_call() {
    let provider = MockProvider::new();
    let controller = controller(&provider);

    for origin in ["Z", "Zu", "Zur", "Zurich", "Zurich Airport"] {
        controller.on_input_change(origin, dest("Lucerne"), vec![]);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    settle().await;

    let calls = provider.route_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].origin, "Zurich Airport");
    assert_eq!(calls[0].destination, "Lucerne");

    let state = controller.state();
    assert_eq!(state.distance_meters(), Some(57_800));
    assert!(!state.is_calculating);
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_nothing_happens_before_debounce_elapses() {
    let provider = MockProvider::new();
    let controller = controller(&provider);

    controller.on_input_change("Bern", dest("Thun"), vec![]);
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(provider.route_calls().is_empty());
    assert_eq!(controller.state().result, None);

    settle().await;
    assert_eq!(provider.route_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_selection_metadata_is_unwrapped() {
    let provider = MockProvider::new();
    let controller = controller(&provider);

    controller.on_input_change(
        PlaceSelection::new("Zurich Airport").with_place_id("zrh"),
        Some(PlaceSelection::new("Lucerne").with_location(47.05, 8.31).into()),
        vec![],
    );
    settle().await;

    let calls = provider.route_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].origin, "Zurich Airport");
    assert_eq!(calls[0].destination, "Lucerne");
}

#[tokio::test(start_paused = true)]
async fn test_stale_result_does_not_overwrite_newer_input() {
    let provider = MockProvider::new()
        .with_delay(Duration::from_secs(3))
        .with_distance("Basel", 120_000)
        .with_distance("Thun", 30_000);
    let controller = controller(&provider);
    let start = Instant::now();

    controller.on_input_change("Bern", dest("Basel"), vec![]);
    // The Basel calculation starts at 500 ms and answers at 3.5 s.
    tokio::time::sleep(Duration::from_millis(600)).await;
    controller.on_input_change("Bern", dest("Thun"), vec![]);

    tokio::time::sleep_until(start + Duration::from_secs(4)).await;
    let state = controller.state();
    assert_eq!(state.result, None, "superseded Basel result was published");
    assert!(state.is_calculating);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = controller.state();
    assert_eq!(state.distance_meters(), Some(30_000));
    assert!(!state.is_calculating);
    assert_eq!(provider.route_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_input_is_not_recalculated() {
    let provider = MockProvider::new();
    // Without a cache, any second calculation would reach the provider.
    let controller = uncached_controller(&provider);

    controller.on_input_change("Bern", dest("Thun"), vec![]);
    settle().await;
    controller.on_input_change(
        PlaceSelection::new("Bern").with_place_id("bern"),
        dest("Thun"),
        vec![],
    );
    settle().await;

    assert_eq!(provider.route_calls().len(), 1);
    assert_eq!(controller.client().throttle().dispatched(), 1);

    controller.on_input_change("Bern", dest("Spiez"), vec![]);
    settle().await;
    assert_eq!(provider.route_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_only_change_is_not_recalculated() {
    let provider = MockProvider::new();
    let controller = uncached_controller(&provider);

    controller.on_input_change("Bern", dest("Lucerne"), vec![]);
    settle().await;
    controller.on_input_change(" Bern", dest("Lucerne "), vec![]);
    settle().await;

    assert_eq!(provider.route_calls().len(), 1);
    assert_eq!(controller.client().throttle().dispatched(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_blank_stop_keeps_previous_result() {
    let provider = MockProvider::new();
    let controller = controller(&provider);

    controller.on_input_change("Zurich Airport", dest("Lucerne"), vec![]);
    settle().await;
    let before = controller.state();
    assert!(before.result.as_ref().is_some_and(RouteOutcome::is_success));

    controller.on_input_change("Zurich Airport", dest("Lucerne"), vec!["  ".into()]);
    settle().await;

    assert_eq!(provider.route_calls().len(), 1);
    assert_eq!(controller.state(), before);
}

#[tokio::test(start_paused = true)]
async fn test_open_ended_booking_resolves_without_provider() {
    let provider = MockProvider::new();
    let controller = controller(&provider);

    controller.on_input_change("Bern", None, vec![]);
    settle().await;

    assert!(provider.route_calls().is_empty());
    assert_eq!(controller.state().distance_meters(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_error_replaces_success_atomically() {
    let provider = MockProvider::new();
    let controller = controller(&provider);
    let mut updates = controller.subscribe();

    controller.on_input_change("Bern", dest("Thun"), vec![]);
    settle().await;
    assert!(controller.state().error.is_none());

    controller.on_input_change("Bern", dest("Nowhere"), vec![]);
    settle().await;
    let state = controller.state();
    assert_eq!(state.result, Some(RouteOutcome::NoRouteFound));
    assert!(state.error.is_some());

    controller.on_input_change("Bern", dest("Thun"), vec![]);
    settle().await;
    let state = updates.borrow_and_update().clone();
    assert!(state.result.as_ref().is_some_and(RouteOutcome::is_success));
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_is_calculating_while_in_flight() {
    let provider = MockProvider::new().with_delay(Duration::from_secs(2));
    let controller = controller(&provider);
    let mut updates = controller.subscribe();

    controller.on_input_change("Bern", dest("Thun"), vec![]);
    updates.changed().await.expect("calculating");
    assert!(updates.borrow_and_update().is_calculating);

    updates.changed().await.expect("resolved");
    let state = updates.borrow_and_update().clone();
    assert!(!state.is_calculating);
    assert!(state.result.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending_timer() {
    let provider = MockProvider::new();
    let controller = controller(&provider);

    controller.on_input_change("Bern", dest("Thun"), vec![]);
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.close();
    controller.on_input_change("Bern", dest("Spiez"), vec![]);
    settle().await;

    assert!(controller.is_closed());
    assert!(provider.route_calls().is_empty());
    assert_eq!(controller.state().result, None);
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_updates() {
    let provider = MockProvider::new();
    let controller = controller(&provider);
    let updates = controller.subscribe();

    controller.on_input_change("Bern", dest("Thun"), vec![]);
    drop(controller);
    settle().await;

    assert!(provider.route_calls().is_empty());
    assert_eq!(updates.borrow().result, None);
}

#[tokio::test(start_paused = true)]
async fn test_independent_controllers_share_throttle() {
    let provider = MockProvider::new();
    let client = client(&provider);
    let pickup = RouteCalculationController::new(client.clone(), ControllerConfig::default());
    let dropoff = RouteCalculationController::new(client.clone(), ControllerConfig::default());

    pickup.on_input_change("Bern", dest("Thun"), vec![]);
    dropoff.on_input_change("Bern", dest("Spiez"), vec![]);
    settle().await;

    let calls = provider.route_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].at - calls[0].at >= Duration::from_secs(1));
    assert!(pickup.state().result.is_some());
    assert!(dropoff.state().result.is_some());
}
