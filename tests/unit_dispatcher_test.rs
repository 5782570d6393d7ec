use almacen_relay::client::Dispatcher;
use almacen_relay::core::protocol::WireFrame;
use serde_json::json;

#[tokio::test]
async fn test_dispatch_routes_by_channel_name() {
    let dispatcher = Dispatcher::new(16);
    let mut users = dispatcher.subscribe("user updated");
    let mut marcas = dispatcher.subscribe("marca updated");

    let delivered = dispatcher.dispatch(WireFrame::new("user updated", json!({"id": "u1"})));
    assert_eq!(delivered, 1);

    assert_eq!(users.recv().await, Some(json!({"id": "u1"})));
    assert!(tokio::time::timeout(std::time::Duration::from_millis(50), marcas.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn test_two_components_can_share_a_channel() {
    let dispatcher = Dispatcher::new(16);
    let mut table = dispatcher.subscribe("user updated");
    let mut badge = dispatcher.subscribe("user updated");

    let delivered = dispatcher.dispatch(WireFrame::new("user updated", json!({"id": "u2"})));
    assert_eq!(delivered, 2);
    assert_eq!(table.recv().await, Some(json!({"id": "u2"})));
    assert_eq!(badge.recv().await, Some(json!({"id": "u2"})));
}

#[tokio::test]
async fn test_unsubscribe_is_dropping_the_handle() {
    let dispatcher = Dispatcher::new(16);
    let table = dispatcher.subscribe("user updated");
    let mut badge = dispatcher.subscribe("user updated");

    drop(table);
    let delivered = dispatcher.dispatch(WireFrame::new("user updated", json!({"id": "u3"})));
    assert_eq!(delivered, 1);
    assert_eq!(badge.recv().await, Some(json!({"id": "u3"})));
}

#[tokio::test]
async fn test_events_without_subscribers_are_dropped() {
    let dispatcher = Dispatcher::new(16);
    assert_eq!(
        dispatcher.dispatch(WireFrame::new("proveedor updated", json!({"id": 1}))),
        0
    );
}

#[tokio::test]
async fn test_idle_channels_are_purged_on_the_next_subscribe() {
    let dispatcher = Dispatcher::new(16);
    let sub = dispatcher.subscribe("user updated");
    assert_eq!(dispatcher.active_channels(), 1);

    drop(sub);
    let _other = dispatcher.subscribe("marca updated");
    assert_eq!(dispatcher.active_channels(), 1);
}
