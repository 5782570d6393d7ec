use almacen_relay::core::hub::EventHub;
use almacen_relay::core::protocol::{WireFrame, WireFrameCodec};
use bytes::BytesMut;
use serde_json::json;
use tokio_test::assert_ok;
use tokio_util::codec::Decoder;

fn decode(bytes: &[u8]) -> WireFrame {
    let mut buf = BytesMut::from(bytes);
    WireFrameCodec.decode(&mut buf).unwrap().unwrap()
}

#[tokio::test]
async fn test_publish_reaches_every_subscriber() {
    let hub = EventHub::new(16);
    let mut receivers: Vec<_> = (0..4).map(|_| hub.subscribe()).collect();
    assert_eq!(hub.subscriber_count(), 4);

    let frame = WireFrame::new("user updated", json!({"id": "u1"}));
    let delivered = hub.publish(&frame).unwrap();
    assert_eq!(delivered, 4);

    for rx in &mut receivers {
        let bytes = rx.recv().await.unwrap();
        assert_eq!(decode(&bytes), frame);
    }
}

#[tokio::test]
async fn test_publish_with_no_subscribers_is_not_an_error() {
    let hub = EventHub::new(16);
    let frame = WireFrame::new("marca updated", json!({"id": 3}));
    let delivered = assert_ok!(hub.publish(&frame));
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_dropped_subscriber_does_not_affect_the_others() {
    let hub = EventHub::new(16);
    let _a = hub.subscribe();
    let b = hub.subscribe();
    let mut c = hub.subscribe();

    drop(b);
    let frame = WireFrame::new("articulo updated", json!({"id": "a9"}));
    assert_eq!(hub.publish(&frame).unwrap(), 2);

    let bytes = c.recv().await.unwrap();
    assert_eq!(decode(&bytes), frame);
}

#[tokio::test]
async fn test_late_subscriber_gets_no_backlog() {
    let hub = EventHub::new(16);
    let mut early = hub.subscribe();

    let before = WireFrame::new("user updated", json!({"id": "u1", "estado": true}));
    hub.publish(&before).unwrap();

    // Subscribing observes only what is published afterwards.
    let mut late = hub.subscribe();
    let after = WireFrame::new("user updated", json!({"id": "u2", "estado": true}));
    hub.publish(&after).unwrap();

    assert_eq!(decode(&early.recv().await.unwrap()), before);
    assert_eq!(decode(&early.recv().await.unwrap()), after);
    assert_eq!(decode(&late.recv().await.unwrap()), after);
    assert!(late.try_recv().is_err());
}
