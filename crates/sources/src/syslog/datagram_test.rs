//! Tests for the datagram receiver

use std::sync::Arc;
use std::time::Duration;

use sluice_protocol::FieldValue;
use tokio::net::UdpSocket;

use crate::syslog::{MemoryAccumulator, Receiver, ReceiverConfig, ReceiverError};

const WAIT: Duration = Duration::from_secs(5);

async fn start(config: ReceiverConfig) -> (Receiver, Arc<MemoryAccumulator>, UdpSocket) {
    let receiver = Receiver::new(config);
    let sink = Arc::new(MemoryAccumulator::new());
    receiver.start(sink.clone()).await.unwrap();

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .connect(receiver.local_addr().await.unwrap())
        .await
        .unwrap();
    (receiver, sink, client)
}

fn udp_config() -> ReceiverConfig {
    ReceiverConfig {
        server: "udp://127.0.0.1:0".into(),
        read_timeout: None,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_each_datagram_is_one_message() {
    let (receiver, sink, client) = start(udp_config()).await;

    client
        .send(b"<34>1 2003-10-11T22:14:15.003Z mymachine.example.com su - ID47 - 'su root' failed")
        .await
        .unwrap();
    client.send(b"<165>1 - - - - - [exampleSDID@32473 iut=\"3\"]").await.unwrap();

    assert!(sink.wait_for_metrics(2, WAIT).await);
    let metrics = sink.metrics();

    assert_eq!(metrics[0].tag("facility"), Some("auth"));
    assert_eq!(metrics[0].tag("severity"), Some("crit"));
    assert_eq!(metrics[0].tag("hostname"), Some("mymachine.example.com"));
    assert_eq!(metrics[0].field("msgid"), Some(&FieldValue::Str("ID47".into())));

    assert_eq!(metrics[1].tag("facility"), Some("local4"));
    assert_eq!(
        metrics[1].field("exampleSDID@32473_iut"),
        Some(&FieldValue::Str("3".into()))
    );
    assert!(metrics[0].timestamp < metrics[1].timestamp);

    receiver.stop().await;
    assert!(sink.errors().is_empty(), "{:?}", sink.errors());
}

#[tokio::test]
async fn test_parse_error_reported_and_loop_continues() {
    let (receiver, sink, client) = start(udp_config()).await;

    client.send(b"not syslog").await.unwrap();
    client.send(b"<14>1 - - - - - -").await.unwrap();

    assert!(sink.wait_for_metrics(1, WAIT).await);
    assert_eq!(sink.error_count(), 1);
    assert!(sink.any_error(|e| matches!(e, ReceiverError::Parse { .. })));

    receiver.stop().await;
}

#[tokio::test]
async fn test_best_effort_datagram() {
    let config = ReceiverConfig {
        best_effort: true,
        ..udp_config()
    };
    let (receiver, sink, client) = start(config).await;

    client.send(b"<14>1 - host app - - [bad").await.unwrap();

    assert!(sink.wait_for_metrics(1, WAIT).await);
    assert!(sink.wait_for_errors(1, WAIT).await);
    assert_eq!(sink.metrics()[0].tag("appname"), Some("app"));

    receiver.stop().await;
}

#[tokio::test]
async fn test_timeout_not_armed_before_first_datagram() {
    let config = ReceiverConfig {
        read_timeout: Some(Duration::from_millis(50)),
        ..udp_config()
    };
    let (receiver, sink, client) = start(config).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.error_count(), 0);

    client.send(b"<14>1 - - - - - -").await.unwrap();
    assert!(sink.wait_for_metrics(1, WAIT).await);

    receiver.stop().await;
}

#[tokio::test]
async fn test_timeout_after_datagram_ends_loop() {
    let config = ReceiverConfig {
        read_timeout: Some(Duration::from_millis(100)),
        ..udp_config()
    };
    let (receiver, sink, client) = start(config).await;

    client.send(b"<14>1 - - - - - -").await.unwrap();
    assert!(sink.wait_for_metrics(1, WAIT).await);

    assert!(sink.wait_for_errors(1, WAIT).await);
    assert!(sink.any_error(|e| matches!(e, ReceiverError::ReadTimeout { .. })));

    // The loop has ended; later datagrams are not processed
    client.send(b"<14>1 - - - - - -").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.metric_count(), 1);

    receiver.stop().await;
}

#[tokio::test]
async fn test_stop_is_silent() {
    let (receiver, sink, _client) = start(udp_config()).await;

    receiver.stop().await;
    assert!(!receiver.is_running().await);
    assert!(sink.errors().is_empty(), "{:?}", sink.errors());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unixgram() {
    use tokio::net::UnixDatagram;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sluice.sock");

    let receiver = Receiver::new(ReceiverConfig {
        server: format!("unixgram://{}", path.display()),
        read_timeout: None,
        ..Default::default()
    });
    let sink = Arc::new(MemoryAccumulator::new());
    receiver.start(sink.clone()).await.unwrap();
    assert!(receiver.local_addr().await.is_none());

    let client = UnixDatagram::unbound().unwrap();
    client.send_to(b"<14>1 - unixhost - - - -", &path).await.unwrap();

    assert!(sink.wait_for_metrics(1, WAIT).await);
    assert_eq!(sink.metrics()[0].tag("hostname"), Some("unixhost"));

    receiver.stop().await;
    assert!(!path.exists());
}
