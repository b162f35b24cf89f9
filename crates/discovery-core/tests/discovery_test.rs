//! Discovery runs against a loopback SSDP responder and a mock HTTP server
//! serving device descriptions.

use std::net::SocketAddr;
use std::time::Duration;

use ccapi_discovery_core::{
    CancellationToken, DiscoveryConfig, DiscoveryEngine, DiscoveryEvent, DiscoveryStatus,
    CCAPI_SERVICE_TYPE,
};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn description(name: &str, udn: &str, port: u16) -> String {
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <friendlyName>{name}</friendlyName>
    <modelName>Canon EOS R6</modelName>
    <serialNumber>0123</serialNumber>
    <UDN>{udn}</UDN>
    <serviceList>
      <service>
        <ns:X_accessURL xmlns:ns="urn:schemas-canon-com:schema-upnp">http://127.0.0.1:{port}/ccapi</ns:X_accessURL>
      </service>
    </serviceList>
  </device>
</root>"#
    )
}

/// Answers every matching M-SEARCH with one response per location.
async fn responder(locations: Vec<String>) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
            let probe = String::from_utf8_lossy(&buf[..len]).to_string();
            if !probe.starts_with("M-SEARCH * HTTP/1.1\r\n")
                || !probe.contains("MAN: \"ssdp:discover\"")
                || !probe.contains(CCAPI_SERVICE_TYPE)
            {
                continue;
            }
            for location in &locations {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=1800\r\nlocation: {}\r\nST: {}\r\nUSN: uuid:camera::{}\r\n\r\n",
                    location, CCAPI_SERVICE_TYPE, CCAPI_SERVICE_TYPE
                );
                let _ = socket.send_to(response.as_bytes(), peer).await;
            }
        }
    });

    addr
}

fn config(target: SocketAddr) -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_target(target)
        .with_bind_addr(SocketAddr::from(([127, 0, 0, 1], 0)))
        .with_max_attempts(2)
        .with_receive_timeout(Duration::from_millis(300))
        .with_attempt_interval(Duration::from_millis(20))
}

async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn drain(events: &mut mpsc::Receiver<DiscoveryEvent>) -> Vec<DiscoveryEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[tokio::test]
async fn test_discovery_dedupes_by_udn() {
    let http = MockServer::start().await;
    let port = http.address().port();
    serve(&http, "/desc1.xml", description("EOS R6", "uuid:camera-1", port)).await;
    serve(&http, "/desc2.xml", description("EOS R6", "uuid:camera-1", port)).await;

    let target = responder(vec![
        format!("{}/desc1.xml", http.uri()),
        format!("{}/desc2.xml", http.uri()),
    ])
    .await;

    let (mut engine, mut events) = DiscoveryEngine::new(config(target)).unwrap();
    let report = engine.discover(CancellationToken::new()).await.unwrap();

    assert_eq!(report.status, DiscoveryStatus::Found(1));
    assert_eq!(report.probes_sent, 2);
    assert_eq!(report.devices.len(), 1);

    let device = &report.devices[0];
    assert_eq!(device.udn, "uuid:camera-1");
    assert_eq!(device.display_name(), "EOS R6");
    assert_eq!(device.source_ip, "127.0.0.1");
    assert_eq!(device.control_base_url, format!("http://127.0.0.1:{}/ccapi", port));

    let events = drain(&mut events);
    assert_eq!(events.first(), Some(&DiscoveryEvent::ProbeSent { attempt: 1 }));
    assert_eq!(events.last(), Some(&DiscoveryEvent::Finished(DiscoveryStatus::Found(1))));
    let found = events
        .iter()
        .filter(|e| matches!(e, DiscoveryEvent::DeviceFound(_)))
        .count();
    assert_eq!(found, 1);
}

#[tokio::test]
async fn test_resolve_response_dedupes_by_udn() {
    let http = MockServer::start().await;
    let port = http.address().port();
    serve(&http, "/a.xml", description("First", "uuid:same", port)).await;
    serve(&http, "/b.xml", description("Second", "uuid:same", port)).await;

    let (engine, _events) = DiscoveryEngine::new(DiscoveryConfig::default()).unwrap();
    let source = SocketAddr::from(([127, 0, 0, 1], 1900));

    let first = engine
        .resolve_response(&format!("HTTP/1.1 200 OK\r\nLOCATION: {}/a.xml\r\n\r\n", http.uri()), source)
        .await
        .unwrap();
    let second = engine
        .resolve_response(&format!("HTTP/1.1 200 OK\r\nLOCATION: {}/b.xml\r\n\r\n", http.uri()), source)
        .await
        .unwrap();

    assert_eq!(first.unwrap().friendly_name, "First");
    assert!(second.is_none());
    let devices = engine.devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].friendly_name, "First");
}

#[tokio::test]
async fn test_two_cameras_are_both_reported() {
    let http = MockServer::start().await;
    let port = http.address().port();
    serve(&http, "/r6.xml", description("EOS R6", "uuid:camera-1", port)).await;
    serve(&http, "/r5.xml", description("", "uuid:camera-2", port)).await;

    let target = responder(vec![
        format!("{}/r6.xml", http.uri()),
        format!("{}/r5.xml", http.uri()),
    ])
    .await;

    let (mut engine, _events) = DiscoveryEngine::new(config(target)).unwrap();
    let report = engine.discover(CancellationToken::new()).await.unwrap();

    assert_eq!(report.status, DiscoveryStatus::Found(2));
    let mut udns: Vec<_> = report.devices.iter().map(|d| d.udn.as_str()).collect();
    udns.sort();
    assert_eq!(udns, vec!["uuid:camera-1", "uuid:camera-2"]);
}

#[tokio::test]
async fn test_broken_description_does_not_abort_run() {
    let http = MockServer::start().await;
    let port = http.address().port();
    serve(&http, "/good.xml", description("EOS R6", "uuid:camera-1", port)).await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<root><device><friendlyName>No URL</friendlyName></device></root>"),
        )
        .mount(&http)
        .await;

    let broken = format!("{}/broken.xml", http.uri());
    let target = responder(vec![broken.clone(), format!("{}/good.xml", http.uri())]).await;

    let (mut engine, mut events) = DiscoveryEngine::new(config(target)).unwrap();
    let report = engine.discover(CancellationToken::new()).await.unwrap();

    assert_eq!(report.status, DiscoveryStatus::Found(1));
    assert_eq!(report.devices[0].udn, "uuid:camera-1");

    let failed: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            DiscoveryEvent::ResolveFailed { location, error } => Some((location, error)),
            _ => None,
        })
        .collect();
    // A failed location is retried on every probe answer
    assert_eq!(failed.len(), 2);
    for (location, error) in &failed {
        assert_eq!(location, &broken);
        assert!(error.contains("control URL"));
    }
}

#[tokio::test]
async fn test_failed_fetch_is_retried_on_next_answer() {
    let http = MockServer::start().await;
    let port = http.address().port();

    Mock::given(method("GET"))
        .and(path("/desc.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&http)
        .await;
    Mock::given(method("GET"))
        .and(path("/desc.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(description("EOS R6", "uuid:camera-1", port)),
        )
        .with_priority(5)
        .mount(&http)
        .await;

    let location = format!("{}/desc.xml", http.uri());
    let target = responder(vec![location.clone()]).await;

    let (mut engine, mut events) = DiscoveryEngine::new(config(target).with_max_attempts(3)).unwrap();
    let report = engine.discover(CancellationToken::new()).await.unwrap();

    assert_eq!(report.status, DiscoveryStatus::Found(1));
    assert_eq!(report.probes_sent, 3);
    assert_eq!(report.devices[0].udn, "uuid:camera-1");

    // 503 on the first answer, success on the second, nothing after that
    assert_eq!(http.received_requests().await.unwrap().len(), 2);

    let events = drain(&mut events);
    let failed: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, DiscoveryEvent::ResolveFailed { .. }))
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        failed[0],
        DiscoveryEvent::ResolveFailed { location: failed_at, error } if failed_at == &location && error.contains("503")
    ));
}

#[tokio::test]
async fn test_silence_reports_no_devices() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = silent.local_addr().unwrap();

    let config = config(target).with_receive_timeout(Duration::from_millis(100));
    let (mut engine, mut events) = DiscoveryEngine::new(config).unwrap();
    let report = engine.discover(CancellationToken::new()).await.unwrap();

    assert_eq!(report.status, DiscoveryStatus::NoDevicesFound);
    assert!(report.devices.is_empty());
    assert_eq!(report.probes_sent, 2);
    assert_eq!(
        drain(&mut events),
        vec![
            DiscoveryEvent::ProbeSent { attempt: 1 },
            DiscoveryEvent::ProbeSent { attempt: 2 },
            DiscoveryEvent::Finished(DiscoveryStatus::NoDevicesFound),
        ]
    );

    // Both probes reached the target
    let mut buf = [0u8; 512];
    for _ in 0..2 {
        let (len, _) = silent.recv_from(&mut buf).await.unwrap();
        assert!(buf[..len].starts_with(b"M-SEARCH * HTTP/1.1\r\n"));
    }
}

#[tokio::test]
async fn test_cancellation_interrupts_listening() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let config = config(silent.local_addr().unwrap())
        .with_max_attempts(3)
        .with_receive_timeout(Duration::from_secs(30));
    let (mut engine, _events) = DiscoveryEngine::new(config).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), engine.discover(cancel))
        .await
        .expect("discovery ignored cancellation")
        .unwrap();

    assert_eq!(report.status, DiscoveryStatus::Cancelled);
    assert_eq!(report.probes_sent, 1);
}

#[tokio::test]
async fn test_cancellation_abandons_pending_fetches() {
    let http = MockServer::start().await;
    let port = http.address().port();
    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(description("EOS R6", "uuid:camera-1", port))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&http)
        .await;

    let target = responder(vec![format!("{}/slow.xml", http.uri())]).await;
    let config = config(target)
        .with_max_attempts(1)
        .with_receive_timeout(Duration::from_secs(30));
    let (mut engine, mut events) = DiscoveryEngine::new(config).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        // The fetch starts right after the first answer and is still waiting
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let report = tokio::time::timeout(Duration::from_secs(5), engine.discover(cancel))
        .await
        .expect("discovery waited for the slow fetch")
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.status, DiscoveryStatus::Cancelled);
    assert!(report.devices.is_empty());
    assert_eq!(http.received_requests().await.unwrap().len(), 1);
    assert_eq!(
        drain(&mut events).last(),
        Some(&DiscoveryEvent::Finished(DiscoveryStatus::Cancelled))
    );
}

#[tokio::test]
async fn test_new_run_clears_previous_results() {
    let http = MockServer::start().await;
    let port = http.address().port();
    serve(&http, "/a.xml", description("Old", "uuid:old", port)).await;

    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let (mut engine, _events) = DiscoveryEngine::new(
        config(silent.local_addr().unwrap())
            .with_max_attempts(1)
            .with_receive_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let source = SocketAddr::from(([127, 0, 0, 1], 1900));
    engine
        .resolve_response(&format!("HTTP/1.1 200 OK\r\nLOCATION: {}/a.xml\r\n\r\n", http.uri()), source)
        .await
        .unwrap();
    assert_eq!(engine.devices().len(), 1);

    let report = engine.discover(CancellationToken::new()).await.unwrap();
    assert_eq!(report.status, DiscoveryStatus::NoDevicesFound);
    assert!(engine.devices().is_empty());
}
