//! Protocol sessions exercised against an in-process mock nPoint device.

use pulsefind_npoint::{probe_device, ProbeOptions, SessionError};
use std::net::Ipv4Addr;
use std::time::Duration;

mod mock {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use sha1::{Digest, Sha1};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    /// How a mock device answers one connection
    #[derive(Debug, Clone)]
    pub struct Behavior {
        /// Data returned for the identity query
        pub identity: String,
        /// Send a handshake without any nonce field
        pub omit_handshake_nonce: bool,
        /// Close the connection without answering query number N (0-based)
        pub drop_at_query: Option<usize>,
    }

    impl Default for Behavior {
        fn default() -> Self {
            Self {
                identity: "AA:BB:00:C0:17:33:00:30".to_string(),
                omit_handshake_nonce: false,
                drop_at_query: None,
            }
        }
    }

    pub struct MockDevice {
        pub addr: SocketAddr,
        /// Query keys received, in arrival order
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    pub async fn spawn(behavior: Behavior) -> MockDevice {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let task_calls = Arc::clone(&calls);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let behavior = behavior.clone();
                let calls = Arc::clone(&task_calls);
                tokio::spawn(serve_connection(stream, behavior, calls));
            }
        });

        MockDevice { addr, calls }
    }

    async fn serve_connection(
        stream: TcpStream,
        behavior: Behavior,
        calls: Arc<Mutex<Vec<String>>>,
    ) {
        let mut ws = accept_async(stream).await.unwrap();

        let mut nonce = "nonce-0".to_string();
        let hello = if behavior.omit_handshake_nonce {
            json!({ "uname": "Linux npoint 4.9" })
        } else {
            json!({ "nonce": nonce, "uname": "Linux npoint 4.9" })
        };
        ws.send(Message::Text(hello.to_string().into())).await.unwrap();

        let mut round = 0usize;
        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { break };
            let request: Value = serde_json::from_str(text.as_str()).unwrap();
            let call = request["callType"].as_str().unwrap().to_string();

            // The signature must prove possession of the nonce issued in
            // the previous round, never an older one.
            let expected = hex::encode(Sha1::digest(format!("{call}{nonce}")));
            assert_eq!(
                request["signature"].as_str().unwrap(),
                expected,
                "bad signature for {call}"
            );

            calls.lock().unwrap().push(call.clone());

            if behavior.drop_at_query == Some(round) {
                break;
            }

            round += 1;
            nonce = format!("nonce-{round}");
            let data = if call == "gtme_web" {
                behavior.identity.clone()
            } else {
                format!("{call}-data")
            };
            let response = json!({ "nonce": nonce, "data": data, "success": "true" });
            ws.send(Message::Text(response.to_string().into())).await.unwrap();
        }
    }
}

fn options(display_level: u8, mac_filter: Option<&str>) -> ProbeOptions {
    ProbeOptions {
        timeout: Duration::from_secs(2),
        display_level,
        mac_filter: mac_filter.map(str::to_string),
    }
}

#[tokio::test]
async fn full_chain_at_maximum_level() {
    let device = mock::spawn(mock::Behavior::default()).await;

    let report = probe_device(Ipv4Addr::LOCALHOST, device.addr.port(), &options(9, None))
        .await
        .unwrap();

    let keys: Vec<&str> = report.fields.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "gtme_web", "bver", "temp", "link", "up_dhm", "batt", "poev", "gurl", "mach",
            "sw_port", "sw_addr", "sw_name", "free"
        ]
    );
    assert_eq!(report.identity(), Some("AA:BB:00:C0:17:33:00:30"));
    assert!(!report.matched_filter);
    assert_eq!(*device.calls.lock().unwrap(), keys);
}

#[tokio::test]
async fn level_zero_stops_at_first_gated_query() {
    let device = mock::spawn(mock::Behavior::default()).await;

    let report = probe_device(Ipv4Addr::LOCALHOST, device.addr.port(), &options(0, None))
        .await
        .unwrap();

    assert_eq!(report.fields.len(), 2);
    assert_eq!(*device.calls.lock().unwrap(), vec!["gtme_web", "bver"]);
}

#[tokio::test]
async fn level_one_adds_sensors_up_to_battery() {
    let device = mock::spawn(mock::Behavior::default()).await;

    probe_device(Ipv4Addr::LOCALHOST, device.addr.port(), &options(1, None))
        .await
        .unwrap();

    assert_eq!(
        *device.calls.lock().unwrap(),
        vec!["gtme_web", "bver", "temp", "link", "up_dhm"]
    );
}

#[tokio::test]
async fn missing_handshake_nonce_sends_no_queries() {
    let device = mock::spawn(mock::Behavior {
        omit_handshake_nonce: true,
        ..mock::Behavior::default()
    })
    .await;

    let err = probe_device(Ipv4Addr::LOCALHOST, device.addr.port(), &options(9, None))
        .await
        .unwrap_err();

    assert_eq!(err, SessionError::NoNonce);
    assert!(device.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mid_chain_drop_reports_the_failing_query() {
    let device = mock::spawn(mock::Behavior {
        drop_at_query: Some(1),
        ..mock::Behavior::default()
    })
    .await;

    let err = probe_device(Ipv4Addr::LOCALHOST, device.addr.port(), &options(9, None))
        .await
        .unwrap_err();

    assert_eq!(err, SessionError::QueryFailed("bver"));
}

#[tokio::test]
async fn filter_mismatch_aborts_after_identity() {
    let device = mock::spawn(mock::Behavior {
        identity: "AA:BB:00:C0:17:44:00:99".to_string(),
        ..mock::Behavior::default()
    })
    .await;

    let err = probe_device(
        Ipv4Addr::LOCALHOST,
        device.addr.port(),
        &options(9, Some("330030")),
    )
    .await
    .unwrap_err();

    assert_eq!(err, SessionError::FilterMismatch);
    assert_eq!(*device.calls.lock().unwrap(), vec!["gtme_web"]);
}

#[tokio::test]
async fn filter_match_is_case_insensitive_and_continues() {
    let device = mock::spawn(mock::Behavior::default()).await;

    let report = probe_device(
        Ipv4Addr::LOCALHOST,
        device.addr.port(),
        &options(0, Some("330030")),
    )
    .await
    .unwrap();

    assert!(report.matched_filter);
    assert_eq!(*device.calls.lock().unwrap(), vec!["gtme_web", "bver"]);
}

#[tokio::test]
async fn closed_port_yields_connect_failed() {
    // Bind and drop to get a port nothing is listening on.
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = probe_device(Ipv4Addr::LOCALHOST, port, &options(0, None))
        .await
        .unwrap_err();

    assert_eq!(err, SessionError::ConnectFailed);
}
