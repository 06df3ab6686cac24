use crate::{
    ConnectionEvent, ConnectionSettings, ConnectionSupervisor, CoreError, DeviceLink, Ingress,
    RawStatus, ingress_channel,
};

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);

fn settings(port: u16, password: Option<&str>) -> ConnectionSettings {
    ConnectionSettings {
        host: "127.0.0.1".to_string(),
        port,
        password: password.map(str::to_string),
    }
}

/// Minimal obs-websocket server: one client, no auth unless `challenge` is set.
#[allow(clippy::unwrap_used)]
async fn fake_obs(listener: TcpListener, challenge: Option<Value>) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();

    let mut hello = json!({ "obsWebSocketVersion": "5.5.2", "rpcVersion": 1 });
    if let Some(challenge) = challenge {
        hello["authentication"] = challenge;
    }
    let frame = json!({ "op": 0, "d": hello }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();

    while let Some(Ok(message)) = ws.next().await {
        if message.is_close() {
            break;
        }
        let Ok(frame) = serde_json::from_str::<Value>(message.to_text().unwrap_or_default()) else {
            continue;
        };

        match frame["op"].as_u64() {
            Some(1) => {
                let reply = json!({ "op": 2, "d": { "negotiatedRpcVersion": 1 } });
                ws.send(Message::Text(reply.to_string().into())).await.unwrap();
            }
            Some(6) => {
                let request_type = frame["d"]["requestType"].as_str().unwrap_or_default();
                let response_data = match request_type {
                    "GetVersion" => json!({ "obsVersion": "30.2.0", "obsWebSocketVersion": "5.5.2" }),
                    _ => json!({
                        "outputActive": true,
                        "outputPaused": false,
                        "outputTimecode": "00:00:05.000",
                        "outputDuration": 5000,
                        "outputBytes": 1024
                    }),
                };
                let reply = json!({
                    "op": 7,
                    "d": {
                        "requestType": request_type,
                        "requestId": frame["d"]["requestId"],
                        "requestStatus": { "result": true, "code": 100 },
                        "responseData": response_data
                    }
                });
                ws.send(Message::Text(reply.to_string().into())).await.unwrap();

                if request_type == "GetVersion" {
                    let event = json!({
                        "op": 5,
                        "d": {
                            "eventType": "RecordStateChanged",
                            "eventIntent": 64,
                            "eventData": { "outputActive": true, "outputState": "OBS_WEBSOCKET_OUTPUT_STARTED" }
                        }
                    });
                    ws.send(Message::Text(event.to_string().into())).await.unwrap();
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::unwrap_used)]
async fn next_event(rx: &mut mpsc::Receiver<Ingress>) -> (u64, ConnectionEvent) {
    loop {
        if let Ingress::Connection { generation, event } =
            timeout(WAIT, rx.recv()).await.unwrap().unwrap()
        {
            return (generation, event);
        }
    }
}

/// WHAT: A full handshake yields Connecting, Connected and forwarded push events
/// WHY: The engine relies on this event order to start polling
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_obs_server_when_connecting_then_events_and_polls_flow() {
    // Given
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(fake_obs(listener, None));

    let (ingress_tx, mut ingress_rx) = ingress_channel();
    let supervisor = ConnectionSupervisor::new(ingress_tx);

    // When
    supervisor.connect(&settings(port, None)).await.unwrap();

    // Then
    let generation = supervisor.generation();
    assert_eq!(
        next_event(&mut ingress_rx).await,
        (generation, ConnectionEvent::Connecting)
    );
    assert_eq!(
        next_event(&mut ingress_rx).await,
        (
            generation,
            ConnectionEvent::Connected {
                version: "30.2.0".to_string()
            }
        )
    );
    assert_eq!(
        next_event(&mut ingress_rx).await,
        (
            generation,
            ConnectionEvent::RecordStateChanged(RawStatus::pushed(true, false))
        )
    );

    // And: Requests are answered over the same socket
    let status = timeout(WAIT, supervisor.get_record_status())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status, RawStatus::polled(true, false, "00:00:05.000"));

    // When: The user disconnects
    supervisor.disconnect().await;

    // Then: Exactly one Disconnected for the closed socket, now stale
    let (closed_generation, event) = next_event(&mut ingress_rx).await;
    assert_eq!(event, ConnectionEvent::Disconnected);
    assert_eq!(closed_generation, generation);
    assert!(supervisor.generation() > generation);
}

/// WHAT: A refused connection reports ConnectionError and returns the error
/// WHY: The engine schedules a reconnect from the event
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_no_server_when_connecting_then_connection_error() {
    // Given: A port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (ingress_tx, mut ingress_rx) = ingress_channel();
    let supervisor = ConnectionSupervisor::new(ingress_tx);

    // When
    let result = supervisor.connect(&settings(port, None)).await;

    // Then
    assert!(matches!(result, Err(CoreError::ConnectionFailed { .. })));
    assert_eq!(next_event(&mut ingress_rx).await.1, ConnectionEvent::Connecting);
    assert!(matches!(
        next_event(&mut ingress_rx).await.1,
        ConnectionEvent::ConnectionError { .. }
    ));

    // And: The link is idle again
    assert!(matches!(
        supervisor.get_record_status().await,
        Err(CoreError::NotConnected { .. })
    ));
}

/// WHAT: A password-protected server without a configured password fails the handshake
/// WHY: The user must be told a password is needed
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_auth_challenge_without_password_when_connecting_then_authentication_required() {
    // Given
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let challenge = json!({
        "challenge": "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=",
        "salt": "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI="
    });
    tokio::spawn(fake_obs(listener, Some(challenge)));

    let (ingress_tx, mut ingress_rx) = ingress_channel();
    let supervisor = ConnectionSupervisor::new(ingress_tx);

    // When
    let result = supervisor.connect(&settings(port, None)).await;

    // Then
    assert!(matches!(result, Err(CoreError::AuthenticationRequired { .. })));
    assert_eq!(next_event(&mut ingress_rx).await.1, ConnectionEvent::Connecting);
    assert!(matches!(
        next_event(&mut ingress_rx).await.1,
        ConnectionEvent::ConnectionError { .. }
    ));
}

/// WHAT: Requests while idle fail with NotConnected
/// WHY: Polls after a disconnect must fail fast
#[tokio::test]
async fn given_idle_supervisor_when_polling_then_not_connected() {
    let (ingress_tx, _ingress_rx) = ingress_channel();
    let supervisor = ConnectionSupervisor::new(ingress_tx);

    assert!(matches!(
        supervisor.get_record_status().await,
        Err(CoreError::NotConnected { .. })
    ));
    supervisor.disconnect().await;
    assert_eq!(supervisor.generation(), 1);
}

/// Accepts the WebSocket upgrade but never sends Hello, holding the handshake open.
#[allow(clippy::unwrap_used)]
async fn silent_obs(listener: TcpListener) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    while ws.next().await.is_some() {}
}

/// WHAT: A second connect while a handshake is in flight is a quiet no-op
/// WHY: The supervisor owns at most one connection attempt at a time
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_handshake_in_flight_when_connecting_again_then_no_second_attempt() {
    // Given: A first attempt waiting for Hello
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(silent_obs(listener));

    let (ingress_tx, mut ingress_rx) = ingress_channel();
    let supervisor = ConnectionSupervisor::new(ingress_tx);
    let first = tokio::spawn({
        let supervisor = supervisor.clone();
        async move { supervisor.connect(&settings(port, None)).await }
    });
    let (generation, event) = next_event(&mut ingress_rx).await;
    assert_eq!(event, ConnectionEvent::Connecting);

    // When
    let second = timeout(WAIT, supervisor.connect(&settings(port, None)))
        .await
        .unwrap();

    // Then: Nothing new was started
    assert!(second.is_ok());
    assert_eq!(supervisor.generation(), generation);
    assert!(
        timeout(Duration::from_millis(200), ingress_rx.recv())
            .await
            .is_err()
    );

    supervisor.disconnect().await;
    let first = timeout(WAIT, first).await.unwrap().unwrap();
    assert!(matches!(first, Err(CoreError::ConnectionCancelled { .. })));
}

/// WHAT: Disconnecting during the handshake cancels it without a Connected event
/// WHY: A user disconnect must win over an attempt that has not finished
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_handshake_in_flight_when_disconnecting_then_attempt_cancelled() {
    // Given
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(silent_obs(listener));

    let (ingress_tx, mut ingress_rx) = ingress_channel();
    let supervisor = ConnectionSupervisor::new(ingress_tx);
    let attempt = tokio::spawn({
        let supervisor = supervisor.clone();
        async move { supervisor.connect(&settings(port, None)).await }
    });
    let (generation, event) = next_event(&mut ingress_rx).await;
    assert_eq!(event, ConnectionEvent::Connecting);

    // When
    supervisor.disconnect().await;

    // Then
    let result = timeout(WAIT, attempt).await.unwrap().unwrap();
    assert!(matches!(result, Err(CoreError::ConnectionCancelled { .. })));
    assert!(supervisor.generation() > generation);
    assert!(
        timeout(Duration::from_millis(200), ingress_rx.recv())
            .await
            .is_err()
    );

    // And: The link is idle again
    assert!(matches!(
        supervisor.get_record_status().await,
        Err(CoreError::NotConnected { .. })
    ));
}
