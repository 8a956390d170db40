//! Two real clients talking through a loopback relay.

use futures_util::{SinkExt, StreamExt};
use pomar_client::{ChatConfig, ConnectionManager, Side, ViewUpdate, WsConnector};
use pomar_core::RetryPolicy;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;

/// Minimal relay: assigns ids in connection order and forwards every text
/// frame to all other clients.
async fn spawn_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (relay_tx, _) = broadcast::channel::<(u32, String)>(64);

    tokio::spawn(async move {
        let mut next_id = 1;
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream, next_id, relay_tx.clone()));
            next_id += 1;
        }
    });
    addr
}

async fn serve(stream: TcpStream, id: u32, relay_tx: broadcast::Sender<(u32, String)>) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut sink, mut stream) = ws.split();
    let mut relay_rx = relay_tx.subscribe();

    let assign = json!({"type": "idClient", "content": id.to_string()}).to_string();
    if sink.send(Message::Text(assign.into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = relay_tx.send((id, text.to_string()));
                }
                Some(Ok(_)) => {}
                _ => break,
            },
            relayed = relay_rx.recv() => match relayed {
                Ok((from, text)) if from != id => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            },
        }
    }
}

async fn wait_for(
    updates: &mut mpsc::UnboundedReceiver<ViewUpdate>,
    matches: impl Fn(&ViewUpdate) -> bool,
) {
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(update) = updates.recv().await {
            if matches(&update) {
                return true;
            }
        }
        false
    })
    .await;
    assert!(matches!(found, Ok(true)), "expected view update never arrived");
}

#[tokio::test]
async fn message_reaches_the_other_client() {
    let addr = spawn_relay().await;
    let config = ChatConfig {
        url: format!("ws://{addr}"),
        reconnect: RetryPolicy::bounded(Duration::from_millis(50), 1),
        sync_delay: Duration::from_millis(20),
        ..ChatConfig::default()
    };

    let (a_updates_tx, mut a_updates) = mpsc::unbounded_channel();
    let (a_input, mut a_input_rx) = mpsc::channel(8);
    let mut a = ConnectionManager::new(WsConnector, &config).with_updates(a_updates_tx);
    let a_task = tokio::spawn(async move { a.run(&mut a_input_rx).await });
    wait_for(&mut a_updates, |u| {
        matches!(u, ViewUpdate::Identity { name: "Cupuaçu", .. })
    })
    .await;

    let (b_updates_tx, mut b_updates) = mpsc::unbounded_channel();
    let (_b_input, mut b_input_rx) = mpsc::channel::<String>(8);
    let mut b = ConnectionManager::new(WsConnector, &config).with_updates(b_updates_tx);
    let b_task = tokio::spawn(async move { b.run(&mut b_input_rx).await });
    wait_for(&mut b_updates, |u| {
        matches!(u, ViewUpdate::Identity { name: "Jabuticaba", .. })
    })
    .await;

    a_input.send("olá".to_string()).await.unwrap();
    wait_for(&mut a_updates, |u| {
        matches!(u, ViewUpdate::Appended(bubble) if bubble.side == Side::Outgoing && bubble.text == "olá")
    })
    .await;
    wait_for(&mut b_updates, |u| {
        matches!(u, ViewUpdate::Appended(bubble)
            if bubble.side == Side::Incoming
                && bubble.text == "olá"
                && bubble.author_name() == Some("Cupuaçu"))
    })
    .await;

    a_task.abort();
    b_task.abort();
}
