use crate::dispatch::{dispatch_message, DispatchOptions, IncomingMessage};
use crate::state::AppState;
use crate::transport::TelegramClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Long-poll Telegram for updates and handle them one at a time.
///
/// Returns once `shutdown` turns true (or its sender is dropped). The flag is
/// only checked between updates, so a command that has started is handled
/// and answered in full. Before returning, the offset of the last handled
/// update is confirmed so it is not delivered again after a restart.
pub async fn run_polling(
    state: Arc<AppState>,
    client: Arc<TelegramClient>,
    options: DispatchOptions,
    poll_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset: Option<i64> = None;
    tracing::info!(?poll_timeout, "Polling for updates");

    'poll: loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let result = tokio::select! {
            result = client.get_updates(offset, poll_timeout) => result,
            _ = shutdown.changed() => break,
        };

        let updates = match result {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}. Retrying in {:?}", e, ERROR_BACKOFF);
                tokio::select! {
                    _ = tokio::time::sleep(ERROR_BACKOFF) => continue,
                    _ = shutdown.changed() => break,
                }
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            if let Some(message) = IncomingMessage::from_update(update) {
                dispatch_message(message, &state, client.as_ref(), &options).await;
            }

            // Remaining updates stay unconfirmed and are redelivered later
            if *shutdown.borrow() {
                break 'poll;
            }
        }
    }

    if let Some(offset) = offset {
        match client.get_updates(Some(offset), Duration::ZERO).await {
            Ok(_) => tracing::debug!(offset, "Confirmed handled updates"),
            Err(e) => tracing::warn!(offset, "Failed to confirm handled updates: {}", e),
        }
    }
    tracing::info!("Polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    async fn fake_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Bot API that hands out one `/clown` for chat 7, then idles
    fn clown_once_api(polls: Arc<Mutex<Vec<Value>>>, sent: Arc<Mutex<Vec<String>>>) -> Router {
        Router::new()
            .route(
                "/botTOKEN/getUpdates",
                post(move |Json(body): Json<Value>| {
                    let polls = polls.clone();
                    async move {
                        let first = {
                            let mut polls = polls.lock().unwrap();
                            polls.push(body);
                            polls.len() == 1
                        };
                        if first {
                            Json(json!({
                                "ok": true,
                                "result": [{"update_id": 1, "message": {
                                    "message_id": 1,
                                    "chat": {"id": 7, "type": "group"},
                                    "text": "/clown"
                                }}]
                            }))
                        } else {
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Json(json!({"ok": true, "result": []}))
                        }
                    }
                }),
            )
            .route(
                "/botTOKEN/sendMessage",
                post(move |Json(body): Json<Value>| {
                    let sent = sent.clone();
                    async move {
                        let text = body["text"].as_str().unwrap_or_default().to_string();
                        sent.lock().unwrap().push(text);
                        Json(json!({"ok": true, "result": {"message_id": 2}}))
                    }
                }),
            )
    }

    #[tokio::test]
    async fn test_shutdown_during_announcement_finishes_it() {
        let polls = Arc::new(Mutex::new(Vec::new()));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let base = fake_api(clown_once_api(polls.clone(), sent.clone())).await;

        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState::open(Store::new(dir.path())).await.unwrap());
        state
            .add_member(
                "7",
                "vasya",
                None,
                "test",
                chrono::Local::now().date_naive(),
            )
            .await
            .unwrap();

        let client = Arc::new(TelegramClient::new(base, "TOKEN".to_string()).unwrap());
        let options = DispatchOptions {
            bot_username: None,
            announce_delay: Duration::from_millis(1000),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let polling = tokio::spawn(run_polling(
            state.clone(),
            client,
            options,
            Duration::from_secs(1),
            shutdown_rx,
        ));

        // Stop while the announcement pause is running
        tokio::time::sleep(Duration::from_millis(400)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(10), polling)
            .await
            .unwrap()
            .unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2, "both announcement messages are sent: {:?}", sent);
        assert_eq!(sent[1], "Клоун дня: vasya (@vasya)");

        let polls = polls.lock().unwrap();
        let last = polls.last().unwrap();
        assert_eq!(last["offset"], 2);
        assert_eq!(last["timeout"], 0);
    }

    #[tokio::test]
    async fn test_shutdown_while_idle_returns_promptly() {
        let router = Router::new().route(
            "/botTOKEN/getUpdates",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({"ok": true, "result": []}))
            }),
        );
        let base = fake_api(router).await;

        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState::new(Store::new(dir.path())));
        let client = Arc::new(TelegramClient::new(base, "TOKEN".to_string()).unwrap());
        let options = DispatchOptions {
            bot_username: None,
            announce_delay: Duration::ZERO,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let polling = tokio::spawn(run_polling(
            state,
            client,
            options,
            Duration::from_secs(30),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), polling)
            .await
            .unwrap()
            .unwrap();
    }
}
