use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use crate::api::AppState;
use crate::events::Subscription;

/// `GET /api/events`: live bus payloads as server-sent events.
///
/// The subscription is taken before the response is returned, so nothing
/// emitted after the handler runs is missed. Dropping the response body on
/// disconnect drops the subscription with it.
pub async fn stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.events.subscribe();
    tracing::debug!(
        "Event stream opened ({} listener(s))",
        state.events.listener_count()
    );

    Sse::new(event_stream(subscription)).keep_alive(
        KeepAlive::new()
            .interval(state.config.heartbeat_interval)
            .text("heartbeat"),
    )
}

fn event_stream(subscription: Subscription) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    let connected = stream::once(async {
        Ok::<_, Infallible>(
            Event::default().data(json!({ "type": "connected", "timestamp": Utc::now() }).to_string()),
        )
    });

    let forwarded = stream::unfold(subscription, |mut subscription| async move {
        let frame = match subscription.recv().await {
            Ok(payload) => match serde_json::to_string(&payload) {
                Ok(data) => Event::default().data(data),
                Err(e) => {
                    tracing::error!("Failed to encode event: {}", e);
                    Event::default().comment("encode error")
                }
            },
            Err(RecvError::Lagged(n)) => {
                tracing::warn!("Event stream lagged, skipped {} events", n);
                Event::default().comment(format!("skipped {} events", n))
            }
            Err(RecvError::Closed) => return None,
        };
        Some((Ok(frame), subscription))
    });

    connected.chain(forwarded)
}
