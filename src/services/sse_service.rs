use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    score::SharedState,
};

/// Subscribe to the realtime stream of one match.
pub fn subscribe_match(state: &SharedState, match_id: Uuid) -> broadcast::Receiver<ServerEvent> {
    state.fanout().subscribe(match_id)
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// releasing the match channel once the client disconnects.
///
/// The handshake goes straight into this connection's own queue; viewers
/// already attached to the match never see it.
pub fn to_sse_stream(
    state: SharedState,
    match_id: Uuid,
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    let handshake = handshake_event(&state, match_id);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if let Some(payload) = handshake {
            let _ = tx.send(Ok(to_event(payload))).await;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages; the client resynchronizes
                            // from the next full snapshot or a fresh GET.
                            continue;
                        }
                    }
                }
            }
        }

        // Own the receiver inside the spawned task so the channel can be
        // reclaimed even if the request context has already dropped.
        drop(receiver);
        state.fanout().release(match_id);
        tracing::info!(%match_id, "match SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Build the greeting sent to one freshly attached viewer.
fn handshake_event(state: &SharedState, match_id: Uuid) -> Option<ServerEvent> {
    let handshake = Handshake {
        match_id,
        message: "subscribed to match score stream".to_string(),
        degraded: state.is_degraded(),
    };
    ServerEvent::json(Some("handshake".to_string()), &handshake).ok()
}
