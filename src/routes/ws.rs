//! WebSocket upgrade + session loop. One run engine per connection.
//! Client messages are parsed as JSON and forwarded to core logic; the round
//! ticker feeds countdown ticks into the same loop, so the engine is only ever
//! touched from this task.

use std::sync::Arc;
use std::time::Instant;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic::{handle_client, handle_tick};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::timer::RoundTicker;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "treasure_hunt", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let mut engine = state.new_engine();
  let mut ticker = RoundTicker::idle();
  info!(
    target: "treasure_hunt",
    run = %engine.run().id,
    player = %engine.profile().name,
    max_questions = engine.rules().max_questions,
    "WebSocket connected"
  );

  if send_all(&mut socket, vec![ServerWsMessage::State { state: engine.snapshot() }]).await.is_err() {
    return;
  }

  loop {
    let replies = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "treasure_hunt", kind = msg.kind(), "WS received");
            handle_client(&state, &mut engine, msg, Instant::now())
          }
          Err(e) => {
            debug!(target: "treasure_hunt", raw = %trunc_for_log(&txt, 80), error = %e, "WS message rejected");
            vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }]
          }
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => continue,
        Some(Err(e)) => {
          error!(target: "treasure_hunt", error = %e, "WS receive error");
          break;
        }
      },
      round_id = ticker.next() => handle_tick(&mut engine, round_id, Instant::now()),
    };

    // Re-arm on a new round, stop on resolution.
    ticker.follow(engine.active_round_id());

    if send_all(&mut socket, replies).await.is_err() {
      break;
    }
  }
  info!(target: "treasure_hunt", run = %engine.run().id, phase = ?engine.phase(), score = engine.run().score, "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, msgs: Vec<ServerWsMessage>) -> Result<(), axum::Error> {
  for msg in msgs {
    let out = serde_json::to_string(&msg).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "treasure_hunt", error = %e, "WS send error");
      return Err(e);
    }
  }
  Ok(())
}
