//! Core behaviors shared by the WebSocket session loop.
//!
//! This includes:
//!   - Turning a scanned (or demo) payload into a running round
//!   - Forwarding answers, hints, skips and retries to the run engine
//!   - Turning countdown ticks into tick/timeout messages
//!   - Mapping refusals to player-facing notices

use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::engine::{Cue, Rejected, Resolution, RoundStart, RunEngine, TickResult};
use crate::hints::HintPayload;
use crate::parser::parse_qr_payload;
use crate::protocol::{shuffled, to_out, ClientWsMessage, RoundResultOut, ServerWsMessage};
use crate::seeds::random_demo_payload;
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state, engine, msg, now), fields(kind = msg.kind()))]
pub fn handle_client(state: &AppState, engine: &mut RunEngine, msg: ClientWsMessage, now: Instant) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::Scan { payload } => {
      info!(target: "scan", payload = %trunc_for_log(&payload, 80), "QR payload received");
      start_from_payload(engine, &payload, now)
    }

    ClientWsMessage::Demo => start_from_payload(engine, random_demo_payload(), now),

    ClientWsMessage::SubmitAnswer { answer } => match engine.submit_answer(&answer, now) {
      Ok(res) => resolution_messages(engine, res),
      Err(e) => notice(e),
    },

    ClientWsMessage::Hint { kind } => match engine.use_hint(kind) {
      Ok(grant) => {
        let hint = match grant.payload {
          HintPayload::FiftyFifty { options } => HintPayload::FiftyFifty { options: shuffled(&options) },
          other => other,
        };
        let text = hint.describe();
        vec![ServerWsMessage::Hint { hint, text, hints_used: grant.hints_used, cues: vec![Cue::Hint] }]
      }
      Err(e) => notice(e),
    },

    ClientWsMessage::Skip => match engine.skip(now) {
      Ok(res) => resolution_messages(engine, res),
      Err(e) => notice(e),
    },

    ClientWsMessage::Retry => match engine.retry(now) {
      Ok(start) => {
        let mut out = notice_text("Retry enabled (reduced marks)");
        out.push(question_message(engine, start, vec![]));
        out
      }
      Err(e) => notice(e),
    },

    ClientWsMessage::ResetRun => {
      let snapshot = engine.reset();
      vec![ServerWsMessage::State { state: snapshot }, ServerWsMessage::Notice { message: "Run reset".into() }]
    }

    ClientWsMessage::GetState => vec![ServerWsMessage::State { state: engine.snapshot() }],

    ClientWsMessage::GetLeaderboard => vec![ServerWsMessage::Leaderboard { entries: state.leaderboard.load() }],
  }
}

/// One countdown second for `round_id`. Stale ticks produce nothing.
pub fn handle_tick(engine: &mut RunEngine, round_id: u64, now: Instant) -> Vec<ServerWsMessage> {
  match engine.tick(round_id, now) {
    Ok(TickResult::Running { time_left }) => vec![ServerWsMessage::Tick { time_left }],
    Ok(TickResult::Resolved(res)) => {
      let mut out = vec![ServerWsMessage::Tick { time_left: 0 }];
      out.extend(resolution_messages(engine, res));
      out
    }
    Err(e) => {
      debug!(target: "run", round_id, reason = %e, "Ignoring tick");
      vec![]
    }
  }
}

fn start_from_payload(engine: &mut RunEngine, payload: &str, now: Instant) -> Vec<ServerWsMessage> {
  let question = parse_qr_payload(payload);
  match engine.start_round(question, now) {
    Ok(start) => vec![question_message(engine, start, vec![Cue::Scan])],
    Err(e) => notice(e),
  }
}

fn question_message(engine: &RunEngine, start: RoundStart, cues: Vec<Cue>) -> ServerWsMessage {
  ServerWsMessage::Question {
    question: to_out(&start.question),
    retry: start.retry,
    state: engine.snapshot(),
    cues,
  }
}

fn resolution_messages(engine: &RunEngine, res: Resolution) -> Vec<ServerWsMessage> {
  let mut out = vec![ServerWsMessage::RoundResult { result: RoundResultOut::from(&res), state: engine.snapshot() }];
  if let Some(fin) = res.finalized {
    out.push(ServerWsMessage::RunFinished {
      entry: fin.entry,
      leaderboard: fin.leaderboard,
      save_error: fin.save_error,
    });
  }
  out
}

fn notice(e: Rejected) -> Vec<ServerWsMessage> {
  notice_text(&e.to_string())
}

fn notice_text(message: &str) -> Vec<ServerWsMessage> {
  vec![ServerWsMessage::Notice { message: message.to_string() }]
}
