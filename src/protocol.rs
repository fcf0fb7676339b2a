//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::{HintKind, LeaderboardEntry, Question, QuestionKind};
use crate::engine::{Cue, Outcome, Resolution, RunSnapshot};
use crate::hints::HintPayload;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// Raw text decoded by the client's QR scanner.
    Scan {
        payload: String,
    },
    Demo,
    SubmitAnswer {
        answer: String,
    },
    Hint {
        kind: HintKind,
    },
    Skip,
    Retry,
    ResetRun,
    GetState,
    GetLeaderboard,
}

impl ClientWsMessage {
    /// Wire tag of the message, for logs that must not carry player text.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientWsMessage::Ping => "ping",
            ClientWsMessage::Scan { .. } => "scan",
            ClientWsMessage::Demo => "demo",
            ClientWsMessage::SubmitAnswer { .. } => "submit_answer",
            ClientWsMessage::Hint { .. } => "hint",
            ClientWsMessage::Skip => "skip",
            ClientWsMessage::Retry => "retry",
            ClientWsMessage::ResetRun => "reset_run",
            ClientWsMessage::GetState => "get_state",
            ClientWsMessage::GetLeaderboard => "get_leaderboard",
        }
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        question: QuestionOut,
        retry: bool,
        state: RunSnapshot,
        cues: Vec<Cue>,
    },
    Tick {
        #[serde(rename = "timeLeft")]
        time_left: u32,
    },
    RoundResult {
        result: RoundResultOut,
        state: RunSnapshot,
    },
    Hint {
        hint: HintPayload,
        text: String,
        #[serde(rename = "hintsUsed")]
        hints_used: u8,
        cues: Vec<Cue>,
    },
    Notice {
        message: String,
    },
    RunFinished {
        entry: LeaderboardEntry,
        leaderboard: Vec<LeaderboardEntry>,
        #[serde(rename = "saveError", skip_serializing_if = "Option::is_none")]
        save_error: Option<String>,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    State {
        state: RunSnapshot,
    },
    Error {
        message: String,
    },
}

/// Question as shown to the player: no answer, options shuffled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
    pub hidden_treasure: bool,
}

/// Convert a parsed `Question` to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    let options = if q.presents_options() {
        shuffled(&q.options)
    } else {
        Vec::new()
    };
    QuestionOut {
        id: q.id.clone(),
        kind: q.kind,
        prompt: q.prompt.clone(),
        options,
        hidden_treasure: q.hidden_treasure,
    }
}

pub fn shuffled(items: &[String]) -> Vec<String> {
    let mut v = items.to_vec();
    v.shuffle(&mut rand::thread_rng());
    v
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResultOut {
    pub outcome: Outcome,
    pub correct: bool,
    pub points: i64,
    pub streak_bonus: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_riddle: Option<String>,
    pub elapsed_ms: u64,
    pub cues: Vec<Cue>,
}

impl From<&Resolution> for RoundResultOut {
    fn from(r: &Resolution) -> Self {
        Self {
            outcome: r.outcome,
            correct: r.outcome.is_correct(),
            points: r.points,
            streak_bonus: r.streak_bonus,
            reason: r.reason.clone(),
            next_riddle: r.next_riddle.clone(),
            elapsed_ms: r.elapsed.as_millis() as u64,
            cues: r.cues.clone(),
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct ParseIn {
    pub payload: String,
}

/// Authoring preview of a payload: the public question plus whether it can be scored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOut {
    pub question: QuestionOut,
    pub has_answer: bool,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    /// False when the leaderboard lives only in memory.
    pub persistent: bool,
}
