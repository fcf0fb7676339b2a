//! Run engine: the state machine behind one player's treasure hunt run.
//!
//! Phases: `Idle` → `Active` (one round, countdown running) → `Idle` again, or
//! `Finalized` once `max_questions` rounds have been resolved. Only `reset`
//! leaves `Finalized`.
//!
//! The engine is synchronous and owned by a single session. Callers pass the
//! current instant in, so elapsed time is measured from the round's start.
//! A round is taken out of the engine when it resolves; anything arriving for
//! it afterwards (a late tick, a second answer) finds no round and is rejected.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::RunRules;
use crate::domain::{Achievements, HintKind, LeaderboardEntry, Profile, Question};
use crate::hints::{HintPayload, HintRefusal, HintTracker};
use crate::leaderboard::LeaderboardStore;
use crate::scoring::{compute_score_with, earns_streak_bonus, ScoreInput};
use crate::timer::{Countdown, TickOutcome};
use crate::util::answers_match;

pub const REASON_NO_ANSWER: &str = "No answer provided";
pub const REASON_INCORRECT: &str = "Incorrect";
/// Wrong pick on a multiple-choice question.
pub const REASON_TRY_AGAIN: &str = "Try again";
pub const REASON_TIME_UP: &str = "Time up";
pub const REASON_SKIPPED: &str = "Skipped";

/// Player-facing refusal of an action that does not fit the current state.
/// The engine is untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
  #[error("No active question. Scan a QR first")]
  NoActiveRound,
  #[error("Finish the current question first")]
  RoundInProgress,
  #[error("Run finished. Reset the run to play again")]
  RunFinished,
  #[error("Nothing to retry yet")]
  NothingToRetry,
  #[error("Type something first")]
  EmptyAnswer,
  #[error("Tick for a round that is no longer running")]
  StaleTick,
  #[error(transparent)]
  Hint(#[from] HintRefusal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Idle,
  Active,
  Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Correct,
  Incorrect,
  Skipped,
  TimedOut,
}

impl Outcome {
  pub fn is_correct(self) -> bool {
    self == Outcome::Correct
  }
}

/// Feedback cues for the client's audio layer. Fire-and-forget.
/// Countdown ticks carry no cue; the client paces its own tick sound off `tick` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
  Scan,
  Correct,
  Incorrect,
  Streak,
  Hint,
}

/// Session aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
  pub id: Uuid,
  pub score: i64,
  pub question_count: u32,
  pub max_questions: u32,
  pub streak: u32,
  pub best_streak: u32,
  /// Applies to the next round that starts.
  pub retry_mode: bool,
  pub achievements: Achievements,
}

impl Run {
  fn fresh(max_questions: u32) -> Self {
    Self {
      id: Uuid::new_v4(),
      score: 0,
      question_count: 0,
      max_questions,
      streak: 0,
      best_streak: 0,
      retry_mode: false,
      achievements: Achievements::default(),
    }
  }
}

#[derive(Debug)]
struct Round {
  id: u64,
  question: Question,
  started_at: Instant,
  countdown: Countdown,
  hints: HintTracker,
  retry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStart {
  pub round_id: u64,
  pub question: Question,
  pub time_left: u32,
  pub retry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintGrant {
  pub payload: HintPayload,
  pub hints_used: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
  pub entry: LeaderboardEntry,
  pub leaderboard: Vec<LeaderboardEntry>,
  pub save_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
  pub round_id: u64,
  pub outcome: Outcome,
  /// Round points: scored points, or the negative skip penalty.
  pub points: i64,
  pub streak_bonus: i64,
  pub reason: Option<String>,
  pub elapsed: Duration,
  pub next_riddle: Option<String>,
  pub cues: Vec<Cue>,
  pub finalized: Option<Finalized>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickResult {
  Running { time_left: u32 },
  Resolved(Resolution),
}

/// What a renderer needs to draw the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
  pub run_id: Uuid,
  pub phase: Phase,
  pub score: i64,
  pub question_count: u32,
  pub max_questions: u32,
  pub streak: u32,
  pub best_streak: u32,
  pub retry_mode: bool,
  pub achievements: Achievements,
  pub round_id: Option<u64>,
  pub time_left: u32,
  pub hints_used: u8,
  pub used_hint_kinds: Vec<HintKind>,
}

pub struct RunEngine {
  rules: RunRules,
  profile: Profile,
  leaderboard: Arc<LeaderboardStore>,
  run: Run,
  phase: Phase,
  round: Option<Round>,
  last_question: Option<Question>,
  next_round_id: u64,
}

impl RunEngine {
  pub fn new(rules: RunRules, profile: Profile, leaderboard: Arc<LeaderboardStore>) -> Self {
    let run = Run::fresh(rules.max_questions);
    Self {
      rules,
      profile,
      leaderboard,
      run,
      phase: Phase::Idle,
      round: None,
      last_question: None,
      next_round_id: 1,
    }
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn run(&self) -> &Run {
    &self.run
  }

  pub fn rules(&self) -> &RunRules {
    &self.rules
  }

  pub fn profile(&self) -> &Profile {
    &self.profile
  }

  pub fn active_round_id(&self) -> Option<u64> {
    self.round.as_ref().map(|r| r.id)
  }

  pub fn snapshot(&self) -> RunSnapshot {
    let round = self.round.as_ref();
    RunSnapshot {
      run_id: self.run.id,
      phase: self.phase,
      score: self.run.score,
      question_count: self.run.question_count,
      max_questions: self.run.max_questions,
      streak: self.run.streak,
      best_streak: self.run.best_streak,
      retry_mode: self.run.retry_mode,
      achievements: self.run.achievements,
      round_id: round.map(|r| r.id),
      time_left: round.map(|r| r.countdown.remaining()).unwrap_or(0),
      hints_used: round.map(|r| r.hints.used()).unwrap_or(0),
      used_hint_kinds: round
        .map(|r| HintKind::ALL.into_iter().filter(|k| r.hints.is_used(*k)).collect())
        .unwrap_or_default(),
    }
  }

  /// Begin a round on a freshly scanned question. Retry mode carries over.
  #[instrument(level = "info", skip(self, question, now), fields(run = %self.run.id, question = %question.id))]
  pub fn start_round(&mut self, question: Question, now: Instant) -> Result<RoundStart, Rejected> {
    self.ensure_idle()?;
    Ok(self.open_round(question, now))
  }

  /// Another attempt at the last question, in retry mode. Does not advance the count.
  #[instrument(level = "info", skip(self, now), fields(run = %self.run.id))]
  pub fn retry(&mut self, now: Instant) -> Result<RoundStart, Rejected> {
    self.ensure_idle()?;
    let question = self.last_question.take().ok_or(Rejected::NothingToRetry)?;
    self.run.retry_mode = true;
    Ok(self.open_round(question, now))
  }

  #[instrument(level = "debug", skip(self), fields(run = %self.run.id))]
  pub fn use_hint(&mut self, kind: HintKind) -> Result<HintGrant, Rejected> {
    self.ensure_not_finished()?;
    let round = self.round.as_mut().ok_or(Rejected::NoActiveRound)?;
    let payload = round.hints.use_hint(kind, &round.question)?;
    debug!(target: "run", round = round.id, ?kind, used = round.hints.used(), "Hint used");
    Ok(HintGrant { payload, hints_used: round.hints.used() })
  }

  /// Check a submitted answer (typed text or picked option) and resolve the round.
  #[instrument(level = "info", skip(self, answer, now), fields(run = %self.run.id, answer_len = answer.len()))]
  pub fn submit_answer(&mut self, answer: &str, now: Instant) -> Result<Resolution, Rejected> {
    self.ensure_not_finished()?;
    let round = self.round.as_ref().ok_or(Rejected::NoActiveRound)?;
    let given = answer.trim();
    if given.is_empty() {
      return Err(Rejected::EmptyAnswer);
    }
    let (correct, reason) = match round.question.answer.as_deref() {
      None => (false, Some(REASON_NO_ANSWER)),
      Some(expected) if answers_match(given, expected) => (true, None),
      Some(_) if round.question.presents_options() => (false, Some(REASON_TRY_AGAIN)),
      Some(_) => (false, Some(REASON_INCORRECT)),
    };
    let elapsed = now.saturating_duration_since(round.started_at);
    self.resolve(correct, reason.map(str::to_string), elapsed)
  }

  /// Resolve the active round as correct or incorrect after `elapsed`.
  pub fn resolve(&mut self, correct: bool, reason: Option<String>, elapsed: Duration) -> Result<Resolution, Rejected> {
    let outcome = if correct { Outcome::Correct } else { Outcome::Incorrect };
    self.resolve_as(outcome, reason, elapsed)
  }

  /// Give up on the active round for a flat penalty. Retry mode is left as is.
  #[instrument(level = "info", skip(self, now), fields(run = %self.run.id))]
  pub fn skip(&mut self, now: Instant) -> Result<Resolution, Rejected> {
    self.ensure_not_finished()?;
    let round = self.round.take().ok_or(Rejected::NoActiveRound)?;
    let elapsed = now.saturating_duration_since(round.started_at);

    let points = -self.rules.skip_penalty;
    self.run.score += points;
    self.run.streak = 0;
    self.run.question_count += 1;
    info!(target: "run", round = round.id, points, score = self.run.score, count = self.run.question_count, "Round skipped");

    Ok(self.close_round(round, Outcome::Skipped, points, 0, Some(REASON_SKIPPED.into()), elapsed, vec![Cue::Incorrect]))
  }

  /// One countdown second for `round_id`. The round times out on the last one.
  pub fn tick(&mut self, round_id: u64, now: Instant) -> Result<TickResult, Rejected> {
    let round = match self.round.as_mut() {
      Some(r) if r.id == round_id => r,
      _ => return Err(Rejected::StaleTick),
    };
    match round.countdown.tick() {
      TickOutcome::Running(time_left) => Ok(TickResult::Running { time_left }),
      TickOutcome::Expired => {
        let elapsed = now.saturating_duration_since(round.started_at);
        info!(target: "run", round = round_id, "Round timed out");
        self
          .resolve_as(Outcome::TimedOut, Some(REASON_TIME_UP.into()), elapsed)
          .map(TickResult::Resolved)
      }
      TickOutcome::Stopped => Err(Rejected::StaleTick),
    }
  }

  /// Throw the run away and start a pristine one. Valid in any phase.
  #[instrument(level = "info", skip(self), fields(run = %self.run.id))]
  pub fn reset(&mut self) -> RunSnapshot {
    self.run = Run::fresh(self.rules.max_questions);
    self.phase = Phase::Idle;
    self.round = None;
    self.last_question = None;
    info!(target: "run", new_run = %self.run.id, "Run reset");
    self.snapshot()
  }

  fn ensure_not_finished(&self) -> Result<(), Rejected> {
    if self.phase == Phase::Finalized {
      return Err(Rejected::RunFinished);
    }
    Ok(())
  }

  fn ensure_idle(&self) -> Result<(), Rejected> {
    match self.phase {
      Phase::Idle => Ok(()),
      Phase::Active => Err(Rejected::RoundInProgress),
      Phase::Finalized => Err(Rejected::RunFinished),
    }
  }

  fn open_round(&mut self, question: Question, now: Instant) -> RoundStart {
    let id = self.next_round_id;
    self.next_round_id += 1;
    let retry = self.run.retry_mode;
    let countdown = Countdown::new(self.rules.round_secs);
    let time_left = countdown.remaining();

    info!(target: "run", round = id, question = %question.id, retry, hidden_treasure = question.hidden_treasure, "Round started");
    let start = RoundStart { round_id: id, question: question.clone(), time_left, retry };
    self.round = Some(Round {
      id,
      question,
      started_at: now,
      countdown,
      hints: HintTracker::new(self.rules.max_hints),
      retry,
    });
    self.phase = Phase::Active;
    start
  }

  fn resolve_as(&mut self, outcome: Outcome, reason: Option<String>, elapsed: Duration) -> Result<Resolution, Rejected> {
    self.ensure_not_finished()?;
    let round = self.round.take().ok_or(Rejected::NoActiveRound)?;
    let correct = outcome.is_correct();
    let used_hints = round.hints.used();

    let points = i64::from(compute_score_with(
      ScoreInput {
        correct,
        used_hints,
        retry_mode: round.retry,
        hidden_treasure: round.question.hidden_treasure,
        elapsed,
      },
      self.rules.fast_threshold(),
    ));

    let mut cues = Vec::with_capacity(2);
    let mut streak_bonus = 0;
    if correct {
      self.run.streak += 1;
      self.run.best_streak = self.run.best_streak.max(self.run.streak);
      if earns_streak_bonus(self.run.streak, self.rules.streak_every) {
        streak_bonus = self.rules.streak_bonus;
        cues.push(Cue::Streak);
      }
      cues.push(Cue::Correct);
    } else {
      self.run.streak = 0;
      cues.push(Cue::Incorrect);
    }

    self.run.score += points + streak_bonus;
    if correct && elapsed <= self.rules.fast_threshold() {
      self.run.achievements.fast_solver = true;
    }
    if correct && used_hints == 0 {
      self.run.achievements.no_hint_master = true;
    }
    self.run.retry_mode = !correct;
    self.run.question_count += 1;

    info!(
      target: "run",
      round = round.id, ?outcome, points, streak_bonus, used_hints,
      elapsed_ms = elapsed.as_millis() as u64,
      score = self.run.score, streak = self.run.streak, count = self.run.question_count,
      "Round resolved"
    );
    Ok(self.close_round(round, outcome, points, streak_bonus, reason, elapsed, cues))
  }

  #[allow(clippy::too_many_arguments)]
  fn close_round(
    &mut self,
    round: Round,
    outcome: Outcome,
    points: i64,
    streak_bonus: i64,
    reason: Option<String>,
    elapsed: Duration,
    cues: Vec<Cue>,
  ) -> Resolution {
    let next_riddle = round.question.next_riddle.clone();
    self.last_question = Some(round.question);
    self.phase = Phase::Idle;

    let finalized = if self.run.question_count >= self.run.max_questions {
      Some(self.finalize())
    } else {
      None
    };

    Resolution {
      round_id: round.id,
      outcome,
      points,
      streak_bonus,
      reason,
      elapsed,
      next_riddle,
      cues,
      finalized,
    }
  }

  /// Record the run on the leaderboard. The run stays as it is until `reset`.
  fn finalize(&mut self) -> Finalized {
    self.phase = Phase::Finalized;
    self.last_question = None;

    let leaderboard = Arc::clone(&self.leaderboard);
    let profile = self.profile.clone();
    let run = &mut self.run;
    let (entry, saved) = leaderboard.record(|existing| {
      let top = existing.iter().map(|e| e.score).max();
      run.achievements.treasure_king = top.map_or(true, |top| run.score >= top);
      LeaderboardEntry {
        name: profile.name,
        avatar: profile.avatar,
        score: run.score,
        best_streak: run.best_streak,
        achievements: run.achievements,
        when: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
      }
    });

    match saved {
      Ok(board) => {
        info!(target: "run", run = %self.run.id, score = entry.score, treasure_king = entry.achievements.treasure_king, "Run finalized");
        Finalized { entry, leaderboard: board, save_error: None }
      }
      Err(e) => {
        warn!(target: "run", run = %self.run.id, error = %e, "Run finalized but leaderboard was not saved");
        Finalized { entry, leaderboard: self.leaderboard.load(), save_error: Some(e.to_string()) }
      }
    }
  }
}
