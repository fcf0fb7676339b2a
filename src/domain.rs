//! Domain models used by the backend: questions, hints, achievements and leaderboard entries.

use serde::{Deserialize, Serialize};

/// How is the question answered?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  /// Player picks one of `options`.
  Mcq,
  /// Player types a free answer.
  Text,
}
impl Default for QuestionKind {
  fn default() -> Self { QuestionKind::Text }
}

/// Optional helpers an organizer can embed in a QR payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hints {
  #[serde(default)] pub fifty_fifty: Option<Vec<String>>,
  #[serde(default)] pub clue: Option<String>,
  #[serde(default)] pub clue_image: Option<String>,
  #[serde(default)] pub first_letter: Option<String>,
}

/// A normalized question. Immutable once parsed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: QuestionKind,
  pub prompt: String,
  pub options: Vec<String>,
  pub answer: Option<String>,
  pub hints: Hints,
  pub hidden_treasure: bool,
  pub next_riddle: Option<String>,
}

impl Question {
  /// Options are only meaningful for mcq questions that actually carry some.
  pub fn presents_options(&self) -> bool {
    self.kind == QuestionKind::Mcq && !self.options.is_empty()
  }
}

/// The three hint kinds; each may be used once per round.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
  Fifty,
  Clue,
  First,
}

impl HintKind {
  pub const ALL: [HintKind; 3] = [HintKind::Fifty, HintKind::Clue, HintKind::First];

  pub fn index(self) -> usize {
    match self {
      HintKind::Fifty => 0,
      HintKind::Clue => 1,
      HintKind::First => 2,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      HintKind::Fifty => "50:50",
      HintKind::Clue => "Clue",
      HintKind::First => "First letter",
    }
  }
}

/// Achievement flags earned during a run. Once set they stay set until reset.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Achievements {
  #[serde(default)] pub fast_solver: bool,
  #[serde(default)] pub no_hint_master: bool,
  #[serde(default)] pub treasure_king: bool,
}

/// Player identity stamped onto leaderboard entries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
  pub name: String,
  pub avatar: String,
}

/// One finished run as persisted in the leaderboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  pub name: String,
  pub avatar: String,
  pub score: i64,
  #[serde(default)] pub best_streak: u32,
  #[serde(default)] pub achievements: Achievements,
  pub when: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn leaderboard_entry_uses_persisted_field_names() {
    let entry = LeaderboardEntry {
      name: "Ana".into(),
      avatar: "🧭".into(),
      score: 17,
      best_streak: 4,
      achievements: Achievements { fast_solver: true, no_hint_master: false, treasure_king: true },
      when: "2026-10-16 10:00:00".into(),
    };
    let v = serde_json::to_value(&entry).unwrap();
    assert_eq!(v["bestStreak"], 4);
    assert_eq!(v["achievements"]["fastSolver"], true);
    assert_eq!(v["achievements"]["noHintMaster"], false);
    assert_eq!(v["achievements"]["treasureKing"], true);
    assert_eq!(v["when"], "2026-10-16 10:00:00");
  }

  #[test]
  fn older_entries_without_streak_or_achievements_still_load() {
    let raw = r#"{"name":"Old","avatar":"🦜","score":3,"when":"yesterday"}"#;
    let entry: LeaderboardEntry = serde_json::from_str(raw).unwrap();
    assert_eq!(entry.best_streak, 0);
    assert_eq!(entry.achievements, Achievements::default());
  }

  #[test]
  fn hint_kind_indices_are_distinct() {
    let idx: Vec<usize> = HintKind::ALL.iter().map(|k| k.index()).collect();
    assert_eq!(idx, vec![0, 1, 2]);
  }
}
