//! Per-round hint bookkeeping: at most `limit` hints, each kind at most once.
//!
//! A granted hint is counted even when the question has nothing to offer for
//! that kind; the payload then reports it as unavailable.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{HintKind, Question, QuestionKind};
use crate::util::first_char;

pub const DEFAULT_CLUE: &str = "Think carefully…";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HintRefusal {
    #[error("Max {limit} hints reached")]
    LimitReached { limit: u8 },
    #[error("Hint already used")]
    AlreadyUsed(HintKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "hint", rename_all = "snake_case")]
pub enum HintPayload {
    FiftyFifty { options: Vec<String> },
    Clue { text: String, image: Option<String> },
    FirstLetter { letter: String },
    Unavailable { kind: HintKind },
}

impl HintPayload {
    /// Short line suitable for a toast.
    pub fn describe(&self) -> String {
        match self {
            HintPayload::FiftyFifty { options } => format!("50:50 → {}", options.join(" / ")),
            HintPayload::Clue { text, .. } => format!("Clue: {}", text),
            HintPayload::FirstLetter { letter } => format!("First letter: {}", letter),
            HintPayload::Unavailable { kind } => format!("{} not available for this question", kind.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintTracker {
    limit: u8,
    used: u8,
    used_kinds: [bool; 3],
}

impl HintTracker {
    pub fn new(limit: u8) -> Self {
        Self { limit, used: 0, used_kinds: [false; 3] }
    }

    pub fn used(&self) -> u8 {
        self.used
    }

    pub fn is_used(&self, kind: HintKind) -> bool {
        self.used_kinds[kind.index()]
    }

    /// Consume a hint of `kind` for `question`.
    pub fn use_hint(&mut self, kind: HintKind, question: &Question) -> Result<HintPayload, HintRefusal> {
        if self.used >= self.limit {
            return Err(HintRefusal::LimitReached { limit: self.limit });
        }
        if self.is_used(kind) {
            return Err(HintRefusal::AlreadyUsed(kind));
        }
        self.used += 1;
        self.used_kinds[kind.index()] = true;
        Ok(payload_for(kind, question))
    }
}

fn payload_for(kind: HintKind, q: &Question) -> HintPayload {
    match kind {
        HintKind::Fifty => match (&q.hints.fifty_fifty, q.kind) {
            (Some(reduced), QuestionKind::Mcq) => HintPayload::FiftyFifty { options: reduced.clone() },
            _ => HintPayload::Unavailable { kind },
        },
        HintKind::Clue => HintPayload::Clue {
            text: q.hints.clue.clone().unwrap_or_else(|| DEFAULT_CLUE.to_string()),
            image: q.hints.clue_image.clone(),
        },
        HintKind::First => {
            let letter = q
                .hints
                .first_letter
                .clone()
                .or_else(|| q.answer.as_deref().and_then(first_char));
            match letter {
                Some(letter) => HintPayload::FirstLetter { letter },
                None => HintPayload::Unavailable { kind },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_qr_payload;

    fn mcq() -> Question {
        parse_qr_payload(
            r#"{"type":"mcq","question":"Capital of Japan?","options":["Tokyo","Osaka","Kyoto"],"answer":"Tokyo",
                "hints":{"fiftyFifty":["Tokyo","Kyoto"],"clue":"Sushi","clueImage":"sushi.png"}}"#,
        )
    }

    #[test]
    fn clue_twice_reports_already_used() {
        let q = mcq();
        let mut t = HintTracker::new(3);
        assert!(t.use_hint(HintKind::Clue, &q).is_ok());
        assert_eq!(t.use_hint(HintKind::Clue, &q), Err(HintRefusal::AlreadyUsed(HintKind::Clue)));
        assert_eq!(t.used(), 1);
    }

    #[test]
    fn all_three_kinds_then_limit() {
        let q = mcq();
        let mut t = HintTracker::new(3);
        for kind in HintKind::ALL {
            t.use_hint(kind, &q).unwrap();
        }
        assert_eq!(t.used(), 3);
        assert_eq!(t.use_hint(HintKind::Clue, &q), Err(HintRefusal::LimitReached { limit: 3 }));
    }

    #[test]
    fn lower_limit_is_checked_before_kind() {
        let q = mcq();
        let mut t = HintTracker::new(1);
        t.use_hint(HintKind::Clue, &q).unwrap();
        assert_eq!(t.use_hint(HintKind::First, &q), Err(HintRefusal::LimitReached { limit: 1 }));
        assert_eq!(t.use_hint(HintKind::Clue, &q), Err(HintRefusal::LimitReached { limit: 1 }));
    }

    #[test]
    fn fifty_fifty_needs_mcq_and_reduced_set() {
        let mut t = HintTracker::new(3);
        assert_eq!(
            t.use_hint(HintKind::Fifty, &mcq()).unwrap(),
            HintPayload::FiftyFifty { options: vec!["Tokyo".into(), "Kyoto".into()] }
        );

        let text_q = parse_qr_payload(r#"{"question":"Q","hints":{"fiftyFifty":["a","b"]}}"#);
        let mut t = HintTracker::new(3);
        assert_eq!(t.use_hint(HintKind::Fifty, &text_q).unwrap(), HintPayload::Unavailable { kind: HintKind::Fifty });
        // still counted
        assert_eq!(t.used(), 1);
        assert!(t.is_used(HintKind::Fifty));
    }

    #[test]
    fn clue_falls_back_to_generic_text() {
        let q = parse_qr_payload(r#"{"question":"Q"}"#);
        let mut t = HintTracker::new(3);
        assert_eq!(
            t.use_hint(HintKind::Clue, &q).unwrap(),
            HintPayload::Clue { text: DEFAULT_CLUE.into(), image: None }
        );
        let mut t = HintTracker::new(3);
        assert_eq!(
            t.use_hint(HintKind::Clue, &mcq()).unwrap(),
            HintPayload::Clue { text: "Sushi".into(), image: Some("sushi.png".into()) }
        );
    }

    #[test]
    fn first_letter_override_then_answer_then_unavailable() {
        let with_override = parse_qr_payload(r#"{"answer":"Tokyo","hints":{"firstLetter":"X"}}"#);
        let from_answer = parse_qr_payload(r#"{"answer":"tokyo"}"#);
        let nothing = parse_qr_payload(r#"{"question":"Q"}"#);

        assert_eq!(
            HintTracker::new(3).use_hint(HintKind::First, &with_override).unwrap(),
            HintPayload::FirstLetter { letter: "X".into() }
        );
        assert_eq!(
            HintTracker::new(3).use_hint(HintKind::First, &from_answer).unwrap(),
            HintPayload::FirstLetter { letter: "t".into() }
        );
        assert_eq!(
            HintTracker::new(3).use_hint(HintKind::First, &nothing).unwrap(),
            HintPayload::Unavailable { kind: HintKind::First }
        );
    }
}
