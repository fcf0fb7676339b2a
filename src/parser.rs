//! QR payload → `Question` normalization.
//!
//! Organizers print JSON payloads, but a QR may hold anything. Decoding is
//! lenient field by field; anything that is not a JSON object degrades into a
//! plain text question whose prompt is the raw payload. This never fails.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::domain::{Hints, Question, QuestionKind};
use crate::util::{random_tag, trunc_for_log};

pub const NO_PROMPT_PLACEHOLDER: &str = "[No question]";

#[instrument(level = "debug", skip(raw), fields(raw_len = raw.len()))]
pub fn parse_qr_payload(raw: &str) -> Question {
  match serde_json::from_str::<Value>(raw) {
    Ok(Value::Object(obj)) => from_object(&obj),
    Ok(_) | Err(_) => {
      debug!(target: "scan", raw = %trunc_for_log(raw, 80), "Payload is not a JSON object; using plain text question");
      plain_text_question(raw)
    }
  }
}

fn plain_text_question(raw: &str) -> Question {
  let prompt = if raw.trim().is_empty() { NO_PROMPT_PLACEHOLDER.to_string() } else { raw.to_string() };
  Question {
    id: random_tag("TXT-", 100_000),
    kind: QuestionKind::Text,
    prompt,
    options: vec![],
    answer: None,
    hints: Hints::default(),
    hidden_treasure: false,
    next_riddle: None,
  }
}

fn from_object(obj: &Map<String, Value>) -> Question {
  let kind = match obj.get("type").and_then(Value::as_str) {
    Some("mcq") => QuestionKind::Mcq,
    _ => QuestionKind::Text,
  };

  Question {
    id: text_field(obj, "id").unwrap_or_else(|| random_tag("Q?", 10_000)),
    kind,
    prompt: text_field(obj, "question").unwrap_or_else(|| NO_PROMPT_PLACEHOLDER.to_string()),
    options: text_list(obj.get("options")).unwrap_or_default(),
    answer: text_field(obj, "answer"),
    hints: obj.get("hints").and_then(Value::as_object).map(hints_from).unwrap_or_default(),
    hidden_treasure: obj.get("hiddenTreasure").map(truthy).unwrap_or(false),
    next_riddle: text_field(obj, "nextRiddle"),
  }
}

fn hints_from(obj: &Map<String, Value>) -> Hints {
  Hints {
    fifty_fifty: text_list(obj.get("fiftyFifty")).filter(|v| !v.is_empty()),
    clue: text_field(obj, "clue"),
    clue_image: text_field(obj, "clueImage"),
    first_letter: text_field(obj, "firstLetter"),
  }
}

/// Scalar field as text. Empty strings count as absent.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
  obj.get(key).and_then(scalar_text).filter(|s| !s.is_empty())
}

fn scalar_text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Arrays keep their scalar items in order; anything else is absent.
fn text_list(v: Option<&Value>) -> Option<Vec<String>> {
  v.and_then(Value::as_array)
    .map(|items| items.iter().filter_map(scalar_text).collect())
}

fn truthy(v: &Value) -> bool {
  match v {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_scans_get_the_placeholder_prompt() {
    for raw in ["", "   ", "\n\t"] {
      let q = parse_qr_payload(raw);
      assert_eq!(q.prompt, NO_PROMPT_PLACEHOLDER, "raw {:?}", raw);
      assert_eq!(q.kind, QuestionKind::Text);
      assert!(q.id.starts_with("TXT-"));
    }
    // non-blank text is kept verbatim, surrounding spaces included
    assert_eq!(parse_qr_payload("  under the bench ").prompt, "  under the bench ");
  }

  #[test]
  fn full_mcq_payload_is_normalized() {
    let raw = r#"{
      "id": "Q7", "type": "mcq", "question": "Capital of Japan?",
      "options": ["Tokyo","Osaka","Kyoto","Nagoya"], "answer": "Tokyo",
      "hints": { "clue": "Sushi…", "firstLetter": "T", "fiftyFifty": ["Tokyo","Kyoto"], "clueImage": "map.png" },
      "hiddenTreasure": true, "nextRiddle": "Find the tallest tower!"
    }"#;
    let q = parse_qr_payload(raw);
    assert_eq!(q.id, "Q7");
    assert_eq!(q.kind, QuestionKind::Mcq);
    assert_eq!(q.prompt, "Capital of Japan?");
    assert_eq!(q.options.len(), 4);
    assert_eq!(q.answer.as_deref(), Some("Tokyo"));
    assert_eq!(q.hints.fifty_fifty.as_deref(), Some(&["Tokyo".to_string(), "Kyoto".to_string()][..]));
    assert_eq!(q.hints.clue.as_deref(), Some("Sushi…"));
    assert_eq!(q.hints.clue_image.as_deref(), Some("map.png"));
    assert_eq!(q.hints.first_letter.as_deref(), Some("T"));
    assert!(q.hidden_treasure);
    assert_eq!(q.next_riddle.as_deref(), Some("Find the tallest tower!"));
  }

  #[test]
  fn missing_fields_get_defaults() {
    let q = parse_qr_payload("{}");
    assert!(q.id.starts_with("Q?"));
    assert_eq!(q.kind, QuestionKind::Text);
    assert_eq!(q.prompt, NO_PROMPT_PLACEHOLDER);
    assert!(q.options.is_empty());
    assert_eq!(q.answer, None);
    assert_eq!(q.hints, Hints::default());
    assert!(!q.hidden_treasure);
    assert_eq!(q.next_riddle, None);
  }

  #[test]
  fn unknown_type_falls_back_to_text() {
    let q = parse_qr_payload(r#"{"type":"essay","question":"Why?"}"#);
    assert_eq!(q.kind, QuestionKind::Text);
  }

  #[test]
  fn non_json_degrades_to_plain_text() {
    let raw = "Look under the third bench";
    let q = parse_qr_payload(raw);
    assert!(q.id.starts_with("TXT-"));
    assert_eq!(q.kind, QuestionKind::Text);
    assert_eq!(q.prompt, raw);
    assert_eq!(q.answer, None);
    assert_eq!(q.hints, Hints::default());
  }

  #[test]
  fn json_scalars_degrade_to_plain_text() {
    assert_eq!(parse_qr_payload("42").prompt, "42");
    assert_eq!(parse_qr_payload("null").prompt, "null");
  }

  #[test]
  fn wrong_typed_fields_do_not_poison_the_rest() {
    let q = parse_qr_payload(r#"{"question":"Q","options":"nope","hints":"nope","answer":7,"hiddenTreasure":"yes"}"#);
    assert_eq!(q.prompt, "Q");
    assert!(q.options.is_empty());
    assert_eq!(q.hints, Hints::default());
    assert_eq!(q.answer.as_deref(), Some("7"));
    assert!(q.hidden_treasure);
  }

  #[test]
  fn empty_answer_means_no_answer() {
    let q = parse_qr_payload(r#"{"question":"Q","answer":""}"#);
    assert_eq!(q.answer, None);
  }

  #[test]
  fn falsy_hidden_treasure_values() {
    for raw in [r#"{"hiddenTreasure":0}"#, r#"{"hiddenTreasure":""}"#, r#"{"hiddenTreasure":null}"#, r#"{"hiddenTreasure":false}"#] {
      assert!(!parse_qr_payload(raw).hidden_treasure, "{raw}");
    }
  }
}
