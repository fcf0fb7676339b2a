//! Small utility helpers used across modules.

use rand::Rng;

/// Answers match when equal after trimming, ignoring case.
pub fn answers_match(given: &str, expected: &str) -> bool {
  given.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// First character of a string, as a string (empty input gives None).
pub fn first_char(s: &str) -> Option<String> {
  s.chars().next().map(|c| c.to_string())
}

/// Short random tag for generated question ids, e.g. `Q?4821` or `TXT-90211`.
pub fn random_tag(prefix: &str, below: u32) -> String {
  let n = rand::thread_rng().gen_range(0..below.max(1));
  format!("{}{}", prefix, n)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge scan payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) { cut -= 1; }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
