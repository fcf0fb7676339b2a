//! Built-in demo payloads so the hunt can be tried without printed QR codes.
//! They are raw payload text and go through the same parser as real scans.

use rand::seq::SliceRandom;

pub fn demo_payloads() -> Vec<&'static str> {
  vec![
    r#"{"id":"DEMO-1","type":"mcq","question":"Capital of Japan?",
        "options":["Tokyo","Osaka","Kyoto","Nagoya"],"answer":"Tokyo",
        "hints":{"clue":"Sushi…","firstLetter":"T","fiftyFifty":["Tokyo","Kyoto"]},
        "hiddenTreasure":true,"nextRiddle":"Find the tallest tower!"}"#,
    r#"{"id":"DEMO-2","type":"text","question":"What has keys but can't open locks?",
        "answer":"piano","hints":{"clue":"It makes music."},
        "nextRiddle":"Look where the music plays."}"#,
    r#"{"id":"DEMO-3","type":"mcq","question":"How many legs does a spider have?",
        "options":["6","8","10","12"],"answer":"8",
        "hints":{"fiftyFifty":["8","12"]}}"#,
    "Walk to the old fountain and count the coins.",
  ]
}

/// A random demo payload.
pub fn random_demo_payload() -> &'static str {
  let payloads = demo_payloads();
  payloads
    .choose(&mut rand::thread_rng())
    .copied()
    .unwrap_or(r#"{"question":"[demo]"}"#)
}
