// Property-based tests for speaker inference and the two metrics.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use quoteval_score::matcher::{infer_speaker, strong_match, weak_match};
use quoteval_score::model::{Character, CharacterSet, QuotationRecord, QuoteCategory};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Short lowercase alias; small alphabet so collisions and substrings are common.
fn arb_alias() -> impl Strategy<Value = String> {
    "[abc]{1,3}"
}

/// 1..5 characters named c0..cN, each with 1..3 aliases.
fn arb_characters() -> impl Strategy<Value = Vec<Character>> {
    prop::collection::vec(prop::collection::vec(arb_alias(), 1..4), 1..6).prop_map(|alias_lists| {
        alias_lists
            .into_iter()
            .enumerate()
            .map(|(i, aliases)| Character::new(format!("c{i}"), aliases))
            .collect()
    })
}

fn arb_prediction() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[abc ]{0,12}",
        1 => Just(String::new()),
    ]
}

fn record(truth: &str, prediction: &str) -> QuotationRecord {
    QuotationRecord::new(Some(truth), QuoteCategory::Explicit, Some(prediction))
}

/// Earliest offset of any alias of `c` in `prediction`.
fn earliest(c: &Character, prediction: &str) -> Option<usize> {
    c.aliases.iter().filter_map(|a| prediction.find(a.as_str())).min()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// The inferred speaker has an alias at the minimum offset over all aliases.
    #[test]
    fn inferred_speaker_is_earliest(chars in arb_characters(), prediction in arb_prediction()) {
        let set = CharacterSet::new(chars.clone()).unwrap();
        let best = chars.iter().filter_map(|c| earliest(c, &prediction)).min();

        match infer_speaker(&set, &prediction) {
            None => prop_assert_eq!(best, None),
            Some(hit) => {
                prop_assert_eq!(Some(hit.offset), best);
                prop_assert_eq!(&prediction[hit.offset..hit.offset + hit.alias.len()], hit.alias);
                // First character in table order reaching that offset wins.
                let first = chars
                    .iter()
                    .find(|c| earliest(c, &prediction) == best)
                    .unwrap();
                prop_assert_eq!(hit.character, first.name.as_str());
            }
        }
    }

    /// Strong implies weak.
    #[test]
    fn strong_implies_weak(chars in arb_characters(), prediction in arb_prediction(), pick in 0usize..6) {
        let truth = chars[pick % chars.len()].name.clone();
        let set = CharacterSet::new(chars).unwrap();
        let rec = record(&truth, &prediction);
        if strong_match(&set, &rec) {
            prop_assert!(weak_match(&set, &rec));
        }
    }

    /// Appending text never breaks a weak match.
    #[test]
    fn weak_is_monotone_under_append(
        chars in arb_characters(),
        prediction in arb_prediction(),
        suffix in "[abc ]{0,6}",
        pick in 0usize..6,
    ) {
        let truth = chars[pick % chars.len()].name.clone();
        let set = CharacterSet::new(chars).unwrap();
        if weak_match(&set, &record(&truth, &prediction)) {
            let longer = format!("{prediction}{suffix}");
            prop_assert!(weak_match(&set, &record(&truth, &longer)));
        }
    }

    /// Missing or empty predictions never match.
    #[test]
    fn empty_prediction_never_matches(chars in arb_characters(), pick in 0usize..6) {
        let truth = chars[pick % chars.len()].name.clone();
        let set = CharacterSet::new(chars).unwrap();
        let missing = QuotationRecord::new(Some(truth.as_str()), QuoteCategory::Implicit, None);
        let empty = record(&truth, "");
        prop_assert!(!strong_match(&set, &missing));
        prop_assert!(!weak_match(&set, &missing));
        prop_assert!(!strong_match(&set, &empty));
        prop_assert!(!weak_match(&set, &empty));
    }

    /// Inference is a pure function of its inputs.
    #[test]
    fn inference_is_deterministic(chars in arb_characters(), prediction in arb_prediction()) {
        let set = CharacterSet::new(chars).unwrap();
        prop_assert_eq!(infer_speaker(&set, &prediction), infer_speaker(&set, &prediction));
    }
}
