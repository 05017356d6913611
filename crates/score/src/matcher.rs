use serde::{Deserialize, Serialize};

use crate::model::{CharacterSet, QuotationRecord};

/// Policy deciding whether a free-text prediction names the true speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// The character whose alias occurs earliest in the prediction is the inferred speaker.
    #[default]
    Strong,
    /// Any alias of the true speaker anywhere in the prediction counts.
    Weak,
}

impl Metric {
    pub fn matches(&self, characters: &CharacterSet, record: &QuotationRecord) -> bool {
        match self {
            Self::Strong => strong_match(characters, record),
            Self::Weak => weak_match(characters, record),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strong" => Ok(Self::Strong),
            "weak" => Ok(Self::Weak),
            other => Err(format!("unknown metric '{other}' (expected strong or weak)")),
        }
    }
}

/// Earliest alias occurrence found in a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AliasHit<'a> {
    pub character: &'a str,
    pub alias: &'a str,
    /// Byte offset of the alias's first occurrence.
    pub offset: usize,
}

/// Resolve a prediction to the character whose alias occurs first in it.
///
/// Candidates are visited in (character order, alias order). An occurrence
/// replaces the current best only at a strictly smaller offset, so on a tie the
/// candidate visited first wins.
pub fn infer_speaker<'a>(characters: &'a CharacterSet, prediction: &str) -> Option<AliasHit<'a>> {
    characters
        .iter()
        .flat_map(|c| c.aliases.iter().map(move |a| (c, a)))
        .filter(|(_, alias)| !alias.is_empty())
        .filter_map(|(c, alias)| {
            prediction.find(alias.as_str()).map(|offset| AliasHit {
                character: &c.name,
                alias,
                offset,
            })
        })
        .fold(None, |best: Option<AliasHit<'a>>, hit| match best {
            Some(b) if b.offset <= hit.offset => Some(b),
            _ => Some(hit),
        })
}

/// Strong metric: the inferred speaker must be the true speaker.
pub fn strong_match(characters: &CharacterSet, record: &QuotationRecord) -> bool {
    let (Some(truth), Some(prediction)) = (record.true_speaker.as_deref(), record.prediction()) else {
        return false;
    };
    infer_speaker(characters, prediction).is_some_and(|hit| hit.character == truth)
}

/// Weak metric: some alias of the true speaker occurs in the prediction.
pub fn weak_match(characters: &CharacterSet, record: &QuotationRecord) -> bool {
    let Some(truth) = record.true_speaker.as_deref() else {
        return false;
    };
    let Some(character) = characters.get(truth) else {
        return false;
    };
    let Some(prediction) = record.prediction() else {
        return false;
    };
    character
        .aliases
        .iter()
        .any(|alias| !alias.is_empty() && prediction.contains(alias.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Character, QuoteCategory};

    fn pride() -> CharacterSet {
        CharacterSet::new(vec![
            Character::new("Elizabeth", ["Elizabeth", "Lizzy"]),
            Character::new("Darcy", ["Darcy", "Mr. Darcy"]),
        ])
        .unwrap()
    }

    fn rec(truth: Option<&str>, prediction: Option<&str>) -> QuotationRecord {
        QuotationRecord::new(truth, QuoteCategory::Explicit, prediction)
    }

    #[test]
    fn earliest_alias_across_characters() {
        let chars = pride();
        let hit = infer_speaker(&chars, "I think Mr. Darcy and Lizzy both spoke").unwrap();
        assert_eq!(hit.character, "Darcy");
        assert_eq!(hit.alias, "Mr. Darcy");
        assert_eq!(hit.offset, 8);
    }

    #[test]
    fn strong_and_weak_disagree_on_mixed_prediction() {
        let chars = pride();
        let r = rec(Some("Elizabeth"), Some("I think Mr. Darcy and Lizzy both spoke"));
        assert!(!strong_match(&chars, &r));
        assert!(weak_match(&chars, &r));
    }

    #[test]
    fn empty_prediction_never_matches() {
        let chars = pride();
        let r = rec(Some("Darcy"), Some(""));
        assert!(!Metric::Strong.matches(&chars, &r));
        assert!(!Metric::Weak.matches(&chars, &r));
        let r = rec(Some("Darcy"), None);
        assert!(!Metric::Strong.matches(&chars, &r));
        assert!(!Metric::Weak.matches(&chars, &r));
    }

    #[test]
    fn no_alias_present_is_incorrect() {
        let chars = pride();
        assert!(infer_speaker(&chars, "Mrs. Bennet").is_none());
        assert!(!strong_match(&chars, &rec(Some("Darcy"), Some("Mrs. Bennet"))));
    }

    #[test]
    fn missing_true_speaker_never_matches() {
        let chars = pride();
        assert!(!strong_match(&chars, &rec(None, Some("Darcy"))));
        assert!(!weak_match(&chars, &rec(None, Some("Darcy"))));
    }

    #[test]
    fn unknown_true_speaker_never_matches() {
        let chars = pride();
        let r = rec(Some("Mr. Collins"), Some("Mr. Collins"));
        assert!(!strong_match(&chars, &r));
        assert!(!weak_match(&chars, &r));
    }

    #[test]
    fn tie_goes_to_first_character_in_table() {
        // "Jane" and "Jane Bennet" both start at offset 0.
        let chars = CharacterSet::new(vec![
            Character::new("Jane", ["Jane"]),
            Character::new("Jane Bennet", ["Jane Bennet"]),
        ])
        .unwrap();
        let hit = infer_speaker(&chars, "Jane Bennet").unwrap();
        assert_eq!(hit.character, "Jane");

        let swapped = CharacterSet::new(vec![
            Character::new("Jane Bennet", ["Jane Bennet"]),
            Character::new("Jane", ["Jane"]),
        ])
        .unwrap();
        let hit = infer_speaker(&swapped, "Jane Bennet").unwrap();
        assert_eq!(hit.character, "Jane Bennet");
    }

    #[test]
    fn tie_within_one_character_keeps_first_alias() {
        let chars = CharacterSet::new(vec![Character::new("Darcy", ["Mr.", "Mr. Darcy"])]).unwrap();
        let hit = infer_speaker(&chars, "Mr. Darcy").unwrap();
        assert_eq!(hit.alias, "Mr.");
    }

    #[test]
    fn first_occurrence_of_alias_is_used() {
        let chars = pride();
        // "Darcy" first occurs at 0 even though "Lizzy" precedes its second occurrence.
        let hit = infer_speaker(&chars, "Darcy told Lizzy about Darcy").unwrap();
        assert_eq!(hit.character, "Darcy");
        assert_eq!(hit.offset, 0);
    }

    #[test]
    fn matching_is_case_sensitive_substring() {
        let chars = pride();
        assert!(!weak_match(&chars, &rec(Some("Darcy"), Some("mr. darcy"))));
        // Unanchored: an alias inside a longer word still counts.
        assert!(weak_match(&chars, &rec(Some("Darcy"), Some("Darcyish"))));
    }

    #[test]
    fn metric_parse_and_display() {
        assert_eq!("weak".parse::<Metric>().unwrap(), Metric::Weak);
        assert_eq!(Metric::Strong.to_string(), "strong");
        assert!("medium".parse::<Metric>().is_err());
    }
}
