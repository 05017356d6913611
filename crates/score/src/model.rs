use std::collections::HashMap;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ScoreError;

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// A character of one novel and the surface forms that refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    pub name: String,
    /// Order matters: the strong metric scans aliases in this order.
    pub aliases: Vec<String>,
}

impl Character {
    pub fn new(name: impl Into<String>, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }
}

/// Alias table for one novel. Keeps table order and indexes by canonical name.
#[derive(Debug, Clone, Default)]
pub struct CharacterSet {
    characters: Vec<Character>,
    by_name: HashMap<String, usize>,
}

impl CharacterSet {
    /// Build a set, rejecting duplicate canonical names.
    pub fn new(characters: Vec<Character>) -> Result<Self, ScoreError> {
        let mut by_name = HashMap::with_capacity(characters.len());
        for (i, c) in characters.iter().enumerate() {
            if by_name.insert(c.name.clone(), i).is_some() {
                return Err(ScoreError::DuplicateCharacter(c.name.clone()));
            }
        }
        Ok(Self { characters, by_name })
    }

    pub fn get(&self, name: &str) -> Option<&Character> {
        self.by_name.get(name).map(|&i| &self.characters[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Character> {
        self.characters.iter()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

impl<'a> IntoIterator for &'a CharacterSet {
    type Item = &'a Character;
    type IntoIter = std::slice::Iter<'a, Character>;

    fn into_iter(self) -> Self::IntoIter {
        self.characters.iter()
    }
}

// ---------------------------------------------------------------------------
// Quotations
// ---------------------------------------------------------------------------

/// How the true speaker of a quotation is signaled in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuoteCategory {
    Explicit,
    Anaphoric,
    Implicit,
}

impl QuoteCategory {
    pub const ALL: [QuoteCategory; 3] = [Self::Explicit, Self::Anaphoric, Self::Implicit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "Explicit",
            Self::Anaphoric => "Anaphoric",
            Self::Implicit => "Implicit",
        }
    }
}

impl fmt::Display for QuoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteCategory {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Explicit" => Ok(Self::Explicit),
            "Anaphoric" => Ok(Self::Anaphoric),
            "Implicit" => Ok(Self::Implicit),
            other => Err(ScoreError::UnknownCategory(other.to_string())),
        }
    }
}

/// Ground truth for one quotation joined with a model's prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationRecord {
    /// `None` for rows with no attributed speaker.
    pub true_speaker: Option<String>,
    pub category: QuoteCategory,
    /// `None` when the model produced nothing. An empty string is treated the same way.
    pub predicted_speaker: Option<String>,
}

impl QuotationRecord {
    pub fn new(
        true_speaker: Option<&str>,
        category: QuoteCategory,
        predicted_speaker: Option<&str>,
    ) -> Self {
        Self {
            true_speaker: true_speaker.map(str::to_string),
            category,
            predicted_speaker: predicted_speaker.map(str::to_string),
        }
    }

    /// The prediction, if present and non-empty.
    pub fn prediction(&self) -> Option<&str> {
        self.predicted_speaker.as_deref().filter(|p| !p.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tallies
// ---------------------------------------------------------------------------

/// Exact `(correct, count)` pair. Percentages are derived on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub correct: usize,
    pub count: usize,
}

impl Bucket {
    pub fn new(correct: usize, count: usize) -> Self {
        Self { correct, count }
    }

    pub fn record(&mut self, correct: bool) {
        self.count += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Accuracy in percent, or `None` for an empty bucket.
    pub fn accuracy(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.correct as f64 / self.count as f64 * 100.0)
        }
    }
}

impl AddAssign for Bucket {
    fn add_assign(&mut self, rhs: Self) {
        self.correct += rhs.correct;
        self.count += rhs.count;
    }
}

/// Overall and per-category counts for one run (or a pool of runs).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTally {
    pub overall: Bucket,
    pub explicit: Bucket,
    pub anaphoric: Bucket,
    pub implicit: Bucket,
    /// Rows counted in `overall` that had no true speaker.
    pub unattributed: usize,
}

impl ScoreTally {
    pub fn bucket(&self, category: QuoteCategory) -> &Bucket {
        match category {
            QuoteCategory::Explicit => &self.explicit,
            QuoteCategory::Anaphoric => &self.anaphoric,
            QuoteCategory::Implicit => &self.implicit,
        }
    }

    pub fn bucket_mut(&mut self, category: QuoteCategory) -> &mut Bucket {
        match category {
            QuoteCategory::Explicit => &mut self.explicit,
            QuoteCategory::Anaphoric => &mut self.anaphoric,
            QuoteCategory::Implicit => &mut self.implicit,
        }
    }

    pub fn total(&self) -> usize {
        self.overall.count
    }

    pub fn correct(&self) -> usize {
        self.overall.correct
    }
}

impl AddAssign for ScoreTally {
    fn add_assign(&mut self, rhs: Self) {
        self.overall += rhs.overall;
        self.explicit += rhs.explicit;
        self.anaphoric += rhs.anaphoric;
        self.implicit += rhs.implicit;
        self.unattributed += rhs.unattributed;
    }
}

impl<'a> std::iter::Sum<&'a ScoreTally> for ScoreTally {
    fn sum<I: Iterator<Item = &'a ScoreTally>>(iter: I) -> Self {
        let mut total = ScoreTally::default();
        for t in iter {
            total += *t;
        }
        total
    }
}
