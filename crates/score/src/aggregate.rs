use crate::matcher::Metric;
use crate::model::{CharacterSet, QuotationRecord, ScoreTally};

/// Score every record with `metric` and count results overall and per category.
pub fn score(characters: &CharacterSet, records: &[QuotationRecord], metric: Metric) -> ScoreTally {
    let mut tally = ScoreTally::default();

    for record in records {
        let correct = metric.matches(characters, record);
        tally.overall.record(correct);
        tally.bucket_mut(record.category).record(correct);
        if record.true_speaker.is_none() {
            tally.unattributed += 1;
        }
    }

    log::debug!(
        "{metric} metric: {}/{} correct over {} record(s)",
        tally.overall.correct,
        tally.overall.count,
        records.len()
    );

    tally
}
