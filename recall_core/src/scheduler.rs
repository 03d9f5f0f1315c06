//! Due-card selection.
//!
//! A card is due when it has never been studied, or when at least
//! [`DUE_INTERVAL_DAYS`] calendar days have passed since it was last studied.
//! The outcome of earlier reviews does not change the interval.

use crate::{Card, ResultRecord};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Days that must pass after a review before the card is due again
pub const DUE_INTERVAL_DAYS: i64 = 3;

/// Most recent study date for `card`, or `None` if it was never studied
pub fn last_studied(card: &Card, log: &[ResultRecord]) -> Option<NaiveDate> {
    log.iter()
        .filter(|r| r.is_for(card))
        .map(|r| r.studied_on)
        .max()
}

/// Whether a card last studied on `last` is due on `today`
pub fn is_due(last: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last {
        None => true,
        Some(last) => (today - last).num_days() >= DUE_INTERVAL_DAYS,
    }
}

/// Select the cards due on `today`, keeping the order of `cards`
pub fn compute_due(cards: &[Card], log: &[ResultRecord], today: NaiveDate) -> Vec<Card> {
    // Index the log once instead of scanning it per card
    let mut latest: HashMap<(&str, &str), NaiveDate> = HashMap::new();
    for record in log {
        let key = (record.front.as_str(), record.back.as_str());
        latest
            .entry(key)
            .and_modify(|d| *d = (*d).max(record.studied_on))
            .or_insert(record.studied_on);
    }

    let mut seen = HashSet::new();
    let due: Vec<Card> = cards
        .iter()
        .filter(|card| {
            if !seen.insert((card.front.as_str(), card.back.as_str())) {
                tracing::warn!("Duplicate card in card set: {:?}", card.front);
            }
            let last = latest
                .get(&(card.front.as_str(), card.back.as_str()))
                .copied();
            is_due(last, today)
        })
        .cloned()
        .collect();

    tracing::info!(
        "{} of {} card(s) due on {}",
        due.len(),
        cards.len(),
        today
    );
    due
}
