//! Core domain types for the recall system.
//!
//! - Cards, identified by their (front, back) text
//! - Review outcomes and the result records that make up the study log

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Card Types
// ============================================================================

/// A flashcard. Two cards with the same front and back are the same card.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    pub front: String,
    pub back: String,
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    /// Text shown for the given face
    pub fn face_text(&self, face: Face) -> &str {
        match face {
            Face::Front => &self.front,
            Face::Back => &self.back,
        }
    }
}

/// Which side of the current card is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Face {
    #[default]
    Front,
    Back,
}

impl Face {
    pub fn flipped(self) -> Self {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Outcome of a single review
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail => write!(f, "fail"),
        }
    }
}

/// One entry in the study log.
///
/// Serialized with the `result`/`timestamp` keys used by existing results
/// files; `outcome`/`studied_on` are accepted when reading.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    pub front: String,
    pub back: String,
    #[serde(rename = "result", alias = "outcome")]
    pub outcome: Outcome,
    #[serde(rename = "timestamp", alias = "studied_on")]
    pub studied_on: NaiveDate,
}

impl ResultRecord {
    pub fn new(card: &Card, outcome: Outcome, studied_on: NaiveDate) -> Self {
        Self {
            front: card.front.clone(),
            back: card.back.clone(),
            outcome,
            studied_on,
        }
    }

    /// Whether this record belongs to the given card
    pub fn is_for(&self, card: &Card) -> bool {
        self.front == card.front && self.back == card.back
    }
}
