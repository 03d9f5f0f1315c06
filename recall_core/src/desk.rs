//! Interactive study desk.
//!
//! Wraps a [`Session`] for front-ends that invoke one action per button
//! press. Unlike the plain session loop, every pass or fail is written to
//! the results store immediately, and the desk can re-shuffle the remaining
//! cards or rebuild the due queue from scratch.

use crate::scheduler::compute_due;
use crate::session::{Command, Event, Session};
use crate::{Card, Error, Outcome, Result, ResultRecord, ResultStore};
use chrono::NaiveDate;
use rand::Rng;
use std::str::FromStr;

/// A button on the desk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Pass,
    Fail,
    Flip,
    Skip,
    Randomize,
    StartOver,
}

impl FromStr for Action {
    type Err = Error;

    /// Parse a button token (`p`, `d`, `f`, `s`, `r`, `o`)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "p" => Ok(Action::Pass),
            "d" => Ok(Action::Fail),
            "f" => Ok(Action::Flip),
            "s" => Ok(Action::Skip),
            "r" => Ok(Action::Randomize),
            "o" => Ok(Action::StartOver),
            other => Err(Error::InvalidCommand(other.to_string())),
        }
    }
}

pub struct Desk<S, R> {
    cards: Vec<Card>,
    log: Vec<ResultRecord>,
    store: S,
    session: Session,
    today: NaiveDate,
    rng: R,
}

impl<S: ResultStore, R: Rng> Desk<S, R> {
    /// Load the study log from `store` and start a session over the cards
    /// due on `today`
    pub fn open(cards: Vec<Card>, store: S, today: NaiveDate, mut rng: R) -> Result<Self> {
        let log = store.load()?;
        let due = compute_due(&cards, &log, today);
        let session = Session::start(due, today, &mut rng);

        Ok(Self {
            cards,
            log,
            store,
            session,
            today,
            rng,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The study log as last persisted
    pub fn log(&self) -> &[ResultRecord] {
        &self.log
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Perform one action.
    ///
    /// Pass and fail persist the full log before the session advances. If
    /// the write fails the error is returned and the current card stays put.
    pub fn perform(&mut self, action: Action) -> Result<Event> {
        match action {
            Action::Pass => self.grade(Outcome::Pass),
            Action::Fail => self.grade(Outcome::Fail),
            Action::Flip => Ok(self.session.apply(Command::Flip)),
            Action::Skip => Ok(self.session.apply(Command::Skip)),
            Action::Randomize => {
                if self.session.is_complete() {
                    return Ok(Event::Ignored);
                }
                self.session.randomize(&mut self.rng);
                Ok(Event::Randomized)
            }
            Action::StartOver => Ok(self.start_over()),
        }
    }

    fn grade(&mut self, outcome: Outcome) -> Result<Event> {
        let Some(record) = self.session.record_for(outcome) else {
            return Ok(Event::Ignored);
        };

        self.log.push(record);
        if let Err(e) = self.store.persist(&self.log) {
            self.log.pop();
            tracing::error!("Failed to persist {} result: {}", outcome, e);
            return Err(e);
        }

        let command = match outcome {
            Outcome::Pass => Command::Pass,
            Outcome::Fail => Command::Fail,
        };
        Ok(self.session.apply(command))
    }

    fn start_over(&mut self) -> Event {
        // Cards graded today are not due again until the interval elapses
        let due = compute_due(&self.cards, &self.log, self.today);
        let count = due.len();
        self.session = Session::start(due, self.today, &mut self.rng);
        tracing::info!("Started over with {} due card(s)", count);
        Event::Restarted { due: count }
    }
}
