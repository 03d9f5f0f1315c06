//! Study session state machine.
//!
//! A session owns a shuffled copy of the due queue. The card at the head of
//! the queue is the current card; passing or failing it records a result and
//! removes it, skipping rotates it to the back. Every command goes through
//! [`Session::apply`].

use crate::{Card, Error, Face, Outcome, Result, ResultRecord, ResultStore};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use std::str::FromStr;

/// A command issued against the current card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Flip,
    Pass,
    Fail,
    Skip,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    /// Parse a single-letter command token (`f`, `p`, `d`, `s`, `q`)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "f" => Ok(Command::Flip),
            "p" => Ok(Command::Pass),
            "d" => Ok(Command::Fail),
            "s" => Ok(Command::Skip),
            "q" => Ok(Command::Quit),
            other => Err(Error::InvalidCommand(other.to_string())),
        }
    }
}

/// Observable state of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a command on the card at `index` (0-based)
    AwaitingCommand { index: usize, face: Face },
    Complete,
}

/// What a command did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Flipped(Face),
    Recorded(ResultRecord),
    Skipped,
    Quit,
    Randomized,
    /// The due queue was rebuilt with `due` cards
    Restarted { due: usize },
    /// The session was already complete
    Ignored,
}

/// Pass/fail counts for a finished session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub passed: usize,
    pub failed: usize,
}

impl SessionSummary {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            match r.outcome {
                Outcome::Pass => acc.passed += 1,
                Outcome::Fail => acc.failed += 1,
            }
            acc
        })
    }

    pub fn recorded(&self) -> usize {
        self.passed + self.failed
    }
}

/// A single study session over a due queue
#[derive(Clone, Debug)]
pub struct Session {
    remaining: VecDeque<Card>,
    reviewed: usize,
    face: Face,
    complete: bool,
    today: NaiveDate,
    results: Vec<ResultRecord>,
}

impl Session {
    /// Start a session over `due`, shuffled with `rng`.
    ///
    /// Every result is stamped with `today`.
    pub fn start<R: Rng + ?Sized>(mut due: Vec<Card>, today: NaiveDate, rng: &mut R) -> Self {
        due.shuffle(rng);
        let complete = due.is_empty();
        tracing::info!("Starting session with {} due card(s)", due.len());

        Self {
            remaining: due.into(),
            reviewed: 0,
            face: Face::Front,
            complete,
            today,
            results: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.complete {
            SessionState::Complete
        } else {
            SessionState::AwaitingCommand {
                index: self.reviewed,
                face: self.face,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The card awaiting a command
    pub fn current(&self) -> Option<&Card> {
        if self.complete {
            None
        } else {
            self.remaining.front()
        }
    }

    pub fn face(&self) -> Face {
        self.face
    }

    /// Text of the current card's showing face
    pub fn current_text(&self) -> Option<&str> {
        self.current().map(|c| c.face_text(self.face))
    }

    /// 1-based position of the current card and the queue length,
    /// for "Card i of N" display
    pub fn progress(&self) -> (usize, usize) {
        (self.reviewed + 1, self.reviewed + self.remaining.len())
    }

    /// Cards not yet passed or failed, current card first
    pub fn remaining(&self) -> impl Iterator<Item = &Card> {
        self.remaining.iter()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Records produced so far, in order
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    /// The record `outcome` would produce for the current card
    pub fn record_for(&self, outcome: Outcome) -> Option<ResultRecord> {
        self.current()
            .map(|card| ResultRecord::new(card, outcome, self.today))
    }

    /// Apply one command
    pub fn apply(&mut self, command: Command) -> Event {
        if self.complete {
            return Event::Ignored;
        }

        match command {
            Command::Flip => {
                self.face = self.face.flipped();
                Event::Flipped(self.face)
            }
            Command::Pass => self.record(Outcome::Pass),
            Command::Fail => self.record(Outcome::Fail),
            Command::Skip => {
                // Single card: rotating is a no-op and the same card shows again
                self.remaining.rotate_left(1);
                self.face = Face::Front;
                tracing::debug!("Skipped card, {} remaining", self.remaining.len());
                Event::Skipped
            }
            Command::Quit => {
                tracing::info!(
                    "Session quit with {} card(s) left unreviewed",
                    self.remaining.len()
                );
                self.remaining.clear();
                self.complete = true;
                Event::Quit
            }
        }
    }

    /// Parse and apply a command token.
    ///
    /// Unrecognized tokens return [`Error::InvalidCommand`] and leave the
    /// session untouched.
    pub fn apply_token(&mut self, token: &str) -> Result<Event> {
        let command = token.parse::<Command>()?;
        Ok(self.apply(command))
    }

    /// Re-shuffle the cards not yet reviewed and restart the count from the
    /// first of them. Results already produced are kept.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.complete {
            return;
        }
        self.remaining.make_contiguous().shuffle(rng);
        self.reviewed = 0;
        self.face = Face::Front;
        tracing::debug!("Randomized {} remaining card(s)", self.remaining.len());
    }

    fn record(&mut self, outcome: Outcome) -> Event {
        let Some(card) = self.remaining.pop_front() else {
            self.complete = true;
            return Event::Ignored;
        };

        let record = ResultRecord::new(&card, outcome, self.today);
        self.results.push(record.clone());
        self.reviewed += 1;
        self.face = Face::Front;

        if self.remaining.is_empty() {
            tracing::info!("All due cards reviewed");
            self.complete = true;
        }
        Event::Recorded(record)
    }

    /// Append this session's results to the store's log (load-merge-save).
    ///
    /// Nothing is written when no card was passed or failed.
    pub fn finish<S: ResultStore + ?Sized>(self, store: &mut S) -> Result<SessionSummary> {
        let summary = SessionSummary::from_records(&self.results);
        if self.results.is_empty() {
            tracing::info!("No results recorded, leaving results store untouched");
            return Ok(summary);
        }

        store.append(&self.results)?;
        tracing::info!(
            "Recorded {} result(s): {} pass, {} fail",
            summary.recorded(),
            summary.passed,
            summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryResultStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn cards(names: &[&str]) -> Vec<Card> {
        names.iter().map(|n| Card::new(*n, format!("{n}!"))).collect()
    }

    fn start(names: &[&str], seed: u64) -> Session {
        Session::start(cards(names), today(), &mut StdRng::seed_from_u64(seed))
    }

    fn multiset<'a>(cards: impl Iterator<Item = &'a Card>) -> BTreeMap<&'a Card, usize> {
        let mut counts = BTreeMap::new();
        for card in cards {
            *counts.entry(card).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("f".parse::<Command>().unwrap(), Command::Flip);
        assert_eq!(" P \n".parse::<Command>().unwrap(), Command::Pass);
        assert_eq!("d".parse::<Command>().unwrap(), Command::Fail);
        assert_eq!("S".parse::<Command>().unwrap(), Command::Skip);
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);

        let err = "x".parse::<Command>().unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!("".parse::<Command>(), Err(Error::InvalidCommand(_))));
        assert!(matches!("pass".parse::<Command>(), Err(Error::InvalidCommand(_))));
    }

    #[test]
    fn test_empty_queue_completes_immediately() {
        let session = start(&[], 1);
        assert_eq!(session.state(), SessionState::Complete);
        assert!(session.current().is_none());
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_start_is_a_permutation_of_due() {
        let names = ["A", "B", "C", "D", "E"];
        let session = start(&names, 42);
        let due = cards(&names);

        assert_eq!(multiset(session.remaining()), multiset(due.iter()));
        assert_eq!(
            session.state(),
            SessionState::AwaitingCommand {
                index: 0,
                face: Face::Front
            }
        );
    }

    #[test]
    fn test_flip_toggles_face_without_recording() {
        let mut session = start(&["A"], 1);

        assert_eq!(session.apply(Command::Flip), Event::Flipped(Face::Back));
        assert_eq!(session.current_text(), Some("A!"));
        assert_eq!(session.apply(Command::Flip), Event::Flipped(Face::Front));
        assert_eq!(session.current_text(), Some("A"));
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_pass_and_fail_advance_and_record() {
        let mut session = start(&["A", "B"], 7);
        let first = session.current().cloned().unwrap();

        session.apply(Command::Flip);
        let event = session.apply(Command::Pass);
        assert_eq!(
            event,
            Event::Recorded(ResultRecord::new(&first, Outcome::Pass, today()))
        );
        assert_eq!(
            session.state(),
            SessionState::AwaitingCommand {
                index: 1,
                face: Face::Front
            }
        );

        session.apply(Command::Fail);
        assert!(session.is_complete());
        assert_eq!(session.results().len(), 2);
        assert_eq!(session.results()[1].outcome, Outcome::Fail);
        assert!(session.results().iter().all(|r| r.studied_on == today()));
    }

    #[test]
    fn test_skip_moves_current_to_back() {
        let mut session = start(&["A", "B", "C"], 3);
        let before: Vec<Card> = session.remaining().cloned().collect();

        session.apply(Command::Flip);
        assert_eq!(session.apply(Command::Skip), Event::Skipped);

        let after: Vec<Card> = session.remaining().cloned().collect();
        assert_eq!(after, vec![before[1].clone(), before[2].clone(), before[0].clone()]);
        assert_eq!(
            session.state(),
            SessionState::AwaitingCommand {
                index: 0,
                face: Face::Front
            }
        );
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_skip_then_pass_single_card() {
        let mut session = start(&["A"], 1);

        session.apply(Command::Skip);
        assert_eq!(session.current(), Some(&Card::new("A", "A!")));
        assert_eq!(session.progress(), (1, 1));

        session.apply(Command::Pass);
        assert!(session.is_complete());
        assert_eq!(
            session.results(),
            &[ResultRecord::new(&Card::new("A", "A!"), Outcome::Pass, today())]
        );
    }

    #[test]
    fn test_quit_discards_remaining_and_keeps_results() {
        let mut session = start(&["A", "B", "C"], 5);
        session.apply(Command::Pass);

        assert_eq!(session.apply(Command::Quit), Event::Quit);
        assert!(session.is_complete());
        assert_eq!(session.remaining().count(), 0);
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_commands_after_completion_are_ignored() {
        let mut session = start(&["A"], 1);
        session.apply(Command::Pass);

        for command in [Command::Flip, Command::Pass, Command::Fail, Command::Skip] {
            assert_eq!(session.apply(command), Event::Ignored);
        }
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_invalid_token_leaves_state_unchanged() {
        let mut session = start(&["A", "B"], 9);
        session.apply(Command::Flip);
        let state = session.state();
        let order: Vec<Card> = session.remaining().cloned().collect();

        assert!(matches!(session.apply_token("z"), Err(Error::InvalidCommand(_))));
        assert_eq!(session.state(), state);
        assert_eq!(session.remaining().cloned().collect::<Vec<_>>(), order);
    }

    #[test]
    fn test_randomize_keeps_remaining_multiset() {
        let mut session = start(&["A", "B", "C", "D"], 11);
        session.apply(Command::Pass);
        session.apply(Command::Flip);
        let before: Vec<Card> = session.remaining().cloned().collect();

        session.randomize(&mut StdRng::seed_from_u64(99));

        assert_eq!(multiset(session.remaining()), multiset(before.iter()));
        assert_eq!(
            session.state(),
            SessionState::AwaitingCommand {
                index: 0,
                face: Face::Front
            }
        );
        assert_eq!(session.progress(), (1, 3));
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_record_count_matches_pass_and_fail_commands() {
        crate::logging::init_test();
        let names = ["A", "B", "C", "D", "E", "F"];
        let mut rng = StdRng::seed_from_u64(2024);

        for seed in 0..20 {
            let mut session = start(&names, seed);
            let all = cards(&names);
            let mut graded = 0;

            while !session.is_complete() {
                let command = match rng.gen_range(0..10) {
                    0..=2 => Command::Flip,
                    3..=5 => Command::Skip,
                    6..=7 => Command::Pass,
                    _ => Command::Fail,
                };
                let len_before = session.remaining().count();
                session.apply(command);

                match command {
                    Command::Pass | Command::Fail => graded += 1,
                    Command::Skip | Command::Flip => {
                        assert_eq!(session.remaining().count(), len_before);
                    }
                    Command::Quit => unreachable!(),
                }

                // Reviewed + remaining always covers the due set exactly once
                let reviewed: Vec<Card> = session
                    .results()
                    .iter()
                    .map(|r| Card::new(r.front.clone(), r.back.clone()))
                    .collect();
                let mut seen = multiset(session.remaining());
                for card in &reviewed {
                    *seen.entry(card).or_insert(0) += 1;
                }
                assert_eq!(seen, multiset(all.iter()));
            }

            assert_eq!(session.results().len(), graded);
            assert_eq!(graded, names.len());
        }
    }

    #[test]
    fn test_finish_appends_to_store() {
        let existing = ResultRecord::new(
            &Card::new("old", "card"),
            Outcome::Pass,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let mut store = MemoryResultStore::new(vec![existing.clone()]);

        let mut session = start(&["A", "B"], 4);
        session.apply(Command::Pass);
        session.apply(Command::Fail);

        let summary = session.finish(&mut store).unwrap();
        assert_eq!(summary, SessionSummary { passed: 1, failed: 1 });
        assert_eq!(store.records().len(), 3);
        assert_eq!(store.records()[0], existing);
        assert_eq!(store.persist_count(), 1);
    }

    #[test]
    fn test_quit_before_grading_writes_nothing() {
        let mut store = MemoryResultStore::default();
        let mut session = start(&["A", "B"], 4);
        session.apply(Command::Flip);
        session.apply(Command::Skip);
        session.apply(Command::Quit);

        let summary = session.finish(&mut store).unwrap();
        assert_eq!(summary.recorded(), 0);
        assert_eq!(store.persist_count(), 0);
    }

    /// Store whose writes always fail
    struct ReadOnlyStore;

    impl ResultStore for ReadOnlyStore {
        fn load(&self) -> Result<Vec<ResultRecord>> {
            Ok(Vec::new())
        }

        fn persist(&mut self, _log: &[ResultRecord]) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn test_finish_reports_failed_write() {
        let mut session = start(&["A", "B"], 4);
        session.apply(Command::Pass);

        let result = session.finish(&mut ReadOnlyStore);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_finish_without_results_never_writes() {
        let mut session = start(&["A"], 4);
        session.apply(Command::Quit);

        assert_eq!(session.finish(&mut ReadOnlyStore).unwrap().recorded(), 0);
    }

    #[test]
    fn test_replacement_characters_are_invalid_commands() {
        let mut session = start(&["A", "B"], 8);
        session.apply(Command::Pass);
        let state = session.state();

        let token = String::from_utf8_lossy(&[0xff, 0xfe, b'\n']).into_owned();
        assert!(matches!(session.apply_token(&token), Err(Error::InvalidCommand(_))));
        assert_eq!(session.state(), state);
        assert_eq!(session.results().len(), 1);
    }
}
