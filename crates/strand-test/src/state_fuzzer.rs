//! State Fuzzer - Randomized pushes against a distinct-state subject
//!
//! Drives one subject with a seeded mix of:
//! - New signed and anchor commits
//! - Equal-but-separately-allocated copies of the held state
//! - The held reference itself
//! - Stale prefixes passed through tip selection
//!
//! and checks that observers saw exactly the distinct transitions, in the
//! same order, with no rollbacks.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strand_core::{Commit, StreamState, UnixTimestamp};
use strand_state::{select_state, CommitLogEquality, StateEquality, StreamStateSubject};

use crate::fixtures::{anchored, fake_cid, genesis_state};
use crate::StateRecorder;

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of pushes
    pub step_count: usize,
    /// Number of recording observers
    pub observer_count: usize,
    /// Probability of appending a signed commit
    pub append_prob: f64,
    /// Probability of appending an anchor commit
    pub anchor_prob: f64,
    /// Probability of pushing an equal copy
    pub replay_prob: f64,
    /// Probability of pushing a stale prefix
    pub stale_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            step_count: 1000,
            observer_count: 3,
            append_prob: 0.3,
            anchor_prob: 0.1,
            replay_prob: 0.3,
            stale_prob: 0.2,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            step_count: 100,
            observer_count: 2,
            ..FuzzerConfig::default()
        }
    }

    /// Mostly redundant pushes
    pub fn redundant() -> Self {
        FuzzerConfig {
            step_count: 2000,
            observer_count: 4,
            append_prob: 0.05,
            anchor_prob: 0.02,
            replay_prob: 0.6,
            stale_prob: 0.3,
            seed: 7,
        }
    }
}

/// Fuzzing result
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FuzzResult {
    /// Distinct states the producer pushed
    pub expected_emissions: u64,
    /// Transitions the subject reported
    pub emitted: u64,
    /// Deliveries equal to the delivery before them
    pub duplicate_emissions: u64,
    /// Deliveries that did not extend the delivery before them
    pub rollbacks: u64,
    /// Observers whose sequence differs from the first observer's
    pub divergent_observers: u64,
}

impl FuzzResult {
    pub fn is_valid(&self) -> bool {
        self.emitted == self.expected_emissions
            && self.duplicate_emissions == 0
            && self.rollbacks == 0
            && self.divergent_observers == 0
    }
}

/// State fuzzer
pub struct StateFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
    subject: StreamStateSubject,
    recorders: Vec<StateRecorder>,
    /// Every state the producer has reached, oldest first
    history: Vec<Arc<StreamState>>,
    commit_seq: u64,
    clock: UnixTimestamp,
}

impl StateFuzzer {
    /// Create a new fuzzer
    pub fn new(config: FuzzerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let initial = Arc::new(genesis_state(config.seed));
        let subject = StreamStateSubject::new(initial.clone());

        let recorders: Vec<StateRecorder> = (0..config.observer_count.max(1))
            .map(|_| {
                let recorder = StateRecorder::new();
                recorder.attach(&subject);
                recorder
            })
            .collect();

        StateFuzzer {
            config,
            rng,
            subject,
            recorders,
            history: vec![initial],
            commit_seq: 0,
            clock: UnixTimestamp(1_000),
        }
    }

    pub fn subject(&self) -> &StreamStateSubject {
        &self.subject
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> FuzzResult {
        let mut expected = 0;

        for _ in 0..self.config.step_count {
            if self.step() {
                expected += 1;
            }
        }

        let mut result = self.check_invariants();
        result.expected_emissions = expected;
        result
    }

    /// One push; returns whether the producer offered a new distinct state
    fn step(&mut self) -> bool {
        let held = self.subject.value();
        let roll: f64 = self.rng.gen();
        let c = &self.config;

        if roll < c.append_prob {
            self.commit_seq += 1;
            let next = held
                .append(Commit::signed(fake_cid(u64::MAX - self.commit_seq)))
                .map(Arc::new);
            match next {
                Ok(next) => self.offer_new(next),
                Err(_) => false,
            }
        } else if roll < c.append_prob + c.anchor_prob {
            if held.tip().is_anchor() {
                return false;
            }
            self.clock = self.clock.saturating_add(std::time::Duration::from_secs(60));
            let next = Arc::new(anchored(&held, self.clock));
            self.offer_new(next)
        } else if roll < c.append_prob + c.anchor_prob + c.replay_prob {
            let copy = StreamState::clone(&held);
            self.subject.next(copy);
            false
        } else if roll < c.append_prob + c.anchor_prob + c.replay_prob + c.stale_prob {
            let idx = self.rng.gen_range(0..self.history.len());
            let stale = self.history[idx].clone();
            if let Ok(chosen) = select_state(&held, stale) {
                self.subject.next(chosen);
            }
            false
        } else {
            self.subject.next(held);
            false
        }
    }

    fn offer_new(&mut self, next: Arc<StreamState>) -> bool {
        self.history.push(next.clone());
        self.subject.next(next);
        true
    }

    /// Check all invariants
    fn check_invariants(&self) -> FuzzResult {
        let mut result = FuzzResult {
            emitted: self.subject.stats().emitted,
            ..FuzzResult::default()
        };

        let reference = self.recorders[0].states();
        for pair in reference.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if CommitLogEquality.equal(prev, next).unwrap_or(false) {
                result.duplicate_emissions += 1;
            }
            if !prev.is_prefix_of(next) {
                result.rollbacks += 1;
            }
        }

        for recorder in &self.recorders[1..] {
            if recorder.states() != reference {
                result.divergent_observers += 1;
            }
        }

        result
    }
}

/// Property-based test helpers
pub mod properties {
    use super::*;

    /// Property: the oracle calls every state equal to itself and to its copy
    pub fn oracle_reflexive(state: &StreamState) -> bool {
        let copy = state.clone();
        CommitLogEquality.equal(state, state).unwrap_or(false)
            && CommitLogEquality.equal(state, &copy).unwrap_or(false)
    }

    /// Property: the oracle is symmetric
    pub fn oracle_symmetric(a: &StreamState, b: &StreamState) -> bool {
        CommitLogEquality.equal(a, b).ok() == CommitLogEquality.equal(b, a).ok()
    }

    /// Property: the oracle agrees with structural equality
    pub fn oracle_matches_structure(a: &StreamState, b: &StreamState) -> bool {
        CommitLogEquality.equal(a, b).unwrap_or(false) == (a == b)
    }
}
