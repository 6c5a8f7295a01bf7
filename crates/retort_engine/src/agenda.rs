//! Activations and the policies that pick which one fires next.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use retort_foundation::ProductionId;

use crate::network::TokenId;

/// One satisfied instance of a production.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Match {
    /// The production that matched.
    pub production: ProductionId,
    /// The token at the production's terminal node.
    pub token: TokenId,
    /// The production's salience when the match arrived.
    pub salience: i32,
}

/// Chooses which ready match fires next.
pub trait MatchSelector {
    /// Returns the index of the chosen match, or `None` for an empty slice.
    fn select(&mut self, ready: &[Match]) -> Option<usize>;
}

/// Picks uniformly at random, reproducibly for a given seed.
#[derive(Clone, Debug)]
pub struct RandomSelector {
    rng: ChaCha8Rng,
}

impl RandomSelector {
    /// Creates a selector from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl MatchSelector for RandomSelector {
    fn select(&mut self, ready: &[Match]) -> Option<usize> {
        if ready.is_empty() {
            None
        } else {
            Some(self.rng.gen_range(0..ready.len()))
        }
    }
}

/// Always picks the first ready match.
#[derive(Copy, Clone, Debug, Default)]
pub struct FirstSelector;

impl MatchSelector for FirstSelector {
    fn select(&mut self, ready: &[Match]) -> Option<usize> {
        (!ready.is_empty()).then_some(0)
    }
}

/// Picks the highest salience; ties go to the earliest match.
#[derive(Copy, Clone, Debug, Default)]
pub struct SalienceSelector;

impl MatchSelector for SalienceSelector {
    fn select(&mut self, ready: &[Match]) -> Option<usize> {
        let mut best: Option<(usize, i32)> = None;
        for (i, m) in ready.iter().enumerate() {
            if best.is_none_or(|(_, s)| m.salience > s) {
                best = Some((i, m.salience));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Names a built-in selection policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// [`RandomSelector`].
    #[default]
    Random,
    /// [`FirstSelector`].
    First,
    /// [`SalienceSelector`].
    Salience,
}

impl SelectionStrategy {
    /// Builds the selector for this policy.
    #[must_use]
    pub fn selector(self, seed: u64) -> Box<dyn MatchSelector> {
        match self {
            Self::Random => Box::new(RandomSelector::new(seed)),
            Self::First => Box::new(FirstSelector),
            Self::Salience => Box::new(SalienceSelector),
        }
    }
}
