use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use strategy::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Pick candidates uniformly at random without replacement.
    Random,
    /// Take candidates in feed order.
    InOrder,
}

impl SelectionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "random" => Some(Self::Random),
            "in-order" => Some(Self::InOrder),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::InOrder => "in-order",
        }
    }
}

/// Chooses which admitted candidates a cycle acts on.
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    policy: SelectionPolicy,
    per_cycle: usize,
    rng: StdRng,
}

impl CandidateSelector {
    pub fn new(policy: SelectionPolicy, per_cycle: usize, seed: u64) -> Self {
        Self {
            policy,
            per_cycle,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn select<'a>(&mut self, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
        match self.policy {
            SelectionPolicy::Random => candidates
                .choose_multiple(&mut self.rng, self.per_cycle)
                .collect(),
            SelectionPolicy::InOrder => candidates.iter().take(self.per_cycle).collect(),
        }
    }
}
