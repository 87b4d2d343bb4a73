use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::RecordId;

// ---------------------------------------------------------------------------
// VoteKind
// ---------------------------------------------------------------------------

/// The direction of a vote as requested by a caller.
///
/// Parsing never fails: text that is not a known direction is kept as
/// [`VoteKind::Unrecognized`] so the vote path can treat it as an explicit
/// no-op instead of an error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VoteKind {
    Up,
    Down,
    Unrecognized(String),
}

impl VoteKind {
    /// Parse a vote direction. Accepts `up`/`upvote` and `down`/`downvote`,
    /// case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" | "upvote" => Self::Up,
            "down" | "downvote" => Self::Down,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Returns `true` for `Up` and `Down`.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl FromStr for VoteKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "upvote"),
            Self::Down => write!(f, "downvote"),
            Self::Unrecognized(raw) => write!(f, "unrecognized({raw})"),
        }
    }
}

// ---------------------------------------------------------------------------
// VoteOutcome
// ---------------------------------------------------------------------------

/// What a single toggle did to the vote sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteOutcome {
    /// The voter was in neither set and is now in the requested one.
    Added,
    /// The voter was already in the requested set and has been removed.
    Removed,
    /// The voter moved from the opposite set to the requested one.
    Switched,
    /// Nothing changed (unrecognized vote kind).
    Unchanged,
}

// ---------------------------------------------------------------------------
// VoteSets
// ---------------------------------------------------------------------------

/// Upvoter and downvoter sets for one story.
///
/// A voter is in at most one of the two sets. The fields are private and the
/// only mutation path is [`VoteSets::apply`], so the invariant cannot be
/// broken from outside; deserialization rejects overlapping input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVoteSets")]
pub struct VoteSets {
    upvotes: BTreeSet<RecordId>,
    downvotes: BTreeSet<RecordId>,
}

#[derive(Deserialize)]
struct RawVoteSets {
    #[serde(default)]
    upvotes: BTreeSet<RecordId>,
    #[serde(default)]
    downvotes: BTreeSet<RecordId>,
}

impl TryFrom<RawVoteSets> for VoteSets {
    type Error = TypeError;

    fn try_from(raw: RawVoteSets) -> Result<Self, Self::Error> {
        if let Some(voter) = raw.upvotes.intersection(&raw.downvotes).next() {
            return Err(TypeError::OverlappingVotes(voter.to_hex()));
        }
        Ok(Self {
            upvotes: raw.upvotes,
            downvotes: raw.downvotes,
        })
    }
}

impl VoteSets {
    /// Empty sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one vote from `voter`.
    ///
    /// Voting in the direction the voter already holds removes the vote.
    /// Voting in the other direction moves the voter across. An unrecognized
    /// kind leaves both sets untouched.
    pub fn apply(&mut self, voter: RecordId, kind: &VoteKind) -> VoteOutcome {
        match kind {
            VoteKind::Up => toggle(&mut self.upvotes, &mut self.downvotes, voter),
            VoteKind::Down => toggle(&mut self.downvotes, &mut self.upvotes, voter),
            VoteKind::Unrecognized(_) => VoteOutcome::Unchanged,
        }
    }

    pub fn upvotes(&self) -> &BTreeSet<RecordId> {
        &self.upvotes
    }

    pub fn downvotes(&self) -> &BTreeSet<RecordId> {
        &self.downvotes
    }

    pub fn has_upvoted(&self, voter: &RecordId) -> bool {
        self.upvotes.contains(voter)
    }

    pub fn has_downvoted(&self, voter: &RecordId) -> bool {
        self.downvotes.contains(voter)
    }

    /// Upvotes minus downvotes.
    pub fn score(&self) -> i64 {
        self.upvotes.len() as i64 - self.downvotes.len() as i64
    }

    /// Returns `true` if neither set has any voter.
    pub fn is_empty(&self) -> bool {
        self.upvotes.is_empty() && self.downvotes.is_empty()
    }
}

fn toggle(
    target: &mut BTreeSet<RecordId>,
    opposite: &mut BTreeSet<RecordId>,
    voter: RecordId,
) -> VoteOutcome {
    if target.remove(&voter) {
        return VoteOutcome::Removed;
    }
    let switched = opposite.remove(&voter);
    target.insert(voter);
    if switched {
        VoteOutcome::Switched
    } else {
        VoteOutcome::Added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn voter(n: u8) -> RecordId {
        RecordId::from_raw([n; 12])
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_known_kinds() {
        assert_eq!(VoteKind::parse("upvote"), VoteKind::Up);
        assert_eq!(VoteKind::parse("UP"), VoteKind::Up);
        assert_eq!(VoteKind::parse("downvote"), VoteKind::Down);
        assert_eq!(VoteKind::parse(" down "), VoteKind::Down);
    }

    #[test]
    fn parse_keeps_unknown_text() {
        let kind: VoteKind = "sideways".parse().unwrap();
        assert_eq!(kind, VoteKind::Unrecognized("sideways".into()));
        assert!(!kind.is_recognized());
    }

    // -----------------------------------------------------------------------
    // Toggle semantics
    // -----------------------------------------------------------------------

    #[test]
    fn same_vote_twice_returns_to_start() {
        let mut sets = VoteSets::new();
        assert_eq!(sets.apply(voter(1), &VoteKind::Up), VoteOutcome::Added);
        assert!(sets.has_upvoted(&voter(1)));
        assert_eq!(sets.apply(voter(1), &VoteKind::Up), VoteOutcome::Removed);
        assert!(sets.is_empty());
    }

    #[test]
    fn opposite_vote_switches_sets() {
        let mut sets = VoteSets::new();
        sets.apply(voter(1), &VoteKind::Down);
        assert_eq!(sets.apply(voter(1), &VoteKind::Up), VoteOutcome::Switched);
        assert!(sets.has_upvoted(&voter(1)));
        assert!(!sets.has_downvoted(&voter(1)));
    }

    #[test]
    fn unrecognized_kind_is_a_no_op() {
        let mut sets = VoteSets::new();
        sets.apply(voter(1), &VoteKind::Up);
        let before = sets.clone();
        let outcome = sets.apply(voter(2), &VoteKind::Unrecognized("meh".into()));
        assert_eq!(outcome, VoteOutcome::Unchanged);
        assert_eq!(sets, before);
        assert!(!sets.has_upvoted(&voter(2)));
        assert!(!sets.has_downvoted(&voter(2)));
    }

    #[test]
    fn end_to_end_sequence() {
        let u1 = voter(1);
        let mut sets = VoteSets::new();

        sets.apply(u1, &VoteKind::Up);
        assert_eq!(sets.upvotes().iter().copied().collect::<Vec<_>>(), vec![u1]);

        sets.apply(u1, &VoteKind::Up);
        assert!(sets.is_empty());

        sets.apply(u1, &VoteKind::Down);
        assert_eq!(sets.downvotes().iter().copied().collect::<Vec<_>>(), vec![u1]);
        assert!(sets.upvotes().is_empty());

        sets.apply(u1, &VoteKind::Up);
        assert_eq!(sets.upvotes().iter().copied().collect::<Vec<_>>(), vec![u1]);
        assert!(sets.downvotes().is_empty());
    }

    #[test]
    fn score_counts_both_directions() {
        let mut sets = VoteSets::new();
        sets.apply(voter(1), &VoteKind::Up);
        sets.apply(voter(2), &VoteKind::Up);
        sets.apply(voter(3), &VoteKind::Down);
        assert_eq!(sets.score(), 1);
    }

    // -----------------------------------------------------------------------
    // Serde
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_rejects_overlap() {
        let id = voter(9).to_hex();
        let json = format!(r#"{{"upvotes":["{id}"],"downvotes":["{id}"]}}"#);
        let result: Result<VoteSets, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_defaults_missing_sets() {
        let sets: VoteSets = serde_json::from_str("{}").unwrap();
        assert!(sets.is_empty());
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn arb_kind() -> impl Strategy<Value = VoteKind> {
        prop_oneof![
            Just(VoteKind::Up),
            Just(VoteKind::Down),
            "[a-z]{1,6}".prop_map(VoteKind::Unrecognized),
        ]
    }

    proptest! {
        #[test]
        fn no_voter_is_ever_in_both_sets(
            ops in proptest::collection::vec((0u8..6, arb_kind()), 0..64)
        ) {
            let mut sets = VoteSets::new();
            for (n, kind) in &ops {
                sets.apply(voter(*n), kind);
                prop_assert!(sets.upvotes().is_disjoint(sets.downvotes()));
            }
        }

        #[test]
        fn repeating_a_vote_restores_previous_state(
            ops in proptest::collection::vec((0u8..6, arb_kind()), 0..32),
            n in 0u8..6,
            up in any::<bool>(),
        ) {
            let mut sets = VoteSets::new();
            for (v, kind) in &ops {
                sets.apply(voter(*v), kind);
            }
            let kind = if up { VoteKind::Up } else { VoteKind::Down };
            let mut twice = sets.clone();
            twice.apply(voter(n), &kind);
            twice.apply(voter(n), &kind);
            // A voter who started in the opposite set ends in neither after
            // switch + remove; everyone else is back to the starting state.
            let started_opposite = if up {
                sets.has_downvoted(&voter(n))
            } else {
                sets.has_upvoted(&voter(n))
            };
            if started_opposite {
                prop_assert!(!twice.has_upvoted(&voter(n)));
                prop_assert!(!twice.has_downvoted(&voter(n)));
            } else {
                prop_assert_eq!(twice, sets);
            }
        }
    }
}
