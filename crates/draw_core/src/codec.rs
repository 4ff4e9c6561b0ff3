//! Compact, order-independent encoding of a fixture matrix
//!
//! A draw state is stored as the sorted set of `(home, away)` pairs, one per
//! committed fixture. Byte form: two bytes per pair. Text form: ids joined
//! with dashes, e.g. `0-12-0-20`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;
use crate::fixture::{FixtureMatrix, Orientation, Slot};
use crate::roster::{Roster, TeamId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PairList")]
pub struct CompressedState {
    pairs: Vec<(TeamId, TeamId)>,
}

/// Wire form before canonicalization.
#[derive(Deserialize)]
struct PairList {
    pairs: Vec<(TeamId, TeamId)>,
}

impl From<PairList> for CompressedState {
    fn from(list: PairList) -> Self {
        Self::from_pairs(list.pairs)
    }
}

impl CompressedState {
    /// Sorts and dedups, so any pair order gives the same state.
    pub fn from_pairs(mut pairs: Vec<(TeamId, TeamId)>) -> Self {
        pairs.sort_unstable();
        pairs.dedup();
        Self { pairs }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() % 2 != 0 {
            return Err(CodecError::OddLength { len: bytes.len() });
        }
        let pairs = bytes.chunks_exact(2).map(|c| (TeamId(c[0]), TeamId(c[1]))).collect();
        Ok(Self::from_pairs(pairs))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.pairs.iter().flat_map(|(home, away)| [home.0, away.0]).collect()
    }

    pub fn pairs(&self) -> &[(TeamId, TeamId)] {
        &self.pairs
    }

    /// Number of fixtures.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for CompressedState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (idx, (home, away)) in self.pairs.iter().enumerate() {
            if idx > 0 {
                f.write_str("-")?;
            }
            write!(f, "{}-{}", home.0, away.0)?;
        }
        Ok(())
    }
}

impl FromStr for CompressedState {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let bytes = s
            .split('-')
            .map(|part| part.trim().parse::<u8>().map_err(|_| CodecError::InvalidNumber(part.to_string())))
            .collect::<Result<Vec<u8>, _>>()?;
        Self::from_bytes(&bytes)
    }
}

/// Collects every home-side slot as a `(home, away)` pair.
pub fn compress(matrix: &FixtureMatrix) -> CompressedState {
    let mut pairs = Vec::with_capacity(matrix.filled_slots() / 2);
    for idx in 0..matrix.team_count() {
        let team = TeamId(idx as u8);
        for slot in Slot::all().filter(|s| s.orientation() == Orientation::Home) {
            if let Some(opponent) = matrix.get(team, slot) {
                pairs.push((team, opponent));
            }
        }
    }
    CompressedState::from_pairs(pairs)
}

/// Rebuilds the dense matrix. Rejects ids outside the roster, self pairs and
/// pairs that disagree with a slot already filled by another pair.
pub fn expand(roster: &Roster, state: &CompressedState) -> Result<FixtureMatrix, CodecError> {
    let mut matrix = FixtureMatrix::empty(roster);
    for &(home, away) in state.pairs() {
        for team in [home, away] {
            if !roster.contains(team) {
                return Err(CodecError::UnknownTeam { team });
            }
        }
        if home == away {
            return Err(CodecError::SelfPair { team: home });
        }

        let home_slot = Slot::new(roster.pot_index(away), Orientation::Home);
        let away_slot = Slot::new(roster.pot_index(home), Orientation::Away);
        fill(&mut matrix, home, home_slot, away)?;
        fill(&mut matrix, away, away_slot, home)?;
    }
    Ok(matrix)
}

fn fill(matrix: &mut FixtureMatrix, team: TeamId, slot: Slot, opponent: TeamId) -> Result<(), CodecError> {
    match matrix.get(team, slot) {
        Some(existing) if existing != opponent => {
            Err(CodecError::SlotConflict { team, slot, existing, incoming: opponent })
        }
        _ => {
            matrix.set(team, slot, Some(opponent));
            Ok(())
        }
    }
}
