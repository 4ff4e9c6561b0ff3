//! Fixture slots and the dense assignment matrix
//!
//! Every team has 8 slots: one home and one away fixture against each pot.
//! `slot = opponent_pot * 2 + orientation`, with Home = 0 and Away = 1.
//!
//! `FixtureMatrix` is the authoritative in-memory form of a (partial) draw.
//! All writes go through `Assign::assign`, which commits both sides of a
//! pairing at once so the matrix stays symmetric.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::roster::{CountryTally, Roster, TeamId, POT_COUNT};

pub const SLOTS_PER_TEAM: usize = POT_COUNT * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Home,
    Away,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::Home => Orientation::Away,
            Orientation::Away => Orientation::Home,
        }
    }

    fn offset(self) -> u8 {
        match self {
            Orientation::Home => 0,
            Orientation::Away => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(u8);

impl Slot {
    pub fn new(opponent_pot: usize, orientation: Orientation) -> Self {
        debug_assert!(opponent_pot < POT_COUNT);
        Slot(opponent_pot as u8 * 2 + orientation.offset())
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < SLOTS_PER_TEAM).then_some(Slot(index as u8))
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOTS_PER_TEAM as u8).map(Slot)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 0-based pot of the opponent held in this slot.
    pub fn pot_index(self) -> usize {
        (self.0 / 2) as usize
    }

    pub fn orientation(self) -> Orientation {
        if self.0 % 2 == 0 {
            Orientation::Home
        } else {
            Orientation::Away
        }
    }

    /// The slot the opponent uses for the same fixture, given the 0-based pot
    /// of the team owning `self`.
    pub fn reciprocal(self, own_pot: usize) -> Slot {
        Slot::new(own_pot, self.orientation().flip())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let side = match self.orientation() {
            Orientation::Home => "home",
            Orientation::Away => "away",
        };
        write!(f, "pot {} {}", self.pot_index() + 1, side)
    }
}

pub type FixtureRow = [Option<TeamId>; SLOTS_PER_TEAM];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureMatrix {
    rows: Vec<FixtureRow>,
}

impl FixtureMatrix {
    /// All slots unassigned.
    pub fn new(team_count: usize) -> Self {
        Self { rows: vec![[None; SLOTS_PER_TEAM]; team_count] }
    }

    pub fn empty(roster: &Roster) -> Self {
        Self::new(roster.len())
    }

    pub fn team_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, team: TeamId, slot: Slot) -> Option<TeamId> {
        self.rows[team.index()][slot.index()]
    }

    pub fn row(&self, team: TeamId) -> &FixtureRow {
        &self.rows[team.index()]
    }

    pub fn opponents(&self, team: TeamId) -> impl Iterator<Item = TeamId> + '_ {
        self.rows[team.index()].iter().flatten().copied()
    }

    pub fn has_opponent(&self, team: TeamId, opponent: TeamId) -> bool {
        self.rows[team.index()].contains(&Some(opponent))
    }

    pub fn open_slots(&self, team: TeamId) -> usize {
        self.rows[team.index()].iter().filter(|s| s.is_none()).count()
    }

    pub fn is_team_complete(&self, team: TeamId) -> bool {
        self.open_slots(team) == 0
    }

    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Option::is_some))
    }

    /// Number of filled slots over all teams (twice the fixture count for a
    /// symmetric matrix).
    pub fn filled_slots(&self) -> usize {
        self.rows.iter().map(|row| row.iter().filter(|s| s.is_some()).count()).sum()
    }

    /// Countries of the team's current opponents.
    pub fn country_tally(&self, roster: &Roster, team: TeamId) -> CountryTally {
        let mut tally = CountryTally::default();
        for opponent in self.opponents(team) {
            tally.add(roster.country_of(opponent));
        }
        tally
    }

    pub(crate) fn set(&mut self, team: TeamId, slot: Slot, value: Option<TeamId>) {
        self.rows[team.index()][slot.index()] = value;
    }
}

/// Anything that can take a symmetric pairing commit.
///
/// Propagation is written against this trait so the same code runs on the
/// persisted matrix and on the search's trailed working copy.
pub trait Assign {
    fn matrix(&self) -> &FixtureMatrix;

    /// Writes `opponent` into `team`'s `slot` and `team` into the opponent's
    /// reciprocal slot.
    fn assign(&mut self, roster: &Roster, team: TeamId, slot: Slot, opponent: TeamId);
}

impl Assign for FixtureMatrix {
    fn matrix(&self) -> &FixtureMatrix {
        self
    }

    fn assign(&mut self, roster: &Roster, team: TeamId, slot: Slot, opponent: TeamId) {
        let reciprocal = slot.reciprocal(roster.pot_index(team));
        self.set(team, slot, Some(opponent));
        self.set(opponent, reciprocal, Some(team));
    }
}

/// Working copy for the search with an undo log.
///
/// Every cell written is recorded; `rollback` clears cells back to a mark.
/// Only unassigned cells are ever written, so clearing restores the exact
/// previous state.
#[derive(Debug, Clone)]
pub struct TrailedMatrix {
    matrix: FixtureMatrix,
    trail: Vec<(TeamId, Slot)>,
}

impl TrailedMatrix {
    pub fn new(matrix: FixtureMatrix) -> Self {
        Self { matrix, trail: Vec::new() }
    }

    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    pub fn rollback(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some((team, slot)) = self.trail.pop() {
                self.matrix.set(team, slot, None);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn into_matrix(self) -> FixtureMatrix {
        self.matrix
    }
}

impl Assign for TrailedMatrix {
    fn matrix(&self) -> &FixtureMatrix {
        &self.matrix
    }

    fn assign(&mut self, roster: &Roster, team: TeamId, slot: Slot, opponent: TeamId) {
        let reciprocal = slot.reciprocal(roster.pot_index(team));
        debug_assert!(self.matrix.get(team, slot).is_none());
        debug_assert!(self.matrix.get(opponent, reciprocal).is_none());
        self.matrix.set(team, slot, Some(opponent));
        self.matrix.set(opponent, reciprocal, Some(team));
        self.trail.push((team, slot));
        self.trail.push((opponent, reciprocal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::test_support::distinct_country_roster;

    #[test]
    fn test_slot_layout() {
        let slot = Slot::new(2, Orientation::Away);
        assert_eq!(slot.index(), 5);
        assert_eq!(slot.pot_index(), 2);
        assert_eq!(slot.orientation(), Orientation::Away);
        assert_eq!(slot.to_string(), "pot 3 away");

        assert_eq!(Slot::from_index(8), None);
        assert_eq!(Slot::all().count(), SLOTS_PER_TEAM);
    }

    #[test]
    fn test_reciprocal_flips_orientation() {
        // A pot-1 team hosting a pot-3 team: the guest sees pot 1 away.
        let slot = Slot::new(2, Orientation::Home);
        let reciprocal = slot.reciprocal(0);
        assert_eq!(reciprocal, Slot::new(0, Orientation::Away));
        assert_eq!(reciprocal.reciprocal(2), slot);
    }

    #[test]
    fn test_assign_is_symmetric() {
        let roster = distinct_country_roster();
        let mut matrix = FixtureMatrix::empty(&roster);
        let home = TeamId(1);
        let away = TeamId(20);

        matrix.assign(&roster, home, Slot::new(2, Orientation::Home), away);

        assert_eq!(matrix.get(home, Slot::new(2, Orientation::Home)), Some(away));
        assert_eq!(matrix.get(away, Slot::new(0, Orientation::Away)), Some(home));
        assert_eq!(matrix.filled_slots(), 2);
        assert_eq!(matrix.open_slots(home), 7);
        assert!(matrix.has_opponent(away, home));
    }

    #[test]
    fn test_trail_rollback_restores_state() {
        let roster = distinct_country_roster();
        let mut base = FixtureMatrix::empty(&roster);
        base.assign(&roster, TeamId(0), Slot::new(1, Orientation::Home), TeamId(9));

        let mut work = TrailedMatrix::new(base.clone());
        let mark = work.mark();
        work.assign(&roster, TeamId(0), Slot::new(1, Orientation::Away), TeamId(10));
        work.assign(&roster, TeamId(30), Slot::new(3, Orientation::Home), TeamId(31));
        assert_eq!(work.trail_len(), 4);

        work.rollback(mark);
        assert_eq!(work.matrix(), &base);
        assert_eq!(work.into_matrix(), base);
    }
}
