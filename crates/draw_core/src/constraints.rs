//! Legal-opponent evaluation
//!
//! Pure functions over a (possibly speculative) matrix. Used by propagation
//! to find forced singletons and by the search to enumerate branches.

use crate::fixture::{FixtureMatrix, Slot};
use crate::roster::{Roster, TeamId};

/// Teams that may fill `team`'s `slot` right now, in id order.
///
/// Candidates come from the slot's pot and are dropped when they are:
/// - the team itself or already one of its opponents
/// - from the team's country, or from a country it already faces twice
/// - already holding a different team in their reciprocal slot
/// - already facing two teams from the team's country
///
/// The slot itself is assumed open; the result ignores its current value.
pub fn legal_opponents(roster: &Roster, matrix: &FixtureMatrix, team: TeamId, slot: Slot) -> Vec<TeamId> {
    let own_country = roster.country_of(team);
    let tally = matrix.country_tally(roster, team);
    let reciprocal = slot.reciprocal(roster.pot_index(team));

    roster
        .pot_members(slot.pot_index())
        .filter(|&candidate| {
            if candidate == team || matrix.has_opponent(team, candidate) {
                return false;
            }
            let country = roster.country_of(candidate);
            if country == own_country || tally.is_capped(country) {
                return false;
            }
            if matrix.get(candidate, reciprocal).is_some() {
                return false;
            }
            !matrix.country_tally(roster, candidate).is_capped(own_country)
        })
        .collect()
}
