//! Forced-move propagation
//!
//! A pass looks at every open slot. No legal opponent means the state is a
//! dead end. Exactly one means the pairing is forced and is committed on the
//! spot. Passes repeat until nothing changes. Forced moves are never guesses,
//! so only the search layer ever undoes them.

use serde::Serialize;

use crate::constraints::legal_opponents;
use crate::error::Infeasible;
use crate::fixture::{Assign, Slot};
use crate::roster::{Roster, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForcedMove {
    pub team: TeamId,
    pub slot: Slot,
    pub opponent: TeamId,
}

/// One pass over all teams and slots. Returns the moves committed; an empty
/// list means the matrix was already at a fixpoint.
pub fn propagate_once<A: Assign>(roster: &Roster, target: &mut A) -> Result<Vec<ForcedMove>, Infeasible> {
    let mut forced = Vec::new();
    for team in roster.ids() {
        for slot in Slot::all() {
            if target.matrix().get(team, slot).is_some() {
                continue;
            }
            let candidates = legal_opponents(roster, target.matrix(), team, slot);
            match candidates.as_slice() {
                [] => return Err(Infeasible { team, slot }),
                [opponent] => {
                    target.assign(roster, team, slot, *opponent);
                    forced.push(ForcedMove { team, slot, opponent: *opponent });
                }
                _ => {}
            }
        }
    }
    Ok(forced)
}

/// Runs passes to a fixpoint.
pub fn propagate<A: Assign>(roster: &Roster, target: &mut A) -> Result<Vec<ForcedMove>, Infeasible> {
    let mut all = Vec::new();
    loop {
        let forced = propagate_once(roster, target)?;
        if forced.is_empty() {
            return Ok(all);
        }
        all.extend(forced);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureMatrix, Orientation};
    use crate::invariants::check_matrix;
    use crate::roster::test_support::{distinct_country_roster, roster_with_countries};

    #[test]
    fn test_empty_matrix_is_fixpoint() {
        let roster = distinct_country_roster();
        let mut matrix = FixtureMatrix::empty(&roster);
        assert!(propagate_once(&roster, &mut matrix).unwrap().is_empty());
        assert_eq!(matrix.filled_slots(), 0);
    }

    #[test]
    fn test_last_open_pairing_is_forced() {
        let roster = distinct_country_roster();
        let mut matrix = FixtureMatrix::empty(&roster);

        // Pot 4 teams 27..35 host each other in a cycle, except 35 -> 27 is left open.
        for i in 27..35u8 {
            matrix.assign(&roster, TeamId(i), Slot::new(3, Orientation::Home), TeamId(i + 1));
        }
        let forced = propagate(&roster, &mut matrix).unwrap();

        // Team 27 is scanned first and closes the cycle from its away side.
        assert_eq!(
            forced,
            vec![ForcedMove {
                team: TeamId(27),
                slot: Slot::new(3, Orientation::Away),
                opponent: TeamId(35),
            }]
        );
        assert_eq!(matrix.get(TeamId(35), Slot::new(3, Orientation::Home)), Some(TeamId(27)));
        check_matrix(&roster, &matrix).unwrap();
    }

    #[test]
    fn test_forced_singleton_respects_country_cap() {
        // Pot 2: seven AAA teams, one BBB (9), one DDD (10).
        // Team 0 already faces AAA twice (18 and 27) and plays BBB away,
        // so its pot-2 home slot can only go to DDD.
        let mut countries: Vec<String> = (0..36).map(|i| format!("C{:02}", i)).collect();
        for idx in 11..18 {
            countries[idx] = "AAA".into();
        }
        countries[9] = "BBB".into();
        countries[10] = "DDD".into();
        countries[18] = "AAA".into();
        countries[27] = "AAA".into();
        let refs: Vec<&str> = countries.iter().map(|s| s.as_str()).collect();
        let roster = roster_with_countries(&refs);

        let mut matrix = FixtureMatrix::empty(&roster);
        matrix.assign(&roster, TeamId(0), Slot::new(2, Orientation::Home), TeamId(18));
        matrix.assign(&roster, TeamId(0), Slot::new(3, Orientation::Home), TeamId(27));
        matrix.assign(&roster, TeamId(0), Slot::new(1, Orientation::Away), TeamId(9));

        let forced = propagate_once(&roster, &mut matrix).unwrap();
        assert!(forced.contains(&ForcedMove {
            team: TeamId(0),
            slot: Slot::new(1, Orientation::Home),
            opponent: TeamId(10),
        }));
        assert_eq!(matrix.get(TeamId(10), Slot::new(0, Orientation::Away)), Some(TeamId(0)));

        let aaa = roster.country_of(TeamId(18));
        assert_eq!(matrix.country_tally(&roster, TeamId(0)).get(aaa), 2);
        check_matrix(&roster, &matrix).unwrap();
    }

    #[test]
    fn test_reports_empty_slot() {
        // Every pot-2 team shares team 0's country: its pot-2 slots are dead.
        let mut countries: Vec<String> = (0..36).map(|i| format!("C{:02}", i)).collect();
        for idx in 9..18 {
            countries[idx] = "AAA".into();
        }
        countries[0] = "AAA".into();
        let refs: Vec<&str> = countries.iter().map(|s| s.as_str()).collect();
        let roster = roster_with_countries(&refs);

        let mut matrix = FixtureMatrix::empty(&roster);
        let err = propagate(&roster, &mut matrix).unwrap_err();
        assert_eq!(err, Infeasible { team: TeamId(0), slot: Slot::new(1, Orientation::Home) });
    }

    #[test]
    fn test_fixpoint_is_idempotent() {
        let roster = distinct_country_roster();
        let mut matrix = FixtureMatrix::empty(&roster);
        for i in 27..35u8 {
            matrix.assign(&roster, TeamId(i), Slot::new(3, Orientation::Home), TeamId(i + 1));
        }
        propagate(&roster, &mut matrix).unwrap();
        let settled = matrix.clone();

        assert!(propagate_once(&roster, &mut matrix).unwrap().is_empty());
        assert_eq!(matrix, settled);
    }
}
