//! Structural checks for any committed matrix, partial or complete.

use thiserror::Error;

use crate::fixture::{FixtureMatrix, Slot};
use crate::roster::{CountryTally, Roster, TeamId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("team {team} holds {opponent} at {slot}, but the reciprocal slot disagrees")]
    Asymmetric { team: TeamId, slot: Slot, opponent: TeamId },

    #[error("team {team} is paired with itself")]
    SelfPairing { team: TeamId },

    #[error("team {team} holds {opponent} at {slot}, which is not from that pot")]
    WrongPot { team: TeamId, slot: Slot, opponent: TeamId },

    #[error("team {team} plays {opponent} from its own country")]
    SameCountry { team: TeamId, opponent: TeamId },

    #[error("team {team} faces {count} opponents from {country}")]
    CountryCap { team: TeamId, country: String, count: u8 },

    #[error("team {team} faces {opponent} more than once")]
    DuplicateOpponent { team: TeamId, opponent: TeamId },
}

/// Returns the first violation found, scanning teams in id order.
pub fn check_matrix(roster: &Roster, matrix: &FixtureMatrix) -> Result<(), Violation> {
    for team in roster.ids() {
        let own_country = roster.country_of(team);
        let own_pot = roster.pot_index(team);
        let mut tally = CountryTally::default();
        let mut seen: Vec<TeamId> = Vec::new();

        for slot in Slot::all() {
            let Some(opponent) = matrix.get(team, slot) else {
                continue;
            };
            if opponent == team {
                return Err(Violation::SelfPairing { team });
            }
            if roster.pot_index(opponent) != slot.pot_index() {
                return Err(Violation::WrongPot { team, slot, opponent });
            }
            if matrix.get(opponent, slot.reciprocal(own_pot)) != Some(team) {
                return Err(Violation::Asymmetric { team, slot, opponent });
            }
            let country = roster.country_of(opponent);
            if country == own_country {
                return Err(Violation::SameCountry { team, opponent });
            }
            if seen.contains(&opponent) {
                return Err(Violation::DuplicateOpponent { team, opponent });
            }
            seen.push(opponent);
            tally.add(country);
            if tally.get(country) > crate::roster::COUNTRY_CAP {
                return Err(Violation::CountryCap {
                    team,
                    country: roster.country_label(country).to_string(),
                    count: tally.get(country),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Assign, Orientation};
    use crate::roster::test_support::{distinct_country_roster, roster_with_countries};

    #[test]
    fn test_valid_partial_matrix() {
        let roster = distinct_country_roster();
        let mut matrix = FixtureMatrix::empty(&roster);
        check_matrix(&roster, &matrix).unwrap();

        matrix.assign(&roster, TeamId(3), Slot::new(0, Orientation::Home), TeamId(4));
        matrix.assign(&roster, TeamId(3), Slot::new(2, Orientation::Away), TeamId(25));
        check_matrix(&roster, &matrix).unwrap();
    }

    #[test]
    fn test_detects_asymmetry_and_wrong_pot() {
        let roster = distinct_country_roster();
        let mut matrix = FixtureMatrix::empty(&roster);
        matrix.set(TeamId(0), Slot::new(1, Orientation::Home), Some(TeamId(9)));
        assert!(matches!(check_matrix(&roster, &matrix), Err(Violation::Asymmetric { .. })));

        let mut matrix = FixtureMatrix::empty(&roster);
        matrix.set(TeamId(0), Slot::new(1, Orientation::Home), Some(TeamId(30)));
        assert!(matches!(check_matrix(&roster, &matrix), Err(Violation::WrongPot { .. })));

        let mut matrix = FixtureMatrix::empty(&roster);
        matrix.set(TeamId(0), Slot::new(0, Orientation::Home), Some(TeamId(0)));
        assert_eq!(check_matrix(&roster, &matrix), Err(Violation::SelfPairing { team: TeamId(0) }));
    }

    #[test]
    fn test_detects_duplicate_opponent() {
        let roster = distinct_country_roster();
        let mut matrix = FixtureMatrix::empty(&roster);
        matrix.assign(&roster, TeamId(0), Slot::new(1, Orientation::Home), TeamId(9));
        matrix.assign(&roster, TeamId(0), Slot::new(1, Orientation::Away), TeamId(9));
        assert_eq!(
            check_matrix(&roster, &matrix),
            Err(Violation::DuplicateOpponent { team: TeamId(0), opponent: TeamId(9) })
        );
    }

    #[test]
    fn test_detects_country_rules() {
        let mut countries: Vec<String> = (0..36).map(|i| format!("C{:02}", i)).collect();
        countries[9] = "C00".into();
        for idx in [10, 18, 27] {
            countries[idx] = "ZZZ".into();
        }
        let refs: Vec<&str> = countries.iter().map(|s| s.as_str()).collect();
        let roster = roster_with_countries(&refs);

        let mut matrix = FixtureMatrix::empty(&roster);
        matrix.assign(&roster, TeamId(0), Slot::new(1, Orientation::Home), TeamId(9));
        assert_eq!(
            check_matrix(&roster, &matrix),
            Err(Violation::SameCountry { team: TeamId(0), opponent: TeamId(9) })
        );

        let mut matrix = FixtureMatrix::empty(&roster);
        matrix.assign(&roster, TeamId(0), Slot::new(1, Orientation::Home), TeamId(10));
        matrix.assign(&roster, TeamId(0), Slot::new(2, Orientation::Home), TeamId(18));
        check_matrix(&roster, &matrix).unwrap();
        matrix.assign(&roster, TeamId(0), Slot::new(3, Orientation::Home), TeamId(27));
        assert!(matches!(
            check_matrix(&roster, &matrix),
            Err(Violation::CountryCap { team: TeamId(0), count: 3, .. })
        ));
    }
}
