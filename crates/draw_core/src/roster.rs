//! Team roster
//!
//! Teams are loaded once from a JSON array of records. A team's id is its
//! position in that array and never changes for the lifetime of a session.
//! Country labels are mapped to a dense `CountryId` at load time so the
//! constraint checks can count countries in a fixed-size array.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::RosterError;

pub const TEAM_COUNT: usize = 36;
pub const POT_COUNT: usize = 4;
pub const TEAMS_PER_POT: usize = TEAM_COUNT / POT_COUNT;

/// At most this many opponents may share a (foreign) country.
pub const COUNTRY_CAP: u8 = 2;

const UCL_2024_ROSTER: &str = include_str!("../data/ucl_2024_teams.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u8);

impl TeamId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(pub u8);

impl CountryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One roster entry as it appears in the input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub name: String,
    pub country: String,
    pub pot: u8,
    /// Badge image reference (presentation only)
    #[serde(default)]
    pub logo: Option<String>,
    /// Prior titles (presentation only)
    #[serde(default)]
    pub champions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub country: CountryId,
    pub country_label: String,
    /// 1-based pot number
    pub pot: u8,
    pub logo: Option<String>,
    pub champions: u32,
}

impl Team {
    /// 0-based pot index, the form slots use.
    pub fn pot_index(&self) -> usize {
        (self.pot - 1) as usize
    }
}

/// Per-country counter indexed by `CountryId`.
///
/// A roster never has more countries than teams, so a fixed array covers
/// every possible label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryTally([u8; TEAM_COUNT]);

impl Default for CountryTally {
    fn default() -> Self {
        Self([0; TEAM_COUNT])
    }
}

impl CountryTally {
    pub fn add(&mut self, country: CountryId) {
        self.0[country.index()] += 1;
    }

    pub fn get(&self, country: CountryId) -> u8 {
        self.0[country.index()]
    }

    /// True when another opponent from `country` would break the cap.
    pub fn is_capped(&self, country: CountryId) -> bool {
        self.get(country) >= COUNTRY_CAP
    }
}

#[derive(Debug, Clone)]
pub struct Roster {
    teams: Vec<Team>,
    countries: Vec<String>,
    popularity: CountryTally,
}

impl Roster {
    pub fn from_records(records: Vec<TeamRecord>) -> Result<Self, RosterError> {
        if records.len() != TEAM_COUNT {
            return Err(RosterError::TeamCount { expected: TEAM_COUNT, found: records.len() });
        }

        let mut countries: Vec<String> = Vec::new();
        let mut popularity = CountryTally::default();
        let mut pot_sizes = [0usize; POT_COUNT];
        let mut teams = Vec::with_capacity(records.len());

        for (idx, record) in records.into_iter().enumerate() {
            if record.pot == 0 || record.pot as usize > POT_COUNT {
                return Err(RosterError::InvalidPot { team: record.name, pot: record.pot });
            }
            let label = record.country.trim();
            if label.is_empty() {
                return Err(RosterError::EmptyCountry { team: record.name });
            }

            let country = match countries.iter().position(|c| c == label) {
                Some(pos) => CountryId(pos as u8),
                None => {
                    countries.push(label.to_string());
                    CountryId((countries.len() - 1) as u8)
                }
            };
            popularity.add(country);
            pot_sizes[(record.pot - 1) as usize] += 1;

            teams.push(Team {
                id: TeamId(idx as u8),
                name: record.name,
                country,
                country_label: label.to_string(),
                pot: record.pot,
                logo: record.logo,
                champions: record.champions,
            });
        }

        for (pot, &found) in pot_sizes.iter().enumerate() {
            if found != TEAMS_PER_POT {
                return Err(RosterError::PotSize {
                    pot: (pot + 1) as u8,
                    expected: TEAMS_PER_POT,
                    found,
                });
            }
        }

        tracing::debug!(teams = teams.len(), countries = countries.len(), "roster loaded");
        Ok(Self { teams, countries, popularity })
    }

    pub fn from_json_str(json: &str) -> Result<Self, RosterError> {
        let records: Vec<TeamRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The 2024/25 Champions League league-phase pots.
    pub fn ucl_2024() -> Result<Self, RosterError> {
        Self::from_json_str(UCL_2024_ROSTER)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> &Team {
        &self.teams[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.teams.iter().map(|t| t.id)
    }

    pub fn name(&self, id: TeamId) -> &str {
        &self.teams[id.index()].name
    }

    pub fn country_of(&self, id: TeamId) -> CountryId {
        self.teams[id.index()].country
    }

    pub fn pot_index(&self, id: TeamId) -> usize {
        self.teams[id.index()].pot_index()
    }

    /// Teams drawn from the given 0-based pot, in id order.
    pub fn pot_members(&self, pot_index: usize) -> impl Iterator<Item = TeamId> + '_ {
        self.teams.iter().filter(move |t| t.pot_index() == pot_index).map(|t| t.id)
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn country_label(&self, country: CountryId) -> &str {
        &self.countries[country.index()]
    }

    /// Number of roster teams sharing this country.
    pub fn popularity(&self, country: CountryId) -> u8 {
        self.popularity.get(country)
    }

    pub fn find(&self, name: &str) -> Option<TeamId> {
        self.teams.iter().find(|t| t.name.eq_ignore_ascii_case(name)).map(|t| t.id)
    }

    /// Whether `id` names a team of this roster. Decoded states may carry
    /// any byte.
    pub fn contains(&self, id: TeamId) -> bool {
        id.index() < self.teams.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a roster with the given country label per team id.
    /// Teams `9 * p .. 9 * p + 9` go to pot `p + 1`.
    pub fn roster_with_countries(countries: &[&str]) -> Roster {
        let records = countries
            .iter()
            .enumerate()
            .map(|(idx, country)| TeamRecord {
                name: format!("Team {}", idx),
                country: country.to_string(),
                pot: (idx / TEAMS_PER_POT + 1) as u8,
                logo: None,
                champions: 0,
            })
            .collect();
        Roster::from_records(records).unwrap()
    }

    /// Every team from its own country: no country constraint ever binds.
    pub fn distinct_country_roster() -> Roster {
        let labels: Vec<String> = (0..TEAM_COUNT).map(|i| format!("C{:02}", i)).collect();
        let refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
        roster_with_countries(&refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ucl_roster_loads() {
        let roster = Roster::ucl_2024().unwrap();
        assert_eq!(roster.len(), TEAM_COUNT);
        for pot in 0..POT_COUNT {
            assert_eq!(roster.pot_members(pot).count(), TEAMS_PER_POT);
        }

        let madrid = roster.find("Real Madrid").unwrap();
        assert_eq!(madrid, TeamId(0));
        assert_eq!(roster.team(madrid).pot, 1);
        assert_eq!(roster.team(madrid).champions, 15);

        let eng = roster.country_of(roster.find("Arsenal FC").unwrap());
        assert_eq!(roster.country_label(eng), "ENG");
        assert_eq!(roster.popularity(eng), 4);
    }

    #[test]
    fn test_ids_follow_record_order() {
        let roster = Roster::ucl_2024().unwrap();
        for (idx, team) in roster.teams().iter().enumerate() {
            assert_eq!(team.id.index(), idx);
        }
    }

    #[test]
    fn test_rejects_wrong_team_count() {
        let err = Roster::from_records(Vec::new()).unwrap_err();
        assert!(matches!(err, RosterError::TeamCount { expected: 36, found: 0 }));
    }

    #[test]
    fn test_rejects_unbalanced_pots() {
        let mut records: Vec<TeamRecord> = (0..TEAM_COUNT)
            .map(|idx| TeamRecord {
                name: format!("T{}", idx),
                country: "X".into(),
                pot: (idx / TEAMS_PER_POT + 1) as u8,
                logo: None,
                champions: 0,
            })
            .collect();
        records[0].pot = 2;

        let err = Roster::from_records(records).unwrap_err();
        assert!(matches!(err, RosterError::PotSize { pot: 1, found: 8, .. }));
    }

    #[test]
    fn test_rejects_bad_pot_and_country() {
        let json = r#"[{"name": "A", "country": "ESP", "pot": 5}]"#;
        let records: Vec<TeamRecord> = serde_json::from_str(json).unwrap();
        let mut all = vec![records[0].clone(); TEAM_COUNT];
        assert!(matches!(
            Roster::from_records(all.clone()),
            Err(RosterError::InvalidPot { pot: 5, .. })
        ));

        all[0].pot = 1;
        all[0].country = "  ".into();
        assert!(matches!(Roster::from_records(all), Err(RosterError::EmptyCountry { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teams.json");
        std::fs::write(&path, UCL_2024_ROSTER).unwrap();

        let roster = Roster::load(&path).unwrap();
        assert_eq!(roster.name(TeamId(35)), "Stade Brestois 29");

        let missing = Roster::load(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(RosterError::Io(_))));
    }

    #[test]
    fn test_contains_and_country_count() {
        let roster = Roster::ucl_2024().unwrap();
        assert!(roster.contains(TeamId(0)));
        assert!(roster.contains(TeamId(35)));
        assert!(!roster.contains(TeamId(36)));
        assert!(!roster.contains(TeamId(255)));
        // ESP ENG GER FRA ITA POR BEL UKR NED CRO AUT SRB SUI SCO SVK CZE
        assert_eq!(roster.country_count(), 16);
    }

    #[test]
    fn test_country_tally_cap() {
        let mut tally = CountryTally::default();
        let c = CountryId(4);
        assert!(!tally.is_capped(c));
        tally.add(c);
        assert!(!tally.is_capped(c));
        tally.add(c);
        assert!(tally.is_capped(c));
        assert_eq!(tally.get(CountryId(0)), 0);
    }
}
