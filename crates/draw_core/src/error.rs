use thiserror::Error;

use crate::fixture::Slot;
use crate::invariants::Violation;
use crate::roster::TeamId;
use crate::session::DrawStatus;

/// A slot with no legal opponent left. Raised by propagation and search;
/// the search recovers from it by backtracking.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no legal opponent for team {team} at {slot}")]
pub struct Infeasible {
    pub team: TeamId,
    pub slot: Slot,
}

/// Why `Search::complete` returned without a completion.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// The whole tree was explored: no completion exists.
    #[error("no completion exists for team {team} ({nodes} nodes explored)")]
    Exhausted { team: TeamId, nodes: u64 },

    /// Every attempt ran out of nodes before finding a completion.
    #[error("search for team {team} gave up after {attempts} attempts ({nodes} nodes)")]
    GaveUp { team: TeamId, attempts: u32, nodes: u64 },
}

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Roster JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid team count: expected {expected}, found {found}")]
    TeamCount { expected: usize, found: usize },

    #[error("Pot {pot} has {found} teams, expected {expected}")]
    PotSize { pot: u8, expected: usize, found: usize },

    #[error("Team '{team}' has invalid pot {pot}")]
    InvalidPot { team: String, pot: u8 },

    #[error("Team '{team}' has an empty country label")]
    EmptyCountry { team: String },
}

/// Structurally invalid compressed state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Odd-length encoding: {len} ids")]
    OddLength { len: usize },

    #[error("Unknown team {team}")]
    UnknownTeam { team: TeamId },

    #[error("Team {team} paired with itself")]
    SelfPair { team: TeamId },

    #[error("Slot conflict for team {team} at {slot}: holds {existing}, got {incoming}")]
    SlotConflict { team: TeamId, slot: Slot, existing: TeamId, incoming: TeamId },

    #[error("Invalid number in encoded state: '{0}'")]
    InvalidNumber(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Session-level failures.
#[derive(Error, Debug)]
pub enum DrawError {
    #[error("Cannot {operation} while status is {status}")]
    Protocol { operation: &'static str, status: DrawStatus },

    #[error("No valid completion exists for team {team}")]
    NoCompletion { team: TeamId },

    #[error("Search for team {team} gave up after {attempts} attempts; raise max_attempts or restart_unit")]
    SearchGaveUp { team: TeamId, attempts: u32 },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] Violation),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),
}

impl DrawError {
    /// Protocol violations leave the session untouched, so the caller can
    /// check the status and try again. Everything else means the draw is
    /// broken and must be restarted.
    pub fn is_recoverable(&self) -> bool {
        match self {
            DrawError::Protocol { .. } => true,
            DrawError::NoCompletion { .. } => false,
            DrawError::SearchGaveUp { .. } => false,
            DrawError::Codec(_) => false,
            DrawError::Invariant(_) => false,
            DrawError::Roster(_) => false,
        }
    }
}

impl From<SearchError> for DrawError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Exhausted { team, .. } => DrawError::NoCompletion { team },
            SearchError::GaveUp { team, attempts, .. } => DrawError::SearchGaveUp { team, attempts },
        }
    }
}

pub type Result<T> = std::result::Result<T, DrawError>;
