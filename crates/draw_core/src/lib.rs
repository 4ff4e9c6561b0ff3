//! # draw_core - League Phase Draw Engine
//!
//! Pairs 36 teams from four pots of nine so that every team meets two
//! opponents from each pot, one at home and one away, never meets a team
//! from its own country and meets at most two teams from any other country.
//!
//! ## Features
//! - Interactive reveal/select protocol, pot by pot
//! - Every committed state is proven completable before it is accepted
//! - Forced-move propagation and backtracking search with an undo trail
//! - Seeded draws are fully reproducible
//! - Compact state encoding for persistence and verification
//! - JSON API for hosts that only speak JSON

pub mod api;
pub mod codec;
pub mod config;
pub mod constraints;
pub mod error;
pub mod fixture;
pub mod invariants;
pub mod log;
pub mod propagate;
pub mod roster;
pub mod search;
pub mod session;

pub use api::{run_draw_json, verify_state_json, DrawRequest, DrawResponse, VerifyResponse};
pub use codec::{compress, expand, CompressedState};
pub use config::{DrawConfig, HeuristicKind, CONFIG_PATH_ENV};
pub use constraints::legal_opponents;
pub use error::{CodecError, ConfigError, DrawError, Infeasible, Result, RosterError, SearchError};
pub use fixture::{Assign, FixtureMatrix, Orientation, Slot, TrailedMatrix, SLOTS_PER_TEAM};
pub use invariants::{check_matrix, Violation};
pub use log::{DecisionLog, DrawEvent};
pub use propagate::{propagate, propagate_once, ForcedMove};
pub use roster::{
    CountryId, Roster, Team, TeamId, TeamRecord, COUNTRY_CAP, POT_COUNT, TEAMS_PER_POT, TEAM_COUNT,
};
pub use search::{
    luby, FewestOpenSlots, MostPopularCountry, NextTeam, Search, SearchOutcome, SearchStats, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RESTART_UNIT,
};
pub use session::{DrawResult, DrawSession, DrawStatus, FixtureLine, PotFixtures};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
