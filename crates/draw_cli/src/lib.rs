//! League Draw CLI library
//!
//! Roster/config loading, full draw runs and state verification for the
//! `league_draw` binary.

use anyhow::{Context, Result};
use draw_core::{
    check_matrix, expand, CompressedState, DrawConfig, DrawResult, DrawSession, Roster, TeamId,
};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Draw output written by `run --out`
#[derive(Debug, Clone, Serialize)]
pub struct DrawReport {
    /// Engine version that produced the draw
    pub engine_version: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    /// Roster file, or "embedded" for the built-in roster
    pub roster: String,
    #[serde(flatten)]
    pub result: DrawResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub fixtures: usize,
    pub complete: bool,
    pub violation: Option<String>,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.violation.is_none()
    }
}

/// Options for a single `run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub seed: Option<u64>,
    pub no_shuffle: bool,
}

pub fn load_roster(path: Option<&Path>) -> Result<Roster> {
    match path {
        Some(path) => Roster::load(path)
            .with_context(|| format!("Failed to load roster: {}", path.display())),
        None => Roster::ucl_2024().context("Failed to load embedded roster"),
    }
}

/// Config file when given, otherwise `LEAGUE_DRAW_CONFIG_PATH`, otherwise
/// defaults. Command-line options override the file.
pub fn load_config(path: Option<&Path>, options: &RunOptions) -> Result<DrawConfig> {
    let mut config = match path {
        Some(path) => {
            let path_str = path.to_str().context("Config path is not valid UTF-8")?;
            DrawConfig::load(path_str)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => DrawConfig::from_env().context("Failed to load config from environment")?,
    };
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    if options.no_shuffle {
        config.shuffle_candidates = false;
    }
    Ok(config)
}

/// Runs a full draw and returns the session for inspection with the report.
pub fn run_draw(roster: Roster, config: DrawConfig, roster_label: &str) -> Result<(DrawSession, DrawReport)> {
    tracing::info!(
        roster = roster_label,
        seed = ?config.seed,
        heuristic = ?config.heuristic,
        shuffle = config.shuffle_candidates,
        "starting draw"
    );
    let mut session = DrawSession::new(roster, config);
    let result = session.run_to_completion().context("Draw did not complete")?;
    tracing::info!(seed = ?result.seed, fixtures = result.fixtures.len(), "draw complete");
    let report = DrawReport {
        engine_version: draw_core::VERSION.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        roster: roster_label.to_string(),
        result,
    };
    Ok((session, report))
}

pub fn write_report(path: &Path, report: &DrawReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

/// Decodes a dashed state and checks it against the roster.
pub fn verify_state(roster: &Roster, state: &str) -> Result<VerifyReport> {
    let state: CompressedState = state.parse().context("Failed to parse state")?;
    let matrix = expand(roster, &state).context("State does not fit the roster")?;
    let violation = check_matrix(roster, &matrix).err().map(|v| v.to_string());
    Ok(VerifyReport { fixtures: state.len(), complete: matrix.is_complete(), violation })
}

/// One line per team: name, country and its eight opponents by pot.
pub fn format_fixtures(session: &DrawSession) -> Vec<String> {
    let roster = session.roster();
    let name = |team: Option<TeamId>| team.map(|t| roster.name(t)).unwrap_or("-");
    roster
        .teams()
        .iter()
        .map(|team| {
            let cells: Vec<String> = session
                .fixtures_for(team.id)
                .iter()
                .map(|f| format!("P{} H: {} / A: {}", f.pot, name(f.home), name(f.away)))
                .collect();
            format!("{} ({}) | {}", team.name, team.country_label, cells.join(" | "))
        })
        .collect()
}
