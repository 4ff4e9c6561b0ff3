//! Draw session
//!
//! Owns the persisted draw state and drives it through the reveal/select
//! cycle pot by pot:
//!
//! ```text
//! WaitingReveal -> Revealing -> WaitingSelect | WaitingReveal | WaitingNextPot | WaitingDone
//! WaitingSelect -> Selecting -> WaitingReveal | WaitingNextPot | WaitingDone
//! WaitingNextPot -> WaitingReveal      (advance_pot)
//! WaitingDone    -> Done               (finish)
//! ```
//!
//! The persisted matrix changes in exactly one place: `select_opponents`
//! commits the focus team's eight slots taken from a search result. Every
//! other pairing the search made while proving feasibility is thrown away.

use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt;

use crate::codec::{compress, CompressedState};
use crate::config::DrawConfig;
use crate::error::{DrawError, Result};
use crate::fixture::{Assign, FixtureMatrix, Orientation, Slot};
use crate::invariants::check_matrix;
use crate::log::{DecisionLog, DrawEvent};
use crate::roster::{Roster, TeamId, POT_COUNT, TEAMS_PER_POT};
use crate::search::{NextTeam, Search, SearchStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    WaitingReveal,
    Revealing,
    WaitingSelect,
    Selecting,
    WaitingNextPot,
    WaitingDone,
    Done,
}

impl fmt::Display for DrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DrawStatus::WaitingReveal => "waiting_reveal",
            DrawStatus::Revealing => "revealing",
            DrawStatus::WaitingSelect => "waiting_select",
            DrawStatus::Selecting => "selecting",
            DrawStatus::WaitingNextPot => "waiting_next_pot",
            DrawStatus::WaitingDone => "waiting_done",
            DrawStatus::Done => "done",
        };
        f.write_str(s)
    }
}

/// Home and away opponents a team has against one pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PotFixtures {
    pub pot: u8,
    pub home: Option<TeamId>,
    pub away: Option<TeamId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixtureLine {
    pub home: String,
    pub away: String,
}

/// Final draw export.
#[derive(Debug, Clone, Serialize)]
pub struct DrawResult {
    pub seed: Option<u64>,
    pub state: String,
    pub reveal_order: Vec<TeamId>,
    pub fixtures: Vec<FixtureLine>,
}

pub struct DrawSession<R: RngCore = ChaCha8Rng> {
    roster: Roster,
    config: DrawConfig,
    heuristic: Box<dyn NextTeam>,
    rng: R,
    seed: Option<u64>,
    matrix: FixtureMatrix,
    revealed: Vec<TeamId>,
    round: usize,
    current: Option<TeamId>,
    status: DrawStatus,
    log: DecisionLog,
    newly_drawn: Vec<TeamId>,
    last_reveal_skipped: bool,
    last_search: Option<SearchStats>,
}

impl DrawSession<ChaCha8Rng> {
    /// Seeds from `config.seed`, or from OS entropy when unset. The seed used
    /// is always available from `seed()`.
    pub fn new(roster: Roster, config: DrawConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let rng = ChaCha8Rng::seed_from_u64(seed);
        Self::with_rng(roster, config, rng, Some(seed))
    }

    /// Restarts with a new seed.
    pub fn restart_with_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = Some(seed);
        self.restart();
    }
}

impl<R: RngCore> DrawSession<R> {
    /// Uses an injected generator. `seed` is informational only.
    pub fn with_rng(roster: Roster, config: DrawConfig, rng: R, seed: Option<u64>) -> Self {
        let heuristic = config.heuristic.build();
        let log = DecisionLog::with_limit(config.log_limit);
        let matrix = FixtureMatrix::empty(&roster);
        tracing::info!(seed = ?seed, heuristic = heuristic.name(), "draw session created");
        Self {
            roster,
            config,
            heuristic,
            rng,
            seed,
            matrix,
            revealed: Vec::new(),
            round: 0,
            current: None,
            status: DrawStatus::WaitingReveal,
            log,
            newly_drawn: Vec::new(),
            last_reveal_skipped: false,
            last_search: None,
        }
    }

    /// Swaps in a custom cascade order for the search.
    pub fn set_heuristic(&mut self, heuristic: Box<dyn NextTeam>) {
        self.heuristic = heuristic;
    }

    // ========================
    // Operations
    // ========================

    /// Draws a random unrevealed team from the current pot.
    pub fn reveal_next(&mut self) -> Result<TeamId> {
        self.expect_status("reveal a team", DrawStatus::WaitingReveal)?;
        let remaining = self.remaining_in_pot();
        let Some(&team) = remaining.choose(&mut self.rng) else {
            return Err(DrawError::Protocol { operation: "reveal a team", status: self.status });
        };

        self.status = DrawStatus::Revealing;
        self.log.clear();
        self.newly_drawn.clear();
        self.revealed.push(team);
        self.current = Some(team);
        let pot = self.roster.team(team).pot;
        self.log.push(DrawEvent::Revealed { team, pot });
        tracing::info!(team = self.roster.name(team), pot, "team revealed");

        if self.matrix.is_team_complete(team) {
            self.last_reveal_skipped = true;
            self.log.push(DrawEvent::SelectionSkipped { team });
            tracing::info!(team = self.roster.name(team), "no selection needed");
            self.advance_after_resolve();
        } else {
            self.last_reveal_skipped = false;
            self.status = DrawStatus::WaitingSelect;
        }
        Ok(team)
    }

    /// Searches for a full completion focused on the current team and
    /// commits that team's fixtures. Returns the newly drawn opponents.
    pub fn select_opponents(&mut self) -> Result<Vec<TeamId>> {
        self.expect_status("select opponents", DrawStatus::WaitingSelect)?;
        let Some(focus) = self.current else {
            return Err(DrawError::Protocol { operation: "select opponents", status: self.status });
        };
        self.status = DrawStatus::Selecting;

        let outcome = Search::new(&self.roster, self.heuristic.as_ref(), &mut self.rng, &mut self.log)
            .shuffle(self.config.shuffle_candidates)
            .trace(self.config.trace_search)
            .restarts(self.config.restart_unit, self.config.max_attempts)
            .complete(&self.matrix, focus, &self.revealed);

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.status = DrawStatus::WaitingSelect;
                tracing::error!(team = self.roster.name(focus), error = %err, "selection failed");
                return Err(err.into());
            }
        };

        let mut next = self.matrix.clone();
        let mut newly_drawn = Vec::new();
        for slot in Slot::all() {
            let Some(opponent) = outcome.matrix.get(focus, slot) else {
                self.status = DrawStatus::WaitingSelect;
                return Err(DrawError::NoCompletion { team: focus });
            };
            let already = next.get(focus, slot);
            if already.is_none() {
                next.assign(&self.roster, focus, slot, opponent);
                newly_drawn.push(opponent);
            }
            self.log.push(DrawEvent::Drawn { team: focus, slot, opponent, new: already.is_none() });
        }

        if self.config.check_invariants {
            if let Err(violation) = check_matrix(&self.roster, &next) {
                self.status = DrawStatus::WaitingSelect;
                return Err(violation.into());
            }
        }

        self.matrix = next;
        self.last_search = Some(outcome.stats);
        self.newly_drawn = newly_drawn.clone();
        tracing::info!(
            team = self.roster.name(focus),
            new = newly_drawn.len(),
            nodes = outcome.stats.nodes,
            "opponents drawn"
        );
        self.advance_after_resolve();
        Ok(newly_drawn)
    }

    pub fn advance_pot(&mut self) -> Result<()> {
        self.expect_status("advance to the next pot", DrawStatus::WaitingNextPot)?;
        self.round += 1;
        self.status = DrawStatus::WaitingReveal;
        tracing::info!(pot = self.current_pot(), "next pot");
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.expect_status("finish the draw", DrawStatus::WaitingDone)?;
        self.status = DrawStatus::Done;
        tracing::info!(fixtures = compress(&self.matrix).len(), "draw finished");
        Ok(())
    }

    /// Drops every commitment and starts over. The generator keeps running,
    /// so the new draw differs from the previous one.
    pub fn restart(&mut self) {
        self.matrix = FixtureMatrix::empty(&self.roster);
        self.revealed.clear();
        self.round = 0;
        self.current = None;
        self.status = DrawStatus::WaitingReveal;
        self.log.clear();
        self.newly_drawn.clear();
        self.last_reveal_skipped = false;
        self.last_search = None;
        tracing::info!("draw restarted");
    }

    /// Drives the session from its current status to `Done`.
    pub fn run_to_completion(&mut self) -> Result<DrawResult> {
        loop {
            match self.status {
                DrawStatus::WaitingReveal => {
                    self.reveal_next()?;
                }
                DrawStatus::WaitingSelect => {
                    self.select_opponents()?;
                }
                DrawStatus::WaitingNextPot => self.advance_pot()?,
                DrawStatus::WaitingDone => self.finish()?,
                DrawStatus::Done => break,
                DrawStatus::Revealing | DrawStatus::Selecting => {
                    return Err(DrawError::Protocol { operation: "run the draw", status: self.status });
                }
            }
        }
        self.result()
    }

    fn advance_after_resolve(&mut self) {
        let count = self.revealed.len();
        if count % TEAMS_PER_POT == 0 {
            self.status = if count == self.roster.len() {
                DrawStatus::WaitingDone
            } else {
                DrawStatus::WaitingNextPot
            };
        } else {
            self.round += 1;
            self.status = DrawStatus::WaitingReveal;
        }
    }

    fn expect_status(&self, operation: &'static str, expected: DrawStatus) -> Result<()> {
        if self.status != expected {
            tracing::warn!(operation, status = %self.status, "operation rejected");
            return Err(DrawError::Protocol { operation, status: self.status });
        }
        Ok(())
    }

    // ========================
    // Accessors
    // ========================

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    pub fn matrix(&self) -> &FixtureMatrix {
        &self.matrix
    }

    pub fn compressed(&self) -> CompressedState {
        compress(&self.matrix)
    }

    pub fn status(&self) -> DrawStatus {
        self.status
    }

    pub fn current_team(&self) -> Option<TeamId> {
        self.current
    }

    pub fn revealed(&self) -> &[TeamId] {
        &self.revealed
    }

    pub fn round(&self) -> usize {
        self.round
    }

    /// 1-based pot the next reveal draws from.
    pub fn current_pot(&self) -> u8 {
        ((self.round / TEAMS_PER_POT).min(POT_COUNT - 1) + 1) as u8
    }

    pub fn remaining_in_pot(&self) -> Vec<TeamId> {
        let pot_index = (self.current_pot() - 1) as usize;
        self.roster.pot_members(pot_index).filter(|t| !self.revealed.contains(t)).collect()
    }

    pub fn decision_log(&self) -> &DecisionLog {
        &self.log
    }

    /// Opponents committed by the last selection (empty after a skip).
    pub fn newly_drawn(&self) -> &[TeamId] {
        &self.newly_drawn
    }

    pub fn last_reveal_skipped(&self) -> bool {
        self.last_reveal_skipped
    }

    pub fn last_search_stats(&self) -> Option<SearchStats> {
        self.last_search
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn fixtures_for(&self, team: TeamId) -> [PotFixtures; POT_COUNT] {
        std::array::from_fn(|pot| PotFixtures {
            pot: (pot + 1) as u8,
            home: self.matrix.get(team, Slot::new(pot, Orientation::Home)),
            away: self.matrix.get(team, Slot::new(pot, Orientation::Away)),
        })
    }

    /// Export of the finished draw.
    pub fn result(&self) -> Result<DrawResult> {
        self.expect_status("export the result", DrawStatus::Done)?;
        let state = self.compressed();
        let fixtures = state
            .pairs()
            .iter()
            .map(|&(home, away)| FixtureLine {
                home: self.roster.name(home).to_string(),
                away: self.roster.name(away).to_string(),
            })
            .collect();
        Ok(DrawResult {
            seed: self.seed,
            state: state.to_string(),
            reveal_order: self.revealed.clone(),
            fixtures,
        })
    }
}
