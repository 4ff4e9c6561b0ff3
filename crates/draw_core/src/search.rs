//! Backtracking search
//!
//! Proves that a focus team's slots can be filled in a way that still leaves
//! the whole draw completable. The search fills the focus team one slot at a
//! time, always taking the open slot with the fewest legal opponents, and
//! propagates forced moves after every tentative pairing. It then cascades
//! into the remaining unrevealed teams one at a time until every team is
//! resolved. The first complete assignment found wins.
//!
//! Branches share one working matrix with an undo log: a failed branch rolls
//! back to its mark instead of discarding a copy.
//!
//! Each attempt runs under a node budget of `restart_unit` times the Luby
//! sequence (1, 1, 2, 1, 1, 2, 4, ...). An attempt that spends its budget is
//! abandoned and the search starts over from the committed state with a new
//! candidate order. An attempt that ends within its budget is conclusive.

use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::constraints::legal_opponents;
use crate::error::SearchError;
use crate::fixture::{Assign, FixtureMatrix, Slot, TrailedMatrix, SLOTS_PER_TEAM};
use crate::log::{DecisionLog, DrawEvent};
use crate::propagate::propagate;
use crate::roster::{Roster, TeamId};

pub const DEFAULT_RESTART_UNIT: u64 = 200;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 256;

/// Picks the next team the search should resolve after the current focus.
pub trait NextTeam {
    fn name(&self) -> &'static str;

    /// `resolved[id]` is true for teams already handled (revealed, or
    /// resolved earlier in this search). `None` ends the search.
    fn next_team(&self, roster: &Roster, matrix: &FixtureMatrix, resolved: &[bool]) -> Option<TeamId>;
}

/// Team from the country with the most roster entries; ties go to the
/// lowest id. Big countries run out of legal opponents first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostPopularCountry;

impl NextTeam for MostPopularCountry {
    fn name(&self) -> &'static str {
        "most_popular_country"
    }

    fn next_team(&self, roster: &Roster, _matrix: &FixtureMatrix, resolved: &[bool]) -> Option<TeamId> {
        let mut best: Option<(u8, TeamId)> = None;
        for team in roster.ids().filter(|t| !resolved[t.index()]) {
            let popularity = roster.popularity(roster.country_of(team));
            match best {
                Some((best_pop, _)) if popularity <= best_pop => {}
                _ => best = Some((popularity, team)),
            }
        }
        best.map(|(_, team)| team)
    }
}

/// Team with the fewest open slots; ties go to the lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestOpenSlots;

impl NextTeam for FewestOpenSlots {
    fn name(&self) -> &'static str {
        "fewest_open_slots"
    }

    fn next_team(&self, roster: &Roster, matrix: &FixtureMatrix, resolved: &[bool]) -> Option<TeamId> {
        roster
            .ids()
            .filter(|t| !resolved[t.index()])
            .min_by_key(|&t| (matrix.open_slots(t), t))
    }
}

/// Term `i` of the Luby sequence, counting from 1.
pub fn luby(i: u32) -> u64 {
    let mut i = u64::from(i.max(1));
    loop {
        let mut k = 1;
        while (1u64 << k) - 1 < i {
            k += 1;
        }
        if i == (1u64 << k) - 1 {
            return 1u64 << (k - 1);
        }
        i -= (1u64 << (k - 1)) - 1;
    }
}

/// Tentative pairings one attempt may try. No limit never runs out.
#[derive(Debug, Clone, Copy, Default)]
struct NodeBudget {
    limit: Option<u64>,
    spent: u64,
}

impl NodeBudget {
    fn new(limit: Option<u64>) -> Self {
        Self { limit, spent: 0 }
    }

    /// Counts one node and reports whether the attempt may go on.
    #[inline]
    fn tick(&mut self) -> bool {
        self.spent += 1;
        !self.is_exceeded()
    }

    #[inline]
    fn is_exceeded(&self) -> bool {
        self.limit.is_some_and(|limit| self.spent > limit)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Tentative pairings tried, over all attempts
    pub nodes: u64,
    /// Pairings undone after their subtree failed
    pub backtracks: u64,
    /// Moves committed by propagation, including ones later undone
    pub forced_commits: u64,
    /// Deepest chain of (team, slot) positions on the search path
    pub max_depth: usize,
    /// Attempts started; every one but the last ran out of nodes
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// A complete, valid assignment for every team.
    pub matrix: FixtureMatrix,
    pub stats: SearchStats,
}

/// How one subtree ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Solved,
    Dead,
    OutOfNodes,
}

pub struct Search<'a, R: RngCore + ?Sized> {
    roster: &'a Roster,
    heuristic: &'a dyn NextTeam,
    rng: &'a mut R,
    log: &'a mut DecisionLog,
    shuffle: bool,
    trace: bool,
    restart_unit: u64,
    max_attempts: u32,
    budget: NodeBudget,
    retry_rng: Option<ChaCha8Rng>,
    stats: SearchStats,
}

impl<'a, R: RngCore + ?Sized> Search<'a, R> {
    pub fn new(
        roster: &'a Roster,
        heuristic: &'a dyn NextTeam,
        rng: &'a mut R,
        log: &'a mut DecisionLog,
    ) -> Self {
        Self {
            roster,
            heuristic,
            rng,
            log,
            shuffle: true,
            trace: false,
            restart_unit: DEFAULT_RESTART_UNIT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            budget: NodeBudget::default(),
            retry_rng: None,
            stats: SearchStats::default(),
        }
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Records every candidate list and tentative pairing in the log.
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Node budget unit and attempt cap. A unit of 0 runs one unbounded
    /// attempt.
    pub fn restarts(mut self, unit: u64, max_attempts: u32) -> Self {
        self.restart_unit = unit;
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Completes `matrix` with `focus` resolved first. `revealed` lists the
    /// teams whose draw is already settled; they are never cascaded into.
    pub fn complete(
        mut self,
        matrix: &FixtureMatrix,
        focus: TeamId,
        revealed: &[TeamId],
    ) -> Result<SearchOutcome, SearchError> {
        tracing::debug!(team = %focus, heuristic = self.heuristic.name(), "search started");

        let max_attempts = if self.restart_unit == 0 { 1 } else { self.max_attempts };
        for attempt in 1..=max_attempts {
            self.stats.attempts = attempt;
            let limit = (self.restart_unit > 0).then(|| self.restart_unit.saturating_mul(luby(attempt)));
            self.budget = NodeBudget::new(limit);
            // Unshuffled retries take their order from the attempt number,
            // never from the caller's generator.
            self.retry_rng = (attempt > 1 && !self.shuffle).then(|| ChaCha8Rng::seed_from_u64(u64::from(attempt)));

            let mut resolved = vec![false; self.roster.len()];
            for team in revealed {
                resolved[team.index()] = true;
            }
            resolved[focus.index()] = true;
            let mut work = TrailedMatrix::new(matrix.clone());

            match self.descend(&mut work, focus, &mut resolved, 0) {
                Walk::Solved => {
                    self.log.push(DrawEvent::SolutionFound {
                        nodes: self.stats.nodes,
                        backtracks: self.stats.backtracks,
                    });
                    tracing::debug!(
                        team = %focus,
                        nodes = self.stats.nodes,
                        backtracks = self.stats.backtracks,
                        max_depth = self.stats.max_depth,
                        attempts = attempt,
                        "search succeeded"
                    );
                    return Ok(SearchOutcome { matrix: work.into_matrix(), stats: self.stats });
                }
                Walk::Dead => {
                    tracing::warn!(team = %focus, nodes = self.stats.nodes, "search exhausted");
                    return Err(SearchError::Exhausted { team: focus, nodes: self.stats.nodes });
                }
                Walk::OutOfNodes => {
                    self.log.push(DrawEvent::Restarted { attempt, nodes: self.budget.spent });
                    tracing::debug!(team = %focus, attempt, nodes = self.budget.spent, "attempt out of nodes");
                }
            }
        }

        tracing::warn!(team = %focus, attempts = max_attempts, nodes = self.stats.nodes, "search gave up");
        Err(SearchError::GaveUp { team: focus, attempts: max_attempts, nodes: self.stats.nodes })
    }

    /// Open slot of `team` with the fewest legal opponents, together with
    /// those opponents. Ties go to the lower slot; `None` once the team is
    /// full.
    fn tightest_slot(&self, matrix: &FixtureMatrix, team: TeamId) -> Option<(Slot, Vec<TeamId>)> {
        let mut best: Option<(Slot, Vec<TeamId>)> = None;
        for slot in Slot::all().filter(|&slot| matrix.get(team, slot).is_none()) {
            let candidates = legal_opponents(self.roster, matrix, team, slot);
            let dead = candidates.is_empty();
            if best.as_ref().map_or(true, |(_, tightest)| candidates.len() < tightest.len()) {
                best = Some((slot, candidates));
            }
            if dead {
                break;
            }
        }
        best
    }

    fn order(&mut self, candidates: &mut [TeamId]) {
        if let Some(rng) = self.retry_rng.as_mut() {
            candidates.shuffle(rng);
        } else if self.shuffle {
            candidates.shuffle(&mut *self.rng);
        }
    }

    /// `depth` counts (team, slot) positions on the current path, so it never
    /// exceeds 8 slots times the number of teams.
    fn descend(&mut self, work: &mut TrailedMatrix, focus: TeamId, resolved: &mut [bool], depth: usize) -> Walk {
        let Some((slot, mut candidates)) = self.tightest_slot(work.matrix(), focus) else {
            if self.trace {
                self.log.push(DrawEvent::TeamResolved { team: focus });
            }
            let Some(next) = self.heuristic.next_team(self.roster, work.matrix(), resolved) else {
                return Walk::Solved;
            };
            resolved[next.index()] = true;
            let walk = self.descend(work, next, resolved, depth);
            if walk == Walk::Dead {
                resolved[next.index()] = false;
            }
            return walk;
        };

        let depth = depth + 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        debug_assert!(depth <= SLOTS_PER_TEAM * self.roster.len());

        self.order(&mut candidates);
        if self.trace {
            self.log.push(DrawEvent::Candidates { team: focus, slot, candidates: candidates.clone() });
        }
        if candidates.is_empty() {
            if self.trace {
                self.log.push(DrawEvent::DeadEnd { team: focus, slot });
            }
            return Walk::Dead;
        }

        for opponent in candidates {
            self.stats.nodes += 1;
            if !self.budget.tick() {
                return Walk::OutOfNodes;
            }
            if self.trace {
                self.log.push(DrawEvent::Tried { team: focus, slot, opponent });
            }

            let mark = work.mark();
            work.assign(self.roster, focus, slot, opponent);
            match propagate(self.roster, work) {
                Ok(forced) => {
                    self.stats.forced_commits += forced.len() as u64;
                    if self.trace {
                        for mv in forced {
                            self.log.push(DrawEvent::Forced { team: mv.team, slot: mv.slot, opponent: mv.opponent });
                        }
                    }
                }
                Err(infeasible) => {
                    if self.trace {
                        self.log.push(DrawEvent::DeadEnd { team: infeasible.team, slot: infeasible.slot });
                    }
                    work.rollback(mark);
                    continue;
                }
            }

            match self.descend(work, focus, resolved, depth) {
                Walk::Dead => {
                    work.rollback(mark);
                    self.stats.backtracks += 1;
                }
                walk => return walk,
            }
        }

        if self.trace {
            self.log.push(DrawEvent::DeadEnd { team: focus, slot });
        }
        Walk::Dead
    }
}
