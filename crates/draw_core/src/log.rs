//! Decision log
//!
//! A human-readable trail of why each pairing was made: reveals, forced
//! moves, search branches and the final draw for a team. The session clears
//! it whenever a new team is revealed.

use serde::Serialize;

use crate::fixture::Slot;
use crate::roster::{Roster, TeamId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DrawEvent {
    Revealed { team: TeamId, pot: u8 },
    /// Every slot was already filled by earlier draws.
    SelectionSkipped { team: TeamId },
    Forced { team: TeamId, slot: Slot, opponent: TeamId },
    Candidates { team: TeamId, slot: Slot, candidates: Vec<TeamId> },
    Tried { team: TeamId, slot: Slot, opponent: TeamId },
    DeadEnd { team: TeamId, slot: Slot },
    TeamResolved { team: TeamId },
    /// An attempt ran out of nodes; the search starts over from the
    /// committed state with a fresh candidate order.
    Restarted { attempt: u32, nodes: u64 },
    SolutionFound { nodes: u64, backtracks: u64 },
    Drawn { team: TeamId, slot: Slot, opponent: TeamId, new: bool },
}

impl DrawEvent {
    pub fn describe(&self, roster: &Roster) -> String {
        let name = |id: &TeamId| roster.name(*id).to_string();
        match self {
            DrawEvent::Revealed { team, pot } => format!("{} drawn from pot {}", name(team), pot),
            DrawEvent::SelectionSkipped { team } => {
                format!("{} already has all opponents, no selection needed", name(team))
            }
            DrawEvent::Forced { team, slot, opponent } => {
                format!("Forced: {} vs {} ({})", name(team), name(opponent), slot)
            }
            DrawEvent::Candidates { team, slot, candidates } => {
                let names: Vec<String> = candidates.iter().map(name).collect();
                format!("Candidates for {} ({}): [{}]", name(team), slot, names.join(", "))
            }
            DrawEvent::Tried { team, slot, opponent } => {
                format!("Trying {} vs {} ({})", name(team), name(opponent), slot)
            }
            DrawEvent::DeadEnd { team, slot } => {
                format!("Dead end for {} at {}, going back", name(team), slot)
            }
            DrawEvent::TeamResolved { team } => format!("All opponents found for {}", name(team)),
            DrawEvent::Restarted { attempt, nodes } => {
                format!("Attempt {} gave up after {} nodes, starting over", attempt, nodes)
            }
            DrawEvent::SolutionFound { nodes, backtracks } => {
                format!("Found valid solution ({} nodes, {} backtracks)", nodes, backtracks)
            }
            DrawEvent::Drawn { team, slot, opponent, new } => {
                let tag = if *new { "" } else { " (already set)" };
                format!("Final: {} vs {} ({}){}", name(team), name(opponent), slot, tag)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DecisionLog {
    events: Vec<DrawEvent>,
    #[serde(skip)]
    limit: Option<usize>,
    /// Events discarded after the limit was reached
    dropped: usize,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }

    pub fn push(&mut self, event: DrawEvent) {
        tracing::trace!(?event, "draw event");
        if self.limit.is_some_and(|limit| self.events.len() >= limit) {
            self.dropped += 1;
            return;
        }
        self.events.push(event);
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn events(&self) -> &[DrawEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    pub fn lines(&self, roster: &Roster) -> Vec<String> {
        self.events.iter().map(|e| e.describe(roster)).collect()
    }
}
