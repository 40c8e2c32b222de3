// Result reporting: turns a finished search into caller-facing data.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::partition::TeamPartition;
use crate::player::{Player, Position};
use crate::search::{BalanceOutcome, StopReason};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub overall: f64,
    pub position: Position,
}

impl From<&Player> for PlayerSummary {
    fn from(p: &Player) -> Self {
        PlayerSummary {
            name: p.name().to_string(),
            overall: p.rating(),
            position: p.position(),
        }
    }
}

/// One team of the final partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamReport {
    /// 1-based.
    pub team_number: usize,
    pub players: Vec<PlayerSummary>,
    pub total_rating: f64,
    pub average_rating: f64,
    /// Every position is present, including zero counts.
    pub position_distribution: BTreeMap<Position, usize>,
}

/// Everything a caller needs to present a balancing result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    pub teams: Vec<TeamReport>,
    pub cost: f64,
    /// Mean rating over all players; 0.0 for an empty pool.
    pub overall_mean: f64,
    /// Largest gap between two team average ratings.
    pub max_rating_difference: f64,
    pub warnings: Vec<String>,
    pub attempts_run: usize,
    pub stop_reason: StopReason,
    pub seed: u64,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl BalanceReport {
    pub fn from_outcome(outcome: &BalanceOutcome<'_>) -> Self {
        let partition = &outcome.best.partition;
        let teams = team_reports(partition);

        let players = partition.players();
        let overall_mean = if players.is_empty() {
            0.0
        } else {
            players.iter().map(Player::rating).sum::<f64>() / players.len() as f64
        };

        let averages: Vec<f64> = teams.iter().map(|t| t.average_rating).collect();
        let max_rating_difference = if averages.is_empty() {
            0.0
        } else {
            let max = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = averages.iter().copied().fold(f64::INFINITY, f64::min);
            max - min
        };

        BalanceReport {
            teams,
            cost: outcome.best.cost,
            overall_mean,
            max_rating_difference,
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
            attempts_run: outcome.stats.attempts_run,
            stop_reason: outcome.stats.stop_reason,
            seed: outcome.stats.seed,
        }
    }

    /// Plain-text rendering. Same as the `Display` output.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

/// One block per team with players grouped by position (highest rating
/// first), then overall statistics.
impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(50);

        writeln!(f, "=== BALANCED TEAMS ===")?;
        for team in &self.teams {
            writeln!(f)?;
            writeln!(f, "Team {}:", team.team_number)?;
            writeln!(f, "{rule}")?;
            writeln!(f, "Average Rating: {:.2}", team.average_rating)?;

            for pos in Position::ALL {
                let mut at_pos: Vec<&PlayerSummary> =
                    team.players.iter().filter(|p| p.position == pos).collect();
                if at_pos.is_empty() {
                    continue;
                }
                at_pos.sort_by(|a, b| b.overall.total_cmp(&a.overall));
                writeln!(f, "{pos}:")?;
                for p in at_pos {
                    writeln!(f, "- {} (Rating: {:.1})", p.name, p.overall)?;
                }
            }

            let dist: Vec<String> = team
                .position_distribution
                .iter()
                .map(|(pos, n)| format!("{pos}: {n}"))
                .collect();
            writeln!(f, "Position Distribution: {}", dist.join(", "))?;
            writeln!(f, "Total Team Rating: {:.2}", team.total_rating)?;
        }

        writeln!(f)?;
        writeln!(f, "=== OVERALL STATISTICS ===")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Overall player mean rating: {:.2}", self.overall_mean)?;
        writeln!(f, "Team Means:")?;
        for team in &self.teams {
            writeln!(f, "Team {}: {:.2}", team.team_number, team.average_rating)?;
        }
        writeln!(
            f,
            "Maximum difference between team means: {:.2}",
            self.max_rating_difference
        )?;
        writeln!(f, "Imbalance cost: {:.4}", self.cost)?;
        writeln!(f, "Attempts run: {} (seed {})", self.attempts_run, self.seed)?;
        for w in &self.warnings {
            writeln!(f, "Warning: {w}")?;
        }
        Ok(())
    }
}

fn team_reports(partition: &TeamPartition<'_>) -> Vec<TeamReport> {
    let players = partition.players();
    partition
        .teams()
        .iter()
        .enumerate()
        .map(|(i, team)| TeamReport {
            team_number: i + 1,
            players: team
                .member_indices()
                .iter()
                .map(|&m| PlayerSummary::from(&players[m]))
                .collect(),
            total_rating: team.rating_total(),
            average_rating: team.rating_average(),
            position_distribution: team.position_counts().iter().collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
