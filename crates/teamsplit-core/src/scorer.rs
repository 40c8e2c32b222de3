// Imbalance scoring: reduces a partition to a single non-negative cost.
//
// cost = rating_weight * R + position_weight * P + shortfall_weight * S
//
// R: spread of team ratings (totals or averages)
// P: sum over positions of the spread of per-team counts
// S: total per-team shortfall below `minimum_per_position` (0 when disabled)

use serde::{Deserialize, Serialize};

use crate::partition::{PartitionError, TeamPartition};
use crate::player::Position;

// ---------------------------------------------------------------------------
// Scorer trait
// ---------------------------------------------------------------------------

/// Anything that can rank partitions. Lower is better; 0.0 is perfect.
///
/// Implementations may assume the partition is complete.
pub trait ImbalanceScorer {
    fn cost(&self, partition: &TeamPartition<'_>) -> f64;
}

// ---------------------------------------------------------------------------
// Spread statistic
// ---------------------------------------------------------------------------

/// How the dispersion of a per-team quantity is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spread {
    /// max - min
    #[default]
    Range,
    /// Population standard deviation (N denominator).
    StdDev,
}

impl Spread {
    /// Spread of a slice of values. Returns 0.0 for fewer than two values.
    pub fn of(&self, values: &[f64]) -> f64 {
        self.of_iter(values.iter().copied())
    }

    /// Like [`Self::of`], without collecting the values first. The iterator
    /// is cloned when a second pass is needed.
    pub fn of_iter<I>(&self, values: I) -> f64
    where
        I: Iterator<Item = f64> + Clone,
    {
        match self {
            Spread::Range => {
                let (n, min, max) = values.fold(
                    (0usize, f64::INFINITY, f64::NEG_INFINITY),
                    |(n, min, max), v| (n + 1, min.min(v), max.max(v)),
                );
                if n < 2 {
                    0.0
                } else {
                    max - min
                }
            }
            Spread::StdDev => {
                let (n, sum) = values.clone().fold((0usize, 0.0), |(n, sum), v| (n + 1, sum + v));
                if n < 2 {
                    return 0.0;
                }
                let n = n as f64;
                let mean = sum / n;
                let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            }
        }
    }
}

/// Which per-team rating figure the rating term compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatingBasis {
    #[default]
    Total,
    /// Empty teams count as 0.0.
    Average,
}

// ---------------------------------------------------------------------------
// Weighted scorer
// ---------------------------------------------------------------------------

/// The individual terms of a cost, before and after weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub rating_imbalance: f64,
    pub positional_imbalance: f64,
    pub position_shortfall: f64,
    pub cost: f64,
}

/// Fixed-weight combination of rating spread and positional spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedScorer {
    pub rating_weight: f64,
    pub position_weight: f64,
    pub spread: Spread,
    pub rating_basis: RatingBasis,
    /// Per-team minimum count of each position. 0 disables the shortfall term.
    pub minimum_per_position: usize,
    pub shortfall_weight: f64,
}

impl Default for WeightedScorer {
    fn default() -> Self {
        WeightedScorer {
            rating_weight: 1.0,
            position_weight: 1.0,
            spread: Spread::Range,
            rating_basis: RatingBasis::Total,
            minimum_per_position: 0,
            shortfall_weight: 1.0,
        }
    }
}

impl WeightedScorer {
    /// Compute every term of the cost for a partition.
    pub fn breakdown(&self, partition: &TeamPartition<'_>) -> ScoreBreakdown {
        if partition.num_players() == 0 {
            return ScoreBreakdown::default();
        }

        let teams = partition.teams();

        let rating_basis = self.rating_basis;
        let rating_imbalance = self.spread.of_iter(teams.iter().map(|t| match rating_basis {
            RatingBasis::Total => t.rating_total(),
            RatingBasis::Average => t.rating_average(),
        }));

        let positional_imbalance: f64 = Position::ALL
            .iter()
            .map(|&pos| {
                self.spread
                    .of_iter(teams.iter().map(|t| t.position_counts().get(pos) as f64))
            })
            .sum();

        let position_shortfall = if self.minimum_per_position == 0 {
            0.0
        } else {
            teams
                .iter()
                .flat_map(|t| t.position_counts().iter())
                .map(|(_, n)| self.minimum_per_position.saturating_sub(n) as f64)
                .sum()
        };

        let cost = self.rating_weight * rating_imbalance
            + self.position_weight * positional_imbalance
            + self.shortfall_weight * position_shortfall;

        ScoreBreakdown {
            rating_imbalance,
            positional_imbalance,
            position_shortfall,
            // Clamp away -0.0 and rounding noise.
            cost: cost.max(0.0),
        }
    }
}

impl ImbalanceScorer for WeightedScorer {
    fn cost(&self, partition: &TeamPartition<'_>) -> f64 {
        self.breakdown(partition).cost
    }
}

// ---------------------------------------------------------------------------
// Scored partition
// ---------------------------------------------------------------------------

/// A complete partition together with its cost.
#[derive(Debug, Clone)]
pub struct ScoredPartition<'a> {
    pub partition: TeamPartition<'a>,
    pub cost: f64,
}

impl<'a> ScoredPartition<'a> {
    /// Score a partition. Incomplete partitions are refused rather than
    /// scored.
    pub fn score<S>(partition: TeamPartition<'a>, scorer: &S) -> Result<Self, PartitionError>
    where
        S: ImbalanceScorer + ?Sized,
    {
        for player in 0..partition.num_players() {
            partition.team_of(player)?;
        }
        let cost = scorer.cost(&partition);
        Ok(ScoredPartition { partition, cost })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
