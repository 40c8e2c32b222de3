// Team balancing engine: splits a rated, position-tagged player pool into a
// fixed number of teams with as little rating and positional imbalance as a
// bounded local search can find.

pub mod partition;
pub mod player;
pub mod report;
pub mod scorer;
pub mod search;

pub use partition::{PartitionError, PositionCounts, Team, TeamPartition};
pub use player::{Player, Position, RatingBounds, ValidationError};
pub use report::{BalanceReport, PlayerSummary, TeamReport};
pub use scorer::{
    ImbalanceScorer, RatingBasis, ScoreBreakdown, ScoredPartition, Spread, WeightedScorer,
};
pub use search::{
    balance, BalanceOutcome, Balancer, ClockMode, ConfigurationError, FrozenClock,
    ImbalanceWarning, InitialAssignment, PartitionConfig, SearchOptions, SearchStats, StopReason,
    Stopwatch, WallClock,
};
