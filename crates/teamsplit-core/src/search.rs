// Restart-based stochastic local search over team partitions.
//
// Each attempt builds an initial partition (snake draft or seeded shuffle)
// and then applies first-improvement pairwise swaps until no swap lowers the
// cost. The best attempt wins; ties keep the earlier attempt.

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::partition::TeamPartition;
use crate::player::Player;
use crate::scorer::{ImbalanceScorer, ScoredPartition, WeightedScorer};

/// A swap must lower the cost by more than this to be accepted.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Error and warning types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("num_teams must be at least 1, got {0}")]
    InvalidTeamCount(usize),

    #[error("time_limit must be a positive number of seconds, got {seconds}")]
    InvalidTimeLimit { seconds: f64 },

    #[error("num_attempts must be at least 1, got {0}")]
    InvalidAttemptCount(usize),
}

/// Non-fatal conditions reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ImbalanceWarning {
    #[error(
        "{num_teams} teams requested for {num_players} players; {empty_teams} team(s) will be empty"
    )]
    MoreTeamsThanPlayers {
        num_teams: usize,
        num_players: usize,
        empty_teams: usize,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Team count and search budget for one balancing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionConfig {
    pub num_teams: usize,
    pub time_limit: Duration,
    pub num_attempts: usize,
}

impl PartitionConfig {
    /// Build a validated config from a time limit expressed in seconds.
    pub fn new(
        num_teams: usize,
        time_limit_secs: f64,
        num_attempts: usize,
    ) -> Result<Self, ConfigurationError> {
        let invalid = ConfigurationError::InvalidTimeLimit {
            seconds: time_limit_secs,
        };
        if time_limit_secs.is_nan() || time_limit_secs <= 0.0 {
            return Err(invalid);
        }
        // Positive limits below one nanosecond round up rather than to zero.
        let time_limit = Duration::try_from_secs_f64(time_limit_secs)
            .map_err(|_| invalid)?
            .max(Duration::from_nanos(1));
        let config = PartitionConfig {
            num_teams,
            time_limit,
            num_attempts,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.num_teams < 1 {
            return Err(ConfigurationError::InvalidTeamCount(self.num_teams));
        }
        if self.time_limit.is_zero() {
            return Err(ConfigurationError::InvalidTimeLimit { seconds: 0.0 });
        }
        if self.num_attempts < 1 {
            return Err(ConfigurationError::InvalidAttemptCount(self.num_attempts));
        }
        Ok(())
    }
}

/// How each attempt seeds its starting partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialAssignment {
    /// Sort by rating (descending, stable) and deal 0..N, N..0, 0..N, ...
    Snake,
    /// Shuffle with the seeded RNG and deal round-robin.
    Shuffled,
    /// Snake for the first attempt, shuffled afterwards.
    #[default]
    SnakeThenShuffled,
}

/// Whether the wall clock bounds the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockMode {
    #[default]
    WallClock,
    /// Ignore `time_limit` and run exactly `num_attempts` attempts.
    AttemptsOnly,
}

/// Tuning knobs for the search that are not part of the per-request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub initial_assignment: InitialAssignment,
    /// Upper bound on swap passes per attempt.
    pub max_swap_passes: usize,
    /// Fixed RNG seed. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    pub clock: ClockMode,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            initial_assignment: InitialAssignment::SnakeThenShuffled,
            max_swap_passes: 100,
            seed: None,
            clock: ClockMode::WallClock,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock abstraction
// ---------------------------------------------------------------------------

/// Source of elapsed time for budget checks.
pub trait Stopwatch {
    fn elapsed(&self) -> Duration;
}

/// Real wall-clock time since construction.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    started: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        WallClock {
            started: Instant::now(),
        }
    }
}

impl Stopwatch for WallClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Never advances. Backs [`ClockMode::AttemptsOnly`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrozenClock;

impl Stopwatch for FrozenClock {
    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    AttemptsExhausted,
    TimeLimit,
    EmptyPool,
}

/// Diagnostics about a finished search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    pub attempts_run: usize,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
    pub seed: u64,
    /// Best cost seen after each completed attempt.
    pub best_cost_history: Vec<f64>,
    /// Improving swaps applied across all attempts.
    pub swaps_applied: usize,
}

/// Result of [`Balancer::balance`].
#[derive(Debug, Clone)]
pub struct BalanceOutcome<'a> {
    pub best: ScoredPartition<'a>,
    pub warnings: Vec<ImbalanceWarning>,
    pub stats: SearchStats,
}

// ---------------------------------------------------------------------------
// Balancer
// ---------------------------------------------------------------------------

/// Search driver. Holds no per-run state, so one instance can serve any
/// number of independent `balance` calls.
#[derive(Debug, Clone, Default)]
pub struct Balancer<S = WeightedScorer> {
    scorer: S,
    options: SearchOptions,
}

impl<S: ImbalanceScorer> Balancer<S> {
    pub fn new(scorer: S, options: SearchOptions) -> Self {
        Balancer { scorer, options }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Split `players` into `config.num_teams` teams, minimizing the scorer's
    /// cost within the configured budget.
    pub fn balance<'a>(
        &self,
        players: &'a [Player],
        config: &PartitionConfig,
    ) -> Result<BalanceOutcome<'a>, ConfigurationError> {
        match self.options.clock {
            ClockMode::WallClock => {
                self.balance_with_stopwatch(players, config, &WallClock::start())
            }
            ClockMode::AttemptsOnly => self.balance_with_stopwatch(players, config, &FrozenClock),
        }
    }

    /// Like [`Self::balance`], with an explicit time source.
    pub fn balance_with_stopwatch<'a>(
        &self,
        players: &'a [Player],
        config: &PartitionConfig,
        stopwatch: &dyn Stopwatch,
    ) -> Result<BalanceOutcome<'a>, ConfigurationError> {
        config.validate()?;

        let num_teams = config.num_teams;
        let warnings = imbalance_warnings(players.len(), num_teams);
        for w in &warnings {
            warn!("{}", w);
        }

        let seed = self.options.seed.unwrap_or_else(|| rand::rng().random());

        if players.is_empty() {
            info!(num_teams, "empty player pool, skipping search");
            return Ok(BalanceOutcome {
                best: ScoredPartition {
                    partition: TeamPartition::new(players, num_teams),
                    cost: 0.0,
                },
                warnings,
                stats: SearchStats {
                    attempts_run: 0,
                    elapsed: stopwatch.elapsed(),
                    stop_reason: StopReason::EmptyPool,
                    seed,
                    best_cost_history: Vec::new(),
                    swaps_applied: 0,
                },
            });
        }

        info!(
            players = players.len(),
            num_teams,
            num_attempts = config.num_attempts,
            time_limit_secs = config.time_limit.as_secs_f64(),
            seed,
            "starting balance search"
        );

        let mut rng = Pcg64::seed_from_u64(seed);
        let mut swaps_applied = 0;

        let (mut best, swaps) = self.run_attempt(0, players, config, stopwatch, &mut rng);
        swaps_applied += swaps;
        let mut history = vec![best.cost];
        let mut stop_reason = StopReason::AttemptsExhausted;

        for attempt in 1..config.num_attempts {
            if stopwatch.elapsed() >= config.time_limit {
                warn!(
                    attempts_run = attempt,
                    num_attempts = config.num_attempts,
                    "time limit reached, stopping search early"
                );
                stop_reason = StopReason::TimeLimit;
                break;
            }

            let (candidate, swaps) =
                self.run_attempt(attempt, players, config, stopwatch, &mut rng);
            swaps_applied += swaps;
            // Strictly lower only: the earlier attempt wins ties.
            if candidate.cost < best.cost {
                best = candidate;
            }
            history.push(best.cost);
        }

        let stats = SearchStats {
            attempts_run: history.len(),
            elapsed: stopwatch.elapsed(),
            stop_reason,
            seed,
            best_cost_history: history,
            swaps_applied,
        };

        info!(
            attempts_run = stats.attempts_run,
            best_cost = best.cost,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            stop_reason = ?stats.stop_reason,
            "balance search finished"
        );

        Ok(BalanceOutcome {
            best,
            warnings,
            stats,
        })
    }

    /// One attempt: build a starting partition, then descend to a local
    /// optimum. Returns the scored result and the number of swaps applied.
    fn run_attempt<'a>(
        &self,
        attempt: usize,
        players: &'a [Player],
        config: &PartitionConfig,
        stopwatch: &dyn Stopwatch,
        rng: &mut Pcg64,
    ) -> (ScoredPartition<'a>, usize) {
        let strategy = match self.options.initial_assignment {
            InitialAssignment::SnakeThenShuffled if attempt == 0 => InitialAssignment::Snake,
            InitialAssignment::SnakeThenShuffled => InitialAssignment::Shuffled,
            other => other,
        };
        let partition = initial_partition(players, config.num_teams, strategy, rng);
        let initial_cost = self.scorer.cost(&partition);

        let (scored, swaps) = self.improve(partition, initial_cost, config.time_limit, stopwatch);

        debug!(
            attempt,
            ?strategy,
            initial_cost,
            local_optimum_cost = scored.cost,
            swaps,
            "attempt finished"
        );
        (scored, swaps)
    }

    /// First-improvement pairwise swap descent.
    ///
    /// The budget is checked before every row of candidate swaps, so a single
    /// pass over a large pool stops close to the time limit. Swaps update the
    /// team aggregates incrementally; they are recomputed exactly after every
    /// pass and before the final cost is taken.
    fn improve<'a>(
        &self,
        mut partition: TeamPartition<'a>,
        mut cost: f64,
        time_limit: Duration,
        stopwatch: &dyn Stopwatch,
    ) -> (ScoredPartition<'a>, usize) {
        let players = partition.players();
        let n = players.len();
        let mut swaps = 0;

        'passes: for _ in 0..self.options.max_swap_passes {
            let mut improved = false;
            for a in 0..n {
                if stopwatch.elapsed() >= time_limit {
                    break 'passes;
                }
                for b in (a + 1)..n {
                    let (Some(team_a), Some(team_b)) =
                        (partition.team_index(a), partition.team_index(b))
                    else {
                        continue;
                    };
                    if team_a == team_b || interchangeable(&players[a], &players[b]) {
                        continue;
                    }

                    partition.swap_between(a, team_a, b, team_b);
                    let candidate = self.scorer.cost(&partition);
                    if candidate < cost - IMPROVEMENT_EPSILON {
                        cost = candidate;
                        swaps += 1;
                        improved = true;
                    } else {
                        partition.swap_between(a, team_b, b, team_a);
                    }
                }
            }

            if !improved {
                break;
            }
            partition.refresh_aggregates();
            cost = self.scorer.cost(&partition);
        }

        if swaps > 0 {
            partition.refresh_aggregates();
            cost = self.scorer.cost(&partition);
        }
        (ScoredPartition { partition, cost }, swaps)
    }
}

/// Run a search with the default scorer and search options.
pub fn balance<'a>(
    players: &'a [Player],
    config: &PartitionConfig,
) -> Result<BalanceOutcome<'a>, ConfigurationError> {
    Balancer::<WeightedScorer>::default().balance(players, config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn imbalance_warnings(num_players: usize, num_teams: usize) -> Vec<ImbalanceWarning> {
    if num_teams > num_players {
        vec![ImbalanceWarning::MoreTeamsThanPlayers {
            num_teams,
            num_players,
            empty_teams: num_teams - num_players,
        }]
    } else {
        Vec::new()
    }
}

/// Swapping two players with identical rating and position cannot change
/// any team aggregate.
fn interchangeable(a: &Player, b: &Player) -> bool {
    a.position() == b.position() && a.rating() == b.rating()
}

/// Build a complete starting partition. Team sizes differ by at most one.
fn initial_partition<'a>(
    players: &'a [Player],
    num_teams: usize,
    strategy: InitialAssignment,
    rng: &mut Pcg64,
) -> TeamPartition<'a> {
    let mut order: Vec<usize> = (0..players.len()).collect();
    let mut partition = TeamPartition::new(players, num_teams);

    match strategy {
        InitialAssignment::Snake | InitialAssignment::SnakeThenShuffled => {
            order.sort_by(|&a, &b| players[b].rating().total_cmp(&players[a].rating()));
            for (k, &player) in order.iter().enumerate() {
                partition.place(player, snake_team(k, num_teams));
            }
        }
        InitialAssignment::Shuffled => {
            order.shuffle(rng);
            for (k, &player) in order.iter().enumerate() {
                partition.place(player, k % num_teams);
            }
        }
    }

    partition
}

/// Team for the k-th pick of a snake draft: 0, 1, .., n-1, n-1, .., 0, 0, ..
fn snake_team(k: usize, num_teams: usize) -> usize {
    let round = k / num_teams;
    let offset = k % num_teams;
    if round % 2 == 0 {
        offset
    } else {
        num_teams - 1 - offset
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::player::Position;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn deterministic(initial_assignment: InitialAssignment) -> Balancer {
        Balancer::new(
            WeightedScorer::default(),
            SearchOptions {
                initial_assignment,
                seed: Some(42),
                clock: ClockMode::AttemptsOnly,
                ..SearchOptions::default()
            },
        )
    }

    fn config(num_teams: usize, num_attempts: usize) -> PartitionConfig {
        PartitionConfig::new(num_teams, 30.0, num_attempts).unwrap()
    }

    /// A mixed pool with deterministic pseudo-varied ratings.
    fn mixed_pool(count: usize) -> Vec<Player> {
        (0..count)
            .map(|i| {
                let rating = ((i * 37) % 41) as f64 / 8.0;
                Player::new(format!("P{i}"), rating, Position::ALL[i % Position::COUNT]).unwrap()
            })
            .collect()
    }

    fn team_assignment(partition: &TeamPartition<'_>) -> Vec<usize> {
        (0..partition.num_players())
            .map(|p| partition.team_of(p).unwrap())
            .collect()
    }

    /// Stopwatch that reports a fixed elapsed time and counts reads.
    struct FixedStopwatch {
        elapsed: Duration,
        reads: Cell<usize>,
    }

    impl Stopwatch for FixedStopwatch {
        fn elapsed(&self) -> Duration {
            self.reads.set(self.reads.get() + 1);
            self.elapsed
        }
    }

    #[test]
    fn snake_team_order() {
        let picks: Vec<usize> = (0..9).map(|k| snake_team(k, 3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 2, 1, 0, 0, 1, 2]);
        assert_eq!(snake_team(5, 1), 0);
    }

    #[test]
    fn config_rejects_invalid_values() {
        assert_eq!(
            PartitionConfig::new(0, 10.0, 5).unwrap_err(),
            ConfigurationError::InvalidTeamCount(0)
        );
        assert_eq!(
            PartitionConfig::new(2, 10.0, 0).unwrap_err(),
            ConfigurationError::InvalidAttemptCount(0)
        );
        assert!(matches!(
            PartitionConfig::new(2, 0.0, 5).unwrap_err(),
            ConfigurationError::InvalidTimeLimit { .. }
        ));
        assert!(matches!(
            PartitionConfig::new(2, f64::NAN, 5).unwrap_err(),
            ConfigurationError::InvalidTimeLimit { .. }
        ));
        assert!(matches!(
            PartitionConfig::new(2, -3.0, 5).unwrap_err(),
            ConfigurationError::InvalidTimeLimit { .. }
        ));
    }

    #[test]
    fn sub_nanosecond_time_limit_rounds_up() {
        let config = PartitionConfig::new(2, 1e-10, 1).unwrap();
        assert_eq!(config.time_limit, Duration::from_nanos(1));
        assert_eq!(
            PartitionConfig::new(2, -1e-10, 1).unwrap_err(),
            ConfigurationError::InvalidTimeLimit { seconds: -1e-10 }
        );
    }

    #[test]
    fn balance_fails_fast_on_zero_teams() {
        let players = mixed_pool(4);
        let bad = PartitionConfig {
            num_teams: 0,
            time_limit: Duration::from_secs(1),
            num_attempts: 1,
        };
        let err = deterministic(InitialAssignment::Snake)
            .balance(&players, &bad)
            .unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidTeamCount(0));
    }

    #[test]
    fn empty_pool_returns_empty_teams() {
        let players: Vec<Player> = Vec::new();
        let outcome = deterministic(InitialAssignment::Snake)
            .balance(&players, &config(3, 5))
            .unwrap();

        assert_eq!(outcome.best.partition.num_teams(), 3);
        assert!(outcome.best.partition.teams().iter().all(|t| t.is_empty()));
        assert_eq!(outcome.best.cost, 0.0);
        assert_eq!(outcome.stats.attempts_run, 0);
        assert_eq!(outcome.stats.stop_reason, StopReason::EmptyPool);
    }

    #[test]
    fn single_player_two_teams_warns() {
        let players = vec![Player::new("Solo", 3.5, Position::Midfielder).unwrap()];
        let outcome = deterministic(InitialAssignment::Snake)
            .balance(&players, &config(2, 3))
            .unwrap();

        let sizes: Vec<usize> = outcome.best.partition.teams().iter().map(|t| t.len()).collect();
        assert_eq!(sizes, vec![1, 0]);
        assert_eq!(
            outcome.warnings,
            vec![ImbalanceWarning::MoreTeamsThanPlayers {
                num_teams: 2,
                num_players: 1,
                empty_teams: 1,
            }]
        );
    }

    #[test]
    fn no_warning_when_teams_fit() {
        let players = mixed_pool(4);
        let outcome = deterministic(InitialAssignment::Snake)
            .balance(&players, &config(4, 1))
            .unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn pairs_strong_with_weak() {
        let players: Vec<Player> = [5.0, 1.0, 5.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, &r)| Player::new(format!("P{i}"), r, Position::Defender).unwrap())
            .collect();
        let outcome = deterministic(InitialAssignment::SnakeThenShuffled)
            .balance(&players, &config(2, 3))
            .unwrap();

        let partition = &outcome.best.partition;
        assert!(approx_eq(partition.team_rating_total(0).unwrap(), 6.0, 1e-9));
        assert!(approx_eq(partition.team_rating_total(1).unwrap(), 6.0, 1e-9));
        let breakdown = WeightedScorer::default().breakdown(partition);
        assert_eq!(breakdown.rating_imbalance, 0.0);
        assert_eq!(outcome.best.cost, 0.0);
    }

    #[test]
    fn identical_players_one_per_team_cost_zero() {
        let players: Vec<Player> = (0..5)
            .map(|i| Player::new(format!("P{i}"), 4.5, Position::Attacker).unwrap())
            .collect();
        let outcome = deterministic(InitialAssignment::Shuffled)
            .balance(&players, &config(5, 2))
            .unwrap();
        assert_eq!(outcome.best.cost, 0.0);
        assert!(outcome.best.partition.teams().iter().all(|t| t.len() == 1));
    }

    #[test]
    fn partition_is_complete_and_has_requested_team_count() {
        let players = mixed_pool(23);
        for num_teams in [1, 2, 3, 5, 30] {
            let outcome = deterministic(InitialAssignment::SnakeThenShuffled)
                .balance(&players, &config(num_teams, 4))
                .unwrap();
            let partition = &outcome.best.partition;

            assert_eq!(partition.num_teams(), num_teams);
            assert!(partition.is_complete());

            let mut seen = vec![0usize; players.len()];
            for team in partition.teams() {
                for &m in team.member_indices() {
                    seen[m] += 1;
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "teams {num_teams}: {seen:?}");
            assert!(outcome.best.cost >= 0.0);
        }
    }

    #[test]
    fn team_sizes_differ_by_at_most_one() {
        let players = mixed_pool(17);
        let outcome = deterministic(InitialAssignment::SnakeThenShuffled)
            .balance(&players, &config(4, 6))
            .unwrap();
        let sizes: Vec<usize> = outcome.best.partition.teams().iter().map(|t| t.len()).collect();
        let max = sizes.iter().max().unwrap();
        let min = sizes.iter().min().unwrap();
        assert!(max - min <= 1, "sizes: {sizes:?}");
    }

    #[test]
    fn best_cost_never_regresses_across_attempts() {
        let players = mixed_pool(20);
        let outcome = deterministic(InitialAssignment::Shuffled)
            .balance(&players, &config(3, 12))
            .unwrap();

        let history = &outcome.stats.best_cost_history;
        assert_eq!(history.len(), 12);
        assert!(history.windows(2).all(|w| w[1] <= w[0]), "{history:?}");
        assert_eq!(*history.last().unwrap(), outcome.best.cost);
    }

    #[test]
    fn result_is_a_local_optimum() {
        let players = mixed_pool(12);
        let balancer = deterministic(InitialAssignment::Snake);
        let outcome = balancer.balance(&players, &config(3, 1)).unwrap();
        let scorer = balancer.scorer();

        let mut partition = outcome.best.partition.clone();
        for a in 0..players.len() {
            for b in (a + 1)..players.len() {
                if partition.team_of(a).unwrap() == partition.team_of(b).unwrap() {
                    continue;
                }
                partition.swap(a, b).unwrap();
                assert!(scorer.cost(&partition) >= outcome.best.cost - IMPROVEMENT_EPSILON);
                partition.swap(a, b).unwrap();
            }
        }
    }

    #[test]
    fn local_search_never_worsens_initial_partition() {
        let players = mixed_pool(15);
        let mut rng = Pcg64::seed_from_u64(0);
        let initial = initial_partition(&players, 3, InitialAssignment::Snake, &mut rng);
        let initial_cost = WeightedScorer::default().cost(&initial);

        let outcome = deterministic(InitialAssignment::Snake)
            .balance(&players, &config(3, 1))
            .unwrap();
        assert!(outcome.best.cost <= initial_cost);
    }

    #[test]
    fn single_snake_attempt_is_deterministic() {
        let players = mixed_pool(14);
        let first = Balancer::new(
            WeightedScorer::default(),
            SearchOptions {
                initial_assignment: InitialAssignment::Snake,
                seed: None,
                clock: ClockMode::AttemptsOnly,
                ..SearchOptions::default()
            },
        );
        let a = first.balance(&players, &config(2, 1)).unwrap();
        let b = first.balance(&players, &config(2, 1)).unwrap();
        assert_eq!(team_assignment(&a.best.partition), team_assignment(&b.best.partition));
        assert_eq!(a.best.cost, b.best.cost);
    }

    #[test]
    fn same_seed_reproduces_shuffled_search() {
        let players = mixed_pool(18);
        let balancer = deterministic(InitialAssignment::Shuffled);
        let a = balancer.balance(&players, &config(3, 5)).unwrap();
        let b = balancer.balance(&players, &config(3, 5)).unwrap();
        assert_eq!(team_assignment(&a.best.partition), team_assignment(&b.best.partition));
        assert_eq!(a.stats.seed, 42);
        assert_eq!(a.stats.best_cost_history, b.stats.best_cost_history);
    }

    #[test]
    fn attempts_only_mode_runs_every_attempt() {
        let players = mixed_pool(10);
        let outcome = deterministic(InitialAssignment::SnakeThenShuffled)
            .balance(&players, &config(2, 7))
            .unwrap();
        assert_eq!(outcome.stats.attempts_run, 7);
        assert_eq!(outcome.stats.stop_reason, StopReason::AttemptsExhausted);
    }

    #[test]
    fn exhausted_time_budget_stops_after_first_attempt() {
        let players = mixed_pool(10);
        let stopwatch = FixedStopwatch {
            elapsed: Duration::from_secs(60),
            reads: Cell::new(0),
        };
        let outcome = deterministic(InitialAssignment::SnakeThenShuffled)
            .balance_with_stopwatch(&players, &config(2, 50), &stopwatch)
            .unwrap();

        assert_eq!(outcome.stats.attempts_run, 1);
        assert_eq!(outcome.stats.stop_reason, StopReason::TimeLimit);
        assert!(outcome.best.partition.is_complete());
        // The budget check ahead of the first row stops before any swap.
        assert_eq!(outcome.stats.swaps_applied, 0);
        assert!(stopwatch.reads.get() >= 2);
    }

    /// Reports no elapsed time for the first `allowed` reads, then a minute.
    struct TrippingStopwatch {
        allowed: usize,
        reads: Cell<usize>,
    }

    impl Stopwatch for TrippingStopwatch {
        fn elapsed(&self) -> Duration {
            let reads = self.reads.get() + 1;
            self.reads.set(reads);
            if reads <= self.allowed {
                Duration::ZERO
            } else {
                Duration::from_secs(60)
            }
        }
    }

    /// Sixteen players whose snake deal puts every attacker on one team and
    /// every defender on the other.
    fn split_by_position_pool() -> Vec<Player> {
        (0..16)
            .map(|i| {
                let rating = 3.5 - (i as f64) * 0.1;
                let pos = if matches!(i % 4, 0 | 3) {
                    Position::Attacker
                } else {
                    Position::Defender
                };
                Player::new(format!("P{i}"), rating, pos).unwrap()
            })
            .collect()
    }

    #[test]
    fn time_limit_interrupts_a_pass_in_progress() {
        let players = split_by_position_pool();
        let balancer = deterministic(InitialAssignment::Snake);
        let scorer = balancer.scorer();

        let mut rng = Pcg64::seed_from_u64(0);
        let initial = initial_partition(&players, 2, InitialAssignment::Snake, &mut rng);
        assert_eq!(scorer.breakdown(&initial).positional_imbalance, 16.0);

        let unbounded = balancer.balance(&players, &config(2, 1)).unwrap();
        assert_eq!(scorer.breakdown(&unbounded.best.partition).positional_imbalance, 0.0);

        // Only the first row of the first pass fits in the budget.
        let stopwatch = TrippingStopwatch {
            allowed: 1,
            reads: Cell::new(0),
        };
        let outcome = balancer
            .balance_with_stopwatch(&players, &config(2, 3), &stopwatch)
            .unwrap();

        assert_eq!(outcome.stats.attempts_run, 1);
        assert_eq!(outcome.stats.stop_reason, StopReason::TimeLimit);
        assert!(outcome.best.partition.is_complete());
        // One row moves a single attacker at most once across teams.
        let breakdown = scorer.breakdown(&outcome.best.partition);
        assert!(breakdown.positional_imbalance >= 12.0, "{breakdown:?}");
        assert!(outcome.stats.swaps_applied < unbounded.stats.swaps_applied);
        assert!(approx_eq(outcome.best.cost, breakdown.cost, 1e-9));
        // Row 0, the refused row 1, the attempt check and the final stats read.
        assert_eq!(stopwatch.reads.get(), 4);
    }

    #[test]
    fn wall_clock_mode_finishes_small_pool_within_budget() {
        let players = mixed_pool(16);
        let balancer = Balancer::new(
            WeightedScorer::default(),
            SearchOptions {
                seed: Some(7),
                ..SearchOptions::default()
            },
        );
        let outcome = balancer.balance(&players, &config(2, 3)).unwrap();
        assert!(outcome.stats.attempts_run <= 3);
        assert!(outcome.stats.elapsed < Duration::from_secs(30));
    }

    #[test]
    fn free_balance_uses_defaults() {
        let players = mixed_pool(8);
        let outcome = balance(&players, &config(2, 2)).unwrap();
        assert_eq!(outcome.best.partition.num_teams(), 2);
        assert!(outcome.best.partition.is_complete());
    }
}
