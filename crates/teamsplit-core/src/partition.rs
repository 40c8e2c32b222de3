// Team partition: one candidate assignment of players to teams, with cached
// per-team rating totals and position counts.

use std::fmt;

use thiserror::Error;

use crate::player::{Player, Position};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("team index {index} out of range (partition has {num_teams} teams)")]
    TeamIndexOutOfRange { index: usize, num_teams: usize },

    #[error("player index {index} out of range (pool has {num_players} players)")]
    PlayerIndexOutOfRange { index: usize, num_players: usize },

    #[error("player {player} is already assigned to team {team}")]
    AlreadyAssigned { player: usize, team: usize },

    #[error("player {player} is not assigned to any team")]
    Unassigned { player: usize },
}

// ---------------------------------------------------------------------------
// Position counts
// ---------------------------------------------------------------------------

/// Count of team members per position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionCounts([usize; Position::COUNT]);

impl PositionCounts {
    pub fn get(&self, pos: Position) -> usize {
        self.0[pos.index()]
    }

    /// Iterate over every position (including zero counts) in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, usize)> + '_ {
        Position::ALL.iter().map(move |&p| (p, self.get(p)))
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    fn increment(&mut self, pos: Position) {
        self.0[pos.index()] += 1;
    }

    fn decrement(&mut self, pos: Position) {
        self.0[pos.index()] -= 1;
    }
}

impl fmt::Display for PositionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(p, n)| format!("{p}: {n}")).collect();
        f.write_str(&parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// One team inside a partition. Holds player indices, not player data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    members: Vec<usize>,
    rating_total: f64,
    position_counts: PositionCounts,
}

impl Team {
    /// Indices into the partition's player slice.
    pub fn member_indices(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn rating_total(&self) -> f64 {
        self.rating_total
    }

    /// Mean member rating. An empty team averages 0.0.
    pub fn rating_average(&self) -> f64 {
        if self.members.is_empty() {
            0.0
        } else {
            self.rating_total / self.members.len() as f64
        }
    }

    pub fn position_counts(&self) -> &PositionCounts {
        &self.position_counts
    }

    fn push(&mut self, index: usize, player: &Player) {
        self.members.push(index);
        self.rating_total += player.rating();
        self.position_counts.increment(player.position());
    }

    /// Put `incoming` into the member slot held by `outgoing`, adjusting the
    /// aggregates by the difference between the two players.
    fn exchange(
        &mut self,
        slot: usize,
        outgoing: &Player,
        incoming_index: usize,
        incoming: &Player,
    ) {
        self.members[slot] = incoming_index;
        self.rating_total += incoming.rating() - outgoing.rating();
        self.position_counts.decrement(outgoing.position());
        self.position_counts.increment(incoming.position());
    }

    /// Rebuild the cached aggregates from scratch, dropping any rounding
    /// drift left by incremental swaps.
    fn recompute(&mut self, players: &[Player]) {
        let mut counts = PositionCounts::default();
        let mut total = 0.0;
        for &i in &self.members {
            total += players[i].rating();
            counts.increment(players[i].position());
        }
        self.rating_total = total;
        self.position_counts = counts;
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// An assignment of a shared, borrowed player pool into `num_teams` teams.
///
/// Player data is never copied; cloning a partition only clones the
/// membership structure.
#[derive(Debug, Clone)]
pub struct TeamPartition<'a> {
    players: &'a [Player],
    teams: Vec<Team>,
    assignment: Vec<Option<usize>>,
    /// Position of each assigned player inside its team's member list.
    slots: Vec<usize>,
}

impl<'a> TeamPartition<'a> {
    /// Create a partition with `num_teams` empty teams and no player assigned.
    pub fn new(players: &'a [Player], num_teams: usize) -> Self {
        TeamPartition {
            players,
            teams: vec![Team::default(); num_teams],
            assignment: vec![None; players.len()],
            slots: vec![0; players.len()],
        }
    }

    /// Build a complete partition from a team index per player.
    pub fn from_assignment(
        players: &'a [Player],
        num_teams: usize,
        team_of: &[usize],
    ) -> Result<Self, PartitionError> {
        let mut partition = Self::new(players, num_teams);
        for (player, &team) in team_of.iter().enumerate() {
            partition.assign(player, team)?;
        }
        Ok(partition)
    }

    /// Place a player into a team.
    pub fn assign(&mut self, player: usize, team: usize) -> Result<(), PartitionError> {
        self.check_player(player)?;
        self.check_team(team)?;
        if let Some(existing) = self.assignment[player] {
            return Err(PartitionError::AlreadyAssigned {
                player,
                team: existing,
            });
        }
        self.place(player, team);
        Ok(())
    }

    /// Exchange the teams of two assigned players. Swapping two players of the
    /// same team is a no-op.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), PartitionError> {
        let team_a = self.team_of(a)?;
        let team_b = self.team_of(b)?;
        if team_a != team_b {
            self.swap_between(a, team_a, b, team_b);
            self.teams[team_a].recompute(self.players);
            self.teams[team_b].recompute(self.players);
        }
        Ok(())
    }

    /// Swap two players already known to sit in `team_a` and `team_b`.
    ///
    /// Constant time: aggregates are updated incrementally, so a long run of
    /// swaps should be followed by [`Self::refresh_aggregates`].
    pub(crate) fn swap_between(&mut self, a: usize, team_a: usize, b: usize, team_b: usize) {
        let players = self.players;
        let (slot_a, slot_b) = (self.slots[a], self.slots[b]);
        self.teams[team_a].exchange(slot_a, &players[a], b, &players[b]);
        self.teams[team_b].exchange(slot_b, &players[b], a, &players[a]);
        self.slots[a] = slot_b;
        self.slots[b] = slot_a;
        self.assignment[a] = Some(team_b);
        self.assignment[b] = Some(team_a);
    }

    /// Recompute every team's rating total and position counts exactly.
    pub(crate) fn refresh_aggregates(&mut self) {
        let players = self.players;
        for team in &mut self.teams {
            team.recompute(players);
        }
    }

    /// Place an unassigned player into an existing team without re-checking
    /// indices. Used by the search, which only generates valid placements.
    pub(crate) fn place(&mut self, player: usize, team: usize) {
        debug_assert!(self.assignment[player].is_none());
        self.slots[player] = self.teams[team].members.len();
        self.teams[team].push(player, &self.players[player]);
        self.assignment[player] = Some(team);
    }

    /// Current team of a player, if any.
    pub(crate) fn team_index(&self, player: usize) -> Option<usize> {
        self.assignment.get(player).copied().flatten()
    }

    /// Team a player is assigned to.
    pub fn team_of(&self, player: usize) -> Result<usize, PartitionError> {
        self.check_player(player)?;
        self.assignment[player].ok_or(PartitionError::Unassigned { player })
    }

    pub fn team_rating_total(&self, team: usize) -> Result<f64, PartitionError> {
        Ok(self.team(team)?.rating_total())
    }

    pub fn team_rating_average(&self, team: usize) -> Result<f64, PartitionError> {
        Ok(self.team(team)?.rating_average())
    }

    pub fn position_counts(&self, team: usize) -> Result<PositionCounts, PartitionError> {
        Ok(*self.team(team)?.position_counts())
    }

    /// Players of one team, in assignment order.
    pub fn team_players(&self, team: usize) -> Result<Vec<&'a Player>, PartitionError> {
        let players = self.players;
        Ok(self
            .team(team)?
            .members
            .iter()
            .map(|&i| &players[i])
            .collect())
    }

    pub fn team(&self, team: usize) -> Result<&Team, PartitionError> {
        self.check_team(team)?;
        Ok(&self.teams[team])
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn players(&self) -> &'a [Player] {
        self.players
    }

    pub fn num_teams(&self) -> usize {
        self.teams.len()
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Whether every player in the pool sits in exactly one team.
    pub fn is_complete(&self) -> bool {
        self.assignment.iter().all(Option::is_some)
    }

    fn check_team(&self, team: usize) -> Result<(), PartitionError> {
        if team >= self.teams.len() {
            return Err(PartitionError::TeamIndexOutOfRange {
                index: team,
                num_teams: self.teams.len(),
            });
        }
        Ok(())
    }

    fn check_player(&self, player: usize) -> Result<(), PartitionError> {
        if player >= self.players.len() {
            return Err(PartitionError::PlayerIndexOutOfRange {
                index: player,
                num_players: self.players.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
