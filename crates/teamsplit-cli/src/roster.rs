// Roster loading: CSV uploads and JSON balance requests.
//
// CSV schema: header row `name,overall,position`, one player per row; extra
// columns are ignored. JSON schema:
// `{players: [{name, overall, position}], num_teams?, time_limit?, num_attempts?}`.
//
// Every player goes through core validation here, so the balancer only ever
// receives valid `Player` values. The first bad row fails the whole load.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use teamsplit_core::{Player, Position, RatingBounds, ValidationError};

const REQUIRED_COLUMNS: [&str; 3] = ["name", "overall", "position"];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Validated players plus any budget values the request carried.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub players: Vec<Player>,
    pub num_teams: Option<usize>,
    pub time_limit: Option<f64>,
    pub num_attempts: Option<usize>,
}

impl Roster {
    /// Number of players at each position, every position included.
    pub fn position_counts(&self) -> Vec<(Position, usize)> {
        Position::ALL
            .iter()
            .map(|&pos| {
                let n = self.players.iter().filter(|p| p.position() == pos).count();
                (pos, n)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV header is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("malformed CSV row {row}: {source}")]
    MalformedRow { row: usize, source: csv::Error },

    #[error("invalid JSON request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid player at row {row}: {source}")]
    InvalidPlayer {
        row: usize,
        source: ValidationError,
    },
}

// ---------------------------------------------------------------------------
// Raw serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayer {
    name: String,
    overall: f64,
    position: String,
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    players: Vec<RawPlayer>,
    #[serde(default)]
    num_teams: Option<usize>,
    #[serde(default)]
    time_limit: Option<f64>,
    #[serde(default)]
    num_attempts: Option<usize>,
}

fn validate_rows(
    rows: impl IntoIterator<Item = (usize, RawPlayer)>,
    bounds: &RatingBounds,
) -> Result<Vec<Player>, RosterError> {
    rows.into_iter()
        .map(|(row, raw)| {
            Player::parse(&raw.name, raw.overall, &raw.position, bounds)
                .map_err(|source| RosterError::InvalidPlayer { row, source })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Load players from CSV. Rows are numbered from 1, not counting the header.
pub fn load_players_csv<R: Read>(rdr: R, bounds: &RatingBounds) -> Result<Roster, RosterError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(column)) {
            return Err(RosterError::MissingColumn(column));
        }
    }
    // Normalize header case so `Name,Overall,Position` deserializes too.
    let lowered: csv::StringRecord = headers.iter().map(str::to_lowercase).collect();
    reader.set_headers(lowered);

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<RawPlayer>().enumerate() {
        let row = i + 1;
        let raw = result.map_err(|source| RosterError::MalformedRow { row, source })?;
        rows.push((row, raw));
    }

    let players = validate_rows(rows, bounds)?;
    debug!(players = players.len(), "loaded CSV roster");
    Ok(Roster {
        players,
        ..Roster::default()
    })
}

/// Load a JSON balance request. Players are numbered from 1 in array order.
pub fn load_request_json<R: Read>(rdr: R, bounds: &RatingBounds) -> Result<Roster, RosterError> {
    let raw: RawRequest = serde_json::from_reader(rdr)?;
    let players = validate_rows(
        raw.players.into_iter().enumerate().map(|(i, p)| (i + 1, p)),
        bounds,
    )?;
    debug!(players = players.len(), "loaded JSON request");
    Ok(Roster {
        players,
        num_teams: raw.num_teams,
        time_limit: raw.time_limit,
        num_attempts: raw.num_attempts,
    })
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, RosterError> {
    std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_players_csv_file(path: &Path, bounds: &RatingBounds) -> Result<Roster, RosterError> {
    load_players_csv(open(path)?, bounds)
}

pub fn load_request_json_file(path: &Path, bounds: &RatingBounds) -> Result<Roster, RosterError> {
    load_request_json(open(path)?, bounds)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
