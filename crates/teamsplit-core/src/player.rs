// Player model: validated, immutable name/rating/position records.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("player name must not be empty")]
    EmptyName,

    #[error("rating {rating} for '{name}' is outside the allowed range {min}..={max}")]
    RatingOutOfBounds {
        name: String,
        rating: f64,
        min: f64,
        max: f64,
    },

    #[error("rating for '{name}' is not a finite number")]
    NonFiniteRating { name: String },

    #[error("unknown position '{value}' for '{name}' (expected GK, DEF, MID or ATT)")]
    UnknownPosition { name: String, value: String },
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Football positions a player can be tagged with.
///
/// The set is closed: anything else is rejected during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "ATT")]
    Attacker,
}

impl Position {
    /// Every position, in display order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Attacker,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Parse a position string into a Position enum.
    ///
    /// Accepts the short codes ("GK", "DEF", "MID", "ATT") and the long
    /// names, case-insensitively and ignoring surrounding whitespace.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GOALKEEPER" => Some(Position::Goalkeeper),
            "DEF" | "DEFENDER" => Some(Position::Defender),
            "MID" | "MIDFIELDER" => Some(Position::Midfielder),
            "ATT" | "ATTACKER" => Some(Position::Attacker),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Attacker => "ATT",
        }
    }

    /// Dense index used for per-team count arrays.
    pub fn index(&self) -> usize {
        match self {
            Position::Goalkeeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Attacker => 3,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Rating bounds
// ---------------------------------------------------------------------------

/// Inclusive range a player rating must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingBounds {
    pub min: f64,
    pub max: f64,
}

impl RatingBounds {
    pub const DEFAULT_MIN: f64 = 0.0;
    pub const DEFAULT_MAX: f64 = 5.0;

    pub fn contains(&self, rating: f64) -> bool {
        (self.min..=self.max).contains(&rating)
    }
}

impl Default for RatingBounds {
    fn default() -> Self {
        RatingBounds {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A single rated player. Fields are private so every instance has passed
/// validation; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    name: String,
    rating: f64,
    position: Position,
}

impl Player {
    /// Create a player checked against the default 0.0..=5.0 rating range.
    pub fn new(
        name: impl Into<String>,
        rating: f64,
        position: Position,
    ) -> Result<Self, ValidationError> {
        Self::with_bounds(name, rating, position, &RatingBounds::default())
    }

    /// Create a player checked against explicit rating bounds.
    pub fn with_bounds(
        name: impl Into<String>,
        rating: f64,
        position: Position,
        bounds: &RatingBounds,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !rating.is_finite() {
            return Err(ValidationError::NonFiniteRating { name });
        }
        if !bounds.contains(rating) {
            return Err(ValidationError::RatingOutOfBounds {
                name,
                rating,
                min: bounds.min,
                max: bounds.max,
            });
        }
        Ok(Player {
            name,
            rating,
            position,
        })
    }

    /// Build a player from raw boundary input where the position is still a
    /// free-form string (CSV cell, JSON field).
    pub fn parse(
        name: &str,
        rating: f64,
        position: &str,
        bounds: &RatingBounds,
    ) -> Result<Self, ValidationError> {
        let Some(pos) = Position::from_str_pos(position) else {
            return Err(ValidationError::UnknownPosition {
                name: name.trim().to_string(),
                value: position.trim().to_string(),
            });
        };
        Self::with_bounds(name, rating, pos, bounds)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
