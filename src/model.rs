use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LeagueError;

/// Official or predicted result of a match, stored as `1`, `X` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "1")]
    Home,
    #[serde(rename = "X")]
    Draw,
    #[serde(rename = "2")]
    Away,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    pub fn code(self) -> &'static str {
        match self {
            Outcome::Home => "1",
            Outcome::Draw => "X",
            Outcome::Away => "2",
        }
    }

    /// Strict lookup: surrounding whitespace is ignored, anything else must match exactly.
    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(Outcome::Home),
            "X" => Some(Outcome::Draw),
            "2" => Some(Outcome::Away),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Outcome {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Outcome::from_code(s).ok_or_else(|| LeagueError::InvalidOutcome(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "utente")]
    pub id: String,
    /// Recomputed on every scoring pass; whatever was stored is ignored.
    #[serde(rename = "punti", default, deserialize_with = "lenient_points")]
    pub points: f64,
    #[serde(rename = "jolly_usati", default)]
    pub wildcards_used: u32,
    #[serde(rename = "gettoni_sfida", default)]
    pub challenge_tokens: u32,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            points: 0.0,
            wildcards_used: 0,
            challenge_tokens: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Odds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "giornata")]
    pub round: u32,
    #[serde(rename = "partita")]
    pub id: String,
    #[serde(rename = "casa", default)]
    pub home: String,
    #[serde(rename = "ospite", default)]
    pub away: String,
    #[serde(rename = "quota1", default, deserialize_with = "lenient_odds")]
    pub odds_home: Option<f64>,
    #[serde(rename = "quotaX", default, deserialize_with = "lenient_odds")]
    pub odds_draw: Option<f64>,
    #[serde(rename = "quota2", default, deserialize_with = "lenient_odds")]
    pub odds_away: Option<f64>,
    #[serde(rename = "risultato", default, deserialize_with = "lenient_outcome")]
    pub result: Option<Outcome>,
}

impl Match {
    pub fn new(round: u32, home: &str, away: &str, odds: Odds) -> Self {
        Self {
            round,
            id: match_id(home, away),
            home: home.to_string(),
            away: away.to_string(),
            odds_home: Some(odds.home),
            odds_draw: Some(odds.draw),
            odds_away: Some(odds.away),
            result: None,
        }
    }

    /// Raw odds cell for one outcome slot. May be missing or non-finite.
    pub fn odds_for(&self, outcome: Outcome) -> Option<f64> {
        match outcome {
            Outcome::Home => self.odds_home,
            Outcome::Draw => self.odds_draw,
            Outcome::Away => self.odds_away,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "utente")]
    pub user: String,
    #[serde(rename = "giornata")]
    pub round: u32,
    #[serde(rename = "partita")]
    pub match_id: String,
    /// Kept as the raw stored code; unknown codes simply never resolve.
    #[serde(rename = "pronostico", default, deserialize_with = "lenient_code")]
    pub pick: String,
    #[serde(rename = "jolly", default, deserialize_with = "lenient_flag")]
    pub wildcard: bool,
    #[serde(rename = "sfida", default, deserialize_with = "lenient_flag")]
    pub challenge: bool,
    #[serde(rename = "sfidato", default, deserialize_with = "lenient_text")]
    pub opponent: Option<String>,
}

impl Prediction {
    pub fn outcome(&self) -> Option<Outcome> {
        Outcome::from_code(&self.pick)
    }

    /// Opponent named by an active challenge, if any.
    pub fn challenged(&self) -> Option<&str> {
        if !self.challenge {
            return None;
        }
        self.opponent
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Full snapshot of the three league tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueData {
    #[serde(rename = "utenti", default)]
    pub users: Vec<User>,
    #[serde(rename = "pronostici", default)]
    pub predictions: Vec<Prediction>,
    #[serde(rename = "partite", default)]
    pub matches: Vec<Match>,
}

pub fn match_id(home: &str, away: &str) -> String {
    format!("{}-{}", home.trim(), away.trim())
}

/// Parses a stored odds cell. Accepts a comma as decimal separator.
pub fn parse_odds_text(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn parse_flag_text(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "si" | "sì" | "x"
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_odds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<Cell>::deserialize(deserializer)?;
    Ok(match cell {
        Some(Cell::Int(v)) => Some(v as f64),
        Some(Cell::Float(v)) if v.is_finite() => Some(v),
        Some(Cell::Text(raw)) => parse_odds_text(&raw),
        _ => None,
    })
}

fn lenient_points<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_odds(deserializer)?.unwrap_or(0.0))
}

fn lenient_outcome<'de, D>(deserializer: D) -> Result<Option<Outcome>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<Cell>::deserialize(deserializer)?;
    Ok(match cell {
        Some(Cell::Text(raw)) => Outcome::from_code(&raw),
        Some(Cell::Int(v)) => Outcome::from_code(&v.to_string()),
        Some(Cell::Float(v)) => whole_number(v).and_then(|v| Outcome::from_code(&v.to_string())),
        _ => None,
    })
}

fn lenient_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<Cell>::deserialize(deserializer)?;
    Ok(match cell {
        Some(Cell::Text(raw)) => raw,
        Some(Cell::Int(v)) => v.to_string(),
        Some(Cell::Float(v)) => whole_number(v).map(|v| v.to_string()).unwrap_or_default(),
        _ => String::new(),
    })
}

/// Spreadsheet tools write integer codes as `1.0`.
fn whole_number(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<Cell>::deserialize(deserializer)?;
    Ok(match cell {
        Some(Cell::Bool(v)) => v,
        Some(Cell::Int(v)) => v != 0,
        Some(Cell::Float(v)) => v != 0.0,
        Some(Cell::Text(raw)) => parse_flag_text(&raw),
        None => false,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<Cell>::deserialize(deserializer)?;
    Ok(match cell {
        Some(Cell::Text(raw)) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
        _ => None,
    })
}
