use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::error::LeagueError;
use crate::model::{LeagueData, Match, Outcome, Prediction, User, parse_flag_text, parse_odds_text};

const DATA_DIR: &str = "polipone";
const DB_FILE: &str = "polipone.sqlite";

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".local").join("share").join(DATA_DIR))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Odds and flag columns are untyped so hand-edited cells survive as written.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS utenti (
            utente TEXT NOT NULL,
            punti REAL NULL,
            jolly_usati INTEGER NOT NULL DEFAULT 0,
            gettoni_sfida INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS pronostici (
            utente TEXT NOT NULL,
            giornata INTEGER NOT NULL,
            partita TEXT NOT NULL,
            pronostico TEXT NULL,
            jolly,
            sfida,
            sfidato TEXT NULL
        );
        CREATE TABLE IF NOT EXISTS partite (
            giornata INTEGER NOT NULL,
            partita TEXT NOT NULL,
            casa TEXT NOT NULL,
            ospite TEXT NOT NULL,
            quota1,
            quotaX,
            quota2,
            risultato TEXT NULL
        );
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .context("init sqlite schema")?;
    Ok(())
}

pub fn load_snapshot(conn: &Connection) -> Result<LeagueData> {
    let data = LeagueData {
        users: load_users(conn)?,
        predictions: load_predictions(conn)?,
        matches: load_matches(conn)?,
    };
    info!(
        "loaded {} users, {} predictions, {} matches",
        data.users.len(),
        data.predictions.len(),
        data.matches.len()
    );
    Ok(data)
}

/// Full rewrite of all three tables in one transaction.
pub fn save_snapshot(conn: &mut Connection, data: &LeagueData) -> Result<()> {
    let tx = conn.transaction().context("begin save transaction")?;
    tx.execute_batch("DELETE FROM utenti; DELETE FROM pronostici; DELETE FROM partite;")
        .context("clear tables")?;
    for user in &data.users {
        insert_user(&tx, user)?;
    }
    for prediction in &data.predictions {
        insert_prediction(&tx, prediction)?;
    }
    for fixture in &data.matches {
        insert_match(&tx, fixture)?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('saved_at', ?1)",
        params![Utc::now().to_rfc3339()],
    )
    .context("stamp saved_at")?;
    tx.commit().context("commit save transaction")?;
    info!(
        "saved {} users, {} predictions, {} matches",
        data.users.len(),
        data.predictions.len(),
        data.matches.len()
    );
    Ok(())
}

pub fn last_saved_at(conn: &Connection) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM meta WHERE key = 'saved_at'", [], |row| {
        row.get(0)
    })
    .optional()
    .context("read saved_at")
}

fn load_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn
        .prepare("SELECT utente, punti, jolly_usati, gettoni_sfida FROM utenti ORDER BY rowid")
        .context("prepare load users")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .context("query load users")?;

    let mut out = Vec::new();
    for row in rows {
        let (id, points, wildcards, tokens) = row.context("decode user row")?;
        out.push(User {
            id,
            points: points.unwrap_or(0.0),
            wildcards_used: to_u32(wildcards, "jolly_usati")?,
            challenge_tokens: to_u32(tokens, "gettoni_sfida")?,
        });
    }
    Ok(out)
}

fn load_predictions(conn: &Connection) -> Result<Vec<Prediction>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT utente, giornata, partita, pronostico, jolly, sfida, sfidato
            FROM pronostici
            ORDER BY rowid
            "#,
        )
        .context("prepare load predictions")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Value>(4)?,
                row.get::<_, Value>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })
        .context("query load predictions")?;

    let mut out = Vec::new();
    for row in rows {
        let (user, round, match_id, pick, wildcard, challenge, opponent) =
            row.context("decode prediction row")?;
        out.push(Prediction {
            user,
            round: to_u32(round, "pronostici.giornata")?,
            match_id,
            pick: pick.unwrap_or_default(),
            wildcard: value_to_flag(&wildcard),
            challenge: value_to_flag(&challenge),
            opponent: opponent
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        });
    }
    Ok(out)
}

fn load_matches(conn: &Connection) -> Result<Vec<Match>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT giornata, partita, casa, ospite, quota1, quotaX, quota2, risultato
            FROM partite
            ORDER BY rowid
            "#,
        )
        .context("prepare load matches")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Value>(4)?,
                row.get::<_, Value>(5)?,
                row.get::<_, Value>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        let (round, id, home, away, q1, qx, q2, result) = row.context("decode match row")?;
        let result = result.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let parsed = result.and_then(Outcome::from_code);
        if let (Some(raw), None) = (result, parsed) {
            warn!("match {id}: unrecognised result {raw:?}, treating as unplayed");
        }
        out.push(Match {
            round: to_u32(round, "partite.giornata")?,
            odds_home: value_to_odds(&q1, &id, "quota1"),
            odds_draw: value_to_odds(&qx, &id, "quotaX"),
            odds_away: value_to_odds(&q2, &id, "quota2"),
            id,
            home,
            away,
            result: parsed,
        });
    }
    Ok(out)
}

fn insert_user(tx: &Transaction<'_>, user: &User) -> Result<()> {
    tx.execute(
        "INSERT INTO utenti (utente, punti, jolly_usati, gettoni_sfida) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.id,
            user.points,
            user.wildcards_used as i64,
            user.challenge_tokens as i64
        ],
    )
    .with_context(|| format!("insert user {}", user.id))?;
    Ok(())
}

fn insert_prediction(tx: &Transaction<'_>, p: &Prediction) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO pronostici (utente, giornata, partita, pronostico, jolly, sfida, sfidato)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            p.user,
            p.round as i64,
            p.match_id,
            p.pick,
            p.wildcard as i64,
            p.challenge as i64,
            p.opponent
        ],
    )
    .with_context(|| format!("insert prediction {} {}", p.user, p.match_id))?;
    Ok(())
}

fn insert_match(tx: &Transaction<'_>, m: &Match) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO partite (giornata, partita, casa, ospite, quota1, quotaX, quota2, risultato)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            m.round as i64,
            m.id,
            m.home,
            m.away,
            m.odds_home,
            m.odds_draw,
            m.odds_away,
            m.result.map(Outcome::code)
        ],
    )
    .with_context(|| format!("insert match {}", m.id))?;
    Ok(())
}

fn to_u32(raw: i64, column: &str) -> Result<u32> {
    u32::try_from(raw)
        .map_err(|_| LeagueError::InvalidInput(format!("{column}: {raw} out of range")).into())
}

fn value_to_odds(value: &Value, match_id: &str, column: &str) -> Option<f64> {
    let parsed = match value {
        Value::Integer(v) => Some(*v as f64),
        Value::Real(v) => Some(*v).filter(|v| v.is_finite()),
        Value::Text(raw) => parse_odds_text(raw),
        Value::Null => return None,
        Value::Blob(_) => None,
    };
    if parsed.is_none() {
        warn!("match {match_id}: unusable {column} cell");
    }
    parsed
}

fn value_to_flag(value: &Value) -> bool {
    match value {
        Value::Integer(v) => *v != 0,
        Value::Real(v) => *v != 0.0,
        Value::Text(raw) => parse_flag_text(raw),
        Value::Null | Value::Blob(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_odds_cells_are_parsed_leniently() {
        assert_eq!(value_to_odds(&Value::Text("2,10".to_string()), "m", "quota1"), Some(2.1));
        assert_eq!(value_to_odds(&Value::Text("?".to_string()), "m", "quota1"), None);
        assert_eq!(value_to_odds(&Value::Integer(3), "m", "quota1"), Some(3.0));
        assert_eq!(value_to_odds(&Value::Null, "m", "quota1"), None);
    }

    #[test]
    fn flag_cells_accept_text_and_numbers() {
        assert!(value_to_flag(&Value::Integer(1)));
        assert!(value_to_flag(&Value::Text("TRUE".to_string())));
        assert!(!value_to_flag(&Value::Text("".to_string())));
        assert!(!value_to_flag(&Value::Null));
    }
}
