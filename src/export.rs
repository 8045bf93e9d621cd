use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::{LeagueData, User};
use crate::scoring::compute_leaderboard;

pub struct ExportReport {
    pub users: usize,
    pub predictions: usize,
    pub matches: usize,
}

/// Writes the leaderboard and the three tables, one sheet each.
pub fn export_workbook(path: &Path, data: &LeagueData) -> Result<ExportReport> {
    let leaderboard = compute_leaderboard(&data.users, &data.predictions, &data.matches);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("classifica")?;
        write_rows(sheet, &leaderboard_rows(&leaderboard))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("utenti")?;
        write_rows(sheet, &user_rows(&data.users))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("pronostici")?;
        write_rows(sheet, &prediction_rows(data))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("partite")?;
        write_rows(sheet, &match_rows(data))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    info!("exported workbook {}", path.display());

    Ok(ExportReport {
        users: data.users.len(),
        predictions: data.predictions.len(),
        matches: data.matches.len(),
    })
}

pub fn leaderboard_rows(leaderboard: &[User]) -> Vec<Vec<String>> {
    let mut rows = vec![header(&["posizione", "utente", "punti", "jolly_usati", "gettoni_sfida"])];
    for (idx, user) in leaderboard.iter().enumerate() {
        rows.push(vec![
            (idx + 1).to_string(),
            user.id.clone(),
            format_points(user.points),
            user.wildcards_used.to_string(),
            user.challenge_tokens.to_string(),
        ]);
    }
    rows
}

pub fn user_rows(users: &[User]) -> Vec<Vec<String>> {
    let mut rows = vec![header(&["utente", "punti", "jolly_usati", "gettoni_sfida"])];
    rows.extend(users.iter().map(|u| {
        vec![
            u.id.clone(),
            format_points(u.points),
            u.wildcards_used.to_string(),
            u.challenge_tokens.to_string(),
        ]
    }));
    rows
}

pub fn prediction_rows(data: &LeagueData) -> Vec<Vec<String>> {
    let mut rows = vec![header(&[
        "utente",
        "giornata",
        "partita",
        "pronostico",
        "jolly",
        "sfida",
        "sfidato",
    ])];
    rows.extend(data.predictions.iter().map(|p| {
        vec![
            p.user.clone(),
            p.round.to_string(),
            p.match_id.clone(),
            p.pick.clone(),
            p.wildcard.to_string(),
            p.challenge.to_string(),
            p.opponent.clone().unwrap_or_default(),
        ]
    }));
    rows
}

pub fn match_rows(data: &LeagueData) -> Vec<Vec<String>> {
    let mut rows = vec![header(&[
        "giornata",
        "partita",
        "casa",
        "ospite",
        "quota1",
        "quotaX",
        "quota2",
        "risultato",
    ])];
    rows.extend(data.matches.iter().map(|m| {
        vec![
            m.round.to_string(),
            m.id.clone(),
            m.home.clone(),
            m.away.clone(),
            opt_to_string(m.odds_home),
            opt_to_string(m.odds_draw),
            opt_to_string(m.odds_away),
            opt_to_string(m.result),
        ]
    }));
    rows
}

pub fn format_points(points: f64) -> String {
    format!("{points:.2}")
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
