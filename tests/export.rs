use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use polipone::export::{export_workbook, leaderboard_rows, match_rows, prediction_rows};
use polipone::league::PredictionInput;
use polipone::model::{LeagueData, Match, Odds, Outcome};
use polipone::scoring::compute_leaderboard;

fn league() -> LeagueData {
    let mut data = LeagueData::default();
    data.add_user("anna").expect("anna");
    data.add_user("bruno").expect("bruno");
    data.add_match(
        2,
        "Roma",
        "Lazio",
        Odds {
            home: 1.8,
            draw: 3.2,
            away: 4.0,
        },
    )
    .expect("match");
    data.set_result(2, "Roma-Lazio", Some(Outcome::Home))
        .expect("result");
    data.save_prediction(PredictionInput {
        user: "bruno".to_string(),
        round: 2,
        match_id: "Roma-Lazio".to_string(),
        pick: Outcome::Home,
        wildcard: true,
        opponent: None,
    })
    .expect("prediction");
    data.matches.push(Match {
        round: 3,
        id: "Milan-Inter".to_string(),
        home: "Milan".to_string(),
        away: "Inter".to_string(),
        odds_home: None,
        odds_draw: Some(3.1),
        odds_away: None,
        result: None,
    });
    data
}

#[test]
fn leaderboard_sheet_numbers_positions() {
    let data = league();
    let board = compute_leaderboard(&data.users, &data.predictions, &data.matches);
    let rows = leaderboard_rows(&board);
    assert_eq!(
        rows[0],
        vec!["posizione", "utente", "punti", "jolly_usati", "gettoni_sfida"]
    );
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][..3], ["1", "bruno", "3.60"]);
    assert_eq!(rows[2][..3], ["2", "anna", "0.00"]);
}

#[test]
fn match_sheet_leaves_missing_cells_empty() {
    let rows = match_rows(&league());
    assert_eq!(
        rows[0],
        vec![
            "giornata",
            "partita",
            "casa",
            "ospite",
            "quota1",
            "quotaX",
            "quota2",
            "risultato"
        ]
    );
    assert_eq!(rows[1], vec!["2", "Roma-Lazio", "Roma", "Lazio", "1.8", "3.2", "4", "1"]);
    assert_eq!(rows[2], vec!["3", "Milan-Inter", "Milan", "Inter", "", "3.1", "", ""]);
}

#[test]
fn prediction_sheet_keeps_flags_and_blank_opponent() {
    let rows = prediction_rows(&league());
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1],
        vec!["bruno", "2", "Roma-Lazio", "1", "true", "false", ""]
    );
}

#[test]
fn workbook_is_written_with_table_counts() {
    let data = league();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let path = std::env::temp_dir().join(format!("polipone_export_{nanos}.xlsx"));

    let report = export_workbook(&path, &data).expect("export");
    let written = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let _ = fs::remove_file(&path);

    assert_eq!(report.users, 2);
    assert_eq!(report.predictions, 1);
    assert_eq!(report.matches, 2);
    assert!(written > 0);
}
