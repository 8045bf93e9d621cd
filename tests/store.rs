use rusqlite::{Connection, params};

use polipone::league::PredictionInput;
use polipone::model::{LeagueData, Odds, Outcome};
use polipone::scoring::compute_leaderboard;
use polipone::store::{init_schema, last_saved_at, load_snapshot, save_snapshot};

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    init_schema(&conn).expect("schema");
    conn
}

fn sample() -> LeagueData {
    let mut data = LeagueData::default();
    for id in ["carla", "anna", "bruno"] {
        data.add_user(id).expect("user");
    }
    let odds = Odds {
        home: 1.8,
        draw: 3.2,
        away: 4.0,
    };
    data.add_match(5, "Roma", "Lazio", odds).expect("match");
    data.set_result(5, "Roma-Lazio", Some(Outcome::Home))
        .expect("result");
    data.save_prediction(PredictionInput {
        user: "anna".to_string(),
        round: 5,
        match_id: "Roma-Lazio".to_string(),
        pick: Outcome::Home,
        wildcard: false,
        opponent: Some("bruno".to_string()),
    })
    .expect("prediction");
    data
}

#[test]
fn saved_snapshot_loads_back_in_order() {
    let mut conn = memory_db();
    let data = sample();
    save_snapshot(&mut conn, &data).expect("save");
    let loaded = load_snapshot(&conn).expect("load");
    assert_eq!(loaded, data);
    assert!(last_saved_at(&conn).expect("meta").is_some());
}

#[test]
fn save_is_a_full_rewrite() {
    let mut conn = memory_db();
    let mut data = sample();
    save_snapshot(&mut conn, &data).expect("first save");
    data.remove_user("carla").expect("remove");
    save_snapshot(&mut conn, &data).expect("second save");
    let loaded = load_snapshot(&conn).expect("load");
    let ids: Vec<&str> = loaded.users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["anna", "bruno"]);
    assert_eq!(loaded.predictions.len(), 1);
    assert_eq!(loaded.matches.len(), 1);
}

#[test]
fn hand_edited_cells_load_leniently() {
    let conn = memory_db();
    conn.execute(
        "INSERT INTO utenti (utente, punti, jolly_usati, gettoni_sfida) VALUES ('anna', NULL, 1, 2)",
        [],
    )
    .expect("user");
    conn.execute(
        "INSERT INTO partite (giornata, partita, casa, ospite, quota1, quotaX, quota2, risultato)
         VALUES (3, 'Roma-Lazio', 'Roma', 'Lazio', '1,80', 'n/d', 4, '2-1')",
        [],
    )
    .expect("match");
    conn.execute(
        "INSERT INTO pronostici (utente, giornata, partita, pronostico, jolly, sfida, sfidato)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params!["anna", 3, "Roma-Lazio", "1", "TRUE", 0, ""],
    )
    .expect("prediction");

    let data = load_snapshot(&conn).expect("load");
    assert_eq!(data.users[0].points, 0.0);
    assert_eq!(data.users[0].challenge_tokens, 2);
    let m = &data.matches[0];
    assert_eq!(m.odds_home, Some(1.8));
    assert_eq!(m.odds_draw, None);
    assert_eq!(m.odds_away, Some(4.0));
    assert_eq!(m.result, None);
    let p = &data.predictions[0];
    assert!(p.wildcard);
    assert!(!p.challenge);
    assert_eq!(p.opponent, None);

    // The unparsable result means the match is still unplayed.
    let board = compute_leaderboard(&data.users, &data.predictions, &data.matches);
    assert_eq!(board[0].points, 0.0);
}

#[test]
fn negative_round_is_invalid_input() {
    let conn = memory_db();
    conn.execute(
        "INSERT INTO partite (giornata, partita, casa, ospite) VALUES (-1, 'A-B', 'A', 'B')",
        [],
    )
    .expect("match");
    let err = load_snapshot(&conn).expect_err("negative round must fail");
    assert!(format!("{err:#}").contains("invalid input"));
}
