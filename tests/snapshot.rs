use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use polipone::error::LeagueError;
use polipone::model::{LeagueData, Odds, Outcome, User};
use polipone::scoring::compute_leaderboard;
use polipone::snapshot::{decode_snapshot, encode_snapshot, read_snapshot, write_snapshot};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn spreadsheet_style_export_decodes_leniently() {
    let raw = read_fixture("league_snapshot.json");
    let data = decode_snapshot(&raw).expect("fixture should decode");
    assert_eq!(data.users.len(), 3);
    assert_eq!(data.matches.len(), 3);
    assert_eq!(data.predictions.len(), 5);

    let derby = &data.matches[0];
    assert_eq!(derby.odds_home, Some(1.8));
    assert_eq!(derby.odds_draw, Some(3.2));
    assert_eq!(derby.result, Some(Outcome::Home));
    assert_eq!(data.matches[1].result, None);
    assert_eq!(data.matches[2].odds_away, None);

    let anna = &data.predictions[0];
    assert!(anna.challenge);
    assert_eq!(anna.challenged(), Some("bruno"));
    assert_eq!(data.predictions[1].pick, "2");
    assert_eq!(data.predictions[1].opponent, None);
}

#[test]
fn fixture_leaderboard() {
    let data = decode_snapshot(&read_fixture("league_snapshot.json")).expect("decode");
    let board = compute_leaderboard(&data.users, &data.predictions, &data.matches);
    let order: Vec<(&str, f64)> = board.iter().map(|u| (u.id.as_str(), u.points)).collect();
    // anna: +1.8 derby; bruno: -4.0 derby challenge, +7.0 jolly on 3.5; carla untouched.
    assert_eq!(order[0].0, "bruno");
    assert!((order[0].1 - 3.0).abs() < 1e-9);
    assert_eq!(order[1].0, "anna");
    assert!((order[1].1 - 1.8).abs() < 1e-9);
    assert_eq!(order[2], ("carla", 0.0));
}

#[test]
fn structurally_invalid_snapshots_are_rejected() {
    assert!(matches!(
        decode_snapshot("{\"version\": 1, \"utenti\": 3}"),
        Err(LeagueError::InvalidInput(_))
    ));
    assert!(matches!(
        decode_snapshot("{\"version\": 2}"),
        Err(LeagueError::InvalidInput(_))
    ));
    assert!(matches!(
        decode_snapshot("not json"),
        Err(LeagueError::InvalidInput(_))
    ));
    let empty = decode_snapshot("{\"version\": 1}").expect("empty tables are valid");
    assert_eq!(empty, LeagueData::default());
}

#[test]
fn written_snapshot_reads_back() {
    let mut data = LeagueData::default();
    data.users.push(User::new("anna"));
    data.add_match(
        2,
        "Roma",
        "Lazio",
        Odds {
            home: 2.0,
            draw: 3.0,
            away: 3.5,
        },
    )
    .expect("match");
    data.set_result(2, "Roma-Lazio", Some(Outcome::Away))
        .expect("result");

    let encoded = encode_snapshot(&data).expect("encode");
    assert_eq!(decode_snapshot(&encoded).expect("decode"), data);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let path = std::env::temp_dir().join(format!("polipone_snapshot_{nanos}.json"));
    write_snapshot(&path, &data).expect("write");
    let loaded = read_snapshot(&path).expect("read");
    let _ = fs::remove_file(&path);
    assert_eq!(loaded, data);
}
