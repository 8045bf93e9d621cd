use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

use polipone::config::AppConfig;
use polipone::export::{self, format_points};
use polipone::league::PredictionInput;
use polipone::model::{LeagueData, Odds, Outcome};
use polipone::scoring::{MovementKind, score_league};
use polipone::{snapshot, store};

const USAGE: &str = "\
usage: polipone_admin [--db PATH] [--verbose] <command> [args]

commands:
  add-user <id>
  remove-user <id>
  add-match <round> <home> <away> <quota1> <quotaX> <quota2>
  set-result <round> <match-id> <1|X|2|none>
  predict <user> <round> <match-id> <1|X|2> [--jolly] [--sfida <user>]
  leaderboard [--detail]
  board <round>
  import-json <path>
  export-json <path>
  export-xlsx [--out PATH]";

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    let verbose = take_flag(&mut args, "--verbose");
    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let db = take_value(&mut args, "--db")?.map(PathBuf::from);
    let out = take_value(&mut args, "--out")?.map(PathBuf::from);
    let config = AppConfig::from_env()?.with_overrides(db, out);

    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let mut conn = store::open_db(&config.db_path)?;
    let mut data = store::load_snapshot(&conn)?;

    let changed = run_command(command, rest, &mut data, &config)?;
    if changed {
        store::save_snapshot(&mut conn, &data)?;
        println!("Saved to {}", config.db_path.display());
    }
    Ok(())
}

/// Returns whether the snapshot was modified and needs saving.
fn run_command(
    command: &str,
    args: &[String],
    data: &mut LeagueData,
    config: &AppConfig,
) -> Result<bool> {
    match command {
        "add-user" => {
            let [id] = expect_args::<1>(args, "add-user <id>")?;
            data.add_user(id)?;
            println!("User {id} added");
            Ok(true)
        }
        "remove-user" => {
            let [id] = expect_args::<1>(args, "remove-user <id>")?;
            data.remove_user(id)?;
            println!("User {id} removed");
            Ok(true)
        }
        "add-match" => {
            let [round, home, away, q1, qx, q2] = expect_args::<6>(
                args,
                "add-match <round> <home> <away> <quota1> <quotaX> <quota2>",
            )?;
            let odds = Odds {
                home: parse_odds(q1)?,
                draw: parse_odds(qx)?,
                away: parse_odds(q2)?,
            };
            let added = data.add_match(parse_round(round)?, home, away, odds)?;
            println!("Match {} added to round {}", added.id, added.round);
            Ok(true)
        }
        "set-result" => {
            let [round, match_id, result] =
                expect_args::<3>(args, "set-result <round> <match-id> <1|X|2|none>")?;
            let result = match result.as_str() {
                "none" | "-" => None,
                raw => Some(raw.parse::<Outcome>()?),
            };
            data.set_result(parse_round(round)?, match_id, result)?;
            println!("Result saved for {match_id}");
            Ok(true)
        }
        "predict" => {
            let mut args = args.to_vec();
            let wildcard = take_flag(&mut args, "--jolly");
            let opponent = take_value(&mut args, "--sfida")?;
            let [user, round, match_id, pick] =
                expect_args::<4>(&args, "predict <user> <round> <match-id> <1|X|2>")?;
            data.save_prediction(PredictionInput {
                user: user.clone(),
                round: parse_round(round)?,
                match_id: match_id.clone(),
                pick: pick.parse()?,
                wildcard,
                opponent,
            })?;
            println!("Prediction saved for {user} on {match_id}");
            Ok(true)
        }
        "leaderboard" => {
            let detail = args.iter().any(|a| a == "--detail");
            print_leaderboard(data, detail);
            Ok(false)
        }
        "board" => {
            let [round] = expect_args::<1>(args, "board <round>")?;
            print_board(data, parse_round(round)?);
            Ok(false)
        }
        "import-json" => {
            let [path] = expect_args::<1>(args, "import-json <path>")?;
            *data = snapshot::read_snapshot(&PathBuf::from(path))?;
            println!(
                "Imported {} users, {} predictions, {} matches",
                data.users.len(),
                data.predictions.len(),
                data.matches.len()
            );
            Ok(true)
        }
        "export-json" => {
            let [path] = expect_args::<1>(args, "export-json <path>")?;
            snapshot::write_snapshot(&PathBuf::from(path), data)?;
            println!("Snapshot written to {path}");
            Ok(false)
        }
        "export-xlsx" => {
            let report = export::export_workbook(&config.export_path, data)?;
            println!(
                "Workbook written to {} ({} users, {} predictions, {} matches)",
                config.export_path.display(),
                report.users,
                report.predictions,
                report.matches
            );
            Ok(false)
        }
        other => Err(anyhow!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_leaderboard(data: &LeagueData, detail: bool) {
    let report = score_league(data);
    for (idx, user) in report.leaderboard.iter().enumerate() {
        println!(
            "{:>3}. {:<20} {:>8}  jolly {}  sfide {}",
            idx + 1,
            user.id,
            format_points(user.points),
            user.wildcards_used,
            user.challenge_tokens
        );
        if !detail {
            continue;
        }
        for m in report.movements_for(&user.id) {
            let what = match m.kind {
                MovementKind::Pick { correct: true, .. } => "hit",
                MovementKind::Pick { correct: false, .. } => "miss",
                MovementKind::ChallengePenalty { .. } => "challenge lost",
            };
            println!("       r{} {:<24} {:<15} {:+.2}", m.round, m.match_id, what, m.points);
        }
    }
    if detail && !report.skipped.is_empty() {
        println!("Skipped predictions: {}", report.skipped.len());
        for s in report.skipped.iter().take(20) {
            println!(" - {} r{} {}: {:?}", s.user, s.round, s.match_id, s.reason);
        }
    }
}

fn print_board(data: &LeagueData, round: u32) {
    let board = data.round_board(round);
    if board.is_empty() {
        println!("No matches in round {round}");
        return;
    }
    for m in board {
        let result = m.result.map(|r| r.code()).unwrap_or("not played");
        println!("{} - {} ({result})", m.home, m.away);
        for pick in &m.picks {
            println!("   {:<20} {}", pick.user, pick.badge());
        }
    }
}

fn expect_args<'a, const N: usize>(args: &'a [String], usage: &str) -> Result<[&'a String; N]> {
    if args.len() != N {
        bail!("usage: {usage}");
    }
    let mut out = [&args[0]; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg;
    }
    Ok(out)
}

fn parse_round(raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("invalid round `{raw}`"))
}

fn parse_odds(raw: &str) -> Result<f64> {
    polipone::model::parse_odds_text(raw).with_context(|| format!("invalid odds `{raw}`"))
}

fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != name);
    args.len() != before
}

/// Removes `name VALUE` or `name=VALUE`; the flag without a value is an error.
fn take_value(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let prefix = format!("{name}=");
    let raw = if let Some(idx) = args.iter().position(|a| a.starts_with(&prefix)) {
        let arg = args.remove(idx);
        arg[prefix.len()..].to_string()
    } else if let Some(idx) = args.iter().position(|a| a == name) {
        args.remove(idx);
        if idx < args.len() {
            args.remove(idx)
        } else {
            String::new()
        }
    } else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        bail!("{name} needs a value");
    }
    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn value_flag_accepts_both_spellings() {
        let mut list = args(&["anna", "--sfida", "bruno", "5"]);
        assert_eq!(
            take_value(&mut list, "--sfida").expect("value"),
            Some("bruno".to_string())
        );
        assert_eq!(list, args(&["anna", "5"]));

        let mut list = args(&["--sfida=carla", "anna"]);
        assert_eq!(
            take_value(&mut list, "--sfida").expect("value"),
            Some("carla".to_string())
        );
        assert_eq!(list, args(&["anna"]));
    }

    #[test]
    fn absent_value_flag_is_none() {
        let mut list = args(&["anna", "5"]);
        assert_eq!(take_value(&mut list, "--sfida").expect("absent"), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn value_flag_without_value_is_rejected() {
        assert!(take_value(&mut args(&["anna", "--sfida"]), "--sfida").is_err());
        assert!(take_value(&mut args(&["--sfida=", "anna"]), "--sfida").is_err());
        assert!(take_value(&mut args(&["--sfida", "  "]), "--sfida").is_err());
    }

    #[test]
    fn take_flag_reports_presence() {
        let mut list = args(&["anna", "--jolly"]);
        assert!(take_flag(&mut list, "--jolly"));
        assert!(!take_flag(&mut list, "--jolly"));
        assert_eq!(list, args(&["anna"]));
    }
}
