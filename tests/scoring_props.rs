use std::collections::HashMap;

use proptest::prelude::*;

use polipone::model::{Match, Outcome, Prediction, User};
use polipone::scoring::compute_leaderboard;

const USERS: [&str; 4] = ["anna", "bruno", "carla", "dario"];
const CODES: [&str; 4] = ["1", "X", "2", "?"];

fn outcome_strategy() -> impl Strategy<Value = Option<Outcome>> {
    prop_oneof![
        Just(None),
        Just(Some(Outcome::Home)),
        Just(Some(Outcome::Draw)),
        Just(Some(Outcome::Away)),
    ]
}

fn odds_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (100u32..900).prop_map(|c| Some(c as f64 / 100.0))]
}

fn matches_strategy() -> impl Strategy<Value = Vec<Match>> {
    prop::collection::vec(
        (odds_strategy(), odds_strategy(), odds_strategy(), outcome_strategy()),
        1..5,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (h, d, a, result))| Match {
                round: 1,
                id: format!("m{idx}"),
                home: format!("H{idx}"),
                away: format!("A{idx}"),
                odds_home: h,
                odds_draw: d,
                odds_away: a,
                result,
            })
            .collect()
    })
}

fn predictions_strategy() -> impl Strategy<Value = Vec<Prediction>> {
    prop::collection::vec(
        (0usize..4, 0usize..5, 0usize..4, any::<bool>(), prop::option::of(0usize..4)),
        0..16,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(user, m, code, wildcard, opponent)| Prediction {
                user: USERS[user].to_string(),
                round: 1,
                match_id: format!("m{m}"),
                pick: CODES[code].to_string(),
                wildcard,
                challenge: opponent.is_some(),
                opponent: opponent.map(|o| USERS[o].to_string()),
            })
            .collect()
    })
}

fn totals(board: &[User]) -> HashMap<String, f64> {
    board.iter().map(|u| (u.id.clone(), u.points)).collect()
}

fn users() -> Vec<User> {
    USERS.iter().map(|id| User::new(*id)).collect()
}

proptest! {
    #[test]
    fn scoring_is_idempotent(matches in matches_strategy(), predictions in predictions_strategy()) {
        let users = users();
        let first = compute_leaderboard(&users, &predictions, &matches);
        let second = compute_leaderboard(&users, &predictions, &matches);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn leaderboard_is_sorted_descending(matches in matches_strategy(), predictions in predictions_strategy()) {
        let board = compute_leaderboard(&users(), &predictions, &matches);
        prop_assert_eq!(board.len(), USERS.len());
        for pair in board.windows(2) {
            prop_assert!(pair[0].points >= pair[1].points);
        }
    }

    #[test]
    fn match_order_does_not_change_totals(matches in matches_strategy(), predictions in predictions_strategy()) {
        let users = users();
        let mut reversed = matches.clone();
        reversed.reverse();
        let a = totals(&compute_leaderboard(&users, &predictions, &matches));
        let b = totals(&compute_leaderboard(&users, &predictions, &reversed));
        for id in USERS {
            prop_assert!((a[id] - b[id]).abs() < 1e-9);
        }
    }

    #[test]
    fn unplayed_league_scores_zero(mut matches in matches_strategy(), predictions in predictions_strategy()) {
        for m in &mut matches {
            m.result = None;
        }
        let board = compute_leaderboard(&users(), &predictions, &matches);
        prop_assert!(board.iter().all(|u| u.points == 0.0));
    }
}
