use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use crate::model::{LeagueData, Match, Outcome, Prediction, User};

/// Why a prediction contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownMatch,
    Unplayed,
    UnresolvedOdds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementKind {
    Pick { correct: bool, wildcard: bool },
    /// Head-to-head loss; `challenger_lost` is set when the declaring user pays.
    ChallengePenalty { challenger_lost: bool },
}

/// One applied point change, in processing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    pub row: usize,
    pub user: String,
    pub round: u32,
    pub match_id: String,
    pub kind: MovementKind,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub row: usize,
    pub user: String,
    pub round: u32,
    pub match_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    pub leaderboard: Vec<User>,
    pub movements: Vec<Movement>,
    pub skipped: Vec<Skipped>,
}

impl ScoreReport {
    pub fn movements_for<'a>(&'a self, user: &'a str) -> impl Iterator<Item = &'a Movement> + 'a {
        self.movements.iter().filter(move |m| m.user == user)
    }
}

pub type MatchIndex<'a> = HashMap<(u32, &'a str), &'a Match>;

type PickIndex<'a> = HashMap<(&'a str, u32, &'a str), &'a Prediction>;

/// Ranked users with freshly computed points.
///
/// Every call starts from zero and replays the full prediction history, so the
/// result depends only on the three tables. Ties keep the order of `users`.
pub fn compute_leaderboard(
    users: &[User],
    predictions: &[Prediction],
    matches: &[Match],
) -> Vec<User> {
    score_snapshot(users, predictions, matches).leaderboard
}

pub fn score_league(data: &LeagueData) -> ScoreReport {
    score_snapshot(&data.users, &data.predictions, &data.matches)
}

/// Same computation as [`compute_leaderboard`], keeping the audit trail.
pub fn score_snapshot(users: &[User], predictions: &[Prediction], matches: &[Match]) -> ScoreReport {
    let index = index_matches(matches);
    let picks = index_picks(predictions);
    let mut totals: HashMap<&str, f64> = users.iter().map(|u| (u.id.as_str(), 0.0)).collect();
    let mut movements = Vec::new();
    let mut skipped = Vec::new();

    for (row, prediction) in predictions.iter().enumerate() {
        let scored = match score_pick(&index, prediction) {
            Ok(scored) => scored,
            Err(reason) => {
                debug!(
                    "skip prediction {row} ({} {} r{}): {reason:?}",
                    prediction.user, prediction.match_id, prediction.round
                );
                skipped.push(Skipped {
                    row,
                    user: prediction.user.clone(),
                    round: prediction.round,
                    match_id: prediction.match_id.clone(),
                    reason,
                });
                continue;
            }
        };

        credit(&mut totals, &prediction.user, scored.delta);
        movements.push(Movement {
            row,
            user: prediction.user.clone(),
            round: prediction.round,
            match_id: prediction.match_id.clone(),
            kind: MovementKind::Pick {
                correct: scored.correct,
                wildcard: prediction.wildcard,
            },
            points: scored.delta,
        });

        let Some(opponent) = prediction.challenged() else {
            continue;
        };
        if !totals.contains_key(opponent) {
            continue;
        }
        if let Some(penalty) = resolve_challenge(&picks, prediction, opponent, &scored) {
            credit(&mut totals, penalty.user, -penalty.amount);
            movements.push(Movement {
                row,
                user: penalty.user.to_string(),
                round: prediction.round,
                match_id: prediction.match_id.clone(),
                kind: MovementKind::ChallengePenalty {
                    challenger_lost: penalty.user == prediction.user,
                },
                points: -penalty.amount,
            });
        }
    }

    ScoreReport {
        leaderboard: rank(users, &totals),
        movements,
        skipped,
    }
}

/// Duplicate keys: the later match overwrites the earlier one.
pub fn index_matches(matches: &[Match]) -> MatchIndex<'_> {
    matches.iter().map(|m| ((m.round, m.id.as_str()), m)).collect()
}

/// First prediction per (user, round, match) wins, matching how opponents are looked up.
fn index_picks(predictions: &[Prediction]) -> PickIndex<'_> {
    let mut out = PickIndex::new();
    for p in predictions {
        out.entry((p.user.as_str(), p.round, p.match_id.as_str()))
            .or_insert(p);
    }
    out
}

/// Odds implied by `pick` for this match, or `None` when the code is not an
/// outcome slot or the stored odds are unusable.
pub fn resolve_odds(fixture: &Match, pick: &str) -> Option<f64> {
    let outcome = Outcome::from_code(pick)?;
    fixture.odds_for(outcome).filter(|odds| odds.is_finite())
}

/// Double-or-nothing: the wildcard doubles a win and costs twice the odds on a miss.
pub fn pick_delta(correct: bool, wildcard: bool, odds: f64) -> f64 {
    match (correct, wildcard) {
        (true, false) => odds,
        (true, true) => 2.0 * odds,
        (false, false) => 0.0,
        (false, true) => -2.0 * odds,
    }
}

struct ScoredPick<'a> {
    fixture: &'a Match,
    result: Outcome,
    odds: f64,
    correct: bool,
    delta: f64,
}

fn score_pick<'a>(
    index: &MatchIndex<'a>,
    prediction: &'a Prediction,
) -> Result<ScoredPick<'a>, SkipReason> {
    let fixture = *index
        .get(&(prediction.round, prediction.match_id.as_str()))
        .ok_or(SkipReason::UnknownMatch)?;
    let result = fixture.result.ok_or(SkipReason::Unplayed)?;
    let odds = resolve_odds(fixture, &prediction.pick).ok_or(SkipReason::UnresolvedOdds)?;
    let correct = prediction.outcome() == Some(result);
    Ok(ScoredPick {
        fixture,
        result,
        odds,
        correct,
        delta: pick_delta(correct, prediction.wildcard, odds),
    })
}

struct Penalty<'a> {
    user: &'a str,
    amount: f64,
}

fn resolve_challenge<'a>(
    picks: &PickIndex<'a>,
    challenger: &'a Prediction,
    opponent: &'a str,
    scored: &ScoredPick<'_>,
) -> Option<Penalty<'a>> {
    let theirs = picks.get(&(opponent, challenger.round, challenger.match_id.as_str()))?;
    let opponent_correct = theirs.outcome() == Some(scored.result);

    match (scored.correct, opponent_correct) {
        (true, false) => {
            // Opponent pays with the odds of their own pick.
            let amount = resolve_odds(scored.fixture, &theirs.pick)?;
            Some(Penalty {
                user: opponent,
                amount,
            })
        }
        (false, true) => Some(Penalty {
            user: challenger.user.as_str(),
            amount: scored.odds,
        }),
        _ => None,
    }
}

fn credit(totals: &mut HashMap<&str, f64>, user: &str, delta: f64) {
    if let Some(points) = totals.get_mut(user) {
        *points += delta;
    }
}

fn rank(users: &[User], totals: &HashMap<&str, f64>) -> Vec<User> {
    let mut out: Vec<User> = users
        .iter()
        .map(|u| User {
            points: totals.get(u.id.as_str()).copied().unwrap_or(0.0),
            ..u.clone()
        })
        .collect();
    // Stable: equal totals keep user-table order. NaN totals sink to the bottom.
    out.sort_by(|a, b| match (a.points.is_nan(), b.points.is_nan()) {
        (false, false) => b.points.partial_cmp(&a.points).unwrap_or(Ordering::Equal),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    out
}
