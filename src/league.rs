use std::collections::BTreeSet;

use log::info;

use crate::error::LeagueError;
use crate::model::{LeagueData, Match, Odds, Outcome, Prediction, User, match_id};

const WILDCARD_FIRST_ROUND: u32 = 2;
const WILDCARD_EVERY: u32 = 2;
const CHALLENGE_FIRST_ROUND: u32 = 5;
const CHALLENGE_EVERY: u32 = 5;
const MIN_ODDS: f64 = 1.0;

/// Rounds 2, 4, 6, ...
pub fn wildcard_available(round: u32) -> bool {
    round >= WILDCARD_FIRST_ROUND && (round - WILDCARD_FIRST_ROUND) % WILDCARD_EVERY == 0
}

/// Rounds 5, 10, 15, ...
pub fn challenge_available(round: u32) -> bool {
    round >= CHALLENGE_FIRST_ROUND && (round - CHALLENGE_FIRST_ROUND) % CHALLENGE_EVERY == 0
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInput {
    pub user: String,
    pub round: u32,
    pub match_id: String,
    pub pick: Outcome,
    pub wildcard: bool,
    pub opponent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardPick {
    pub user: String,
    pub pick: Option<String>,
    pub wildcard: bool,
    pub challenge: bool,
}

impl BoardPick {
    pub fn badge(&self) -> String {
        let mut out = self.pick.clone().unwrap_or_else(|| "-".to_string());
        if self.wildcard {
            out.push_str(" J");
        }
        if self.challenge {
            out.push_str(" S");
        }
        out
    }
}

/// One match of a round with every user's pick, in user-table order.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchBoard {
    pub match_id: String,
    pub home: String,
    pub away: String,
    pub result: Option<Outcome>,
    pub picks: Vec<BoardPick>,
}

impl LeagueData {
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_match(&self, round: u32, match_id: &str) -> Option<&Match> {
        self.matches
            .iter()
            .rev()
            .find(|m| m.round == round && m.id == match_id)
    }

    pub fn add_user(&mut self, id: &str) -> Result<(), LeagueError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(LeagueError::EmptyUserId);
        }
        if self.user(id).is_some() {
            return Err(LeagueError::DuplicateUser(id.to_string()));
        }
        self.users.push(User::new(id));
        info!("added user {id}");
        Ok(())
    }

    /// Drops the user row only; their predictions stay and simply score for nobody.
    pub fn remove_user(&mut self, id: &str) -> Result<User, LeagueError> {
        let pos = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| LeagueError::UnknownUser(id.to_string()))?;
        info!("removed user {id}");
        Ok(self.users.remove(pos))
    }

    pub fn add_match(
        &mut self,
        round: u32,
        home: &str,
        away: &str,
        odds: Odds,
    ) -> Result<&Match, LeagueError> {
        if round == 0 {
            return Err(LeagueError::InvalidRound(round));
        }
        let (home, away) = (home.trim(), away.trim());
        if home.is_empty() || away.is_empty() {
            return Err(LeagueError::InvalidTeam);
        }
        for value in [odds.home, odds.draw, odds.away] {
            if !value.is_finite() || value < MIN_ODDS {
                return Err(LeagueError::InvalidOdds(value));
            }
        }
        let id = match_id(home, away);
        if self.find_match(round, &id).is_some() {
            return Err(LeagueError::DuplicateMatch {
                round,
                match_id: id,
            });
        }
        self.matches.push(Match::new(round, home, away, odds));
        info!("added match {id} to round {round}");
        Ok(&self.matches[self.matches.len() - 1])
    }

    /// `None` clears the result, putting the match back to "not yet played".
    pub fn set_result(
        &mut self,
        round: u32,
        match_id: &str,
        result: Option<Outcome>,
    ) -> Result<(), LeagueError> {
        let fixture = self
            .matches
            .iter_mut()
            .rev()
            .find(|m| m.round == round && m.id == match_id)
            .ok_or_else(|| LeagueError::UnknownMatch {
                round,
                match_id: match_id.to_string(),
            })?;
        fixture.result = result;
        info!(
            "round {round} {match_id}: result {}",
            result.map(Outcome::code).unwrap_or("cleared")
        );
        Ok(())
    }

    /// Replace-on-save: any earlier prediction for the same (user, round, match) is dropped.
    pub fn save_prediction(&mut self, input: PredictionInput) -> Result<(), LeagueError> {
        if self.user(&input.user).is_none() {
            return Err(LeagueError::UnknownUser(input.user));
        }
        if self.find_match(input.round, &input.match_id).is_none() {
            return Err(LeagueError::UnknownMatch {
                round: input.round,
                match_id: input.match_id,
            });
        }
        if input.wildcard && !wildcard_available(input.round) {
            return Err(LeagueError::WildcardUnavailable(input.round));
        }
        if let Some(opponent) = input.opponent.as_deref() {
            if !challenge_available(input.round) {
                return Err(LeagueError::ChallengeUnavailable(input.round));
            }
            if opponent == input.user || self.user(opponent).is_none() {
                return Err(LeagueError::InvalidOpponent(opponent.to_string()));
            }
        }

        self.predictions.retain(|p| {
            !(p.user == input.user && p.round == input.round && p.match_id == input.match_id)
        });
        self.predictions.push(Prediction {
            user: input.user,
            round: input.round,
            match_id: input.match_id,
            pick: input.pick.code().to_string(),
            wildcard: input.wildcard,
            challenge: input.opponent.is_some(),
            opponent: input.opponent,
        });
        Ok(())
    }

    pub fn rounds(&self) -> Vec<u32> {
        self.matches
            .iter()
            .map(|m| m.round)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn matches_in_round(&self, round: u32) -> Vec<&Match> {
        self.matches.iter().filter(|m| m.round == round).collect()
    }

    pub fn predictions_for(&self, user: &str, round: u32) -> Vec<&Prediction> {
        self.predictions
            .iter()
            .filter(|p| p.user == user && p.round == round)
            .collect()
    }

    pub fn round_board(&self, round: u32) -> Vec<MatchBoard> {
        self.matches_in_round(round)
            .into_iter()
            .map(|m| MatchBoard {
                match_id: m.id.clone(),
                home: m.home.clone(),
                away: m.away.clone(),
                result: m.result,
                picks: self
                    .users
                    .iter()
                    .map(|u| {
                        let found = self
                            .predictions
                            .iter()
                            .find(|p| p.user == u.id && p.round == round && p.match_id == m.id);
                        BoardPick {
                            user: u.id.clone(),
                            pick: found.map(|p| p.pick.clone()),
                            wildcard: found.is_some_and(|p| p.wildcard),
                            challenge: found.is_some_and(|p| p.challenge),
                        }
                    })
                    .collect(),
            })
            .collect()
    }
}
