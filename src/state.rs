use std::collections::VecDeque;

use crate::league::MatchBoard;
use crate::model::{LeagueData, Match, User};
use crate::scoring::{Movement, ScoreReport, score_league};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Leaderboard,
    Board,
    Matches,
}

pub struct AppState {
    pub title: String,
    pub screen: Screen,
    pub data: LeagueData,
    pub report: ScoreReport,
    pub rounds: Vec<u32>,
    pub round_idx: usize,
    pub selected: usize,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(title: impl Into<String>, data: LeagueData) -> Self {
        let mut state = Self {
            title: title.into(),
            screen: Screen::Leaderboard,
            data: LeagueData::default(),
            report: ScoreReport::default(),
            rounds: Vec::new(),
            round_idx: 0,
            selected: 0,
            help_overlay: false,
            logs: VecDeque::new(),
        };
        state.reload(data);
        state.round_idx = state.default_round_idx();
        state
    }

    /// Swaps in a fresh snapshot and rescores it, keeping the current round when it still exists.
    pub fn reload(&mut self, data: LeagueData) {
        let current = self.current_round();
        self.report = score_league(&data);
        self.rounds = data.rounds();
        self.data = data;
        self.round_idx = current
            .and_then(|r| self.rounds.iter().position(|x| *x == r))
            .unwrap_or_else(|| self.default_round_idx());
        self.clamp_selection();
        let skipped = self.report.skipped.len();
        self.push_log(format!(
            "scored {} predictions ({skipped} skipped)",
            self.data.predictions.len()
        ));
    }

    /// First round that still has an unplayed match, otherwise the last round.
    fn default_round_idx(&self) -> usize {
        self.rounds
            .iter()
            .position(|r| {
                self.data
                    .matches
                    .iter()
                    .any(|m| m.round == *r && m.result.is_none())
            })
            .unwrap_or_else(|| self.rounds.len().saturating_sub(1))
    }

    pub fn current_round(&self) -> Option<u32> {
        self.rounds.get(self.round_idx).copied()
    }

    pub fn next_round(&mut self) {
        if self.round_idx + 1 < self.rounds.len() {
            self.round_idx += 1;
            self.selected = 0;
        }
    }

    pub fn prev_round(&mut self) {
        if self.round_idx > 0 {
            self.round_idx -= 1;
            self.selected = 0;
        }
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.selected = 0;
    }

    pub fn leaderboard(&self) -> &[User] {
        &self.report.leaderboard
    }

    pub fn round_matches(&self) -> Vec<&Match> {
        self.current_round()
            .map(|r| self.data.matches_in_round(r))
            .unwrap_or_default()
    }

    pub fn round_board(&self) -> Vec<MatchBoard> {
        self.current_round()
            .map(|r| self.data.round_board(r))
            .unwrap_or_default()
    }

    pub fn selected_user(&self) -> Option<&User> {
        match self.screen {
            Screen::Leaderboard => self.report.leaderboard.get(self.selected),
            _ => None,
        }
    }

    pub fn selected_movements(&self) -> Vec<&Movement> {
        let Some(user) = self.selected_user() else {
            return Vec::new();
        };
        self.report.movements_for(&user.id).collect()
    }

    fn row_count(&self) -> usize {
        match self.screen {
            Screen::Leaderboard => self.report.leaderboard.len(),
            Screen::Board | Screen::Matches => self.round_matches().len(),
        }
    }

    pub fn select_next(&mut self) {
        let total = self.row_count();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.row_count();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.row_count();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}
