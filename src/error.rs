use thiserror::Error;

/// Errors raised at the league boundary: decoding snapshots and validating admin edits.
///
/// The scoring engine itself never fails; malformed rows are skipped there.
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("user id must not be empty")]
    EmptyUserId,
    #[error("unknown user `{0}`")]
    UnknownUser(String),
    #[error("user `{0}` already exists")]
    DuplicateUser(String),
    #[error("no match `{match_id}` in round {round}")]
    UnknownMatch { round: u32, match_id: String },
    #[error("match `{match_id}` already exists in round {round}")]
    DuplicateMatch { round: u32, match_id: String },
    #[error("invalid outcome `{0}`, expected 1, X or 2")]
    InvalidOutcome(String),
    #[error("round must be at least 1, got {0}")]
    InvalidRound(u32),
    #[error("team names must not be empty")]
    InvalidTeam,
    #[error("odds must be at least 1.0, got {0}")]
    InvalidOdds(f64),
    #[error("wildcard is not available in round {0}")]
    WildcardUnavailable(u32),
    #[error("challenges are not available in round {0}")]
    ChallengeUnavailable(u32),
    #[error("`{0}` cannot be challenged")]
    InvalidOpponent(String),
}
