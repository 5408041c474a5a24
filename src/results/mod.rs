use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub mod create;

/// The score a team achieved at a tournament. Results are never edited or
/// removed. Deleting a tournament leaves its results in place with no
/// tournament, so they still count towards the team's rating.
#[derive(Queryable, Serialize, Clone, Debug)]
pub struct TournamentResult {
    pub id: i32,
    pub score: i32,
    pub team_id: i32,
    pub tournament_id: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct ResultForm {
    pub score: i32,
    pub team_id: i32,
    pub tournament_id: i32,
}
