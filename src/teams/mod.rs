use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::Serialize;

use crate::{schema::teams, util_resp::FailureResponse};

pub mod create;
pub mod join;
pub mod rating;

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub rating: i64,
}

impl Team {
    pub fn fetch(
        team_id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Team, FailureResponse> {
        let ret = teams::table
            .filter(teams::id.eq(team_id))
            .first::<Team>(conn)
            .optional()?
            .ok_or_else(|| FailureResponse::NotFound("Team not found".to_string()));

        tracing::trace!(team_id, "found? {}", ret.is_ok());

        ret
    }
}
