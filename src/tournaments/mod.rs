use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{schema::tournaments, util_resp::FailureResponse};

pub mod create;
pub mod manage;
pub mod view;

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Tournament {
    pub id: i32,
    pub name: String,
    pub date: NaiveDateTime,
}

/// Body of both the create and the replace requests.
#[derive(Deserialize, Debug)]
pub struct TournamentForm {
    pub name: String,
    pub date: NaiveDateTime,
}

impl Tournament {
    pub fn fetch(
        id: i32,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Tournament, FailureResponse> {
        tournaments::table
            .filter(tournaments::id.eq(id))
            .first::<Tournament>(conn)
            .optional()?
            .ok_or_else(|| {
                FailureResponse::NotFound("Tournament not found".to_string())
            })
    }

    /// Whether a tournament other than `except` already uses `name`.
    pub fn name_taken(
        name: &str,
        except: Option<i32>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<bool> {
        let mut query = tournaments::table
            .filter(tournaments::name.eq(name))
            .into_boxed();
        if let Some(id) = except {
            query = query.filter(tournaments::id.ne(id));
        }
        query
            .count()
            .get_result::<i64>(conn)
            .map(|count| count > 0)
    }
}
