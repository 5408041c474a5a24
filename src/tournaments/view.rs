use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    extract::Query,
    schema::tournaments,
    state::Conn,
    tournaments::Tournament,
    util_resp::{StandardResponse, success},
};

#[derive(Deserialize, Debug)]
pub struct PageQuery {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    10
}

pub async fn list_tournaments(
    mut conn: Conn<false>,
    Query(page): Query<PageQuery>,
) -> StandardResponse {
    let tournaments = tournaments::table
        .order_by(tournaments::id.asc())
        .offset(i64::from(page.skip))
        .limit(i64::from(page.limit))
        .load::<Tournament>(&mut *conn)?;

    success(tournaments)
}
