use diesel::prelude::*;

use crate::{
    extract::Json,
    results::{ResultForm, TournamentResult},
    schema::results,
    state::Conn,
    teams::{Team, rating::recompute},
    tournaments::Tournament,
    util_resp::{StandardResponse, success},
};

/// Records a result and brings the team's rating up to date. Both writes
/// happen in the request's transaction, so they are committed together.
#[tracing::instrument(skip_all, fields(team_id = form.team_id, tournament_id = form.tournament_id))]
pub async fn do_create_result(
    mut conn: Conn<true>,
    Json(form): Json<ResultForm>,
) -> StandardResponse {
    let team = Team::fetch(form.team_id, &mut *conn)?;
    let tournament = Tournament::fetch(form.tournament_id, &mut *conn)?;

    diesel::insert_into(results::table)
        .values((
            results::score.eq(form.score),
            results::team_id.eq(team.id),
            results::tournament_id.eq(Some(tournament.id)),
        ))
        .execute(&mut *conn)?;

    // the transaction holds SQLite's write lock, so nobody else can have
    // inserted since
    let result = results::table
        .order_by(results::id.desc())
        .first::<TournamentResult>(&mut *conn)?;

    let rating = recompute(team.id, &mut *conn)?;

    tracing::info!(result_id = result.id, rating, "recorded result");

    success(result)
}
