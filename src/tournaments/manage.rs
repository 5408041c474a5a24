//! Replacing and removing tournaments.

use diesel::prelude::*;

use crate::{
    extract::{Json, Path},
    schema::{results, tournaments},
    state::Conn,
    tournaments::{Tournament, TournamentForm},
    util_resp::{StandardResponse, bad_request, no_content, success},
    validation::is_valid_name,
};

#[tracing::instrument(skip_all, fields(tid = %tid))]
pub async fn do_update_tournament(
    Path(tid): Path<i32>,
    mut conn: Conn<true>,
    Json(form): Json<TournamentForm>,
) -> StandardResponse {
    let tournament = Tournament::fetch(tid, &mut *conn)?;

    if let Err(e) = is_valid_name(&form.name) {
        return bad_request(format!("Tournament name {e}"));
    }
    if Tournament::name_taken(&form.name, Some(tournament.id), &mut *conn)? {
        return bad_request("A tournament with that name already exists");
    }

    diesel::update(tournaments::table.filter(tournaments::id.eq(tournament.id)))
        .set((
            tournaments::name.eq(&form.name),
            tournaments::date.eq(form.date),
        ))
        .execute(&mut *conn)?;

    success(Tournament::fetch(tournament.id, &mut *conn)?)
}

/// Deletes a tournament. Its results are kept, with their tournament
/// cleared, so team ratings do not change.
#[tracing::instrument(skip_all, fields(tid = %tid))]
pub async fn do_delete_tournament(
    Path(tid): Path<i32>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let tournament = Tournament::fetch(tid, &mut *conn)?;

    let detached = diesel::update(
        results::table.filter(results::tournament_id.eq(tournament.id)),
    )
    .set(results::tournament_id.eq(None::<i32>))
    .execute(&mut *conn)?;
    diesel::delete(tournaments::table.filter(tournaments::id.eq(tournament.id)))
        .execute(&mut *conn)?;

    tracing::info!(detached, "deleted tournament");

    no_content()
}
