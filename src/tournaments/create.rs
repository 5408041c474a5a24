use diesel::prelude::*;

use crate::{
    extract::Json,
    schema::tournaments,
    state::Conn,
    tournaments::{Tournament, TournamentForm},
    util_resp::{StandardResponse, bad_request, success},
    validation::is_valid_name,
};

#[tracing::instrument(skip_all, fields(name = %form.name))]
pub async fn do_create_tournament(
    mut conn: Conn<true>,
    Json(form): Json<TournamentForm>,
) -> StandardResponse {
    if let Err(e) = is_valid_name(&form.name) {
        return bad_request(format!("Tournament name {e}"));
    }

    if Tournament::name_taken(&form.name, None, &mut *conn)? {
        return bad_request("A tournament with that name already exists");
    }

    diesel::insert_into(tournaments::table)
        .values((
            tournaments::name.eq(&form.name),
            tournaments::date.eq(form.date),
        ))
        .execute(&mut *conn)?;

    let tournament = tournaments::table
        .filter(tournaments::name.eq(&form.name))
        .first::<Tournament>(&mut *conn)?;

    tracing::info!(id = tournament.id, "created tournament");

    success(tournament)
}
