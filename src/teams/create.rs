use diesel::prelude::*;
use serde::Deserialize;

use crate::{
    auth::User,
    extract::Json,
    schema::{teams, users},
    state::Conn,
    teams::Team,
    util_resp::{StandardResponse, bad_request, msg},
    validation::is_valid_name,
};

#[derive(Deserialize)]
pub struct CreateTeamForm {
    name: String,
}

/// Creates a team with the caller as its only member.
#[tracing::instrument(skip_all, fields(user = %user.name, team = %form.name))]
pub async fn do_create_team(
    user: User<true>,
    mut conn: Conn<true>,
    Json(form): Json<CreateTeamForm>,
) -> StandardResponse {
    if user.team_id.is_some() {
        return bad_request("User is already part of a team");
    }
    if let Err(e) = is_valid_name(&form.name) {
        return bad_request(format!("Team name {e}"));
    }

    let taken = teams::table
        .filter(teams::name.eq(&form.name))
        .count()
        .get_result::<i64>(&mut *conn)?;
    if taken > 0 {
        return bad_request("A team with that name already exists");
    }

    diesel::insert_into(teams::table)
        .values((teams::name.eq(&form.name), teams::rating.eq(0i64)))
        .execute(&mut *conn)?;

    let team = teams::table
        .filter(teams::name.eq(&form.name))
        .first::<Team>(&mut *conn)?;

    diesel::update(users::table.filter(users::id.eq(user.id)))
        .set(users::team_id.eq(Some(team.id)))
        .execute(&mut *conn)?;

    tracing::info!(team_id = team.id, "created team");

    msg(format!(
        "Team '{}' created successfully, and user '{}' is added as a member.",
        team.name, user.name
    ))
}
