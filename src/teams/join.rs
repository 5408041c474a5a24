use diesel::prelude::*;

use crate::{
    auth::User,
    extract::Path,
    schema::users,
    state::Conn,
    teams::Team,
    util_resp::{StandardResponse, bad_request, msg},
};

#[tracing::instrument(skip_all, fields(user = %user.name, team_id = team_id))]
pub async fn do_join_team(
    Path(team_id): Path<i32>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    if user.team_id.is_some() {
        return bad_request("User is already part of a team");
    }

    let team = Team::fetch(team_id, &mut *conn)?;

    diesel::update(users::table.filter(users::id.eq(user.id)))
        .set(users::team_id.eq(Some(team.id)))
        .execute(&mut *conn)?;

    tracing::info!("joined team");

    msg(format!(
        "User '{}' has joined the team '{}' successfully.",
        user.name, team.name
    ))
}
