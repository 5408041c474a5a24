//! A team's rating is the sum of the scores of all of its results. It is
//! stored on the team and recomputed from scratch whenever the results of a
//! team change.

use diesel::{connection::LoadConnection, dsl::sum, prelude::*, sqlite::Sqlite};
use serde::Serialize;

use crate::{
    extract::Path,
    schema::{results, teams},
    state::Conn,
    teams::Team,
    util_resp::{FailureResponse, StandardResponse, success},
};

/// Rescans every result of the team and stores the total as its rating.
/// Returns the new rating.
pub fn recompute(
    team_id: i32,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<i64, FailureResponse> {
    let team = Team::fetch(team_id, conn)?;

    let total = results::table
        .filter(results::team_id.eq(team.id))
        .select(sum(results::score))
        .first::<Option<i64>>(conn)?
        .unwrap_or(0);

    diesel::update(teams::table.filter(teams::id.eq(team.id)))
        .set(teams::rating.eq(total))
        .execute(conn)?;

    tracing::debug!(team_id, rating = total, "recomputed team rating");

    Ok(total)
}

#[derive(Serialize)]
pub struct TeamRating {
    pub team_id: i32,
    pub rating: i64,
}

pub async fn get_team_rating(
    Path(team_id): Path<i32>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let team = Team::fetch(team_id, &mut *conn)?;

    success(TeamRating {
        team_id: team.id,
        rating: team.rating,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use diesel::prelude::*;

    use super::recompute;
    use crate::{
        schema::{results, teams, tournaments},
        test::make_test_pool,
        util_resp::FailureResponse,
    };

    fn insert_fixtures(conn: &mut SqliteConnection) -> (i32, i32) {
        diesel::insert_into(teams::table)
            .values((teams::name.eq("Owls"), teams::rating.eq(0i64)))
            .execute(conn)
            .unwrap();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::name.eq("Spring Open"),
                tournaments::date.eq(NaiveDate::from_ymd_opt(2024, 4, 1)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap()),
            ))
            .execute(conn)
            .unwrap();

        let team_id = teams::table.select(teams::id).first(conn).unwrap();
        let tournament_id =
            tournaments::table.select(tournaments::id).first(conn).unwrap();
        (team_id, tournament_id)
    }

    fn stored_rating(team_id: i32, conn: &mut SqliteConnection) -> i64 {
        teams::table
            .filter(teams::id.eq(team_id))
            .select(teams::rating)
            .first(conn)
            .unwrap()
    }

    #[test]
    fn rating_tracks_sum_of_scores() {
        let pool = make_test_pool();
        let mut conn = pool.get().unwrap();
        let (team_id, tournament_id) = insert_fixtures(&mut conn);

        assert_eq!(recompute(team_id, &mut *conn).unwrap(), 0);

        let mut expected = 0i64;
        for score in [12, 7, -3, 40] {
            diesel::insert_into(results::table)
                .values((
                    results::score.eq(score),
                    results::team_id.eq(team_id),
                    results::tournament_id.eq(tournament_id),
                ))
                .execute(&mut *conn)
                .unwrap();
            expected += i64::from(score);

            assert_eq!(recompute(team_id, &mut *conn).unwrap(), expected);
            assert_eq!(stored_rating(team_id, &mut conn), expected);
        }
    }

    #[test]
    fn other_teams_results_are_ignored() {
        let pool = make_test_pool();
        let mut conn = pool.get().unwrap();
        let (team_id, tournament_id) = insert_fixtures(&mut conn);

        diesel::insert_into(teams::table)
            .values((teams::name.eq("Larks"), teams::rating.eq(0i64)))
            .execute(&mut *conn)
            .unwrap();
        let other: i32 = teams::table
            .filter(teams::name.eq("Larks"))
            .select(teams::id)
            .first(&mut *conn)
            .unwrap();

        for (score, team) in [(5, team_id), (100, other)] {
            diesel::insert_into(results::table)
                .values((
                    results::score.eq(score),
                    results::team_id.eq(team),
                    results::tournament_id.eq(tournament_id),
                ))
                .execute(&mut *conn)
                .unwrap();
        }

        assert_eq!(recompute(team_id, &mut *conn).unwrap(), 5);
        assert_eq!(stored_rating(other, &mut conn), 0);
    }

    #[test]
    fn missing_team_is_not_found() {
        let pool = make_test_pool();
        let mut conn = pool.get().unwrap();

        assert!(matches!(
            recompute(404, &mut *conn),
            Err(FailureResponse::NotFound(_))
        ));
    }
}
