use chrono::Utc;
use diesel::{insert_into, prelude::*};
use serde::Deserialize;

use crate::{
    auth::{User, hash_password},
    extract::Json,
    schema::users,
    state::Conn,
    util_resp::{StandardResponse, bad_request, msg},
    validation::{is_valid_email, is_valid_name},
};

#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[tracing::instrument(skip_all, fields(name = %form.name))]
pub async fn do_register(
    mut conn: Conn<true>,
    Json(form): Json<RegisterForm>,
) -> StandardResponse {
    if let Err(e) = is_valid_name(&form.name) {
        return bad_request(format!("Username {e}"));
    }
    if let Err(e) = is_valid_email(&form.email) {
        return bad_request(format!("Email is {e}"));
    }
    if form.password.is_empty() {
        return bad_request("Password must not be empty");
    }

    let existing = users::table
        .filter(
            users::name
                .eq(&form.name)
                .or(users::email.eq(&form.email)),
        )
        .first::<User>(&mut *conn)
        .optional()?;

    if let Some(user) = existing {
        return if user.name == form.name {
            bad_request("Username already registered")
        } else {
            bad_request("Email already registered")
        };
    }

    let password_hash = hash_password(&form.password)?;

    insert_into(users::table)
        .values((
            users::name.eq(&form.name),
            users::email.eq(&form.email),
            users::password_hash.eq(password_hash),
            users::team_id.eq(None::<i32>),
            users::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)?;

    tracing::info!("registered user");

    msg("User registered successfully")
}
