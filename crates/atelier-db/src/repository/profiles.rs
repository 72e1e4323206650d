//! Profile repository.

use atelier_common::models::profile::Profile;
use atelier_common::models::row::{encode_string_vec, encode_ts};
use chrono::Utc;
use sqlx::AnyPool;
use uuid::Uuid;

/// Insert a profile created at onboarding completion.
pub async fn insert(pool: &AnyPool, profile: &Profile) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO profiles (
            id, display_name, program, skills, bio, studio_preferences,
            avatar_url, portfolio_url, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(profile.id.to_string())
    .bind(&profile.display_name)
    .bind(profile.program.as_str())
    .bind(encode_string_vec(&profile.skills))
    .bind(&profile.bio)
    .bind(encode_string_vec(&profile.studio_preferences))
    .bind(&profile.avatar_url)
    .bind(&profile.portfolio_url)
    .bind(encode_ts(profile.created_at))
    .bind(encode_ts(profile.updated_at))
    .execute(pool)
    .await?;
    Ok(())
}

/// Find a profile by user ID.
pub async fn find_by_id(pool: &AnyPool, id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// Batch-fetch profiles by ID. Missing IDs are silently absent from the result.
pub async fn find_by_ids(pool: &AnyPool, ids: &[Uuid]) -> Result<Vec<Profile>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT * FROM profiles WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, Profile>(&sql);
    for id in ids {
        query = query.bind(id.to_string());
    }
    query.fetch_all(pool).await
}

/// List profiles for discovery, excluding the requesting user.
pub async fn list_excluding(pool: &AnyPool, user_id: Uuid) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id <> ? ORDER BY created_at")
        .bind(user_id.to_string())
        .fetch_all(pool)
        .await
}

/// Update a profile's mutable fields. `None` leaves a column unchanged.
#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &AnyPool,
    id: Uuid,
    display_name: Option<&str>,
    program: Option<&str>,
    skills: Option<&[String]>,
    bio: Option<&str>,
    studio_preferences: Option<&[String]>,
    avatar_url: Option<&str>,
    portfolio_url: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE profiles SET
            display_name = COALESCE(?, display_name),
            program = COALESCE(?, program),
            skills = COALESCE(?, skills),
            bio = COALESCE(?, bio),
            studio_preferences = COALESCE(?, studio_preferences),
            avatar_url = COALESCE(?, avatar_url),
            portfolio_url = COALESCE(?, portfolio_url),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(display_name)
    .bind(program)
    .bind(skills.map(encode_string_vec))
    .bind(bio)
    .bind(studio_preferences.map(encode_string_vec))
    .bind(avatar_url)
    .bind(portfolio_url)
    .bind(encode_ts(Utc::now()))
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}
