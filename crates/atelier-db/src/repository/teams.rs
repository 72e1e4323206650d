//! Team repository.

use atelier_common::models::row::{encode_string_vec, encode_ts};
use atelier_common::models::team::Team;
use chrono::Utc;
use sqlx::AnyPool;
use uuid::Uuid;

pub async fn insert(pool: &AnyPool, team: &Team) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO teams (
            id, name, description, studio, looking_for, skills_needed,
            owner_id, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(team.id.to_string())
    .bind(&team.name)
    .bind(&team.description)
    .bind(&team.studio)
    .bind(&team.looking_for)
    .bind(encode_string_vec(&team.skills_needed))
    .bind(team.owner_id.to_string())
    .bind(encode_ts(team.created_at))
    .bind(encode_ts(team.updated_at))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &AnyPool, id: Uuid) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// Batch-fetch teams by ID. Missing IDs are silently absent from the result.
pub async fn find_by_ids(pool: &AnyPool, ids: &[Uuid]) -> Result<Vec<Team>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT * FROM teams WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, Team>(&sql);
    for id in ids {
        query = query.bind(id.to_string());
    }
    query.fetch_all(pool).await
}

/// List all teams for discovery.
pub async fn list_all(pool: &AnyPool) -> Result<Vec<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams ORDER BY created_at")
        .fetch_all(pool)
        .await
}

/// Update a team's mutable fields. `None` leaves a column unchanged.
pub async fn update(
    pool: &AnyPool,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    looking_for: Option<&str>,
    skills_needed: Option<&[String]>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE teams SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            looking_for = COALESCE(?, looking_for),
            skills_needed = COALESCE(?, skills_needed),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(looking_for)
    .bind(skills_needed.map(encode_string_vec))
    .bind(encode_ts(Utc::now()))
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM teams WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
