//! Team model — a project group recruiting members for a studio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_skills;

/// A project team. The creator becomes its one confirmed admin member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,

    /// 3-100 characters
    pub name: String,

    /// Up to 1000 characters
    pub description: Option<String>,

    /// Studio affiliation
    pub studio: String,

    /// Free-text description of who the team is looking for
    pub looking_for: String,

    /// Skills the team needs (up to 20)
    pub skills_needed: Vec<String>,

    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for Team {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        use sqlx::Row;
        Ok(Team {
            id: get_uuid(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            studio: row.try_get("studio")?,
            looking_for: row.try_get("looking_for")?,
            skills_needed: get_string_vec(row, "skills_needed")?,
            owner_id: get_uuid(row, "owner_id")?,
            created_at: get_datetime(row, "created_at")?,
            updated_at: get_datetime(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 3, max = 100, message = "Team name must be 3-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, message = "Studio is required"))]
    pub studio: String,

    pub looking_for: String,

    #[validate(custom(function = "validate_skills"))]
    pub skills_needed: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub looking_for: Option<String>,

    #[validate(custom(function = "validate_skills"))]
    pub skills_needed: Option<Vec<String>>,
}
