//! Profile model — a student looking for (or already on) a project team.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_skills, validate_studio_preferences};

/// Academic track a student belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    ComputerScience,
    InteractionDesign,
    VisualArts,
    Engineering,
    Business,
    FilmMedia,
}

impl Program {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComputerScience => "computer_science",
            Self::InteractionDesign => "interaction_design",
            Self::VisualArts => "visual_arts",
            Self::Engineering => "engineering",
            Self::Business => "business",
            Self::FilmMedia => "film_media",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "computer_science" => Some(Self::ComputerScience),
            "interaction_design" => Some(Self::InteractionDesign),
            "visual_arts" => Some(Self::VisualArts),
            "engineering" => Some(Self::Engineering),
            "business" => Some(Self::Business),
            "film_media" => Some(Self::FilmMedia),
            _ => None,
        }
    }
}

/// A student profile. Created at onboarding completion, mutated only by its
/// owner; never hard-deleted here (account deletion is an upstream workflow).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub program: Program,

    /// Up to 20 skills, each up to 50 characters
    pub skills: Vec<String>,

    /// Free-text bio, up to 500 characters
    pub bio: String,

    /// Ordered studio preferences — the first entry is the primary
    pub studio_preferences: Vec<String>,

    pub avatar_url: Option<String>,

    /// External portfolio / profile link
    pub portfolio_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for Profile {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        use sqlx::Row;
        let program_raw: String = row.try_get("program")?;
        Ok(Profile {
            id: get_uuid(row, "id")?,
            display_name: row.try_get("display_name")?,
            program: Program::parse(&program_raw).ok_or_else(|| {
                sqlx::Error::Decode(format!("unknown program: {program_raw}").into())
            })?,
            skills: get_string_vec(row, "skills")?,
            bio: row.try_get("bio")?,
            studio_preferences: get_string_vec(row, "studio_preferences")?,
            avatar_url: row.try_get("avatar_url")?,
            portfolio_url: row.try_get("portfolio_url")?,
            created_at: get_datetime(row, "created_at")?,
            updated_at: get_datetime(row, "updated_at")?,
        })
    }
}

/// Onboarding-completion request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 80, message = "Display name must be 1-80 characters"))]
    pub display_name: String,

    pub program: Program,

    #[validate(custom(function = "validate_skills"))]
    pub skills: Vec<String>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: String,

    #[validate(custom(function = "validate_studio_preferences"))]
    pub studio_preferences: Vec<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,

    #[validate(url(message = "Portfolio link must be a valid URL"))]
    pub portfolio_url: Option<String>,
}

/// Self-edit request; absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 80))]
    pub display_name: Option<String>,

    pub program: Option<Program>,

    #[validate(custom(function = "validate_skills"))]
    pub skills: Option<Vec<String>>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(custom(function = "validate_studio_preferences"))]
    pub studio_preferences: Option<Vec<String>>,

    pub avatar_url: Option<String>,
    pub portfolio_url: Option<String>,
}
