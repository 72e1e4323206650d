//! Shared test fixtures: an in-memory SQLite database with the full schema,
//! plus seeded profiles and teams.

use chrono::Utc;
use sqlx::AnyPool;
use uuid::Uuid;

use atelier_common::ids;
use atelier_common::models::conversation::{Conversation, ConversationKind};
use atelier_common::models::member::{MemberRole, MemberStatus, TeamMember};
use atelier_common::models::profile::{Profile, Program};
use atelier_common::models::team::Team;
use atelier_db::repository::{conversations, participants, profiles, team_members, teams};
use atelier_db::Database;

pub async fn memory_db() -> Database {
    let db = Database::connect_url("sqlite::memory:", 1, 1)
        .await
        .expect("in-memory database");
    db.migrate().await.expect("schema");
    db
}

pub fn profile_fixture(name: &str) -> Profile {
    let now = Utc::now();
    Profile {
        id: ids::generate_id(),
        display_name: name.to_string(),
        program: Program::InteractionDesign,
        skills: vec!["prototyping".into()],
        bio: format!("{name} builds things"),
        studio_preferences: vec!["Spring Studio".into()],
        avatar_url: None,
        portfolio_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed_profile(pool: &AnyPool, name: &str) -> Profile {
    let profile = profile_fixture(name);
    profiles::insert(pool, &profile).await.expect("seed profile");
    profile
}

/// Seed a team the way team creation does it: the team row, the creator as
/// its confirmed admin, and the team group conversation with the creator
/// as first participant.
pub async fn seed_team(pool: &AnyPool, owner_id: Uuid, name: &str) -> Team {
    let now = Utc::now();
    let team = Team {
        id: ids::generate_id(),
        name: name.to_string(),
        description: None,
        studio: "Spring Studio".into(),
        looking_for: "people who ship".into(),
        skills_needed: vec!["rust".into()],
        owner_id,
        created_at: now,
        updated_at: now,
    };
    teams::insert(pool, &team).await.expect("seed team");

    let admin = TeamMember {
        team_id: team.id,
        user_id: owner_id,
        role: MemberRole::Admin,
        status: MemberStatus::Confirmed,
        joined_at: now,
    };
    team_members::insert(pool, &admin).await.expect("seed admin");

    let conversation = Conversation {
        id: ids::generate_id(),
        kind: ConversationKind::Team,
        match_id: None,
        team_id: Some(team.id),
        created_at: now,
        updated_at: now,
    };
    conversations::insert(pool, &conversation).await.expect("seed team conversation");
    participants::add(pool, conversation.id, owner_id, now)
        .await
        .expect("seed owner participant");

    team
}
