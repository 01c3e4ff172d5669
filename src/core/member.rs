//! Member business logic - creating and looking up the people who share expenses.

use super::model::{Member, MemberId};
use crate::{
    config::ledger::Config,
    entities::{self, member},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Creates a new member with a trimmed, non-empty display name.
///
/// # Errors
/// Returns [`Error::Config`] for an empty name, or a database error if the insert fails.
pub async fn create_member(db: &DatabaseConnection, display_name: String) -> Result<Member> {
    if display_name.trim().is_empty() {
        return Err(Error::Config {
            message: "Member display name cannot be empty".to_string(),
        });
    }

    let model = member::ActiveModel {
        display_name: Set(display_name.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    Ok(result.into())
}

/// Finds a member by id.
pub async fn get_member_by_id(
    db: &DatabaseConnection,
    member_id: MemberId,
) -> Result<Option<Member>> {
    Ok(entities::Member::find_by_id(member_id.0)
        .one(db)
        .await?
        .map(Into::into))
}

/// Finds a member by exact display name.
pub async fn get_member_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Member>> {
    Ok(entities::Member::find()
        .filter(member::Column::DisplayName.eq(name))
        .one(db)
        .await?
        .map(Into::into))
}

/// Lists every member, ordered by id.
pub async fn get_all_members(db: &DatabaseConnection) -> Result<Vec<Member>> {
    Ok(entities::Member::find()
        .order_by_asc(member::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Verifies that every id refers to an existing member.
pub(crate) async fn ensure_members_exist<C>(db: &C, member_ids: &[MemberId]) -> Result<()>
where
    C: ConnectionTrait,
{
    let raw_ids: Vec<i64> = member_ids.iter().map(|id| id.0).collect();
    let found: Vec<i64> = entities::Member::find()
        .filter(member::Column::Id.is_in(raw_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| model.id)
        .collect();

    match member_ids.iter().find(|id| !found.contains(&id.0)) {
        Some(&member) => Err(Error::MemberNotFound { member }),
        None => Ok(()),
    }
}

/// Creates the members listed in config.toml that do not exist yet.
///
/// Returns how many members were created.
#[instrument(skip_all)]
pub async fn seed_members(db: &DatabaseConnection, config: &Config) -> Result<usize> {
    let mut created = 0;
    for seed in &config.members {
        if get_member_by_name(db, seed.display_name.trim()).await?.is_some() {
            continue;
        }
        create_member(db, seed.display_name.clone()).await?;
        created += 1;
    }

    if created > 0 {
        info!("Seeded {created} member(s) from configuration");
    }
    Ok(created)
}
