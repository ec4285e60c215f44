use crate::domain::model::{AliasReport, Division, GenesysUser, NameMismatch};
use crate::domain::ports::UserDirectory;
use crate::utils::error::Result;

pub fn division_users<'a>(users: &'a [GenesysUser], division_id: &str) -> Vec<&'a GenesysUser> {
    users
        .iter()
        .filter(|user| user.in_division(division_id))
        .collect()
}

/// Users whose preferred name is empty or differs from the first word of their name.
pub fn find_mismatches<'a>(
    users: impl IntoIterator<Item = &'a GenesysUser>,
    division: &Division,
) -> Vec<NameMismatch> {
    let mut mismatches = Vec::new();

    for user in users {
        let Some(first_name) = user.first_name() else {
            tracing::warn!("⚠️ Skipping user {}: no full name available", user.id);
            continue;
        };
        if user.preferred_name_matches(first_name) {
            continue;
        }

        let preferred = user
            .preferred_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Empty");
        let division_name = user
            .division
            .as_ref()
            .and_then(|d| d.name.clone())
            .unwrap_or_else(|| division.name.clone());

        mismatches.push(NameMismatch {
            id: user.id.clone(),
            full_name: user.name.clone().unwrap_or_default(),
            first_name: first_name.to_string(),
            preferred_name: preferred.to_string(),
            email: user.email.clone().unwrap_or_else(|| "No email".to_string()),
            division: division_name,
        });
    }

    mismatches
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DivisionCheck {
    pub divisions_processed: usize,
    pub mismatches: Vec<NameMismatch>,
}

/// Reports mismatches per division. Users are listed once and shared across divisions.
pub async fn check_divisions<D: UserDirectory>(
    directory: &D,
    divisions: &[Division],
) -> Result<DivisionCheck> {
    let users = directory.users().await?;
    let mut check = DivisionCheck::default();

    for (index, division) in divisions.iter().enumerate() {
        tracing::info!(
            "🏢 Processing division {} of {}: {} ({})",
            index + 1,
            divisions.len(),
            division.name,
            division.id
        );
        let members = division_users(&users, &division.id);
        if members.is_empty() {
            tracing::info!("No users found in division {}", division.name);
        }

        let found = find_mismatches(members, division);
        tracing::info!(
            "Found {} users with mismatched names in division {}",
            found.len(),
            division.name
        );
        check.mismatches.extend(found);
        check.divisions_processed += 1;
    }

    Ok(check)
}

/// Sets each user's preferred name to their first name. Per-user failures are counted, not fatal.
pub async fn update_preferred_names<D: UserDirectory>(
    directory: &D,
    users: &[&GenesysUser],
    dry_run: bool,
) -> AliasReport {
    let mut report = AliasReport::default();

    for user in users {
        let Some(first_name) = user.first_name() else {
            tracing::warn!("⚠️ Skipping user {}: no name available", user.id);
            report.skipped += 1;
            continue;
        };
        if user.preferred_name_matches(first_name) {
            tracing::debug!("Skipping user {}: preferred name already matches", user.id);
            report.skipped += 1;
            continue;
        }

        if dry_run {
            tracing::info!("🔍 Dry run: would set {} preferred_name to '{}'", user.id, first_name);
            report.skipped += 1;
            continue;
        }

        match directory.set_preferred_name(user, first_name).await {
            Ok(()) => {
                tracing::info!("✏️ Updated user {}: preferred_name set to '{}'", user.id, first_name);
                report.updated += 1;
            }
            Err(e) => {
                tracing::error!("❌ Failed to update user {}: {}", user.id, e);
                report.errors += 1;
            }
        }
    }

    report
}
