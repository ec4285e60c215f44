use crate::adapters::genesys::{GenesysClient, GenesysDataTable, GenesysSettings, GenesysUserDirectory};
use crate::adapters::slack::SlackClient;
use crate::config::BlacklistSettings;
use crate::core::blacklist::BlacklistPipeline;
use crate::core::engine::SyncEngine;
use crate::core::profiles::{check_divisions, division_users, update_preferred_names, DivisionCheck};
use crate::core::watermark::WatermarkStore;
use crate::core::{Storage, UserDirectory};
use crate::domain::model::{AliasReport, Division, SyncReport};
use crate::utils::error::Result;

/// One incremental pass: new channel messages → blacklist rows, then the watermark.
pub async fn run_blacklist<S: Storage>(settings: &BlacklistSettings, storage: S) -> Result<SyncReport> {
    let slack = SlackClient::new(
        &settings.slack_api_url,
        &settings.slack_token,
        settings.slack_page_size,
        settings.genesys.retry.clone(),
    );
    let client = GenesysClient::authenticate(&settings.genesys).await?;
    let table = GenesysDataTable::new(
        client,
        &settings.data_table_id,
        &settings.email_column,
        settings.table_page_size,
    );
    let watermark = WatermarkStore::new(storage, settings.watermark_path.clone());

    let pipeline = BlacklistPipeline::new(slack, table, watermark, &settings.channel_id)
        .with_dry_run(settings.dry_run);
    let report = SyncEngine::new(pipeline).run().await?;

    tracing::info!(
        "📊 Scanned {} messages, {} candidates ({} rejected), {} inserted, {} already present, {} failed",
        report.messages_scanned,
        report.candidates,
        report.rejected,
        report.inserted,
        report.already_present,
        report.failed
    );
    Ok(report)
}

pub async fn run_useralias(
    settings: &GenesysSettings,
    division_id: &str,
    dry_run: bool,
) -> Result<AliasReport> {
    let client = GenesysClient::authenticate(settings).await?;
    let directory = GenesysUserDirectory::new(client);

    let users = directory.users().await?;
    let members = division_users(&users, division_id);
    tracing::info!("👥 Found {} users in division {}", members.len(), division_id);

    let report = update_preferred_names(&directory, &members, dry_run).await;
    tracing::info!(
        "✅ Process completed. Updated {} users. Skipped: {}. Errors: {}",
        report.updated,
        report.skipped,
        report.errors
    );
    Ok(report)
}

/// `specific_division` limits the check to one division; otherwise every division is listed.
pub async fn run_check(
    settings: &GenesysSettings,
    specific_division: Option<&str>,
) -> Result<DivisionCheck> {
    let client = GenesysClient::authenticate(settings).await?;
    let directory = GenesysUserDirectory::new(client);

    let divisions = match specific_division {
        Some(id) => {
            tracing::info!("🏢 Processing specific division: {}", id);
            vec![Division::from_id(id)]
        }
        None => directory.divisions().await?,
    };

    let check = check_divisions(&directory, &divisions).await?;
    tracing::info!("=== Summary ===");
    tracing::info!("Total divisions processed: {}", check.divisions_processed);
    tracing::info!("Total users with mismatched names: {}", check.mismatches.len());
    Ok(check)
}
