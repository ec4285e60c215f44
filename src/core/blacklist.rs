use crate::core::extract::extract_emails;
use crate::core::watermark::WatermarkStore;
use crate::domain::model::{EmailAddress, InsertOutcome, SlackTs, SyncReport};
use crate::domain::ports::{BlacklistTable, ChatHistory, Pipeline, Storage};
use crate::utils::error::Result;
use std::collections::BTreeSet;

/// What one pass over the channel produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelScan {
    pub watermark_before: SlackTs,
    /// Newest message `ts` seen, or `watermark_before` when nothing new arrived.
    pub newest: SlackTs,
    pub messages_scanned: usize,
    pub emails: BTreeSet<EmailAddress>,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub scan: ChannelScan,
    pub existing_rows: usize,
    pub to_insert: Vec<EmailAddress>,
    pub already_present: usize,
}

/// Chat channel → blacklist data table, resumable through the watermark.
pub struct BlacklistPipeline<C: ChatHistory, T: BlacklistTable, S: Storage> {
    chat: C,
    table: T,
    watermark: WatermarkStore<S>,
    channel: String,
    dry_run: bool,
}

impl<C: ChatHistory, T: BlacklistTable, S: Storage> BlacklistPipeline<C, T, S> {
    pub fn new(chat: C, table: T, watermark: WatermarkStore<S>, channel: &str) -> Self {
        Self {
            chat,
            table,
            watermark,
            channel: channel.to_string(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    async fn advance_watermark(&self, scan: &ChannelScan, failed: usize) -> Result<SlackTs> {
        if self.dry_run {
            tracing::info!("🔍 Dry run: watermark stays at {}", scan.watermark_before);
            return Ok(scan.watermark_before);
        }
        if failed > 0 {
            tracing::warn!(
                "🕒 {} insert(s) failed; watermark stays at {} so the next run retries",
                failed,
                scan.watermark_before
            );
            return Ok(scan.watermark_before);
        }
        if scan.newest <= scan.watermark_before {
            return Ok(scan.watermark_before);
        }

        self.watermark.save(scan.newest).await?;
        tracing::info!(
            "🕒 Watermark advanced to {} ({})",
            scan.newest,
            scan.newest
                .to_datetime()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default()
        );
        Ok(scan.newest)
    }
}

#[async_trait::async_trait]
impl<C: ChatHistory, T: BlacklistTable, S: Storage> Pipeline for BlacklistPipeline<C, T, S> {
    type Extracted = ChannelScan;
    type Plan = SyncPlan;
    type Output = SyncReport;

    async fn extract(&self) -> Result<ChannelScan> {
        let watermark_before = self.watermark.load().await?;
        tracing::info!("🕒 Last run watermark: {}", watermark_before);

        let messages = self.chat.messages_since(&self.channel, watermark_before).await?;
        let newest = messages
            .iter()
            .map(|message| message.ts)
            .fold(watermark_before, SlackTs::max);

        let extraction = extract_emails(&messages);
        tracing::info!(
            "📧 Found {} distinct emails in {} messages ({} rejected)",
            extraction.emails.len(),
            messages.len(),
            extraction.rejected
        );

        Ok(ChannelScan {
            watermark_before,
            newest,
            messages_scanned: messages.len(),
            emails: extraction.emails,
            rejected: extraction.rejected,
        })
    }

    async fn transform(&self, scan: ChannelScan) -> Result<SyncPlan> {
        if scan.emails.is_empty() {
            tracing::info!("📧 No new emails to process");
            return Ok(SyncPlan {
                scan,
                existing_rows: 0,
                to_insert: Vec::new(),
                already_present: 0,
            });
        }

        let existing = self.table.existing_emails().await?;
        tracing::info!("🗂️ Blacklist table holds {} emails", existing.len());

        let (present, to_insert): (Vec<EmailAddress>, Vec<EmailAddress>) = scan
            .emails
            .iter()
            .cloned()
            .partition(|email| existing.contains(email.as_str()));

        Ok(SyncPlan {
            existing_rows: existing.len(),
            already_present: present.len(),
            to_insert,
            scan,
        })
    }

    async fn load(&self, plan: SyncPlan) -> Result<SyncReport> {
        let mut report = SyncReport {
            messages_scanned: plan.scan.messages_scanned,
            candidates: plan.scan.emails.len(),
            rejected: plan.scan.rejected,
            existing_rows: plan.existing_rows,
            already_present: plan.already_present,
            watermark_before: plan.scan.watermark_before,
            dry_run: self.dry_run,
            ..SyncReport::default()
        };

        for email in &plan.to_insert {
            if self.dry_run {
                tracing::info!("🔍 Dry run: would add {}", email);
                continue;
            }

            match self.table.insert_email(email).await {
                Ok(InsertOutcome::Inserted) => {
                    tracing::info!("➕ Added {} to the blacklist", email);
                    report.inserted += 1;
                }
                Ok(InsertOutcome::AlreadyExists) => {
                    report.already_present += 1;
                }
                Err(e) => {
                    tracing::error!("❌ Failed to add {}: {}", email, e);
                    report.failed += 1;
                }
            }
        }

        report.watermark_after = self.advance_watermark(&plan.scan, report.failed).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SlackMessage;
    use crate::utils::error::SyncError;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MemoryStorage {
        fn get(&self, path: &str) -> Option<String> {
            let files = self.files.lock().unwrap();
            files
                .get(path)
                .map(|bytes| String::from_utf8(bytes.clone()).unwrap())
        }
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.files.lock().unwrap().get(path).cloned())
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct FakeChat {
        messages: Vec<SlackMessage>,
        requested_oldest: Arc<Mutex<Option<SlackTs>>>,
    }

    #[async_trait::async_trait]
    impl ChatHistory for FakeChat {
        async fn messages_since(&self, _channel: &str, oldest: SlackTs) -> Result<Vec<SlackMessage>> {
            *self.requested_oldest.lock().unwrap() = Some(oldest);
            Ok(self
                .messages
                .iter()
                .filter(|message| message.ts > oldest)
                .cloned()
                .collect())
        }
    }

    #[derive(Clone, Default)]
    struct FakeTable {
        rows: Arc<Mutex<HashSet<String>>>,
        failing: HashSet<String>,
        lists: Arc<Mutex<usize>>,
    }

    #[async_trait::async_trait]
    impl BlacklistTable for FakeTable {
        async fn existing_emails(&self) -> Result<HashSet<String>> {
            *self.lists.lock().unwrap() += 1;
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn insert_email(&self, email: &EmailAddress) -> Result<InsertOutcome> {
            if self.failing.contains(email.as_str()) {
                return Err(SyncError::ApiError {
                    service: "genesys",
                    status: 400,
                    message: "rejected".to_string(),
                });
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.insert(email.to_string()) {
                Ok(InsertOutcome::Inserted)
            } else {
                Ok(InsertOutcome::AlreadyExists)
            }
        }
    }

    fn msg(ts: &str, text: &str) -> SlackMessage {
        SlackMessage {
            ts: ts.parse().unwrap(),
            text: Some(text.to_string()),
            subtype: None,
            user: None,
        }
    }

    fn pipeline(
        messages: Vec<SlackMessage>,
        table: FakeTable,
        storage: MemoryStorage,
    ) -> BlacklistPipeline<FakeChat, FakeTable, MemoryStorage> {
        let chat = FakeChat {
            messages,
            requested_oldest: Arc::new(Mutex::new(None)),
        };
        BlacklistPipeline::new(
            chat,
            table,
            WatermarkStore::new(storage, "wm.txt"),
            "C0123456789",
        )
    }

    async fn run<C: ChatHistory, T: BlacklistTable, S: Storage>(
        pipeline: &BlacklistPipeline<C, T, S>,
    ) -> SyncReport {
        let scan = pipeline.extract().await.unwrap();
        let plan = pipeline.transform(scan).await.unwrap();
        pipeline.load(plan).await.unwrap()
    }

    #[tokio::test]
    async fn test_inserts_only_missing_emails_and_advances() {
        let table = FakeTable::default();
        table.rows.lock().unwrap().insert("old@example.com".to_string());
        let storage = MemoryStorage::default();

        let p = pipeline(
            vec![
                msg("1700000002.000000", "OLD@example.com, new@example.com"),
                msg("1700000005.000001", "New@Example.com again"),
            ],
            table.clone(),
            storage.clone(),
        );
        let report = run(&p).await;

        assert_eq!(report.messages_scanned, 2);
        assert_eq!(report.candidates, 2);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.watermark_after, "1700000005.000001".parse().unwrap());
        assert_eq!(storage.get("wm.txt").as_deref(), Some("1700000005.000001"));
        assert!(table.rows.lock().unwrap().contains("new@example.com"));
    }

    #[tokio::test]
    async fn test_second_run_starts_after_watermark() {
        let table = FakeTable::default();
        let storage = MemoryStorage::default();
        let messages = vec![msg("1700000002.000000", "a@example.com")];

        let first = pipeline(messages.clone(), table.clone(), storage.clone());
        assert_eq!(run(&first).await.inserted, 1);

        let second = pipeline(messages, table.clone(), storage.clone());
        let report = run(&second).await;
        assert_eq!(
            *second.chat.requested_oldest.lock().unwrap(),
            Some("1700000002".parse().unwrap())
        );
        assert_eq!(report.messages_scanned, 0);
        assert_eq!(report.inserted, 0);
        // Nothing to diff against, so the table is not listed again.
        assert_eq!(*table.lists.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_messages_without_emails_still_advance() {
        let storage = MemoryStorage::default();
        let p = pipeline(
            vec![msg("1700000009.000000", "no addresses here")],
            FakeTable::default(),
            storage.clone(),
        );
        let report = run(&p).await;

        assert_eq!(report.candidates, 0);
        assert_eq!(storage.get("wm.txt").as_deref(), Some("1700000009.000000"));
    }

    #[tokio::test]
    async fn test_failed_insert_holds_watermark() {
        let storage = MemoryStorage::default();
        storage
            .write_file("wm.txt", b"1700000000.000000")
            .await
            .unwrap();
        let table = FakeTable {
            failing: HashSet::from(["bad@example.com".to_string()]),
            ..FakeTable::default()
        };

        let p = pipeline(
            vec![msg("1700000003.000000", "bad@example.com good@example.com")],
            table,
            storage.clone(),
        );
        let report = run(&p).await;

        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.watermark_after, report.watermark_before);
        assert_eq!(storage.get("wm.txt").as_deref(), Some("1700000000.000000"));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let storage = MemoryStorage::default();
        let table = FakeTable::default();
        let p = pipeline(
            vec![msg("1700000003.000000", "someone@example.com")],
            table.clone(),
            storage.clone(),
        )
        .with_dry_run(true);
        let report = run(&p).await;

        assert!(report.dry_run);
        assert_eq!(report.inserted, 0);
        assert!(table.rows.lock().unwrap().is_empty());
        assert_eq!(storage.get("wm.txt"), None);
    }
}
