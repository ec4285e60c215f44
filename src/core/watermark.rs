use crate::domain::model::SlackTs;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, SyncError};

pub const DEFAULT_WATERMARK_FILE: &str = "last_run_timestamp.txt";

/// The single piece of state carried between runs: the newest processed message `ts`.
pub struct WatermarkStore<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> WatermarkStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// `SlackTs::ZERO` when no watermark has been written yet.
    pub async fn load(&self) -> Result<SlackTs> {
        let Some(bytes) = self.storage.read_file(&self.key).await? else {
            tracing::info!("🕒 No watermark at {}; scanning from the beginning", self.key);
            return Ok(SlackTs::ZERO);
        };

        let content = String::from_utf8(bytes).map_err(|_| SyncError::InvalidWatermark {
            value: self.key.clone(),
            reason: "file is not valid UTF-8".to_string(),
        })?;

        if content.trim().is_empty() {
            tracing::warn!("🕒 Watermark {} is empty; scanning from the beginning", self.key);
            return Ok(SlackTs::ZERO);
        }

        content.parse()
    }

    pub async fn save(&self, watermark: SlackTs) -> Result<()> {
        self.storage
            .write_file(&self.key, watermark.to_string().as_bytes())
            .await
    }
}
