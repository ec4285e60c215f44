use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct SyncEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> SyncEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<P::Output> {
        let started = Instant::now();
        tracing::info!("🚀 Starting sync run");

        tracing::debug!("📥 Extract phase");
        let extracted = self.pipeline.extract().await?;

        tracing::debug!("🔄 Transform phase");
        let plan = self.pipeline.transform(extracted).await?;

        tracing::debug!("💾 Load phase");
        let output = self.pipeline.load(plan).await?;

        tracing::info!("✅ Sync run finished in {:?}", started.elapsed());
        Ok(output)
    }
}
