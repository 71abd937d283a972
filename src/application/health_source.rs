// Health introspection trait required for fleet monitoring
use crate::domain::servo::HealthSnapshot;
use async_trait::async_trait;

#[async_trait]
pub trait HealthSource: Send + Sync {
    /// Stable name, used as the registry key
    fn name(&self) -> &str;

    /// Take a fresh health snapshot
    async fn snapshot(&self) -> anyhow::Result<HealthSnapshot>;
}
