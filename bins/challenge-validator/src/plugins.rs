// Integration capabilities available to challenge validators.
// The default set is inert; scoring never depends on any of them.
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[async_trait]
pub trait SourceControl: Send + Sync {
    async fn user_exists(&self, username: &str) -> Result<bool>;
    async fn can_user_access_repo(&self, username: &str, repo_full_name: &str) -> Result<bool>;
    async fn invite_user_to_repo(&self, username: &str, repo_full_name: &str) -> Result<()>;
}

#[async_trait]
pub trait CiTrigger: Send + Sync {
    /// Returns the id of the triggered run
    async fn trigger_workflow(
        &self,
        repo_full_name: &str,
        workflow_id: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<u64>;
}

#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<()>;
    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive: &Path, destination: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSourceControl;

#[async_trait]
impl SourceControl for NoopSourceControl {
    async fn user_exists(&self, _username: &str) -> Result<bool> {
        Ok(true)
    }

    async fn can_user_access_repo(&self, _username: &str, _repo_full_name: &str) -> Result<bool> {
        Ok(true)
    }

    async fn invite_user_to_repo(&self, _username: &str, _repo_full_name: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCiTrigger;

#[async_trait]
impl CiTrigger for NoopCiTrigger {
    async fn trigger_workflow(
        &self,
        _repo_full_name: &str,
        _workflow_id: &str,
        _inputs: &BTreeMap<String, String>,
    ) -> Result<u64> {
        Ok(0)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopArtifactStorage;

#[async_trait]
impl ArtifactStorage for NoopArtifactStorage {
    async fn upload(&self, _key: &str, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn download(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopArchiveExtractor;

impl ArchiveExtractor for NoopArchiveExtractor {
    fn extract(&self, _archive: &Path, _destination: &Path) -> Result<()> {
        Ok(())
    }
}

/// Capability bundle handed to a validator at construction
#[derive(Clone)]
pub struct Plugins {
    pub source_control: Arc<dyn SourceControl>,
    pub ci: Arc<dyn CiTrigger>,
    pub storage: Arc<dyn ArtifactStorage>,
    pub archives: Arc<dyn ArchiveExtractor>,
}

impl Default for Plugins {
    fn default() -> Self {
        Self {
            source_control: Arc::new(NoopSourceControl),
            ci: Arc::new(NoopCiTrigger),
            storage: Arc::new(NoopArtifactStorage),
            archives: Arc::new(NoopArchiveExtractor),
        }
    }
}

impl std::fmt::Debug for Plugins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugins").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_plugins_are_inert() {
        let plugins = Plugins::default();

        assert!(plugins.source_control.user_exists("octocat").await.unwrap());
        assert!(plugins
            .source_control
            .can_user_access_repo("octocat", "devmatch/challenge")
            .await
            .unwrap());
        plugins
            .source_control
            .invite_user_to_repo("octocat", "devmatch/challenge")
            .await
            .unwrap();

        let run_id = plugins
            .ci
            .trigger_workflow("devmatch/challenge", "validate.yml", &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(run_id, 0);

        plugins.storage.upload("results/output.json", b"[]").await.unwrap();
        assert!(plugins.storage.download("results/output.json").await.unwrap().is_none());

        plugins
            .archives
            .extract(Path::new("submission.zip"), Path::new("workspace"))
            .unwrap();
    }
}
