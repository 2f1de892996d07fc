use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::gateway::{ConnectionProfile, ProfileResolver};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Connection profiles stored as `<org>.json`, `<org>.yaml` or `<org>.yml`
/// in one directory.
#[derive(Clone, Debug)]
pub struct FileProfileStore {
    root: PathBuf,
}

impl FileProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn profile_path(&self, organization: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{organization}.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    pub fn load(&self, organization: &str) -> Result<ConnectionProfile> {
        if organization.is_empty()
            || organization.contains(['/', '\\'])
            || organization.starts_with('.')
        {
            return Err(anyhow!("invalid organization name `{organization}`"));
        }
        let path = self.profile_path(organization).ok_or_else(|| {
            anyhow!(
                "no connection profile for organization `{organization}` in {}",
                self.root.display()
            )
        })?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("unable to read connection profile {}", path.display()))?;
        let document = parse_document(&path, &content)
            .with_context(|| format!("invalid connection profile {}", path.display()))?;
        if !document.is_object() {
            return Err(anyhow!(
                "connection profile {} must be a mapping",
                path.display()
            ));
        }
        Ok(ConnectionProfile {
            organization: organization.to_string(),
            document,
        })
    }
}

fn parse_document(path: &Path, content: &str) -> Result<Value> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(serde_json::from_str(content)?),
        _ => Ok(serde_yaml::from_str(content)?),
    }
}

#[async_trait]
impl ProfileResolver for FileProfileStore {
    async fn connection_profile(&self, organization: &str) -> Result<ConnectionProfile> {
        self.load(organization)
    }
}
