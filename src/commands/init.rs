use crate::commands::Out;
use crate::config::InitOptions;
use crate::{Config, Result};
use std::path::Path;

/// Creates the home directory with its `config.json` and secrets directory.
///
/// # Arguments
/// - `home` - The directory that will be the root of the data directory, e.g. `$HOME/finboard`
/// - `options` - The backend, where to find it, and the credentials for it.
///
/// # Errors
/// - Returns an error if any file operations fail or the backend settings are incomplete.
pub async fn init(home: &Path, options: InitOptions) -> Result<Out<()>> {
    let backend = options.backend;
    let config = Config::create(home, options).await?;
    Ok(format!(
        "Created the finboard home at '{}' using the {backend} backend",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, Credentials};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let options = InitOptions {
            backend: Backend::Airtable,
            airtable_base_id: Some("appXYZ".into()),
            credentials: Credentials {
                airtable_api_key: Some("patKEY".into()),
                ..Credentials::default()
            },
            ..InitOptions::default()
        };
        let out = init(dir.path(), options).await.unwrap();
        assert!(out.message().contains("airtable backend"));
        assert!(dir.path().join("config.json").is_file());
        assert!(dir.path().join(".secrets/credentials.json").is_file());
    }
}
