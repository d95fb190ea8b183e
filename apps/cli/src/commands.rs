//! Subcommand implementations.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context;
use micloud_drive::{Client, HttpSession, RemoteFile, ReqwestSession, UploadOptions};

use crate::config::Config;

/// Builds a drive client from the configured credentials.
pub fn connect(config: &Config) -> anyhow::Result<Client<ReqwestSession>> {
    let (user_id, service_token) = config.credentials()?;
    let session =
        ReqwestSession::new(user_id, service_token).context("failed to create HTTP session")?;

    Ok(Client::new(session)
        .with_base_url(&config.base_url)
        .with_options(UploadOptions {
            concurrency: config.upload_concurrency.max(1),
        }))
}

pub async fn upload<S: HttpSession>(
    client: &Client<S>,
    path: &Path,
    parent: &str,
) -> anyhow::Result<()> {
    let id = client
        .upload_file(path, parent)
        .await
        .with_context(|| format!("failed to upload {}", path.display()))?;
    println!("{id}");
    Ok(())
}

pub async fn download<S: HttpSession>(
    client: &Client<S>,
    id: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let bytes = client
        .get_file(id)
        .await
        .with_context(|| format!("failed to download file {id}"))?;

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "file saved");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

pub async fn url<S: HttpSession>(client: &Client<S>, id: &str) -> anyhow::Result<()> {
    let url = client
        .download_url(id)
        .await
        .with_context(|| format!("failed to resolve download link for {id}"))?;
    println!("{url}");
    Ok(())
}

pub async fn list<S: HttpSession>(client: &Client<S>, folder: &str) -> anyhow::Result<()> {
    let entries = client
        .list_folder(folder)
        .await
        .with_context(|| format!("failed to list folder {folder}"))?;
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// One `ls` line: kind marker, size, id, name.
pub fn format_entry(entry: &RemoteFile) -> String {
    let kind = if entry.is_folder() { 'd' } else { '-' };
    format!("{kind} {:>12} {:>20}  {}", entry.size, entry.id, entry.name)
}

/// Resolved configuration with the service token masked.
pub fn describe_config(path: &Path, config: &Config) -> String {
    let token = if config.service_token.is_empty() {
        "(not set)"
    } else {
        "(set)"
    };

    let mut out = String::new();
    let _ = writeln!(out, "config file:        {}", path.display());
    let _ = writeln!(out, "user_id:            {}", config.user_id);
    let _ = writeln!(out, "service_token:      {token}");
    let _ = writeln!(out, "base_url:           {}", config.base_url);
    let _ = writeln!(out, "default_parent_id:  {}", config.default_parent_id);
    let _ = writeln!(out, "upload_concurrency: {}", config.upload_concurrency);
    out
}
