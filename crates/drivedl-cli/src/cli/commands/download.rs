//! `drivedl <link> [destination]` – fetch one file.

use anyhow::{Context, Result};
use drivedl_core::config::DriveConfig;
use drivedl_core::{download, extract_file_id, DriveError};
use std::path::Path;

pub async fn run_download(
    link: &str,
    destination: Option<&Path>,
    cfg: &DriveConfig,
) -> Result<()> {
    let file_id =
        extract_file_id(link).ok_or_else(|| DriveError::InvalidLink(link.to_string()))?;
    println!("Attempting to download file with ID: {file_id}");

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let result = tokio::task::spawn_blocking({
        let destination = destination.map(Path::to_path_buf);
        let cfg = cfg.clone();
        move || download(&file_id, destination.as_deref(), &cwd, &cfg)
    })
    .await
    .context("download task join")?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if err
                .downcast_ref::<DriveError>()
                .is_some_and(DriveError::is_write_error)
            {
                eprintln!(
                    "Please ensure the destination path is valid and you have write permissions."
                );
            }
            return Err(err);
        }
    };

    if let Some(note) = outcome.note {
        eprintln!("Warning: {}", note.message(&outcome.path));
    }
    println!("File downloaded successfully to: {}", outcome.path.display());
    Ok(())
}
