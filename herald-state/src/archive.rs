//! Recipient-source archival
//!
//! After a campaign has recorded an outcome for every recipient, the
//! consumed source files are moved into a per-campaign, timestamped archive
//! location and replaced with empty placeholders. The next run of the same
//! campaign therefore starts from a clean recipient set instead of
//! re-sending to the same list.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    error::{Result, StateError},
    manifest::TrackingId,
};

/// Move consumed sources under `archive_root/<tracking-id>/<timestamp>/`,
/// leaving an empty placeholder at each original path.
///
/// Returns the archived destinations. A source that has already vanished is
/// skipped silently; any other failure aborts with [`StateError::Archive`].
///
/// # Errors
///
/// Returns an error if the archive directory cannot be created or a source
/// cannot be moved.
pub fn archive_sources(
    archive_root: &Path,
    tracking_id: &TrackingId,
    sources: &[PathBuf],
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let destination_dir = archive_root
        .join(tracking_id.as_str())
        .join(now.format("%Y%m%d_%H%M%S").to_string());
    fs::create_dir_all(&destination_dir).map_err(|e| StateError::Archive {
        path: destination_dir.clone(),
        detail: e.to_string(),
    })?;

    let mut archived = Vec::with_capacity(sources.len());

    for source in sources {
        if !source.exists() {
            continue;
        }

        let file_name = source.file_name().ok_or_else(|| StateError::Archive {
            path: source.clone(),
            detail: "source has no file name".to_string(),
        })?;
        let destination = destination_dir.join(file_name);

        move_file(source, &destination).map_err(|e| StateError::Archive {
            path: source.clone(),
            detail: e.to_string(),
        })?;

        // Empty placeholder so the campaign's configured source path keeps
        // existing, with nothing left to send to.
        fs::write(source, b"").map_err(|e| StateError::Archive {
            path: source.clone(),
            detail: format!("failed to write placeholder: {e}"),
        })?;

        info!(
            source = %source.display(),
            destination = %destination.display(),
            "Archived consumed recipient source"
        );
        archived.push(destination);
    }

    Ok(archived)
}

/// Rename, falling back to copy-and-remove when the archive lives on a
/// different filesystem.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
