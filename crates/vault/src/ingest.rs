use std::fs::{self, File};
use std::path::Path;

use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;
use zip::ZipArchive;

use common::{is_audio_name, natural_cmp};

use crate::organize::{OrganizeOutcome, VaultWriter};
use crate::playlist::LinkOutcome;

#[derive(Debug)]
pub enum IngestError {
    Io(std::io::Error),
    Archive(zip::result::ZipError),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Io(err) => write!(f, "io error: {}", err),
            IngestError::Archive(err) => write!(f, "archive error: {}", err),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err)
    }
}

impl From<zip::result::ZipError> for IngestError {
    fn from(err: zip::result::ZipError) -> Self {
        IngestError::Archive(err)
    }
}

// processed counts every audio file the organizer accepted, duplicates and
// quarantined included; link skips never subtract from it
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub processed: usize,
    pub organized: usize,
    pub duplicates: usize,
    pub quarantined: usize,
    pub linked: usize,
}

pub fn ingest_archive(
    writer: &VaultWriter,
    archive_path: &Path,
    target_playlist: Option<&str>,
) -> Result<IngestReport, IngestError> {
    let scratch = writer.roots().scratch().join(Uuid::new_v4().to_string());
    fs::create_dir_all(&scratch)?;

    let result = extract_and_organize(writer, archive_path, &scratch, target_playlist);

    if let Err(err) = fs::remove_dir_all(&scratch) {
        warn!("Failed to clean scratch directory {:?}: {}", scratch, err);
    }
    result
}

fn extract_and_organize(
    writer: &VaultWriter,
    archive_path: &Path,
    scratch: &Path,
    target_playlist: Option<&str>,
) -> Result<IngestReport, IngestError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let entries = archive.len();
    archive.extract(scratch)?;
    debug!("Extracted {} archive entries into {:?}", entries, scratch);

    let playlist_dir = match target_playlist {
        Some(target) => {
            let dir = writer.playlist_dir(target);
            if dir.is_none() {
                warn!("Ignoring invalid playlist target {:?}", target);
            }
            dir
        }
        None => None,
    };

    let mut report = IngestReport::default();
    let walker = WalkDir::new(scratch)
        .follow_links(false)
        .sort_by(|a, b| natural_cmp(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy()));
    for entry in walker.into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_audio_name(&name) {
            continue;
        }

        let outcome = writer.organize(entry.path());
        match &outcome {
            OrganizeOutcome::Organized(_) => report.organized += 1,
            OrganizeOutcome::Duplicate(_) => report.duplicates += 1,
            OrganizeOutcome::Quarantined(_) => report.quarantined += 1,
        }
        report.processed += 1;

        if let Some(dir) = &playlist_dir {
            match writer.link_into_playlist(dir, outcome.path()) {
                Ok(LinkOutcome::Linked(_)) => report.linked += 1,
                Ok(LinkOutcome::AlreadyLinked(_)) | Ok(LinkOutcome::PlaylistMissing) => {}
                Err(err) => {
                    warn!("Failed to link {:?} into {:?}: {}", outcome.path(), dir, err);
                }
            }
        }
    }

    info!(
        "Ingested {} files: {} organized, {} duplicates, {} quarantined, {} linked",
        report.processed, report.organized, report.duplicates, report.quarantined, report.linked
    );
    Ok(report)
}
