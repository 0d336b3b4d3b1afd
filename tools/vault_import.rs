use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use common::is_audio_name;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vault::{ingest_archive, Roots, VaultWriter};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let data_root = args
        .next()
        .or_else(|| env::var("TONEVAULT_DATA").ok())
        .ok_or("TONEVAULT_DATA not set and no data root argument")?;
    let source = args.next().ok_or("no source directory or archive given")?;
    let playlist = args.next();

    let roots = Roots::new(PathBuf::from(&data_root));
    roots.ensure_layout()?;
    let writer = VaultWriter::new(roots.clone());

    let source = PathBuf::from(source);
    let (archive, packed_here) = if source.is_dir() {
        fs::create_dir_all(roots.scratch())?;
        let archive = roots.scratch().join("import.zip");
        let packed = pack_audio(&source, &archive)?;
        info!("Packed {} audio files from {:?}", packed, source);
        (archive, true)
    } else {
        (source, false)
    };

    let report = ingest_archive(&writer, &archive, playlist.as_deref());
    if packed_here {
        let _ = fs::remove_file(&archive);
    }
    let report = report?;

    println!(
        "Imported: {} processed, {} organized, {} duplicates, {} quarantined, {} linked",
        report.processed, report.organized, report.duplicates, report.quarantined, report.linked
    );

    Ok(())
}

fn pack_audio(source: &Path, archive_path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let mut packed = 0;
    for entry in WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_audio_name(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let rel = entry.path().strip_prefix(source)?;
        zip.start_file(rel.to_string_lossy().replace('\\', "/"), options)?;
        let mut src = File::open(entry.path())?;
        std::io::copy(&mut src, &mut zip)?;
        packed += 1;
    }
    zip.finish()?;
    Ok(packed)
}
