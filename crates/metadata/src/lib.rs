use std::path::Path;

use lofty::error::LoftyError;
use lofty::picture::{Picture, PictureType};
use lofty::prelude::{ItemKey, TaggedFileExt};

use common::{sanitize_segment, AUDIO_EXT};

pub const DEFAULT_ARTIST: &str = "Unknown";
pub const DEFAULT_ALBUM: &str = "Singles";

#[derive(Debug, Default, Clone)]
pub struct TagInfo {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track_no: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track: u32,
}

impl TrackMetadata {
    pub fn from_tags(info: &TagInfo, source: &Path) -> Self {
        let stem = source
            .file_stem()
            .or_else(|| source.file_name())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_ARTIST.to_string());
        let artist = sanitize_segment(info.artist.as_deref().unwrap_or(DEFAULT_ARTIST), DEFAULT_ARTIST);
        let album = sanitize_segment(info.album.as_deref().unwrap_or(DEFAULT_ALBUM), DEFAULT_ALBUM);
        let title = sanitize_segment(info.title.as_deref().unwrap_or(&stem), &stem);
        let track = info
            .track_no
            .as_deref()
            .map(parse_track_number)
            .unwrap_or(0);
        TrackMetadata { artist, album, title, track }
    }

    pub fn vault_file_name(&self) -> String {
        format!("{:02} - {}{}", self.track, self.title, AUDIO_EXT)
    }
}

#[derive(Debug, Clone)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: Option<String>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

pub fn read_tags(path: &Path) -> Result<TagInfo, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;

    let mut info = TagInfo::default();
    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        info.artist = tag.get_string(&ItemKey::TrackArtist).map(|v| v.to_string());
        info.album = tag.get_string(&ItemKey::AlbumTitle).map(|v| v.to_string());
        info.title = tag.get_string(&ItemKey::TrackTitle).map(|v| v.to_string());
        info.track_no = tag.get_string(&ItemKey::TrackNumber).map(|v| v.to_string());
    }

    Ok(info)
}

pub fn read_cover(path: &Path) -> Result<Option<CoverArt>, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => return Ok(None),
    };

    let picture = match pick_picture(tag.pictures()) {
        Some(picture) => picture,
        None => return Ok(None),
    };

    let data = picture.data().to_vec();
    let mime = guess_mime(&data);
    Ok(Some(CoverArt { data, mime }))
}

pub fn parse_track_number(text: &str) -> u32 {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().unwrap_or(0)
}

fn pick_picture(pictures: &[Picture]) -> Option<&Picture> {
    for picture in pictures {
        if picture.pic_type() == PictureType::CoverFront {
            return Some(picture);
        }
    }
    pictures.first()
}

fn guess_mime(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg".to_string())
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn track_numbers_tolerate_slash_totals() {
        assert_eq!(parse_track_number("7"), 7);
        assert_eq!(parse_track_number("3/12"), 3);
        assert_eq!(parse_track_number(" 4 "), 4);
        assert_eq!(parse_track_number("x"), 0);
        assert_eq!(parse_track_number(""), 0);
        assert_eq!(parse_track_number("-1"), 0);
    }

    #[test]
    fn missing_tags_fall_back_to_defaults() {
        let info = TagInfo::default();
        let meta = TrackMetadata::from_tags(&info, Path::new("/tmp/ingest/song one.mp3"));
        assert_eq!(meta.artist, DEFAULT_ARTIST);
        assert_eq!(meta.album, DEFAULT_ALBUM);
        assert_eq!(meta.title, "song one");
        assert_eq!(meta.track, 0);
        assert_eq!(meta.vault_file_name(), "00 - song one.mp3");
    }

    #[test]
    fn blank_tags_count_as_missing() {
        let info = TagInfo {
            artist: Some("  ".to_string()),
            album: Some(String::new()),
            title: Some("Echoes".to_string()),
            track_no: Some("2/9".to_string()),
        };
        let meta = TrackMetadata::from_tags(&info, Path::new("x.mp3"));
        assert_eq!(meta.artist, DEFAULT_ARTIST);
        assert_eq!(meta.album, DEFAULT_ALBUM);
        assert_eq!(meta.title, "Echoes");
        assert_eq!(meta.vault_file_name(), "02 - Echoes.mp3");
    }

    #[test]
    fn separators_in_tags_become_dashes() {
        let info = TagInfo {
            artist: Some("AC/DC".to_string()),
            album: Some("Back in Black".to_string()),
            title: Some("Shoot to Thrill".to_string()),
            track_no: Some("2".to_string()),
        };
        let meta = TrackMetadata::from_tags(&info, Path::new("x.mp3"));
        assert_eq!(meta.artist, "AC-DC");
        assert_eq!(meta.vault_file_name(), "02 - Shoot to Thrill.mp3");
    }

    #[test]
    fn large_track_numbers_keep_all_digits() {
        let info = TagInfo {
            track_no: Some("123".to_string()),
            title: Some("Finale".to_string()),
            ..TagInfo::default()
        };
        let meta = TrackMetadata::from_tags(&info, Path::new("x.mp3"));
        assert_eq!(meta.vault_file_name(), "123 - Finale.mp3");
    }
}
