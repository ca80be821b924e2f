use std::path::PathBuf;

pub const DEFAULT_SONG_NAME: &str = "Từ ngày em đến";
pub const DEFAULT_SONG_SINGER: &str = "Da Lab";
pub const DEFAULT_SONG_ALBUM: &str = "Single";
pub const DEFAULT_SONG_IMAGE: &str = "assets/songs/tungayemden.jpg";
pub const DEFAULT_SONG_DURATION: u32 = 4 * 60 + 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    Path(PathBuf),
    Picked { path: PathBuf },
    None,
}

impl CoverSource {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            CoverSource::Path(path) | CoverSource::Picked { path } => Some(path),
            CoverSource::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    pub name: String,
    pub singer: String,
    pub album: String,
    pub image: CoverSource,
    pub duration: u32,
}

impl Default for SongInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_SONG_NAME.to_string(),
            singer: DEFAULT_SONG_SINGER.to_string(),
            album: DEFAULT_SONG_ALBUM.to_string(),
            image: CoverSource::Path(PathBuf::from(DEFAULT_SONG_IMAGE)),
            duration: DEFAULT_SONG_DURATION,
        }
    }
}

/// Formats whole seconds as `m:ss`; minutes are not wrapped into hours.
pub fn format_duration(seconds: u32) -> String {
    let minute = seconds / 60;
    let second = seconds - minute * 60;
    format!("{minute}:{second:02}")
}

pub fn format_remaining(duration: u32, position: u32) -> String {
    format!("-{}", format_duration(duration.saturating_sub(position)))
}
