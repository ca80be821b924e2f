use anyhow::Context;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
};

use crate::{
    song::{CoverSource, SongInfo},
    theme::{CardTheme, ThemeSection},
};

#[derive(Debug, Clone)]
pub struct Config {
    pub song: SongInfo,
    pub export: ExportConfig,
    pub theme: CardTheme,
    pub ui: UiConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            song: SongInfo::default(),
            export: ExportConfig::default(),
            theme: CardTheme::default(),
            ui: UiConfig::default(),
            source: None,
            warnings: Vec::new(),
        }
    }
}

impl Config {
    pub fn candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("config.toml"));
            candidates.push(current_dir.join("config").join("config.toml"));
            candidates.push(current_dir.join("config").join("music-tag.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("config.toml"));
                candidates.push(dir.join("config").join("config.toml"));
                candidates.push(dir.join("config").join("music-tag.toml"));
            }
        }

        candidates
    }

    pub fn load() -> anyhow::Result<Self> {
        for path in Self::candidates() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml(data: &str) -> anyhow::Result<Self> {
        let doc: ConfigDocument = toml::from_str(data)?;
        Ok(doc.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub directory: PathBuf,
    pub ask_location: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            ask_location: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiConfig {
    pub watch_config: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { watch_config: true }
    }
}

pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    changes_rx: Receiver<notify::Result<notify::Event>>,
}

impl ConfigWatcher {
    pub fn watch(path: &Path) -> anyhow::Result<Self> {
        let path = path.to_path_buf();
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        // Editors often replace the file, so watch the directory.
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok(Self {
            path,
            _watcher: watcher,
            changes_rx: rx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll(&self) -> Option<anyhow::Result<Config>> {
        let mut touched = false;
        while let Ok(event) = self.changes_rx.try_recv() {
            match event {
                Ok(evt) => {
                    if evt.paths.iter().any(|p| p.file_name() == self.path.file_name()) {
                        touched = true;
                    }
                }
                Err(err) => log::warn!("Config watcher error: {err}"),
            }
        }

        touched.then(|| Config::load_from(&self.path))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    song: SongSection,
    #[serde(default)]
    export: ExportSection,
    #[serde(default)]
    theme: ThemeSection,
    #[serde(default)]
    ui: UiSection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults = SongInfo::default();
        let song = SongInfo {
            name: value.song.name.unwrap_or(defaults.name),
            singer: value.song.singer.unwrap_or(defaults.singer),
            album: value.song.album.unwrap_or(defaults.album),
            image: value
                .song
                .image
                .map(|path| {
                    if path.as_os_str().is_empty() {
                        CoverSource::None
                    } else {
                        CoverSource::Path(path)
                    }
                })
                .unwrap_or(defaults.image),
            duration: value.song.duration.unwrap_or(defaults.duration),
        };

        let export = ExportConfig {
            directory: value
                .export
                .directory
                .unwrap_or_else(|| ExportConfig::default().directory),
            ask_location: value.export.ask_location.unwrap_or(false),
        };

        let mut warnings = Vec::new();
        let theme = CardTheme::resolve(&value.theme, &mut warnings);

        Config {
            song,
            export,
            theme,
            ui: UiConfig {
                watch_config: value.ui.watch_config.unwrap_or(true),
            },
            source: None,
            warnings,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SongSection {
    name: Option<String>,
    singer: Option<String>,
    album: Option<String>,
    image: Option<PathBuf>,
    duration: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportSection {
    directory: Option<PathBuf>,
    ask_location: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct UiSection {
    watch_config: Option<bool>,
}
