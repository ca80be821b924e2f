use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
};

use anyhow::{Context, Result};
use eframe::egui::ColorImage;

use crate::song::CoverSource;

pub const COVER_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn has_cover_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            COVER_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

pub fn decode_cover_image(bytes: &[u8]) -> Result<ColorImage> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Unable to determine image format")?;
    let image = reader.decode().context("Failed to decode cover image")?;
    let image = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}

pub fn load_cover_image(path: &Path) -> Result<ColorImage> {
    let data =
        fs::read(path).with_context(|| format!("Unable to open cover: {}", path.display()))?;
    decode_cover_image(&data).with_context(|| format!("Bad cover file: {}", path.display()))
}

pub fn pick_cover_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Change Image")
        .add_filter("Images", &COVER_EXTENSIONS)
        .pick_file()
}

#[derive(Debug)]
pub enum CoverUpdate {
    Loaded { source: CoverSource, image: ColorImage },
    Failed { source: CoverSource, error: String },
}

struct CoverMessage {
    request_id: u64,
    update: CoverUpdate,
}

/// Decodes covers on short-lived worker threads. Only the newest request's
/// result is delivered; older ones are dropped when they arrive.
pub struct CoverLoader {
    tx: Sender<CoverMessage>,
    rx: Receiver<CoverMessage>,
    next_request_id: u64,
    inflight: Option<u64>,
}

impl Default for CoverLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            next_request_id: 1,
            inflight: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inflight.is_some()
    }

    pub fn request(&mut self, source: CoverSource) -> Option<u64> {
        let path = source.path()?.clone();
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("cover-decode".into())
            .spawn(move || {
                let update = match load_cover_image(&path) {
                    Ok(image) => CoverUpdate::Loaded { source, image },
                    Err(err) => CoverUpdate::Failed {
                        source,
                        error: format!("{err:#}"),
                    },
                };
                let _ = tx.send(CoverMessage { request_id, update });
            });

        match spawned {
            Ok(_) => {
                self.inflight = Some(request_id);
                Some(request_id)
            }
            Err(err) => {
                log::error!("Failed to start cover decoder: {err}");
                None
            }
        }
    }

    pub fn poll(&mut self) -> Option<CoverUpdate> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if Some(message.request_id) == self.inflight {
                        self.inflight = None;
                        latest = Some(message.update);
                    } else {
                        log::debug!("Dropping stale cover request {}", message.request_id);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn write_png(dir: &Path, name: &str, rgba: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba(rgba));
        img.save(&path).unwrap();
        path
    }

    fn wait_for(loader: &mut CoverLoader) -> CoverUpdate {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(update) = loader.poll() {
                return update;
            }
            assert!(Instant::now() < deadline, "cover decode timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn decode_cover_image_fails_on_garbage_input() {
        assert!(decode_cover_image(&[0u8, 1, 2, 3]).is_err());
    }

    #[test]
    fn extension_filter_matches_picker() {
        assert!(has_cover_extension(Path::new("a/b/cover.JPG")));
        assert!(has_cover_extension(Path::new("cover.jpeg")));
        assert!(has_cover_extension(Path::new("cover.png")));
        assert!(!has_cover_extension(Path::new("cover.gif")));
        assert!(!has_cover_extension(Path::new("cover")));
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "cover.png", [10, 20, 30, 255]);
        let image = load_cover_image(&path).unwrap();
        assert_eq!(image.size, [3, 2]);
        assert_eq!(image.pixels[0].r(), 10);
    }

    #[test]
    fn loader_delivers_latest_request_only() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_png(dir.path(), "first.png", [255, 0, 0, 255]);
        let second = write_png(dir.path(), "second.png", [0, 255, 0, 255]);

        let mut loader = CoverLoader::new();
        loader.request(CoverSource::Picked { path: first });
        let second_source = CoverSource::Picked { path: second };
        loader.request(second_source.clone());
        assert!(loader.is_loading());

        match wait_for(&mut loader) {
            CoverUpdate::Loaded { source, image } => {
                assert_eq!(source, second_source);
                assert_eq!(image.pixels[0].g(), 255);
            }
            other => panic!("unexpected update: {other:?}"),
        }
        assert!(!loader.is_loading());
    }

    #[test]
    fn loader_reports_missing_file() {
        let mut loader = CoverLoader::new();
        let source = CoverSource::Path(PathBuf::from("definitely/not/here.png"));
        loader.request(source.clone());
        match wait_for(&mut loader) {
            CoverUpdate::Failed { source: failed, error } => {
                assert_eq!(failed, source);
                assert!(error.contains("here.png"));
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn loader_ignores_sourceless_request() {
        let mut loader = CoverLoader::new();
        assert_eq!(loader.request(CoverSource::None), None);
        assert!(!loader.is_loading());
    }
}
