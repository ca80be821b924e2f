use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, Sender, TryRecvError},
        Arc,
    },
    thread,
};

use anyhow::{anyhow, Context, Result};
use eframe::egui::{ColorImage, Rect};

use crate::config::ExportConfig;

pub const EXPORT_FILE_NAME: &str = "music-tag.png";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardNode {
    pub rect: Rect,
    pub pixels_per_point: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTag(pub u64);

pub fn crop_to_node(screenshot: &ColorImage, node: &CardNode) -> Result<ColorImage> {
    let [width, height] = screenshot.size;
    let ppp = node.pixels_per_point.max(f32::EPSILON);
    let to_px = |v: f32, limit: usize| ((v * ppp).round().max(0.0) as usize).min(limit);

    let min_x = to_px(node.rect.min.x, width);
    let max_x = to_px(node.rect.max.x, width);
    let min_y = to_px(node.rect.min.y, height);
    let max_y = to_px(node.rect.max.y, height);
    if min_x >= max_x || min_y >= max_y {
        return Err(anyhow!(
            "Card region {:?} lies outside the {width}x{height} screenshot",
            node.rect
        ));
    }

    let out_width = max_x - min_x;
    let mut pixels = Vec::with_capacity(out_width * (max_y - min_y));
    for y in min_y..max_y {
        let row = y * width;
        pixels.extend_from_slice(&screenshot.pixels[row + min_x..row + max_x]);
    }
    Ok(ColorImage::new([out_width, max_y - min_y], pixels))
}

pub fn encode_png(image: &ColorImage) -> Result<Vec<u8>> {
    let [width, height] = image.size;
    let raw: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|pixel| pixel.to_srgba_unmultiplied())
        .collect();
    let buffer = image::RgbaImage::from_raw(width as u32, height as u32, raw)
        .ok_or_else(|| anyhow!("Pixel buffer does not match {width}x{height}"))?;

    let mut bytes = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(bytes)
}

pub fn render_node_to_image_bytes(screenshot: &ColorImage, node: &CardNode) -> Result<Vec<u8>> {
    let cropped = crop_to_node(screenshot, node)?;
    encode_png(&cropped)
}

pub trait ImageSaver: Send {
    fn save(&self, bytes: &[u8]) -> Result<PathBuf>;
}

pub struct FileSaver {
    path: PathBuf,
}

impl FileSaver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSaver for FileSaver {
    fn save(&self, bytes: &[u8]) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, bytes)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(self.path.clone())
    }
}

pub fn choose_destination(config: &ExportConfig) -> Option<PathBuf> {
    if config.ask_location {
        rfd::FileDialog::new()
            .set_directory(&config.directory)
            .set_file_name(EXPORT_FILE_NAME)
            .add_filter("PNG", &["png"])
            .save_file()
    } else {
        Some(config.directory.join(EXPORT_FILE_NAME))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Saved(PathBuf),
    Failed(String),
}

struct PendingExport {
    tag: ExportTag,
    node: CardNode,
    saver: Box<dyn ImageSaver>,
}

struct ExportMessage {
    tag: ExportTag,
    status: ExportStatus,
}

pub struct CardExporter {
    pending: Option<PendingExport>,
    running: Option<ExportTag>,
    tx: Sender<ExportMessage>,
    rx: Receiver<ExportMessage>,
    next_tag: u64,
}

impl Default for CardExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CardExporter {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            pending: None,
            running: None,
            tx,
            rx,
            next_tag: 1,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.running.is_some()
    }

    pub fn awaiting_screenshot(&self) -> bool {
        self.pending.is_some()
    }

    /// Queues an export of `node`. `saver` runs only once the request is
    /// accepted; the caller then sends a screenshot command carrying the tag.
    pub fn request<F>(&mut self, node: Option<CardNode>, saver: F) -> Option<ExportTag>
    where
        F: FnOnce() -> Option<Box<dyn ImageSaver>>,
    {
        let node = node?;
        if self.is_busy() {
            log::debug!("Export already in progress; ignoring request");
            return None;
        }
        let saver = saver()?;

        let tag = ExportTag(self.next_tag);
        self.next_tag += 1;
        self.pending = Some(PendingExport { tag, node, saver });
        Some(tag)
    }

    /// `Ok(false)` when the screenshot answers no pending export.
    pub fn on_screenshot(&mut self, tag: ExportTag, screenshot: Arc<ColorImage>) -> Result<bool> {
        if self.pending.as_ref().map(|p| p.tag) != Some(tag) {
            return Ok(false);
        }
        let Some(PendingExport { tag, node, saver }) = self.pending.take() else {
            return Ok(false);
        };

        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("card-export".into())
            .spawn(move || {
                let status = match render_node_to_image_bytes(&screenshot, &node)
                    .and_then(|bytes| saver.save(&bytes))
                {
                    Ok(path) => ExportStatus::Saved(path),
                    Err(err) => ExportStatus::Failed(format!("{err:#}")),
                };
                let _ = tx.send(ExportMessage { tag, status });
            });

        spawned.context("Failed to start export worker")?;
        self.running = Some(tag);
        Ok(true)
    }

    pub fn abandon_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            log::warn!("Screenshot for export {:?} never arrived", pending.tag);
        }
    }

    pub fn poll(&mut self) -> Option<ExportStatus> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if Some(message.tag) == self.running {
                        self.running = None;
                        return Some(message.status);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }
}
