use std::time::{Duration, Instant};

use eframe::egui::{
    self, Align2, Color32, CornerRadius, FontId, Margin, RichText, Sense, TextureHandle,
    TextureOptions, ViewportCommand,
};

use crate::{
    config::{Config, ConfigWatcher},
    cover::{pick_cover_file, CoverLoader, CoverUpdate},
    duration::INPUT_PLACEHOLDER,
    export::{
        choose_destination, CardExporter, CardNode, ExportStatus, ExportTag, FileSaver, ImageSaver,
    },
    song::{format_duration, format_remaining, CoverSource},
    state::{Applied, CardEvent, CardState, TextField},
    theme::CardTheme,
    widgets::{apply_style, cover_tile, icon_button, position_slider, PlaybackIcon},
};

const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(5);
const STATUS_TTL: Duration = Duration::from_secs(4);
const DURATION_EDITOR_WIDTH: f32 = 50.0;
const CONTROL_SIZE: f32 = 44.0;
const PLAY_CONTROL_SIZE: f32 = 60.0;
const WINDOW_MARGIN: f32 = 64.0;
const WINDOW_HEIGHT: f32 = 340.0;

pub fn window_size(theme: &CardTheme) -> egui::Vec2 {
    egui::vec2(theme.card_width + WINDOW_MARGIN, WINDOW_HEIGHT)
}

struct StatusLine {
    text: String,
    is_error: bool,
    shown_at: Instant,
}

pub fn duration_events_from_input(events: &[egui::Event]) -> Vec<CardEvent> {
    let mut out = Vec::new();
    for event in events {
        match event {
            egui::Event::Text(text) | egui::Event::Paste(text) => {
                out.push(CardEvent::DurationTyped(text.clone()));
            }
            egui::Event::Key {
                key: egui::Key::Backspace,
                pressed: true,
                ..
            } => out.push(CardEvent::DurationBackspace),
            egui::Event::Key {
                key: egui::Key::Enter,
                pressed: true,
                ..
            } => out.push(CardEvent::CommitDuration),
            _ => {}
        }
    }
    out
}

pub struct MusicTagApp {
    state: CardState,
    config: Config,
    cover_loader: CoverLoader,
    cover_texture: Option<TextureHandle>,
    exporter: CardExporter,
    export_requested_at: Option<Instant>,
    card_node: Option<CardNode>,
    duration_label_rect: Option<egui::Rect>,
    duration_popup_rect: Option<egui::Rect>,
    status: Option<StatusLine>,
    config_watcher: Option<ConfigWatcher>,
    style_dirty: bool,
}

impl MusicTagApp {
    pub fn new(config: Config) -> Self {
        for warning in &config.warnings {
            log::warn!("Config: {warning}");
        }

        let config_watcher = match (&config.source, config.ui.watch_config) {
            (Some(path), true) => match ConfigWatcher::watch(path) {
                Ok(watcher) => {
                    log::info!("Watching {} for theme changes", watcher.path().display());
                    Some(watcher)
                }
                Err(err) => {
                    log::warn!("Config hot reload unavailable: {err:#}");
                    None
                }
            },
            _ => None,
        };

        let mut cover_loader = CoverLoader::new();
        cover_loader.request(config.song.image.clone());

        Self {
            state: CardState::new(config.song.clone()),
            config,
            cover_loader,
            cover_texture: None,
            exporter: CardExporter::new(),
            export_requested_at: None,
            card_node: None,
            duration_label_rect: None,
            duration_popup_rect: None,
            status: None,
            config_watcher,
            style_dirty: true,
        }
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    fn theme(&self) -> &CardTheme {
        &self.config.theme
    }

    fn dispatch(&mut self, event: CardEvent) {
        match self.state.apply(event) {
            Applied::DurationSet(seconds) => {
                log::info!("Duration set to {}", format_duration(seconds));
            }
            Applied::DurationReverted(err) => {
                log::debug!("Duration input rejected: {err}");
            }
            Applied::Changed | Applied::Ignored => {}
        }
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    fn poll_config(&mut self, ctx: &egui::Context) {
        let Some(watcher) = self.config_watcher.as_ref() else {
            return;
        };
        match watcher.poll() {
            Some(Ok(config)) => {
                log::info!("Reloaded theme from {}", watcher.path().display());
                self.apply_reloaded_config(ctx, config);
            }
            Some(Err(err)) => log::warn!("Config reload failed: {err:#}"),
            None => {}
        }
    }

    fn apply_reloaded_config(&mut self, ctx: &egui::Context, config: Config) {
        for warning in &config.warnings {
            log::warn!("Config: {warning}");
        }
        if config.theme.card_width != self.config.theme.card_width {
            ctx.send_viewport_cmd(ViewportCommand::InnerSize(window_size(&config.theme)));
        }
        self.config.theme = config.theme;
        self.config.export = config.export;
        self.style_dirty = true;
    }

    fn poll_cover(&mut self, ctx: &egui::Context) {
        match self.cover_loader.poll() {
            Some(CoverUpdate::Loaded { source, image }) => {
                log::info!("Loaded cover {:?}", source.path());
                self.cover_texture =
                    Some(ctx.load_texture("card.cover", image, TextureOptions::LINEAR));
                self.dispatch(CardEvent::CoverLoaded(source));
            }
            Some(CoverUpdate::Failed { source, error }) => {
                log::warn!("Cover load failed: {error}");
                if matches!(source, CoverSource::Picked { .. }) {
                    self.set_status("Could not open that image", true);
                }
            }
            None => {}
        }
    }

    fn poll_export(&mut self, ctx: &egui::Context) {
        let screenshots: Vec<_> = ctx.input(|i| {
            i.raw
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Screenshot {
                        user_data, image, ..
                    } => user_data
                        .data
                        .as_ref()
                        .and_then(|data| data.downcast_ref::<ExportTag>())
                        .map(|tag| (*tag, image.clone())),
                    _ => None,
                })
                .collect()
        });
        for (tag, image) in screenshots {
            if let Err(err) = self.exporter.on_screenshot(tag, image) {
                self.fail_export(&format!("{err:#}"));
            }
        }

        if self.exporter.awaiting_screenshot()
            && self
                .export_requested_at
                .is_some_and(|at| at.elapsed() > SCREENSHOT_TIMEOUT)
        {
            self.exporter.abandon_pending();
            self.fail_export("no screenshot from the window");
        }

        match self.exporter.poll() {
            Some(ExportStatus::Saved(path)) => {
                log::info!("Exported card to {}", path.display());
                self.export_requested_at = None;
                self.set_status(format!("Saved {}", path.display()), false);
            }
            Some(ExportStatus::Failed(err)) => self.fail_export(&err),
            None => {}
        }
    }

    fn fail_export(&mut self, err: &str) {
        log::error!("Export failed: {err}");
        self.export_requested_at = None;
        self.set_status(format!("Export failed: {err}"), true);
    }

    /// Starts an export of the card drawn last frame. Returns `false` when
    /// nothing was started (no card yet, busy, or dialog cancelled).
    pub fn request_export(&mut self, ctx: &egui::Context) -> bool {
        let export_config = self.config.export.clone();
        let tag = self.exporter.request(self.card_node, || {
            choose_destination(&export_config)
                .map(|path| Box::new(FileSaver::new(path)) as Box<dyn ImageSaver>)
        });
        match tag {
            Some(tag) => {
                ctx.send_viewport_cmd(ViewportCommand::Screenshot(egui::UserData::new(tag)));
                self.export_requested_at = Some(Instant::now());
                true
            }
            None => false,
        }
    }

    fn handle_duration_keys(&mut self, ctx: &egui::Context) {
        if !self.state.duration_editor_open {
            return;
        }

        let (events, pressed_at) = ctx.input(|i| {
            let pressed_at = if i.pointer.any_pressed() {
                i.pointer.interact_pos()
            } else {
                None
            };
            (duration_events_from_input(&i.events), pressed_at)
        });
        for event in events {
            self.dispatch(event);
        }

        if let Some(pos) = pressed_at {
            let inside = |rect: Option<egui::Rect>| rect.is_some_and(|r| r.contains(pos));
            if !inside(self.duration_popup_rect) && !inside(self.duration_label_rect) {
                self.dispatch(CardEvent::CommitDuration);
            }
        }
    }

    fn render_card(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme().clone();
        let mut events = Vec::new();

        let frame = egui::Frame::new()
            .fill(theme.background)
            .corner_radius(CornerRadius::same(theme.corner_radius.round().clamp(0.0, 255.0) as u8))
            .inner_margin(Margin::same(theme.card_padding.round().clamp(0.0, 127.0) as i8));

        let response = frame.show(ui, |card| {
            let inner_width = (theme.card_width - 2.0 * theme.card_padding).max(1.0);
            card.set_width(inner_width);
            card.spacing_mut().item_spacing = egui::vec2(0.0, 4.0);

            card.horizontal(|row| {
                let cover = cover_tile(row, &theme, self.cover_texture.as_ref())
                    .on_hover_text("Change Image");
                if cover.clicked() {
                    if let Some(path) = pick_cover_file() {
                        self.cover_loader.request(CoverSource::Picked { path });
                    }
                }
                row.add_space(12.0);
                row.vertical(|meta| {
                    let song = &self.state.song;
                    for (field, value, size) in [
                        (TextField::Name, &song.name, theme.title_size),
                        (TextField::Singer, &song.singer, theme.body_size),
                        (TextField::Album, &song.album, theme.body_size),
                    ] {
                        if let Some(edited) = editable_text(meta, &theme, field, value, size) {
                            events.push(CardEvent::EditText(field, edited));
                        }
                    }
                });
            });

            let mut position = self.state.position;
            if position_slider(card, &theme, &mut position, self.state.song.duration).changed() {
                events.push(CardEvent::Seek(position));
            }

            card.horizontal(|row| {
                row.label(
                    RichText::new(format_duration(position))
                        .size(theme.tiny_size)
                        .color(theme.tiny_text_color()),
                );
                row.with_layout(egui::Layout::right_to_left(egui::Align::Center), |right| {
                    let remaining = format_remaining(self.state.song.duration, position);
                    let label = right
                        .add(
                            egui::Label::new(
                                RichText::new(remaining)
                                    .size(theme.tiny_size)
                                    .color(theme.tiny_text_color()),
                            )
                            .selectable(false)
                            .sense(Sense::click()),
                        )
                        .on_hover_cursor(egui::CursorIcon::Text);
                    self.duration_label_rect = Some(label.rect);
                    if label.clicked() {
                        events.push(CardEvent::OpenDurationEditor);
                    }
                });
            });

            Self::render_controls(card, &theme, self.state.paused, &mut events);
        });

        self.card_node = Some(CardNode {
            rect: response.response.rect,
            pixels_per_point: ui.ctx().pixels_per_point(),
        });

        for event in events {
            if event == CardEvent::OpenDurationEditor {
                ui.ctx().memory_mut(|m| m.stop_text_input());
            }
            self.dispatch(event);
        }
    }

    fn render_controls(
        ui: &mut egui::Ui,
        theme: &CardTheme,
        paused: bool,
        events: &mut Vec<CardEvent>,
    ) {
        let total = 2.0 * CONTROL_SIZE + PLAY_CONTROL_SIZE + 2.0 * 8.0;
        ui.horizontal(|row| {
            row.spacing_mut().item_spacing.x = 8.0;
            row.add_space(((row.available_width() - total) / 2.0).max(0.0));

            if icon_button(row, theme, PlaybackIcon::Rewind, CONTROL_SIZE, "previous").clicked() {
                events.push(CardEvent::Previous);
            }
            let (icon, hint) = if paused {
                (PlaybackIcon::Play, "play")
            } else {
                (PlaybackIcon::Pause, "pause")
            };
            if icon_button(row, theme, icon, PLAY_CONTROL_SIZE, hint).clicked() {
                events.push(CardEvent::TogglePlayback);
            }
            let next = icon_button(row, theme, PlaybackIcon::FastForward, CONTROL_SIZE, "next");
            if next.clicked() {
                events.push(CardEvent::Next);
            }
        });
    }

    fn render_duration_editor(&mut self, ctx: &egui::Context) {
        if !self.state.duration_editor_open {
            self.duration_popup_rect = None;
            return;
        }
        let Some(anchor) = self.duration_label_rect else {
            return;
        };
        let theme = self.theme().clone();

        let area = egui::Area::new(egui::Id::new("duration-editor"))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor.right_top() + egui::vec2(8.0, -6.0))
            .interactable(true)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(Color32::WHITE)
                    .show(ui, |ui| {
                        let height = theme.body_size + 8.0;
                        let (rect, _) = ui.allocate_exact_size(
                            egui::vec2(DURATION_EDITOR_WIDTH, height),
                            Sense::hover(),
                        );
                        let painter = ui.painter_at(rect.expand(1.0));
                        let text = self.state.duration_input.text();
                        let font = FontId::proportional(theme.body_size * 0.9);
                        let (content, color) = if text.is_empty() {
                            (INPUT_PLACEHOLDER, theme.tiny_text_color())
                        } else {
                            (text, theme.text_color)
                        };
                        let galley_rect = painter.text(
                            rect.left_center(),
                            Align2::LEFT_CENTER,
                            content,
                            font,
                            color,
                        );

                        let caret_x = if text.is_empty() {
                            rect.left()
                        } else {
                            galley_rect.right() + 1.0
                        };
                        let blink = (ui.input(|i| i.time) * 2.0) as i64 % 2 == 0;
                        if blink {
                            painter.line_segment(
                                [
                                    egui::pos2(caret_x, rect.top() + 3.0),
                                    egui::pos2(caret_x, rect.bottom() - 3.0),
                                ],
                                egui::Stroke::new(1.0, theme.text_color),
                            );
                        }
                        painter.line_segment(
                            [rect.left_bottom(), rect.right_bottom()],
                            egui::Stroke::new(2.0, theme.accent_color),
                        );
                    });
            });

        self.duration_popup_rect = Some(area.response.rect);
        ctx.request_repaint_after(Duration::from_millis(250));
    }

    fn render_export_controls(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme().clone();
        let label = RichText::new("Download Transparent Image  ⬇")
            .size(theme.body_size * 0.9)
            .color(theme.accent_color);
        let button = ui.add_enabled(
            !self.exporter.is_busy(),
            egui::Button::new(label).frame(false),
        );
        if button.clicked() {
            let ctx = ui.ctx().clone();
            self.request_export(&ctx);
        }

        if self
            .status
            .as_ref()
            .is_some_and(|status| status.shown_at.elapsed() > STATUS_TTL)
        {
            self.status = None;
        }
        if let Some(status) = &self.status {
            let color = if status.is_error {
                Color32::from_rgb(220, 80, 80)
            } else {
                theme.tiny_text_color()
            };
            ui.label(RichText::new(&status.text).size(theme.tiny_size).color(color));
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.poll_config(ctx);
        if self.style_dirty {
            apply_style(ctx, self.theme());
            self.style_dirty = false;
        }

        self.poll_cover(ctx);
        self.poll_export(ctx);
        self.handle_duration_keys(ctx);

        let panel_frame = egui::Frame::central_panel(&ctx.style()).fill(Color32::TRANSPARENT);
        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                ui.vertical_centered(|column| {
                    column.add_space(16.0);
                    self.render_card(column);
                    column.add_space(12.0);
                    self.render_export_controls(column);
                });
            });

        self.render_duration_editor(ctx);

        if self.cover_loader.is_loading() || self.exporter.is_busy() || self.status.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

fn editable_text(
    ui: &mut egui::Ui,
    theme: &CardTheme,
    field: TextField,
    value: &str,
    size: f32,
) -> Option<String> {
    let mut buffer = value.to_string();
    let response = ui.add(
        egui::TextEdit::singleline(&mut buffer)
            .id_salt(("card.text", field as u8))
            .frame(false)
            .margin(Margin::ZERO)
            .font(FontId::proportional(size))
            .text_color(theme.text_color)
            .desired_width(f32::INFINITY),
    );
    response.changed().then_some(buffer)
}

impl eframe::App for MusicTagApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}
