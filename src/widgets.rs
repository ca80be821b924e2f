use eframe::egui::{
    self, epaint::PathShape, pos2, vec2, Color32, CornerRadius, Pos2, Rect, Sense, Shape,
    Stroke, TextureHandle, Vec2,
};

use crate::theme::CardTheme;

const TRACK_THICKNESS: f32 = 4.0;
const THUMB_RADIUS: f32 = 4.0;
const THUMB_ACTIVE_RADIUS: f32 = 10.0;

fn to_corner_radius(value: f32) -> CornerRadius {
    CornerRadius::same(value.clamp(0.0, u8::MAX as f32).round() as u8)
}

pub fn apply_style(ctx: &egui::Context, theme: &CardTheme) {
    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::light();
    style.visuals.panel_fill = Color32::TRANSPARENT;
    style.visuals.window_fill = Color32::WHITE;
    style.visuals.override_text_color = Some(theme.text_color);
    style.visuals.selection.bg_fill = theme.accent_color.gamma_multiply(0.3);
    style.visuals.selection.stroke = Stroke::new(1.0, theme.accent_color);
    style.visuals.text_cursor.stroke = Stroke::new(1.5, theme.text_color);
    style.visuals.hyperlink_color = theme.accent_color;
    ctx.set_style(style);
}

pub fn slider_value_at(x: f32, track_min_x: f32, track_width: f32, max: u32) -> u32 {
    let t = ((x - track_min_x) / track_width.max(1.0)).clamp(0.0, 1.0);
    (t * max as f32).round() as u32
}

pub fn position_slider(
    ui: &mut egui::Ui,
    theme: &CardTheme,
    value: &mut u32,
    max: u32,
) -> egui::Response {
    let desired_height = THUMB_ACTIVE_RADIUS * 2.0 + 8.0;
    let width = ui.available_width();
    let (rect, mut response) =
        ui.allocate_exact_size(vec2(width, desired_height), Sense::click_and_drag());

    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    let track_min_x = rect.min.x + THUMB_RADIUS;
    let track_max_x = rect.max.x - THUMB_RADIUS;
    let track_width = (track_max_x - track_min_x).max(1.0);

    if response.dragged() || response.drag_started() || response.clicked() {
        if let Some(pos) = ui.input(|input| input.pointer.interact_pos()) {
            let new_value = slider_value_at(pos.x, track_min_x, track_width, max);
            if new_value != *value {
                *value = new_value;
                response.mark_changed();
            }
        }
    }

    let fraction = if max == 0 {
        0.0
    } else {
        (*value as f32 / max as f32).clamp(0.0, 1.0)
    };

    let painter = ui.painter_at(rect);
    let track_rect = Rect::from_min_max(
        pos2(track_min_x, rect.center().y - TRACK_THICKNESS / 2.0),
        pos2(track_max_x, rect.center().y + TRACK_THICKNESS / 2.0),
    );
    let rounding = to_corner_radius(TRACK_THICKNESS / 2.0);
    painter.rect_filled(track_rect, rounding, theme.rail_color());

    if fraction > 0.0 {
        let fill_rect = Rect::from_min_max(
            track_rect.min,
            pos2(track_rect.min.x + track_width * fraction, track_rect.max.y),
        );
        painter.rect_filled(fill_rect, rounding, theme.slider_color);
    }

    let active = response.dragged() || response.is_pointer_button_down_on();
    let radius = ui.ctx().animate_value_with_time(
        response.id.with("thumb"),
        if active { THUMB_ACTIVE_RADIUS } else { THUMB_RADIUS },
        0.15,
    );
    let thumb_center = pos2(track_min_x + track_width * fraction, track_rect.center().y);
    if response.hovered() || active {
        painter.circle_filled(
            thumb_center,
            radius + 4.0,
            theme.slider_color.gamma_multiply(0.16),
        );
    }
    painter.circle_filled(thumb_center, radius, theme.slider_color);

    response
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIcon {
    Rewind,
    Play,
    Pause,
    FastForward,
}

fn triangle(points: [Pos2; 3], color: Color32) -> Shape {
    Shape::Path(PathShape::convex_polygon(points.to_vec(), color, Stroke::NONE))
}

fn paint_icon(painter: &egui::Painter, rect: Rect, icon: PlaybackIcon, color: Color32) {
    let c = rect.center();
    let s = rect.width().min(rect.height()) * 0.5;
    match icon {
        PlaybackIcon::Play => {
            painter.add(triangle(
                [
                    pos2(c.x - s * 0.45, c.y - s * 0.6),
                    pos2(c.x + s * 0.6, c.y),
                    pos2(c.x - s * 0.45, c.y + s * 0.6),
                ],
                color,
            ));
        }
        PlaybackIcon::Pause => {
            let bar = vec2(s * 0.32, s * 1.2);
            let rounding = to_corner_radius(s * 0.08);
            for dx in [-s * 0.3, s * 0.3] {
                let rect = Rect::from_center_size(pos2(c.x + dx, c.y), bar);
                painter.rect_filled(rect, rounding, color);
            }
        }
        PlaybackIcon::Rewind | PlaybackIcon::FastForward => {
            let dir = if icon == PlaybackIcon::Rewind { -1.0 } else { 1.0 };
            for offset in [-s * 0.45, s * 0.05] {
                let base = c.x + offset * dir;
                painter.add(triangle(
                    [
                        pos2(base, c.y - s * 0.45),
                        pos2(base + dir * s * 0.5, c.y),
                        pos2(base, c.y + s * 0.45),
                    ],
                    color,
                ));
            }
        }
    }
}

pub fn icon_button(
    ui: &mut egui::Ui,
    theme: &CardTheme,
    icon: PlaybackIcon,
    size: f32,
    hint: &str,
) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(Vec2::splat(size), Sense::click());
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        ui.painter()
            .circle_filled(rect.center(), size / 2.0, theme.icon_color.gamma_multiply(0.04));
    }
    paint_icon(ui.painter(), rect.shrink(size * 0.2), icon, theme.icon_color);
    response.on_hover_text(hint)
}

pub fn cover_uv(texture_size: Vec2) -> Rect {
    if texture_size.x <= 0.0 || texture_size.y <= 0.0 {
        return Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0));
    }
    if texture_size.x > texture_size.y {
        let w = texture_size.y / texture_size.x;
        let x0 = (1.0 - w) / 2.0;
        Rect::from_min_max(pos2(x0, 0.0), pos2(x0 + w, 1.0))
    } else {
        let h = texture_size.x / texture_size.y;
        let y0 = (1.0 - h) / 2.0;
        Rect::from_min_max(pos2(0.0, y0), pos2(1.0, y0 + h))
    }
}

pub fn cover_tile(
    ui: &mut egui::Ui,
    theme: &CardTheme,
    texture: Option<&TextureHandle>,
) -> egui::Response {
    let size = Vec2::splat(theme.cover_size);
    let rounding = to_corner_radius(theme.cover_radius);
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());

    match texture {
        Some(texture) => {
            let image = egui::Image::new((texture.id(), size))
                .uv(cover_uv(texture.size_vec2()))
                .fit_to_exact_size(size)
                .corner_radius(rounding);
            ui.put(rect, image);
        }
        None => {
            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, rounding, theme.text_color.gamma_multiply(0.08));
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No artwork",
                egui::FontId::proportional(theme.tiny_size),
                theme.tiny_text_color(),
            );
        }
    }

    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_maps_pointer_to_seconds() {
        assert_eq!(slider_value_at(0.0, 10.0, 100.0, 270), 0);
        assert_eq!(slider_value_at(60.0, 10.0, 100.0, 270), 135);
        assert_eq!(slider_value_at(500.0, 10.0, 100.0, 270), 270);
        assert_eq!(slider_value_at(50.0, 10.0, 100.0, 0), 0);
    }

    #[test]
    fn cover_uv_crops_long_side() {
        let wide = cover_uv(vec2(200.0, 100.0));
        assert_eq!(wide, Rect::from_min_max(pos2(0.25, 0.0), pos2(0.75, 1.0)));

        let tall = cover_uv(vec2(100.0, 400.0));
        assert_eq!(tall, Rect::from_min_max(pos2(0.0, 0.375), pos2(1.0, 0.625)));

        let square = cover_uv(vec2(64.0, 64.0));
        assert_eq!(square, Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0)));
    }
}
