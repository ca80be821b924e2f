use anyhow::{anyhow, Result};
use eframe::egui::Color32;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct CardTheme {
    pub background: Color32,
    pub text_color: Color32,
    pub tiny_text_alpha: f32,
    pub slider_color: Color32,
    pub rail_alpha: f32,
    pub icon_color: Color32,
    pub accent_color: Color32,
    pub card_width: f32,
    pub card_padding: f32,
    pub corner_radius: f32,
    pub cover_size: f32,
    pub cover_radius: f32,
    pub title_size: f32,
    pub body_size: f32,
    pub tiny_size: f32,
}

impl Default for CardTheme {
    fn default() -> Self {
        Self {
            background: Color32::TRANSPARENT,
            text_color: Color32::from_rgba_unmultiplied(0, 0, 0, 222),
            tiny_text_alpha: 0.38,
            slider_color: Color32::from_rgba_unmultiplied(0, 0, 0, 222),
            rail_alpha: 0.28,
            icon_color: Color32::BLACK,
            accent_color: Color32::from_rgb(0x19, 0x76, 0xd2),
            card_width: 400.0,
            card_padding: 16.0,
            corner_radius: 8.0,
            cover_size: 100.0,
            cover_radius: 4.0,
            title_size: 20.0,
            body_size: 16.0,
            tiny_size: 12.0,
        }
    }
}

impl CardTheme {
    pub fn tiny_text_color(&self) -> Color32 {
        self.text_color.gamma_multiply(self.tiny_text_alpha)
    }

    pub fn rail_color(&self) -> Color32 {
        self.slider_color.gamma_multiply(self.rail_alpha)
    }

    /// Builds a theme from the `[theme]` config table. Bad values keep the
    /// default and leave a warning behind.
    pub(crate) fn resolve(section: &ThemeSection, warnings: &mut Vec<String>) -> Self {
        let defaults = Self::default();
        Self {
            background: resolve_color_field(
                "background",
                &section.background,
                defaults.background,
                warnings,
            ),
            text_color: resolve_color_field(
                "text_color",
                &section.text_color,
                defaults.text_color,
                warnings,
            ),
            tiny_text_alpha: resolve_unit_field(
                "tiny_text_alpha",
                section.tiny_text_alpha,
                defaults.tiny_text_alpha,
                warnings,
            ),
            slider_color: resolve_color_field(
                "slider_color",
                &section.slider_color,
                defaults.slider_color,
                warnings,
            ),
            rail_alpha: resolve_unit_field(
                "rail_alpha",
                section.rail_alpha,
                defaults.rail_alpha,
                warnings,
            ),
            icon_color: resolve_color_field(
                "icon_color",
                &section.icon_color,
                defaults.icon_color,
                warnings,
            ),
            accent_color: resolve_color_field(
                "accent_color",
                &section.accent_color,
                defaults.accent_color,
                warnings,
            ),
            card_width: resolve_size_field(
                "card_width",
                section.card_width,
                defaults.card_width,
                warnings,
            ),
            card_padding: resolve_size_field(
                "card_padding",
                section.card_padding,
                defaults.card_padding,
                warnings,
            ),
            corner_radius: resolve_size_field(
                "corner_radius",
                section.corner_radius,
                defaults.corner_radius,
                warnings,
            ),
            cover_size: resolve_size_field(
                "cover_size",
                section.cover_size,
                defaults.cover_size,
                warnings,
            ),
            cover_radius: resolve_size_field(
                "cover_radius",
                section.cover_radius,
                defaults.cover_radius,
                warnings,
            ),
            title_size: resolve_size_field(
                "title_size",
                section.title_size,
                defaults.title_size,
                warnings,
            ),
            body_size: resolve_size_field(
                "body_size",
                section.body_size,
                defaults.body_size,
                warnings,
            ),
            tiny_size: resolve_size_field(
                "tiny_size",
                section.tiny_size,
                defaults.tiny_size,
                warnings,
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct ThemeSection {
    background: Option<String>,
    text_color: Option<String>,
    tiny_text_alpha: Option<f32>,
    slider_color: Option<String>,
    rail_alpha: Option<f32>,
    icon_color: Option<String>,
    accent_color: Option<String>,
    card_width: Option<f32>,
    card_padding: Option<f32>,
    corner_radius: Option<f32>,
    cover_size: Option<f32>,
    cover_radius: Option<f32>,
    title_size: Option<f32>,
    body_size: Option<f32>,
    tiny_size: Option<f32>,
}

fn resolve_color_field(
    name: &str,
    value: &Option<String>,
    default: Color32,
    warnings: &mut Vec<String>,
) -> Color32 {
    match value {
        Some(raw) => match parse_color(raw) {
            Ok(color) => color,
            Err(err) => {
                warnings.push(format!("theme.{name}: {err}; using default"));
                default
            }
        },
        None => default,
    }
}

fn resolve_unit_field(
    name: &str,
    value: Option<f32>,
    default: f32,
    warnings: &mut Vec<String>,
) -> f32 {
    match value {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        Some(v) => {
            warnings.push(format!("theme.{name}: {v} is outside 0..=1; using default"));
            default
        }
        None => default,
    }
}

fn resolve_size_field(
    name: &str,
    value: Option<f32>,
    default: f32,
    warnings: &mut Vec<String>,
) -> f32 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) => {
            warnings.push(format!("theme.{name}: {v} is not a valid size; using default"));
            default
        }
        None => default,
    }
}

pub fn parse_color(value: &str) -> Result<Color32> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("transparent") {
        return Ok(Color32::TRANSPARENT);
    }
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if let Some(rest) = v.strip_prefix("rgba(") {
        let (r, g, b, a) = parse_rgba_components(rest.trim_end_matches(')'))?;
        return Ok(Color32::from_rgba_unmultiplied(r, g, b, a));
    }
    if let Some(rest) = v.strip_prefix("rgb(") {
        let (r, g, b) = parse_rgb_components(rest.trim_end_matches(')'))?;
        return Ok(Color32::from_rgb(r, g, b));
    }
    Err(anyhow!("Unsupported color format: {v}"))
}

fn parse_hex_color(hex: &str) -> Result<Color32> {
    let value = hex.trim();
    if !matches!(value.len(), 6 | 8) {
        return Err(anyhow!("Invalid hex color: #{value}"));
    }
    let bytes =
        u32::from_str_radix(value, 16).map_err(|_| anyhow!("Invalid hex color: #{value}"))?;

    Ok(if value.len() == 6 {
        Color32::from_rgb((bytes >> 16) as u8, (bytes >> 8) as u8, bytes as u8)
    } else {
        Color32::from_rgba_unmultiplied(
            (bytes >> 24) as u8,
            (bytes >> 16) as u8,
            (bytes >> 8) as u8,
            bytes as u8,
        )
    })
}

fn parse_rgba_components(input: &str) -> Result<(u8, u8, u8, u8)> {
    let parts: Vec<_> = input.split(',').map(|p| p.trim()).collect();
    if parts.len() != 4 {
        return Err(anyhow!("rgba expects 4 components"));
    }
    let (r, g, b) = parse_rgb_components(&parts[0..3].join(","))?;
    let a = parse_alpha(parts[3])?;
    Ok((r, g, b, a))
}

fn parse_rgb_components(input: &str) -> Result<(u8, u8, u8)> {
    let parts: Vec<_> = input.split(',').map(|p| p.trim()).collect();
    if parts.len() != 3 {
        return Err(anyhow!("rgb expects 3 components"));
    }
    Ok((
        parse_channel(parts[0])?,
        parse_channel(parts[1])?,
        parse_channel(parts[2])?,
    ))
}

fn parse_channel(src: &str) -> Result<u8> {
    let value: f32 = src
        .parse()
        .map_err(|_| anyhow!("Invalid color channel: {src}"))?;
    if !(0.0..=255.0).contains(&value) {
        return Err(anyhow!("Color channel out of range: {src}"));
    }
    Ok(value.round() as u8)
}

fn parse_alpha(src: &str) -> Result<u8> {
    if src.contains('.') {
        let value: f32 = src.parse().map_err(|_| anyhow!("Invalid alpha: {src}"))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(anyhow!("Alpha out of range: {src}"));
        }
        Ok((value * 255.0).round() as u8)
    } else {
        parse_channel(src)
    }
}
