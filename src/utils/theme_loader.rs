use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeFile {
    pub name: String,
    pub themes: Vec<ThemeVariant>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeVariant {
    pub mode: String, // "light" or "dark"
    pub colors: HashMap<String, String>,
}

/// Colors used by the views. Confidence tier colors are fixed and live in
/// `internal::confidence`, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct TuiTheme {
    pub background: Color,
    pub foreground: Color,
    pub accent: Color,
    pub muted: Color,
    pub border: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
}

impl Default for TuiTheme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Reset,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            border: Color::Gray,
            selection_bg: Color::Blue,
            selection_fg: Color::White,
        }
    }
}

impl ThemeVariant {
    fn color(&self, keys: &[&str], fallback: Color) -> Color {
        keys.iter()
            .find_map(|k| self.colors.get(*k))
            .map(|hex| parse_color(hex))
            .unwrap_or(fallback)
    }
}

#[tracing::instrument(skip(path, mode), fields(path = %path.display(), mode = %mode))]
pub fn load_theme(path: &Path, mode: &str) -> Result<TuiTheme> {
    let content = fs::read_to_string(path).context("Failed to read theme file")?;
    let theme_file: ThemeFile =
        serde_json::from_str(&content).context("Failed to parse theme JSON")?;

    let variant = theme_file
        .themes
        .iter()
        .find(|t| t.mode.eq_ignore_ascii_case(mode))
        .or_else(|| theme_file.themes.first())
        .context("No matching theme variant found")?;

    let defaults = TuiTheme::default();
    let theme = TuiTheme {
        background: variant.color(&["background"], defaults.background),
        foreground: variant.color(&["foreground"], defaults.foreground),
        accent: variant.color(&["accent", "base.cyan"], defaults.accent),
        muted: variant.color(&["muted.foreground"], defaults.muted),
        border: variant.color(&["border"], defaults.border),
        selection_bg: variant.color(
            &["selection.background", "list.active.background"],
            defaults.selection_bg,
        ),
        selection_fg: variant.color(
            &["selection.foreground", "foreground"],
            defaults.selection_fg,
        ),
    };

    tracing::info!(theme = %theme_file.name, mode = %variant.mode, "Loaded theme");
    Ok(theme)
}

/// Theme named by the config, or terminal defaults if none is set or it fails to load.
pub fn theme_from_config(config: &crate::config::AppConfig) -> TuiTheme {
    match config.theme_file.as_deref() {
        Some(path) => match load_theme(Path::new(path), &config.theme_mode) {
            Ok(theme) => theme,
            Err(e) => {
                tracing::error!("Failed to load theme '{}': {:#}", path, e);
                TuiTheme::default()
            }
        },
        None => TuiTheme::default(),
    }
}

fn parse_color(hex: &str) -> Color {
    if let Ok(c) = hex.parse::<Color>() {
        return c;
    }

    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    match hex.len() {
        // 8-char hex carries alpha, which the terminal can't use
        6 | 8 => Color::Rgb(channel(0..2), channel(2..4), channel(4..6)),
        _ => Color::Reset,
    }
}
