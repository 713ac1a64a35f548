//! Confidence tiering shared by every place a confidence value is shown.

use ratatui::style::Color;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Classify a backend confidence. Lower bounds are inclusive; values
    /// outside [0, 1] (or NaN) fall into `Low`.
    pub fn from_confidence(confidence: f64) -> Self {
        if !is_in_range(confidence) {
            return Self::Low;
        }
        match confidence {
            c if c >= 0.8 => Self::High,
            c if c >= 0.6 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::High => Color::Green,
            Self::Medium => Color::Yellow,
            Self::Low => Color::Red,
        }
    }

    pub fn badge_text(&self) -> String {
        format!("{} Confidence", self)
    }
}

fn is_in_range(confidence: f64) -> bool {
    (0.0..=1.0).contains(&confidence)
}

/// "92.0%" style label; out-of-range values render as "--%".
pub fn format_percent(confidence: f64) -> String {
    match is_in_range(confidence) {
        true => format!("{:.1}%", confidence * 100.0),
        false => "--%".to_string(),
    }
}
