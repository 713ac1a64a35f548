use serde::Deserialize;
use std::fmt;

/// An image picked by the user, held in memory for one analysis cycle.
#[derive(Clone, PartialEq)]
pub struct SelectedImage {
    pub filename: String,
    pub size: u64,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl SelectedImage {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        Self {
            mime_type: crate::internal::upload::guess_mime_type(&filename),
            size: data.len() as u64,
            filename,
            data,
        }
    }

    /// Size in megabytes with two decimals, e.g. "2.00 MB".
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }
}

// Keep multi-megabyte payloads out of logs and test failure output.
impl fmt::Debug for SelectedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedImage")
            .field("filename", &self.filename)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /api/v1/identify` as it arrives on the wire.
///
/// Every field is optional here so that a missing required field becomes a
/// validation error instead of an opaque decode failure. Optional fields take
/// either camelCase or snake_case, but only one spelling per field.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawAnalysisResult {
    pub landmark: Option<String>,
    pub confidence: Option<f64>,
    pub summary: Option<String>,
    #[serde(rename = "yearBuilt", alias = "year_built")]
    pub year_built: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "imageUrl", alias = "image_url")]
    pub image_url: Option<String>,
    #[serde(rename = "audioUrl", alias = "audio_url")]
    pub audio_url: Option<String>,
    #[serde(rename = "referenceUrl", alias = "reference_url")]
    pub reference_url: Option<String>,
}

/// A validated identification result.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub landmark: String,
    pub confidence: f64,
    pub summary: String,
    pub year_built: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub reference_url: Option<String>,
}

impl TryFrom<RawAnalysisResult> for AnalysisResult {
    type Error = String;

    fn try_from(raw: RawAnalysisResult) -> Result<Self, Self::Error> {
        let landmark = raw.landmark.ok_or("missing field `landmark`")?;
        let confidence = raw.confidence.ok_or("missing field `confidence`")?;
        let summary = raw.summary.ok_or("missing field `summary`")?;

        Ok(Self {
            landmark,
            confidence,
            summary,
            year_built: non_empty(raw.year_built),
            location: non_empty(raw.location),
            image_url: non_empty(raw.image_url),
            audio_url: non_empty(raw.audio_url),
            reference_url: non_empty(raw.reference_url),
        })
    }
}

/// Optional display fields are rendered only when present; treat "" as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A curated landmark shown on the Explore page.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MonumentSummary {
    pub id: String,
    pub title: String,
    pub image: String,
    pub short_text: String,
    #[serde(default)]
    pub audio_preview_url: Option<String>,
    #[serde(default)]
    pub year_built: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reference_url: Option<String>,
}

/// A past analysis cycle shown on the History page.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub filename: String,
    pub landmark: String,
    pub confidence: f64,
    pub timestamp: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_result() {
        let json = r#"{
            "landmark": "Eiffel Tower",
            "confidence": 0.92,
            "summary": "Wrought-iron lattice tower.",
            "yearBuilt": "1889",
            "location": "Paris, France",
            "audioUrl": "/static/audio/eiffel.mp3"
        }"#;
        let raw: RawAnalysisResult = serde_json::from_str(json).unwrap();
        let result = AnalysisResult::try_from(raw).unwrap();

        assert_eq!(result.landmark, "Eiffel Tower");
        assert_eq!(result.year_built.as_deref(), Some("1889"));
        assert_eq!(result.audio_url.as_deref(), Some("/static/audio/eiffel.mp3"));
        assert_eq!(result.image_url, None);
    }

    #[test]
    fn accepts_snake_case_aliases() {
        let json = r#"{
            "landmark": "Colosseum",
            "confidence": 0.7,
            "summary": "",
            "year_built": "80 AD",
            "reference_url": "https://en.wikipedia.org/wiki/Colosseum"
        }"#;
        let raw: RawAnalysisResult = serde_json::from_str(json).unwrap();
        let result = AnalysisResult::try_from(raw).unwrap();

        assert_eq!(result.summary, "");
        assert_eq!(result.year_built.as_deref(), Some("80 AD"));
        assert!(result.reference_url.is_some());
    }

    #[test]
    fn both_spellings_of_one_field_are_rejected() {
        let json = r#"{"landmark": "Big Ben", "confidence": 0.9, "summary": "Clock.",
            "yearBuilt": "1859", "year_built": "1859"}"#;
        let err = serde_json::from_str::<RawAnalysisResult>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate field `yearBuilt`"));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let raw: RawAnalysisResult =
            serde_json::from_str(r#"{"landmark": "Taj Mahal", "summary": "x"}"#).unwrap();
        let err = AnalysisResult::try_from(raw).unwrap_err();
        assert!(err.contains("confidence"));
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let raw = RawAnalysisResult {
            landmark: Some("Petra".into()),
            confidence: Some(0.5),
            summary: Some("Rose city.".into()),
            location: Some("   ".into()),
            ..Default::default()
        };
        let result = AnalysisResult::try_from(raw).unwrap();
        assert_eq!(result.location, None);
    }

    #[test]
    fn selected_image_size_label() {
        let image = SelectedImage::new("photo.jpg", vec![0u8; 2 * 1024 * 1024]);
        assert_eq!(image.size_label(), "2.00 MB");
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn history_entry_without_image() {
        let json = r#"[{
            "id": "a1",
            "filename": "photo.jpg",
            "landmark": "Big Ben",
            "confidence": 0.81,
            "timestamp": "2024-05-01T10:30:00"
        }]"#;
        let entries: Vec<HistoryEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].image_url, None);
    }
}
