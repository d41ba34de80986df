use serde::{Deserialize, Serialize};

/// Ratio used when a thumbnail's dimensions cannot be resolved.
pub const FALLBACK_RATIO: f32 = 16.0 / 9.0;

/// One image as listed by the remote backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    #[serde(default)]
    pub name: String,
}

impl ImageDescriptor {
    pub fn new(
        url: impl Into<String>,
        thumbnail_url: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            thumbnail_url: thumbnail_url.into(),
            name: name.into(),
        }
    }
}

/// An image in the gallery list. `url` is the identity key.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub url: String,
    pub thumbnail_url: String,
    pub name: String,
    /// Width / height of the decoded thumbnail, once probed.
    pub ratio: Option<f32>,
}

impl ImageRecord {
    pub fn from_descriptor(desc: ImageDescriptor) -> Self {
        Self {
            url: desc.url,
            thumbnail_url: desc.thumbnail_url,
            name: desc.name,
            ratio: None,
        }
    }

    pub fn has_ratio(&self) -> bool {
        self.ratio.is_some()
    }

    /// Aspect ratio used for layout. Degenerate values are clamped so a row
    /// can always be scaled.
    pub fn aspect_ratio(&self) -> f32 {
        match self.ratio {
            Some(r) if r.is_finite() && r > 0.0 => r.max(0.01),
            _ => FALLBACK_RATIO,
        }
    }
}

/// Computes width / height from pixel dimensions.
pub fn ratio_from_dimensions(width: u32, height: u32) -> Option<f32> {
    if width == 0 || height == 0 {
        None
    } else {
        Some(width as f32 / height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_wire_format() {
        let json = r#"[{"url":"https://x/a.jpg","thumbnailUrl":"https://x/a_t.jpg","name":"a.jpg"}]"#;
        let parsed: Vec<ImageDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].thumbnail_url, "https://x/a_t.jpg");
        assert_eq!(parsed[0].name, "a.jpg");
    }

    #[test]
    fn test_missing_name_defaults_to_empty() {
        let json = r#"{"url":"u","thumbnailUrl":"t"}"#;
        let parsed: ImageDescriptor = serde_json::from_str(json).unwrap();
        assert!(parsed.name.is_empty());
    }

    #[test]
    fn test_aspect_ratio_fallbacks() {
        let mut record = ImageRecord::from_descriptor(ImageDescriptor::new("u", "t", "n"));
        assert!(!record.has_ratio());
        assert!((record.aspect_ratio() - FALLBACK_RATIO).abs() < f32::EPSILON);

        record.ratio = Some(f32::NAN);
        assert!((record.aspect_ratio() - FALLBACK_RATIO).abs() < f32::EPSILON);

        record.ratio = Some(1.5);
        assert!((record.aspect_ratio() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ratio_from_dimensions() {
        assert_eq!(ratio_from_dimensions(400, 200), Some(2.0));
        assert_eq!(ratio_from_dimensions(0, 200), None);
        assert_eq!(ratio_from_dimensions(200, 0), None);
    }
}
