use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output format a project's images are rendered in. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "png" => Some(ImageFormat::Png),
            "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }
}

/// Aspect ratio a project's images are rendered at. Stored as the ratio text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1:1" => Some(AspectRatio::Square),
            "3:4" => Some(AspectRatio::Portrait),
            "4:3" => Some(AspectRatio::Landscape),
            "16:9" => Some(AspectRatio::Wide),
            "9:16" => Some(AspectRatio::Tall),
            _ => None,
        }
    }
}

/// Camera angle of a derived image. Base images carry no view type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViewType {
    Front,
    Side,
    Top,
    Bottom,
}

impl ViewType {
    /// Generation order of one view set.
    pub const ALL: [ViewType; 4] = [
        ViewType::Front,
        ViewType::Side,
        ViewType::Top,
        ViewType::Bottom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewType::Front => "FRONT",
            ViewType::Side => "SIDE",
            ViewType::Top => "TOP",
            ViewType::Bottom => "BOTTOM",
        }
    }

    /// Lowercase name used inside prompts.
    pub fn label(self) -> &'static str {
        match self {
            ViewType::Front => "front",
            ViewType::Side => "side",
            ViewType::Top => "top",
            ViewType::Bottom => "bottom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FRONT" => Some(ViewType::Front),
            "SIDE" => Some(ViewType::Side),
            "TOP" => Some(ViewType::Top),
            "BOTTOM" => Some(ViewType::Bottom),
            _ => None,
        }
    }
}

impl std::fmt::Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-color annotation attached to a reference image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorDescription {
    pub color: String,
    pub description: String,
}

// --- Projects ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub image_format: Option<ImageFormat>,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub image_format: ImageFormat,
    pub aspect_ratio: AspectRatio,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub images_generated: i64,
    pub total_cost_usd: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub image_count: i64,
    pub reference_image_count: i64,
    pub message_count: i64,
    /// Token-equivalent of all usage, for display only.
    pub display_tokens: i64,
}

// --- Reference images ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImageResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub color_descriptions: Option<Vec<ColorDescription>>,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReferenceImageRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color_descriptions: Option<Vec<ColorDescription>>,
}

// --- Generated images & messages ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageResponse {
    pub id: Uuid,
    pub view_type: Option<ViewType>,
    pub view_set_id: Option<Uuid>,
    pub prompt: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// --- Generation ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    pub project_id: Uuid,
    pub prompt: String,
    #[serde(default)]
    pub reference_image_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub id: Uuid,
    pub image_url: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateViewsRequest {
    pub project_id: Uuid,
    #[serde(default)]
    pub base_image_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub id: Uuid,
    pub view_type: ViewType,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateViewsResponse {
    pub views: Vec<ViewResponse>,
    pub view_set_id: Uuid,
}

// --- Health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub total_cost_usd: f64,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_types_round_trip_through_db_text() {
        for view in ViewType::ALL {
            assert_eq!(ViewType::parse(view.as_str()), Some(view));
        }
        assert_eq!(ViewType::parse("front"), None);
        assert_eq!(ViewType::parse(""), None);
    }

    #[test]
    fn formats_and_ratios_round_trip_through_db_text() {
        for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Webp] {
            assert_eq!(ImageFormat::parse(format.as_str()), Some(format));
        }
        for ratio in [
            AspectRatio::Square,
            AspectRatio::Portrait,
            AspectRatio::Landscape,
            AspectRatio::Wide,
            AspectRatio::Tall,
        ] {
            assert_eq!(AspectRatio::parse(ratio.as_str()), Some(ratio));
        }
    }

    #[test]
    fn view_type_serializes_uppercase() {
        let json = serde_json::to_string(&ViewType::Front).unwrap();
        assert_eq!(json, "\"FRONT\"");
    }
}
