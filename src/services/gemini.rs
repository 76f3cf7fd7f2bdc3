use anyhow::Result;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Serialize)]
struct ImageConfig {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize, Debug)]
struct ResponseInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<i64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<i64>,
}

pub struct ImageResult {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Text part accompanying the image, when the model returns one.
    pub text: Option<String>,
    pub prompt_tokens: i64,
    pub output_tokens: i64,
}

/// Generate one image, optionally conditioned on an inline reference image.
pub async fn generate_image(
    api_key: &str,
    model: &str,
    prompt: &str,
    reference: Option<(&[u8], &str)>,
    aspect_ratio: &str,
) -> Result<ImageResult> {
    let mut parts: Vec<GeminiPart> = Vec::new();

    if let Some((bytes, mime_type)) = reference {
        parts.push(GeminiPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
        });
    }

    parts.push(GeminiPart::Text {
        text: prompt.into(),
    });

    let request = GeminiRequest {
        contents: vec![GeminiContent { parts }],
        generation_config: GenerationConfig {
            response_modalities: vec!["TEXT".into(), "IMAGE".into()],
            image_config: Some(ImageConfig {
                aspect_ratio: aspect_ratio.into(),
            }),
        },
    };

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        model, api_key
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;

    let resp = client.post(&url).json(&request).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Gemini API error {}: {}", status, body);
    }

    let data: GeminiResponse = resp.json().await?;

    let prompt_tokens = data
        .usage_metadata
        .as_ref()
        .and_then(|u| u.prompt_token_count)
        .unwrap_or(0);
    let output_tokens = data
        .usage_metadata
        .as_ref()
        .and_then(|u| u.candidates_token_count)
        .unwrap_or(0);

    let candidates = data.candidates.unwrap_or_default();
    let parts = candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.as_ref())
        .ok_or_else(|| anyhow::anyhow!("No candidates in Gemini response"))?;

    let text = parts.iter().find_map(|p| p.text.clone());

    // Find image part
    let image_part = parts
        .iter()
        .find(|p| {
            p.inline_data
                .as_ref()
                .is_some_and(|d| d.mime_type.starts_with("image/"))
        })
        .and_then(|p| p.inline_data.as_ref())
        .ok_or_else(|| anyhow::anyhow!("No image in Gemini response"))?;

    let bytes = base64::engine::general_purpose::STANDARD.decode(&image_part.data)?;

    Ok(ImageResult {
        bytes,
        mime_type: image_part.mime_type.clone(),
        text,
        prompt_tokens,
        output_tokens,
    })
}
