use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub presign_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8890".into())
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/facet".into()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-image".into()),
            s3_bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "facet-images".into()),
            s3_region: std::env::var("S3_REGION").unwrap_or_else(|_| "auto".into()),
            s3_endpoint: std::env::var("S3_ENDPOINT").ok(),
            s3_access_key: std::env::var("S3_ACCESS_KEY_ID").unwrap_or_default(),
            s3_secret_key: std::env::var("S3_SECRET_ACCESS_KEY").unwrap_or_default(),
            presign_ttl_secs: std::env::var("PRESIGN_TTL_SECS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .context("PRESIGN_TTL_SECS must be a number")?,
        })
    }
}
