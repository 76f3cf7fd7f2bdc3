use crate::models::{AspectRatio, ColorDescription, ImageFormat, ViewType};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

// --- Projects ---

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub name: String,
    pub image_format: String,
    pub aspect_ratio: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub images_generated: i64,
    pub total_cost_usd: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn image_format(&self) -> ImageFormat {
        ImageFormat::parse(&self.image_format).unwrap_or_default()
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::parse(&self.aspect_ratio).unwrap_or_default()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectWithCounts {
    #[sqlx(flatten)]
    pub project: ProjectRecord,
    pub image_count: i64,
    pub reference_image_count: i64,
    pub message_count: i64,
}

pub async fn insert_project(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    image_format: ImageFormat,
    aspect_ratio: AspectRatio,
) -> Result<ProjectRecord, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(
        "INSERT INTO projects (id, name, image_format, aspect_ratio) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(image_format.as_str())
    .bind(aspect_ratio.as_str())
    .fetch_one(pool)
    .await
}

pub async fn get_project(pool: &PgPool, id: Uuid) -> Result<Option<ProjectRecord>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_projects(pool: &PgPool) -> Result<Vec<ProjectWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, ProjectWithCounts>(
        "SELECT p.*,
            (SELECT COUNT(*) FROM generated_images gi WHERE gi.project_id = p.id) AS image_count,
            (SELECT COUNT(*) FROM reference_images ri WHERE ri.project_id = p.id) AS reference_image_count,
            (SELECT COUNT(*) FROM messages m WHERE m.project_id = p.id) AS message_count
         FROM projects p
         ORDER BY p.created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn delete_project(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// All object-store keys referenced by a project, for best-effort cleanup
/// before the row cascade removes the records.
pub async fn project_storage_keys(pool: &PgPool, id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT storage_key FROM generated_images WHERE project_id = $1
         UNION ALL
         SELECT storage_key FROM reference_images WHERE project_id = $1",
    )
    .bind(id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct UsageTotals {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub images_generated: i64,
}

/// Applies usage deltas as an atomic increment so concurrent generation runs
/// cannot lose each other's updates, and returns the post-increment totals.
pub async fn add_project_usage(
    pool: &PgPool,
    id: Uuid,
    input_tokens: i64,
    output_tokens: i64,
    images: i64,
) -> Result<UsageTotals, sqlx::Error> {
    sqlx::query_as::<_, UsageTotals>(
        "UPDATE projects
         SET input_tokens = input_tokens + $2,
             output_tokens = output_tokens + $3,
             images_generated = images_generated + $4,
             updated_at = now()
         WHERE id = $1
         RETURNING input_tokens, output_tokens, images_generated",
    )
    .bind(id)
    .bind(input_tokens)
    .bind(output_tokens)
    .bind(images)
    .fetch_one(pool)
    .await
}

pub async fn set_project_cost(pool: &PgPool, id: Uuid, cost_usd: f64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE projects SET total_cost_usd = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(cost_usd)
        .execute(pool)
        .await?;
    Ok(())
}

// --- Generated images ---

#[derive(Debug, sqlx::FromRow)]
pub struct GeneratedImageRecord {
    pub id: Uuid,
    pub storage_key: String,
    pub prompt: String,
    pub view_type: Option<String>,
    pub view_set_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImageRecord {
    pub fn view_type(&self) -> Option<ViewType> {
        self.view_type.as_deref().and_then(ViewType::parse)
    }
}

pub async fn insert_generated_image(
    pool: &PgPool,
    id: Uuid,
    project_id: Uuid,
    storage_key: &str,
    prompt: &str,
    view_type: Option<ViewType>,
    view_set_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO generated_images (id, project_id, storage_key, prompt, view_type, view_set_id)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(project_id)
    .bind(storage_key)
    .bind(prompt)
    .bind(view_type.map(ViewType::as_str))
    .bind(view_set_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_generated_image(
    pool: &PgPool,
    project_id: Uuid,
    id: Uuid,
) -> Result<Option<GeneratedImageRecord>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImageRecord>(
        "SELECT id, storage_key, prompt, view_type, view_set_id, created_at
         FROM generated_images WHERE project_id = $1 AND id = $2",
    )
    .bind(project_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Looks up an image only if it is a base image (no view tag) of the project.
pub async fn get_base_image(
    pool: &PgPool,
    project_id: Uuid,
    id: Uuid,
) -> Result<Option<GeneratedImageRecord>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImageRecord>(
        "SELECT id, storage_key, prompt, view_type, view_set_id, created_at
         FROM generated_images
         WHERE project_id = $1 AND id = $2 AND view_type IS NULL",
    )
    .bind(project_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn latest_base_image(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Option<GeneratedImageRecord>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImageRecord>(
        "SELECT id, storage_key, prompt, view_type, view_set_id, created_at
         FROM generated_images
         WHERE project_id = $1 AND view_type IS NULL
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_generated_images(
    pool: &PgPool,
    project_id: Uuid,
    base_only: bool,
) -> Result<Vec<GeneratedImageRecord>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImageRecord>(
        "SELECT id, storage_key, prompt, view_type, view_set_id, created_at
         FROM generated_images
         WHERE project_id = $1 AND ($2 = FALSE OR view_type IS NULL)
         ORDER BY created_at DESC",
    )
    .bind(project_id)
    .bind(base_only)
    .fetch_all(pool)
    .await
}

pub async fn delete_generated_image(
    pool: &PgPool,
    project_id: Uuid,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM generated_images WHERE project_id = $1 AND id = $2")
        .bind(project_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// --- Reference images ---

#[derive(Debug, sqlx::FromRow)]
pub struct ReferenceImageRecord {
    pub id: Uuid,
    pub storage_key: String,
    pub name: Option<String>,
    pub color_descriptions: Option<Json<Vec<ColorDescription>>>,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_reference_image(
    pool: &PgPool,
    id: Uuid,
    project_id: Uuid,
    storage_key: &str,
    name: Option<&str>,
    color_descriptions: Option<&[ColorDescription]>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reference_images (id, project_id, storage_key, name, color_descriptions)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(project_id)
    .bind(storage_key)
    .bind(name)
    .bind(color_descriptions.map(Json))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_reference_image(
    pool: &PgPool,
    project_id: Uuid,
    id: Uuid,
) -> Result<Option<ReferenceImageRecord>, sqlx::Error> {
    sqlx::query_as::<_, ReferenceImageRecord>(
        "SELECT id, storage_key, name, color_descriptions, created_at
         FROM reference_images WHERE project_id = $1 AND id = $2",
    )
    .bind(project_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_reference_images(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<ReferenceImageRecord>, sqlx::Error> {
    sqlx::query_as::<_, ReferenceImageRecord>(
        "SELECT id, storage_key, name, color_descriptions, created_at
         FROM reference_images WHERE project_id = $1
         ORDER BY created_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Partial update; absent fields keep their stored value.
pub async fn update_reference_image(
    pool: &PgPool,
    project_id: Uuid,
    id: Uuid,
    name: Option<&str>,
    color_descriptions: Option<&[ColorDescription]>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE reference_images
         SET name = COALESCE($3, name),
             color_descriptions = COALESCE($4, color_descriptions)
         WHERE project_id = $1 AND id = $2",
    )
    .bind(project_id)
    .bind(id)
    .bind(name)
    .bind(color_descriptions.map(Json))
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_reference_image(
    pool: &PgPool,
    project_id: Uuid,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reference_images WHERE project_id = $1 AND id = $2")
        .bind(project_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// --- Messages ---

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_message(
    pool: &PgPool,
    project_id: Uuid,
    role: &str,
    content: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO messages (id, project_id, role, content) VALUES ($1, $2, $3, $4)")
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(role)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_messages(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<MessageRecord>, sqlx::Error> {
    sqlx::query_as::<_, MessageRecord>(
        "SELECT id, role, content, created_at FROM messages
         WHERE project_id = $1 ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Most recent turns, returned oldest-first for prompt context.
pub async fn recent_messages(
    pool: &PgPool,
    project_id: Uuid,
    limit: i64,
) -> Result<Vec<MessageRecord>, sqlx::Error> {
    let mut rows = sqlx::query_as::<_, MessageRecord>(
        "SELECT id, role, content, created_at FROM messages
         WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(project_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.reverse();
    Ok(rows)
}

// --- Aggregates ---

pub async fn total_cost(pool: &PgPool) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>("SELECT COALESCE(SUM(total_cost_usd), 0) FROM projects")
        .fetch_one(pool)
        .await
}
