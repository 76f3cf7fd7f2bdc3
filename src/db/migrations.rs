use sqlx::PgPool;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        image_format TEXT NOT NULL DEFAULT 'png',
        aspect_ratio TEXT NOT NULL DEFAULT '1:1',
        input_tokens BIGINT NOT NULL DEFAULT 0,
        output_tokens BIGINT NOT NULL DEFAULT 0,
        images_generated BIGINT NOT NULL DEFAULT 0,
        total_cost_usd DOUBLE PRECISION NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );

    CREATE TABLE IF NOT EXISTS generated_images (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        storage_key TEXT NOT NULL,
        prompt TEXT NOT NULL,
        view_type TEXT,
        view_set_id UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT view_requires_set CHECK (view_type IS NULL OR view_set_id IS NOT NULL)
    );

    CREATE INDEX IF NOT EXISTS idx_generated_images_project
        ON generated_images (project_id, created_at);

    CREATE TABLE IF NOT EXISTS reference_images (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        storage_key TEXT NOT NULL,
        name TEXT,
        color_descriptions JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );

    CREATE TABLE IF NOT EXISTS messages (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );

    CREATE INDEX IF NOT EXISTS idx_messages_project
        ON messages (project_id, created_at);
";

pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
