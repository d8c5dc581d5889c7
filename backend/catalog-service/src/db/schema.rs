use tracing::info;

use crate::error::Result;
use sqlx::PgPool;

/// Ensure catalog tables exist.
///
/// Created lazily at startup so fresh developer machines and CI databases
/// work without a separate migration step. Every statement is idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    info!("Ensuring catalog tables exist");

    sqlx::raw_sql(CATALOG_SCHEMA).execute(pool).await?;

    Ok(())
}

const CATALOG_SCHEMA: &str = r#"
CREATE EXTENSION IF NOT EXISTS "pgcrypto";

CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS interval_values (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    from_value BIGINT,
    to_value BIGINT
);

CREATE TABLE IF NOT EXISTS scientific_classifications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    family TEXT NOT NULL DEFAULT '',
    phylum TEXT NOT NULL DEFAULT '',
    classify TEXT NOT NULL DEFAULT '',
    genus TEXT NOT NULL DEFAULT '',
    species TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS classification_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    scientific_classification_id UUID NOT NULL
        REFERENCES scientific_classifications(id) ON DELETE CASCADE,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS species (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    slug TEXT NOT NULL UNIQUE,
    latin_name TEXT NOT NULL UNIQUE,
    image_url TEXT,
    genus_description TEXT NOT NULL DEFAULT '',
    duration TEXT,
    edible BOOLEAN,
    edible_part BIGINT,
    rating BIGINT NOT NULL DEFAULT 999999,
    height_cm_id UUID REFERENCES interval_values(id),
    years_to_max_height_id UUID REFERENCES interval_values(id),
    spread_cm_id UUID REFERENCES interval_values(id),
    soil_type BIGINT,
    soil_moisture BIGINT,
    soil_ph BIGINT,
    position_sunlight BIGINT,
    position_side BIGINT,
    exposure TEXT,
    hardiness_zone TEXT NOT NULL DEFAULT '',
    fragrance BIGINT,
    cultivation TEXT NOT NULL DEFAULT '',
    harvest BIGINT,
    planting BIGINT,
    toxicity BIGINT,
    foliage BIGINT,
    habit BIGINT,
    scientific_classification_id UUID REFERENCES scientific_classifications(id),
    misc JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    modified_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_species_rating ON species(rating);

CREATE TABLE IF NOT EXISTS common_names (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    name TEXT NOT NULL UNIQUE,
    lang TEXT NOT NULL,
    is_main BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE INDEX IF NOT EXISTS idx_common_names_species ON common_names(species_id);

CREATE TABLE IF NOT EXISTS synonyms (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    name TEXT NOT NULL UNIQUE
);

CREATE INDEX IF NOT EXISTS idx_synonyms_species ON synonyms(species_id);

CREATE TABLE IF NOT EXISTS tags (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS species_tags (
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (species_id, tag_id)
);

CREATE TABLE IF NOT EXISTS images (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    image_url TEXT NOT NULL,
    image_copyright TEXT NOT NULL DEFAULT '',
    part TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sources (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    sid TEXT NOT NULL,
    name TEXT NOT NULL,
    source_url TEXT,
    citation TEXT NOT NULL DEFAULT '',
    last_update TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS regular_events (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    frequency_id UUID REFERENCES interval_values(id),
    frequency_count BIGINT NOT NULL,
    frequency_unit TEXT NOT NULL,
    UNIQUE (species_id, name)
);

CREATE TABLE IF NOT EXISTS pathogens (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL UNIQUE,
    pathogen_type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS species_pathogens (
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    pathogen_id UUID NOT NULL REFERENCES pathogens(id) ON DELETE CASCADE,
    PRIMARY KEY (species_id, pathogen_id)
);

CREATE TABLE IF NOT EXISTS distributions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL,
    tdwg_code TEXT NOT NULL,
    tdwg_level BIGINT NOT NULL,
    species_count BIGINT NOT NULL,
    UNIQUE (name, tdwg_code)
);

CREATE TABLE IF NOT EXISTS distribution_species (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    distribution_id UUID NOT NULL REFERENCES distributions(id) ON DELETE CASCADE,
    statuses BIGINT
);

CREATE INDEX IF NOT EXISTS idx_distribution_species_species
    ON distribution_species(species_id);

CREATE TABLE IF NOT EXISTS growth_tips (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL UNIQUE,
    tip_type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS species_growth_tips (
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    growth_tip_id UUID NOT NULL REFERENCES growth_tips(id) ON DELETE CASCADE,
    PRIMARY KEY (species_id, growth_tip_id)
);

CREATE TABLE IF NOT EXISTS part_colors (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    species_id UUID NOT NULL REFERENCES species(id) ON DELETE CASCADE,
    plant_part TEXT NOT NULL,
    season TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS colors (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS part_color_colors (
    part_color_id UUID NOT NULL REFERENCES part_colors(id) ON DELETE CASCADE,
    color_id UUID NOT NULL REFERENCES colors(id) ON DELETE CASCADE,
    PRIMARY KEY (part_color_id, color_id)
);
"#;
