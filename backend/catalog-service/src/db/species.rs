/// Species database operations: transactional writes for ingestion and the
/// filtered read side.
use crate::error::Result;
use crate::models::{DecodedFlags, SpeciesRow, SpeciesSummary};
use bitflag_codec::fields::{field_vocabulary, DISTRIBUTION_STATUS};
use bitflag_codec::{BitFilter, BitSet, BitSetData};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

/// Column values for a new species row. Bitmask fields arrive already
/// encoded; `None` stores NULL, never 0.
#[derive(Debug, Default)]
pub struct NewSpecies {
    pub slug: String,
    pub latin_name: String,
    pub image_url: Option<String>,
    pub genus_description: String,
    pub duration: Option<String>,
    pub edible: Option<bool>,
    pub edible_part: Option<i64>,
    pub rating: i64,
    pub height_cm_id: Option<Uuid>,
    pub years_to_max_height_id: Option<Uuid>,
    pub spread_cm_id: Option<Uuid>,
    pub soil_type: Option<i64>,
    pub soil_moisture: Option<i64>,
    pub soil_ph: Option<i64>,
    pub position_sunlight: Option<i64>,
    pub position_side: Option<i64>,
    pub exposure: Option<String>,
    pub hardiness_zone: String,
    pub fragrance: Option<i64>,
    pub cultivation: String,
    pub harvest: Option<i64>,
    pub planting: Option<i64>,
    pub toxicity: Option<i64>,
    pub foliage: Option<i64>,
    pub habit: Option<i64>,
    pub scientific_classification_id: Option<Uuid>,
    pub misc: Option<serde_json::Value>,
}

/// Insert the species row. A conflict on slug or latin name returns no id,
/// which callers treat as "already ingested" and roll back.
pub async fn insert_species(
    tx: &mut Transaction<'_, Postgres>,
    species: &NewSpecies,
) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO species (
            slug, latin_name, image_url, genus_description, duration, edible,
            edible_part, rating, height_cm_id, years_to_max_height_id,
            spread_cm_id, soil_type, soil_moisture, soil_ph,
            position_sunlight, position_side, exposure, hardiness_zone,
            fragrance, cultivation, harvest, planting, toxicity, foliage,
            habit, scientific_classification_id, misc
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27
        )
        ON CONFLICT DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&species.slug)
    .bind(&species.latin_name)
    .bind(&species.image_url)
    .bind(&species.genus_description)
    .bind(&species.duration)
    .bind(species.edible)
    .bind(species.edible_part)
    .bind(species.rating)
    .bind(species.height_cm_id)
    .bind(species.years_to_max_height_id)
    .bind(species.spread_cm_id)
    .bind(species.soil_type)
    .bind(species.soil_moisture)
    .bind(species.soil_ph)
    .bind(species.position_sunlight)
    .bind(species.position_side)
    .bind(&species.exposure)
    .bind(&species.hardiness_zone)
    .bind(species.fragrance)
    .bind(&species.cultivation)
    .bind(species.harvest)
    .bind(species.planting)
    .bind(species.toxicity)
    .bind(species.foliage)
    .bind(species.habit)
    .bind(species.scientific_classification_id)
    .bind(&species.misc)
    .fetch_optional(tx.as_mut())
    .await?;

    Ok(id)
}

pub async fn insert_interval(
    tx: &mut Transaction<'_, Postgres>,
    from_value: Option<i64>,
    to_value: Option<i64>,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO interval_values (from_value, to_value) VALUES ($1, $2) RETURNING id",
    )
    .bind(from_value)
    .bind(to_value)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_classification(
    tx: &mut Transaction<'_, Postgres>,
    family: &str,
    phylum: &str,
    classify: &str,
    genus: &str,
    species: &str,
    orders: &[String],
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO scientific_classifications (family, phylum, classify, genus, species)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(family)
    .bind(phylum)
    .bind(classify)
    .bind(genus)
    .bind(species)
    .fetch_one(tx.as_mut())
    .await?;

    for order in orders {
        sqlx::query(
            "INSERT INTO classification_orders (scientific_classification_id, name) VALUES ($1, $2)",
        )
        .bind(id)
        .bind(order)
        .execute(tx.as_mut())
        .await?;
    }

    Ok(id)
}

/// Common names are globally unique by name; a name already claimed by
/// another species is left untouched.
pub async fn insert_common_name_if_absent(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    name: &str,
    lang: &str,
    is_main: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO common_names (species_id, name, lang, is_main)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(species_id)
    .bind(name)
    .bind(lang)
    .bind(is_main)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

pub async fn insert_synonym_if_absent(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    name: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO synonyms (species_id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
    )
    .bind(species_id)
    .bind(name)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

async fn get_or_create_by_name(
    tx: &mut Transaction<'_, Postgres>,
    sql: &str,
    name: &str,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(sql)
        .bind(name)
        .fetch_one(tx.as_mut())
        .await?;

    Ok(id)
}

pub async fn get_or_create_tag(tx: &mut Transaction<'_, Postgres>, name: &str) -> Result<Uuid> {
    // DO UPDATE so the statement always returns the id, new row or not.
    get_or_create_by_name(
        tx,
        r#"
        INSERT INTO tags (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
        name,
    )
    .await
}

pub async fn attach_tag(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    tag_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO species_tags (species_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
        .bind(species_id)
        .bind(tag_id)
        .execute(tx.as_mut())
        .await?;

    Ok(())
}

pub async fn get_or_create_pathogen(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    pathogen_type: &str,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO pathogens (name, pathogen_type) VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(pathogen_type)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(id)
}

pub async fn attach_pathogen(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    pathogen_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO species_pathogens (species_id, pathogen_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
        .bind(species_id)
        .bind(pathogen_id)
        .execute(tx.as_mut())
        .await?;

    Ok(())
}

pub async fn get_or_create_growth_tip(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    tip_type: &str,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO growth_tips (name, tip_type) VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(tip_type)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(id)
}

pub async fn attach_growth_tip(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    growth_tip_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO species_growth_tips (species_id, growth_tip_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
        .bind(species_id)
        .bind(growth_tip_id)
        .execute(tx.as_mut())
        .await?;

    Ok(())
}

pub async fn get_or_create_distribution(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    tdwg_code: &str,
    tdwg_level: i64,
    species_count: i64,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO distributions (name, tdwg_code, tdwg_level, species_count)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name, tdwg_code) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(tdwg_code)
    .bind(tdwg_level)
    .bind(species_count)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(id)
}

pub async fn insert_distribution_species(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    distribution_id: Uuid,
    statuses: Option<i64>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO distribution_species (species_id, distribution_id, statuses) VALUES ($1, $2, $3)",
    )
    .bind(species_id)
    .bind(distribution_id)
    .bind(statuses)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

pub async fn insert_image(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    image_url: &str,
    image_copyright: &str,
    part: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO images (species_id, image_url, image_copyright, part) VALUES ($1, $2, $3, $4)",
    )
    .bind(species_id)
    .bind(image_url)
    .bind(image_copyright)
    .bind(part)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_source(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    sid: &str,
    name: &str,
    source_url: Option<&str>,
    citation: &str,
    last_update: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sources (species_id, sid, name, source_url, citation, last_update)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(species_id)
    .bind(sid)
    .bind(name)
    .bind(source_url)
    .bind(citation)
    .bind(last_update)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

/// Unique per (species, name); the water regimen is the only writer today.
pub async fn insert_regular_event(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    name: &str,
    frequency_id: Option<Uuid>,
    frequency_count: i64,
    frequency_unit: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO regular_events (species_id, name, frequency_id, frequency_count, frequency_unit)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(species_id)
    .bind(name)
    .bind(frequency_id)
    .bind(frequency_count)
    .bind(frequency_unit)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}

pub async fn insert_part_color(
    tx: &mut Transaction<'_, Postgres>,
    species_id: Uuid,
    plant_part: &str,
    season: &str,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO part_colors (species_id, plant_part, season) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(species_id)
    .bind(plant_part)
    .bind(season)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(id)
}

pub async fn get_or_create_color(tx: &mut Transaction<'_, Postgres>, name: &str) -> Result<Uuid> {
    get_or_create_by_name(
        tx,
        r#"
        INSERT INTO colors (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
        name,
    )
    .await
}

pub async fn attach_color(
    tx: &mut Transaction<'_, Postgres>,
    part_color_id: Uuid,
    color_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO part_color_colors (part_color_id, color_id) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
        .bind(part_color_id)
        .bind(color_id)
        .execute(tx.as_mut())
        .await?;

    Ok(())
}

/// Interval column a range bound applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalField {
    HeightCm,
    YearsToMaxHeight,
    SpreadCm,
}

impl IntervalField {
    fn fk_column(self) -> &'static str {
        match self {
            IntervalField::HeightCm => "height_cm_id",
            IntervalField::YearsToMaxHeight => "years_to_max_height_id",
            IntervalField::SpreadCm => "spread_cm_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEndpoint {
    FromValue,
    ToValue,
}

impl RangeEndpoint {
    fn column(self) -> &'static str {
        match self {
            RangeEndpoint::FromValue => "from_value",
            RangeEndpoint::ToValue => "to_value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gte,
    Lte,
}

impl RangeOp {
    fn sql(self) -> &'static str {
        match self {
            RangeOp::Gte => ">=",
            RangeOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RangeBound {
    pub field: IntervalField,
    pub endpoint: RangeEndpoint,
    pub op: RangeOp,
    pub value: i64,
}

/// Listing filters. All predicates are ANDed together.
#[derive(Debug, Default)]
pub struct SpeciesFilters {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub exposure: Vec<String>,
    pub duration: Vec<String>,
    flags: Vec<BitFilter>,
    ranges: Vec<RangeBound>,
}

impl SpeciesFilters {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add a conjunctive bit-flag constraint by internal values. Unknown
    /// field names and all-unknown value lists add no constraint.
    pub fn with_flags<S: AsRef<str>>(mut self, field: &str, values: &[S]) -> Self {
        if let Some(vocabulary) = field_vocabulary(field) {
            if let Some(filter) = vocabulary.filter(values) {
                self.flags.push(filter);
            }
        }
        self
    }

    pub fn with_range(
        mut self,
        field: IntervalField,
        endpoint: RangeEndpoint,
        op: RangeOp,
        value: i64,
    ) -> Self {
        self.ranges.push(RangeBound {
            field,
            endpoint,
            op,
            value,
        });
        self
    }

    pub fn flags(&self) -> &[BitFilter] {
        &self.flags
    }

    fn apply(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", search);
            builder.push(" AND (s.latin_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(
                " OR EXISTS (SELECT 1 FROM common_names cn \
                 WHERE cn.species_id = s.id AND cn.name ILIKE ",
            );
            builder.push_bind(pattern.clone());
            builder.push(
                ") OR EXISTS (SELECT 1 FROM synonyms sy \
                 WHERE sy.species_id = s.id AND sy.name ILIKE ",
            );
            builder.push_bind(pattern);
            builder.push("))");
        }

        if let Some(tag) = &self.tag {
            builder.push(
                " AND EXISTS (SELECT 1 FROM species_tags st \
                 JOIN tags t ON t.id = st.tag_id \
                 WHERE st.species_id = s.id AND t.name ILIKE ",
            );
            builder.push_bind(format!("%{}%", tag));
            builder.push(")");
        }

        if !self.exposure.is_empty() {
            builder.push(" AND s.exposure = ANY(");
            builder.push_bind(self.exposure.clone());
            builder.push(")");
        }

        if !self.duration.is_empty() {
            builder.push(" AND s.duration = ANY(");
            builder.push_bind(self.duration.clone());
            builder.push(")");
        }

        for filter in &self.flags {
            builder.push(format!(" AND (s.{} & ", filter.column));
            builder.push_bind(filter.mask);
            builder.push(") = ");
            builder.push_bind(filter.mask);
        }

        for bound in &self.ranges {
            builder.push(format!(
                " AND EXISTS (SELECT 1 FROM interval_values iv \
                 WHERE iv.id = s.{} AND iv.{} {} ",
                bound.field.fk_column(),
                bound.endpoint.column(),
                bound.op.sql()
            ));
            builder.push_bind(bound.value);
            builder.push(")");
        }
    }
}

/// Summary listing ordered by rating (best ranked first).
pub async fn list_species(
    pool: &PgPool,
    filters: &SpeciesFilters,
    limit: i64,
    offset: i64,
) -> Result<Vec<SpeciesSummary>> {
    let mut builder = QueryBuilder::new(
        "SELECT s.slug, s.latin_name, s.image_url, \
         (SELECT cn.name FROM common_names cn \
          WHERE cn.species_id = s.id AND cn.is_main AND cn.lang = 'en' \
          LIMIT 1) AS main_common_name \
         FROM species s WHERE TRUE",
    );
    filters.apply(&mut builder);
    builder.push(" ORDER BY s.rating LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows = builder
        .build_query_as::<SpeciesSummary>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn count_species(pool: &PgPool, filters: &SpeciesFilters) -> Result<i64> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM species s WHERE TRUE");
    filters.apply(&mut builder);

    let count = builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<SpeciesRow>> {
    let row = sqlx::query_as::<_, SpeciesRow>("SELECT * FROM species WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CommonNameRow {
    pub name: String,
    pub lang: String,
    pub is_main: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct IntervalValueRow {
    pub from_value: Option<i64>,
    pub to_value: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ClassificationRow {
    pub family: String,
    pub phylum: String,
    pub classify: String,
    pub genus: String,
    pub species: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationDetails {
    #[serde(flatten)]
    pub classification: ClassificationRow,
    pub order: Vec<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ImageRow {
    pub image_url: String,
    pub image_copyright: String,
    pub part: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SourceRow {
    pub sid: String,
    pub name: String,
    pub source_url: Option<String>,
    pub citation: String,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct RegularEventRow {
    pub name: String,
    pub frequency_from: Option<i64>,
    pub frequency_to: Option<i64>,
    pub frequency_count: i64,
    pub frequency_unit: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PathogenRow {
    pub name: String,
    pub pathogen_type: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DistributionRow {
    pub name: String,
    pub tdwg_code: String,
    pub tdwg_level: i64,
    pub species_count: i64,
    pub statuses: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionDetails {
    pub name: String,
    pub tdwg_code: String,
    pub tdwg_level: i64,
    pub species_count: i64,
    pub statuses: Vec<BitSetData>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct GrowthTipRow {
    pub name: String,
    pub tip_type: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartColorRow {
    pub id: Uuid,
    pub plant_part: String,
    pub season: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartColorDetails {
    pub plant_part: String,
    pub season: String,
    pub colors: Vec<String>,
}

/// Fully hydrated detail view with every bitmask decoded for serialization.
#[derive(Debug, Serialize)]
pub struct SpeciesDetails {
    pub slug: String,
    pub latin_name: String,
    pub image_url: Option<String>,
    pub genus_description: String,
    pub duration: Option<String>,
    pub edible: Option<bool>,
    pub rating: i64,
    pub exposure: Option<String>,
    pub hardiness_zone: String,
    pub cultivation: String,
    pub misc: Option<serde_json::Value>,
    pub flags: DecodedFlags,
    pub main_common_name: Option<String>,
    pub common_names: Vec<CommonNameRow>,
    pub synonyms: Vec<String>,
    pub tags: Vec<String>,
    pub height_cm: Option<IntervalValueRow>,
    pub years_to_max_height: Option<IntervalValueRow>,
    pub spread_cm: Option<IntervalValueRow>,
    pub scientific_classification: Option<ClassificationDetails>,
    pub images: Vec<ImageRow>,
    pub sources: Vec<SourceRow>,
    pub regular_events: Vec<RegularEventRow>,
    pub pathogens: Vec<PathogenRow>,
    pub distributions: Vec<DistributionDetails>,
    pub growth_tips: Vec<GrowthTipRow>,
    pub part_colors: Vec<PartColorDetails>,
}

async fn fetch_interval(pool: &PgPool, id: Option<Uuid>) -> Result<Option<IntervalValueRow>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let row = sqlx::query_as::<_, IntervalValueRow>(
        "SELECT from_value, to_value FROM interval_values WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

async fn fetch_classification(
    pool: &PgPool,
    id: Option<Uuid>,
) -> Result<Option<ClassificationDetails>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let Some(classification) = sqlx::query_as::<_, ClassificationRow>(
        "SELECT family, phylum, classify, genus, species \
         FROM scientific_classifications WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let order = sqlx::query_scalar::<_, String>(
        "SELECT name FROM classification_orders WHERE scientific_classification_id = $1",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(ClassificationDetails {
        classification,
        order,
    }))
}

/// Load the full detail view for one species, `None` when the slug is
/// unknown.
pub async fn load_details(pool: &PgPool, slug: &str) -> Result<Option<SpeciesDetails>> {
    let Some(row) = find_by_slug(pool, slug).await? else {
        return Ok(None);
    };

    let main_common_name = sqlx::query_scalar::<_, String>(
        "SELECT name FROM common_names \
         WHERE species_id = $1 AND is_main AND lang = 'en' LIMIT 1",
    )
    .bind(row.id)
    .fetch_optional(pool)
    .await?;

    let common_names = sqlx::query_as::<_, CommonNameRow>(
        "SELECT name, lang, is_main FROM common_names WHERE species_id = $1 ORDER BY name",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let synonyms = sqlx::query_scalar::<_, String>(
        "SELECT name FROM synonyms WHERE species_id = $1 ORDER BY name",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let tags = sqlx::query_scalar::<_, String>(
        "SELECT t.name FROM tags t \
         JOIN species_tags st ON st.tag_id = t.id \
         WHERE st.species_id = $1 ORDER BY t.name",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let images = sqlx::query_as::<_, ImageRow>(
        "SELECT image_url, image_copyright, part FROM images WHERE species_id = $1",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let sources = sqlx::query_as::<_, SourceRow>(
        "SELECT sid, name, source_url, citation, last_update \
         FROM sources WHERE species_id = $1",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let regular_events = sqlx::query_as::<_, RegularEventRow>(
        "SELECT re.name, iv.from_value AS frequency_from, iv.to_value AS frequency_to, \
         re.frequency_count, re.frequency_unit \
         FROM regular_events re \
         LEFT JOIN interval_values iv ON iv.id = re.frequency_id \
         WHERE re.species_id = $1",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let pathogens = sqlx::query_as::<_, PathogenRow>(
        "SELECT p.name, p.pathogen_type FROM pathogens p \
         JOIN species_pathogens sp ON sp.pathogen_id = p.id \
         WHERE sp.species_id = $1 ORDER BY p.name",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let distributions = sqlx::query_as::<_, DistributionRow>(
        "SELECT d.name, d.tdwg_code, d.tdwg_level, d.species_count, ds.statuses \
         FROM distributions d \
         JOIN distribution_species ds ON ds.distribution_id = d.id \
         WHERE ds.species_id = $1 ORDER BY d.name",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|d| DistributionDetails {
        statuses: BitSet::from_bits(&DISTRIBUTION_STATUS, d.statuses).get_set_data(),
        name: d.name,
        tdwg_code: d.tdwg_code,
        tdwg_level: d.tdwg_level,
        species_count: d.species_count,
    })
    .collect();

    let growth_tips = sqlx::query_as::<_, GrowthTipRow>(
        "SELECT g.name, g.tip_type FROM growth_tips g \
         JOIN species_growth_tips sg ON sg.growth_tip_id = g.id \
         WHERE sg.species_id = $1 ORDER BY g.name",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let part_color_rows = sqlx::query_as::<_, PartColorRow>(
        "SELECT id, plant_part, season FROM part_colors WHERE species_id = $1",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let mut part_colors = Vec::with_capacity(part_color_rows.len());
    for pc in part_color_rows {
        let colors = sqlx::query_scalar::<_, String>(
            "SELECT c.name FROM colors c \
             JOIN part_color_colors pcc ON pcc.color_id = c.id \
             WHERE pcc.part_color_id = $1 ORDER BY c.name",
        )
        .bind(pc.id)
        .fetch_all(pool)
        .await?;
        part_colors.push(PartColorDetails {
            plant_part: pc.plant_part,
            season: pc.season,
            colors,
        });
    }

    let [height_cm, years_to_max_height, spread_cm] = [
        fetch_interval(pool, row.height_cm_id).await?,
        fetch_interval(pool, row.years_to_max_height_id).await?,
        fetch_interval(pool, row.spread_cm_id).await?,
    ];

    let scientific_classification =
        fetch_classification(pool, row.scientific_classification_id).await?;

    Ok(Some(SpeciesDetails {
        flags: row.decoded(),
        slug: row.slug,
        latin_name: row.latin_name,
        image_url: row.image_url,
        genus_description: row.genus_description,
        duration: row.duration,
        edible: row.edible,
        rating: row.rating,
        exposure: row.exposure,
        hardiness_zone: row.hardiness_zone,
        cultivation: row.cultivation,
        misc: row.misc,
        main_common_name,
        common_names,
        synonyms,
        tags,
        height_cm,
        years_to_max_height,
        spread_cm,
        scientific_classification,
        images,
        sources,
        regular_events,
        pathogens,
        distributions,
        growth_tips,
        part_colors,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_fields_add_no_constraint() {
        let filters = SpeciesFilters::default()
            .with_flags("soil_type", &["clay"])
            .with_flags("no_such_field", &["clay"])
            .with_flags("habit", &["unknown_value"]);
        assert_eq!(filters.flags().len(), 1);
        assert_eq!(filters.flags()[0].column, "soil_type");
    }

    #[test]
    fn range_bounds_render_their_columns() {
        let bound = RangeBound {
            field: IntervalField::SpreadCm,
            endpoint: RangeEndpoint::ToValue,
            op: RangeOp::Lte,
            value: 100,
        };
        assert_eq!(bound.field.fk_column(), "spread_cm_id");
        assert_eq!(bound.endpoint.column(), "to_value");
        assert_eq!(bound.op.sql(), "<=");
    }
}
