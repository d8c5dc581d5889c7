//! Species ingestion pipeline.
//!
//! One database transaction per record: a record either lands completely or
//! not at all, and a batch is just a sequence of independent transactions.
//! A species already in the catalog (same latin name or slug) rolls back and
//! reports [`IngestOutcome::Skipped`]; that is bookkeeping, not an error.

pub mod record;

use crate::db::species as db;
use crate::error::{CatalogError, Result};
use bitflag_codec::fields::{
    DISTRIBUTION_STATUS, DURATION, EXPOSURE, FOLIAGE, HABIT, PLANT_PARTS, POSITION_SIDE,
    POSITION_SUNLIGHT, SEASONS_MAX, SOIL_MOISTURE, SOIL_PH, SOIL_TYPE, TOXICITY,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use record::SpeciesRecord;
use sqlx::PgPool;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Created(Uuid),
    /// The species is already in the catalog; nothing was written.
    Skipped,
}

/// URL-safe identifier derived from the latin name: lowercase, every run of
/// non-alphanumeric characters collapsed to a single hyphen.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_hyphen = true;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Source timestamps arrive in several shapes; an unparseable one is logged
/// and stored as NULL rather than failing the record.
fn parse_last_update(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(parsed.and_hms_opt(0, 0, 0)?.and_utc());
    }
    tracing::warn!(last_update = raw, "Unparseable source timestamp");
    None
}

/// Ingest one species record inside its own transaction.
pub async fn ingest(pool: &PgPool, record: &SpeciesRecord) -> Result<IngestOutcome> {
    let mut tx = pool.begin().await?;

    // One-to-one rows first so the species row can reference them.
    let mut interval_ids = [None, None, None];
    for (index, interval) in [
        record.size.height_cm,
        record.size.years_to_max_height,
        record.size.spread_cm,
    ]
    .iter()
    .enumerate()
    {
        if let Some(interval) = interval {
            interval_ids[index] =
                Some(db::insert_interval(&mut tx, interval.from_value, interval.to_value).await?);
        }
    }
    let [height_cm_id, years_to_max_height_id, spread_cm_id] = interval_ids;

    let scientific_classification_id = match &record.scientific_classification {
        Some(sclass) if !sclass.is_empty() => Some(
            db::insert_classification(
                &mut tx,
                sclass.family.as_deref().unwrap_or_default(),
                sclass.phylum.as_deref().unwrap_or_default(),
                sclass.classify.as_deref().unwrap_or_default(),
                sclass.genus.as_deref().unwrap_or_default(),
                sclass.species.as_deref().unwrap_or_default(),
                &sclass.order,
            )
            .await?,
        ),
        _ => None,
    };

    let new_species = db::NewSpecies {
        slug: slugify(&record.latin_name),
        latin_name: record.latin_name.clone(),
        image_url: record.image_url.clone(),
        genus_description: record.genus_description.clone().unwrap_or_default(),
        duration: record
            .duration
            .as_deref()
            .and_then(|label| DURATION.value_for_label(label))
            .map(str::to_string),
        edible: record.edible,
        edible_part: PLANT_PARTS.encode_labels(&record.edible_part),
        rating: record.rank,
        height_cm_id,
        years_to_max_height_id,
        spread_cm_id,
        soil_type: SOIL_TYPE.encode_labels(&record.soil.soil_type),
        soil_moisture: SOIL_MOISTURE.encode_labels(&record.soil.moisture),
        soil_ph: SOIL_PH.encode_labels(&record.soil.ph),
        position_sunlight: POSITION_SUNLIGHT.encode_labels(&record.position.sunlight),
        position_side: POSITION_SIDE.encode_labels(&record.position.side),
        exposure: record
            .position
            .exposure
            .as_deref()
            .and_then(|label| EXPOSURE.value_for_label(label))
            .map(str::to_string),
        hardiness_zone: record.position.hardiness_zone.clone().unwrap_or_default(),
        fragrance: PLANT_PARTS.encode_labels(record.colour_and_scent.fragrance()),
        cultivation: record.how_to_grow.cultivation().to_string(),
        harvest: SEASONS_MAX.encode_labels(&record.events.harvest),
        planting: SEASONS_MAX.encode_labels(&record.events.planting),
        toxicity: TOXICITY.encode_labels(&record.toxicity),
        foliage: FOLIAGE.encode_labels(&record.botanical_details.foliage),
        habit: HABIT.encode_labels(&record.botanical_details.habit),
        scientific_classification_id,
        misc: record.misc.clone(),
    };

    let Some(species_id) = db::insert_species(&mut tx, &new_species).await? else {
        tx.rollback().await?;
        tracing::info!(latin_name = %record.latin_name, "Species already ingested, skipping");
        return Ok(IngestOutcome::Skipped);
    };

    for (lang, name) in &record.main_common_name {
        db::insert_common_name_if_absent(&mut tx, species_id, name, lang, true).await?;
    }
    for (lang, names) in &record.common_names {
        for name in names {
            db::insert_common_name_if_absent(&mut tx, species_id, name, lang, false).await?;
        }
    }

    for synonym in &record.synonyms {
        db::insert_synonym_if_absent(&mut tx, species_id, synonym).await?;
    }

    for tag in &record.tags {
        let tag_id = db::get_or_create_tag(&mut tx, tag).await?;
        db::attach_tag(&mut tx, species_id, tag_id).await?;
    }

    for (part, images) in record.images.iter_known(&PLANT_PARTS) {
        for image in images {
            db::insert_image(&mut tx, species_id, &image.image_url, &image.copyright, part)
                .await?;
        }
    }

    for source in &record.sources {
        db::insert_source(
            &mut tx,
            species_id,
            &source.id,
            &source.name,
            source.url.as_deref(),
            source.citation.as_deref().unwrap_or_default(),
            parse_last_update(&source.last_update),
        )
        .await?;
    }

    if let Some(water) = &record.soil.water {
        let frequency_id = match water.frequency {
            Some(frequency) => Some(
                db::insert_interval(&mut tx, frequency.from_value, frequency.to_value).await?,
            ),
            None => None,
        };
        db::insert_regular_event(
            &mut tx,
            species_id,
            "water",
            frequency_id,
            water.frequency_count,
            &water.frequency_unit,
        )
        .await?;
    }

    for pathogen in &record.diseases_and_pests {
        let pathogen_id = db::get_or_create_pathogen(&mut tx, pathogen, "disease").await?;
        db::attach_pathogen(&mut tx, species_id, pathogen_id).await?;
    }

    for (status, places) in record.distributions.iter_known(&DISTRIBUTION_STATUS) {
        let statuses = DISTRIBUTION_STATUS.encode_values(&[status]);
        for place in places {
            let distribution_id = db::get_or_create_distribution(
                &mut tx,
                &place.name,
                &place.tdwg_code,
                place.tdwg_level,
                place.species_count,
            )
            .await?;
            db::insert_distribution_species(&mut tx, species_id, distribution_id, statuses)
                .await?;
        }
    }

    for (tip_type, tips) in record.how_to_grow.tips() {
        for tip in tips {
            let tip_id = db::get_or_create_growth_tip(&mut tx, tip, tip_type).await?;
            db::attach_growth_tip(&mut tx, species_id, tip_id).await?;
        }
    }

    for (season, colors_by_part) in record.colour_and_scent.seasons() {
        for (part, colors) in colors_by_part.parts() {
            if colors.is_empty() {
                continue;
            }
            let part_color_id = db::insert_part_color(&mut tx, species_id, part, season).await?;
            for color in colors {
                let color_id = db::get_or_create_color(&mut tx, color).await?;
                db::attach_color(&mut tx, part_color_id, color_id).await?;
            }
        }
    }

    tx.commit().await?;
    tracing::info!(latin_name = %record.latin_name, species_id = %species_id, "Species ingested");
    Ok(IngestOutcome::Created(species_id))
}

/// Outcome counters for a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub created: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Ingest every `*.json` record file under `dir`. Records are independent:
/// a bad file is counted and logged, never aborts the batch.
pub async fn load_directory(pool: &PgPool, dir: &Path) -> Result<IngestStats> {
    let mut stats = IngestStats::default();

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|err| CatalogError::Internal(format!("cannot read {}: {err}", dir.display())))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Unreadable record file");
                stats.failed += 1;
                continue;
            }
        };
        let record: SpeciesRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Malformed record file");
                stats.failed += 1;
                continue;
            }
        };
        match ingest(pool, &record).await {
            Ok(IngestOutcome::Created(_)) => stats.created += 1,
            Ok(IngestOutcome::Skipped) => stats.skipped += 1,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "Record ingestion failed");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("Acer campestre"), "acer-campestre");
        assert_eq!(slugify("Rosa 'Peace' (HT)"), "rosa-peace-ht");
        assert_eq!(slugify("  Büddleja  davidii  "), "büddleja-davidii");
    }

    #[test]
    fn slugify_trims_edge_hyphens() {
        assert_eq!(slugify("--x--"), "x");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn last_update_accepts_known_shapes() {
        assert!(parse_last_update("2023-04-01T10:30:00+00:00").is_some());
        assert!(parse_last_update("2023-04-01 10:30:00").is_some());
        assert!(parse_last_update("2023-04-01").is_some());
        assert!(parse_last_update("last spring").is_none());
    }
}
