//! Species row types and bitmask decoding for serialization.

use bitflag_codec::fields::{
    FOLIAGE, HABIT, PLANT_PARTS, POSITION_SIDE, POSITION_SUNLIGHT, SEASONS_MAX, SOIL_MOISTURE,
    SOIL_PH, SOIL_TYPE, TOXICITY,
};
use bitflag_codec::{BitSet, BitSetData};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Full species row. Bitmask columns stay raw integers here; decoding to
/// label pairs happens only at serialization via [`SpeciesRow::decoded`].
#[derive(Debug, Clone, FromRow)]
pub struct SpeciesRow {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Listing projection ordered by rating.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SpeciesSummary {
    pub slug: String,
    pub latin_name: String,
    pub image_url: Option<String>,
    /// Main English common name, when one exists.
    pub main_common_name: Option<String>,
}

/// Every bitmask field decoded into ordered value/label pairs, the shape
/// the detail serializer emits.
#[derive(Debug, Serialize)]
pub struct DecodedFlags {
    pub edible_part: Vec<BitSetData>,
    pub soil_type: Vec<BitSetData>,
    pub soil_moisture: Vec<BitSetData>,
    pub soil_ph: Vec<BitSetData>,
    pub position_sunlight: Vec<BitSetData>,
    pub position_side: Vec<BitSetData>,
    pub fragrance: Vec<BitSetData>,
    pub harvest: Vec<BitSetData>,
    pub planting: Vec<BitSetData>,
    pub toxicity: Vec<BitSetData>,
    pub foliage: Vec<BitSetData>,
    pub habit: Vec<BitSetData>,
}

impl SpeciesRow {
    pub fn decoded(&self) -> DecodedFlags {
        DecodedFlags {
            edible_part: BitSet::from_bits(&PLANT_PARTS, self.edible_part).get_set_data(),
            soil_type: BitSet::from_bits(&SOIL_TYPE, self.soil_type).get_set_data(),
            soil_moisture: BitSet::from_bits(&SOIL_MOISTURE, self.soil_moisture).get_set_data(),
            soil_ph: BitSet::from_bits(&SOIL_PH, self.soil_ph).get_set_data(),
            position_sunlight: BitSet::from_bits(&POSITION_SUNLIGHT, self.position_sunlight)
                .get_set_data(),
            position_side: BitSet::from_bits(&POSITION_SIDE, self.position_side).get_set_data(),
            fragrance: BitSet::from_bits(&PLANT_PARTS, self.fragrance).get_set_data(),
            harvest: BitSet::from_bits(&SEASONS_MAX, self.harvest).get_set_data(),
            planting: BitSet::from_bits(&SEASONS_MAX, self.planting).get_set_data(),
            toxicity: BitSet::from_bits(&TOXICITY, self.toxicity).get_set_data(),
            foliage: BitSet::from_bits(&FOLIAGE, self.foliage).get_set_data(),
            habit: BitSet::from_bits(&HABIT, self.habit).get_set_data(),
        }
    }
}
