//! Source-record shapes for the species dataset.
//!
//! Upstream data is messy: intervals arrive as garbage strings, water
//! regimens miss required fields, grouped maps carry keys outside the
//! vocabularies. Deserialization is lenient where the dataset is known to
//! drift (bad substructures become `None`) and strict only on `latin_name`,
//! the one field nothing can be ingested without.

use bitflag_codec::Vocabulary;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A half-open-ish measurement range; both endpoints optional but positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IntervalRange {
    pub from_value: Option<i64>,
    pub to_value: Option<i64>,
}

fn positive_endpoint(obj: &serde_json::Map<String, Value>, key: &str) -> Option<Option<i64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(value) => {
            let n = value.as_i64()?;
            if n > 0 {
                Some(Some(n))
            } else {
                None
            }
        }
    }
}

fn parse_interval(value: &Value) -> Option<IntervalRange> {
    let obj = value.as_object()?;
    let from_value = positive_endpoint(obj, "from_value")?;
    let to_value = positive_endpoint(obj, "to_value")?;
    if from_value.is_none() && to_value.is_none() {
        return None;
    }
    Some(IntervalRange {
        from_value,
        to_value,
    })
}

/// Anything that is not a well-formed range with at least one positive
/// endpoint becomes `None` instead of failing the record.
fn lenient_interval<'de, D>(deserializer: D) -> Result<Option<IntervalRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_interval(&value))
}

/// Watering schedule attached to the soil section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterRegimen {
    pub frequency: Option<IntervalRange>,
    pub frequency_count: i64,
    pub frequency_unit: String,
}

fn lenient_water<'de, D>(deserializer: D) -> Result<Option<WaterRegimen>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(obj) = value.as_object() else {
        return Ok(None);
    };
    let Some(frequency_count) = obj.get("frequency_count").and_then(Value::as_i64) else {
        return Ok(None);
    };
    let Some(frequency_unit) = obj.get("frequency_unit").and_then(Value::as_str) else {
        return Ok(None);
    };
    let frequency = obj.get("frequency").and_then(parse_interval);
    Ok(Some(WaterRegimen {
        frequency,
        frequency_count,
        frequency_unit: frequency_unit.to_string(),
    }))
}

/// A map from group key to child list (images by plant part, distributions
/// by status). Keys are validated against a vocabulary at iteration time,
/// not at parse time.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Grouped<T>(pub BTreeMap<String, Vec<T>>);

impl<T> Default for Grouped<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T> Grouped<T> {
    /// Iterate non-empty groups whose key is a known vocabulary value.
    pub fn iter_known<'a>(
        &'a self,
        vocabulary: &'a Vocabulary,
    ) -> impl Iterator<Item = (&'a str, &'a [T])> {
        self.0
            .iter()
            .filter(|(key, children)| {
                vocabulary.bit_for_value(key).is_some() && !children.is_empty()
            })
            .map(|(key, children)| (key.as_str(), children.as_slice()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SizeSection {
    #[serde(deserialize_with = "lenient_interval")]
    pub height_cm: Option<IntervalRange>,
    #[serde(deserialize_with = "lenient_interval")]
    pub years_to_max_height: Option<IntervalRange>,
    #[serde(deserialize_with = "lenient_interval")]
    pub spread_cm: Option<IntervalRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SoilSection {
    #[serde(deserialize_with = "lenient_water")]
    pub water: Option<WaterRegimen>,
    /// Display labels, encoded to bitmasks at insert time.
    #[serde(rename = "type")]
    pub soil_type: Vec<String>,
    pub moisture: Vec<String>,
    pub ph: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PositionSection {
    pub sunlight: Vec<String>,
    pub side: Vec<String>,
    /// Display label of a single choice, not a flag list.
    pub exposure: Option<String>,
    pub hardiness_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    pub harvest: Vec<String>,
    pub planting: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorSection {
    pub stem: Vec<String>,
    pub flower: Vec<String>,
    pub foliage: Vec<String>,
    pub fruit: Vec<String>,
}

impl ColorSection {
    /// Plant-part value keyed color lists, declaration order.
    pub fn parts(&self) -> [(&'static str, &[String]); 4] {
        [
            ("stem", &self.stem),
            ("flower", &self.flower),
            ("foliage", &self.foliage),
            ("fruit", &self.fruit),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColourAndScentSection {
    pub fragrance: Option<Vec<String>>,
    pub spring: ColorSection,
    pub summer: ColorSection,
    pub autumn: ColorSection,
    pub winter: ColorSection,
}

impl ColourAndScentSection {
    pub fn fragrance(&self) -> &[String] {
        self.fragrance.as_deref().unwrap_or_default()
    }

    pub fn seasons(&self) -> [(&'static str, &ColorSection); 4] {
        [
            ("spring", &self.spring),
            ("summer", &self.summer),
            ("autumn", &self.autumn),
            ("winter", &self.winter),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HowToGrowSection {
    pub cultivation: Option<String>,
    pub propagation: Vec<String>,
    // Field name carries an upstream dataset typo; it is the wire key.
    pub suggested_panting_places: Vec<String>,
    pub pruning: Vec<String>,
}

impl HowToGrowSection {
    pub fn cultivation(&self) -> &str {
        self.cultivation.as_deref().unwrap_or_default()
    }

    /// Tip lists keyed by their tip-type value; cultivation is prose, not
    /// a tip list, and is excluded.
    pub fn tips(&self) -> [(&'static str, &[String]); 3] {
        [
            ("propagation", &self.propagation),
            ("suggested_panting_places", &self.suggested_panting_places),
            ("pruning", &self.pruning),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassificationSection {
    pub family: Option<String>,
    pub phylum: Option<String>,
    pub classify: Option<String>,
    pub order: Vec<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
}

impl ClassificationSection {
    pub fn is_empty(&self) -> bool {
        [
            &self.family,
            &self.phylum,
            &self.classify,
            &self.genus,
            &self.species,
        ]
        .iter()
        .all(|field| field.as_deref().unwrap_or_default().is_empty())
            && self.order.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotanicalDetailsSection {
    pub foliage: Vec<String>,
    pub habit: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSource {
    pub image_url: String,
    pub copyright: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionSource {
    pub name: String,
    pub tdwg_code: String,
    pub tdwg_level: i64,
    pub species_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRecord {
    pub last_update: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
}

fn default_rank() -> i64 {
    999_999
}

/// One species as shipped by the upstream dataset. Multi-valued categorical
/// fields carry display labels.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesRecord {
    pub latin_name: String,
    #[serde(default)]
    pub main_common_name: BTreeMap<String, String>,
    #[serde(default)]
    pub common_names: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Grouped<ImageSource>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub edible: Option<bool>,
    #[serde(default)]
    pub edible_part: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub genus_description: Option<String>,
    #[serde(default = "default_rank")]
    pub rank: i64,
    #[serde(default)]
    pub size: SizeSection,
    #[serde(default)]
    pub soil: SoilSection,
    #[serde(default)]
    pub position: PositionSection,
    #[serde(default)]
    pub events: EventsSection,
    #[serde(default)]
    pub colour_and_scent: ColourAndScentSection,
    #[serde(default)]
    pub toxicity: Vec<String>,
    #[serde(default)]
    pub how_to_grow: HowToGrowSection,
    #[serde(default)]
    pub diseases_and_pests: Vec<String>,
    #[serde(default)]
    pub scientific_classification: Option<ClassificationSection>,
    #[serde(default)]
    pub botanical_details: BotanicalDetailsSection,
    #[serde(default)]
    pub distributions: Grouped<DistributionSource>,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
    #[serde(default)]
    pub misc: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitflag_codec::fields::{DISTRIBUTION_STATUS, PLANT_PARTS};

    #[test]
    fn minimal_record_needs_only_a_latin_name() {
        let record: SpeciesRecord =
            serde_json::from_str(r#"{"latin_name": "Acer campestre"}"#).unwrap();
        assert_eq!(record.latin_name, "Acer campestre");
        assert_eq!(record.rank, 999_999);
        assert!(record.size.height_cm.is_none());
        assert!(record.soil.water.is_none());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn malformed_intervals_become_none() {
        let json = r#"{
            "latin_name": "X",
            "size": {
                "height_cm": {"from_value": 10, "to_value": 50},
                "years_to_max_height": "unknown",
                "spread_cm": {"from_value": 0, "to_value": 50}
            }
        }"#;
        let record: SpeciesRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.size.height_cm,
            Some(IntervalRange {
                from_value: Some(10),
                to_value: Some(50),
            })
        );
        assert!(record.size.years_to_max_height.is_none());
        // A non-positive endpoint invalidates the whole range.
        assert!(record.size.spread_cm.is_none());
    }

    #[test]
    fn interval_with_both_endpoints_missing_is_none() {
        let json = r#"{"latin_name": "X", "size": {"height_cm": {"from_value": null}}}"#;
        let record: SpeciesRecord = serde_json::from_str(json).unwrap();
        assert!(record.size.height_cm.is_none());
    }

    #[test]
    fn water_without_required_fields_becomes_none() {
        let json = r#"{
            "latin_name": "X",
            "soil": {
                "water": {"frequency": {"from_value": 3, "to_value": 7}},
                "type": ["Clay"]
            }
        }"#;
        let record: SpeciesRecord = serde_json::from_str(json).unwrap();
        assert!(record.soil.water.is_none());
        assert_eq!(record.soil.soil_type, vec!["Clay"]);
    }

    #[test]
    fn water_with_all_fields_parses() {
        let json = r#"{
            "latin_name": "X",
            "soil": {
                "water": {
                    "frequency": {"from_value": 3, "to_value": 7},
                    "frequency_count": 1,
                    "frequency_unit": "week"
                }
            }
        }"#;
        let record: SpeciesRecord = serde_json::from_str(json).unwrap();
        let water = record.soil.water.unwrap();
        assert_eq!(water.frequency_count, 1);
        assert_eq!(water.frequency_unit, "week");
        assert_eq!(water.frequency.unwrap().from_value, Some(3));
    }

    #[test]
    fn grouped_iteration_skips_unknown_and_empty_groups() {
        let json = r#"{
            "latin_name": "X",
            "images": {
                "flower": [{"image_url": "a.jpg", "copyright": "c"}],
                "hologram": [{"image_url": "b.jpg", "copyright": "c"}],
                "fruit": []
            }
        }"#;
        let record: SpeciesRecord = serde_json::from_str(json).unwrap();
        let groups: Vec<&str> = record
            .images
            .iter_known(&PLANT_PARTS)
            .map(|(part, _)| part)
            .collect();
        assert_eq!(groups, vec!["flower"]);
    }

    #[test]
    fn distribution_groups_follow_status_values() {
        let json = r#"{
            "latin_name": "X",
            "distributions": {
                "native": [
                    {"name": "Great Britain", "tdwg_code": "GRB", "tdwg_level": 3, "species_count": 1200}
                ],
                "martian": [
                    {"name": "Mars", "tdwg_code": "MRS", "tdwg_level": 1, "species_count": 0}
                ]
            }
        }"#;
        let record: SpeciesRecord = serde_json::from_str(json).unwrap();
        let groups: Vec<&str> = record
            .distributions
            .iter_known(&DISTRIBUTION_STATUS)
            .map(|(status, _)| status)
            .collect();
        assert_eq!(groups, vec!["native"]);
    }

    #[test]
    fn empty_classification_is_detected() {
        let empty = ClassificationSection::default();
        assert!(empty.is_empty());

        let populated = ClassificationSection {
            family: Some("Sapindaceae".to_string()),
            ..ClassificationSection::default()
        };
        assert!(!populated.is_empty());
    }
}
