//! The declared vocabularies for every categorical species field.
//!
//! Flag order is load-bearing: bit position equals declaration index and
//! existing rows store masks computed against this exact order. Append new
//! flags at the end; never reorder or remove.

use crate::vocabulary::Vocabulary;

pub static SOIL_PH: Vocabulary = Vocabulary {
    field: "soil_ph",
    flags: &[
        ("acid", "Acid"),
        ("neutral", "Neutral"),
        ("alkaline", "Alkaline"),
    ],
};

pub static SOIL_TYPE: Vocabulary = Vocabulary {
    field: "soil_type",
    flags: &[
        ("clay", "Clay"),
        ("sand", "Sand"),
        ("chalk", "Chalk"),
        ("loam", "Loam"),
    ],
};

pub static SOIL_MOISTURE: Vocabulary = Vocabulary {
    field: "soil_moisture",
    flags: &[
        ("moist_well_drained", "Moist but well-drained"),
        ("poorly_drained", "Poorly-drained"),
        ("well_drained", "Well-drained"),
    ],
};

/// Scalar choice field, not a bitmask; kept here so ingestion can map the
/// source's display text to the stored value.
pub static DURATION: Vocabulary = Vocabulary {
    field: "duration",
    flags: &[
        ("annual", "Annual"),
        ("biennial", "Biennial"),
        ("perennial", "Perennial"),
    ],
};

/// Shared by `edible_part`, `fragrance`, and the image group keys.
pub static PLANT_PARTS: Vocabulary = Vocabulary {
    field: "plant_parts",
    flags: &[
        ("bark", "Bark"),
        ("fruit", "Fruit"),
        ("flower", "Flower"),
        ("habit", "Habit"),
        ("leaf", "Leaf"),
        ("other", "Other"),
        ("root", "Root"),
        ("stem", "Stem"),
        ("seed", "Seed"),
        ("tuber", "Tuber"),
        ("foliage", "Foliage"),
    ],
};

pub static POSITION_SUNLIGHT: Vocabulary = Vocabulary {
    field: "position_sunlight",
    flags: &[
        ("partial_shade", "Partial shade"),
        ("full_sun", "Full sun"),
        ("full_shade", "Full shade"),
    ],
};

pub static POSITION_SIDE: Vocabulary = Vocabulary {
    field: "position_side",
    flags: &[
        ("east_facing", "East-facing"),
        ("north_facing", "North-facing"),
        ("west_facing", "West-facing"),
        ("south_facing", "South-facing"),
    ],
};

/// Group keys for per-season part colors.
pub static SEASONS: Vocabulary = Vocabulary {
    field: "seasons",
    flags: &[
        ("spring", "Spring"),
        ("summer", "Summer"),
        ("autumn", "Autumn"),
        ("winter", "Winter"),
    ],
};

pub static TOXICITY: Vocabulary = Vocabulary {
    field: "toxicity",
    flags: &[
        ("toxic_to_cats", "Toxic to Cats"),
        ("slightly_toxic_to_humans", "Slightly Toxic to Humans"),
        ("moderate_toxic_to_humans", "Moderate Toxic to Humans"),
        ("highly_toxic_to_humans", "Highly Toxic to Humans"),
        ("toxic_to_dogs", "Toxic to Dogs"),
    ],
};

pub static FOLIAGE: Vocabulary = Vocabulary {
    field: "foliage",
    flags: &[
        ("deciduous", "Deciduous"),
        ("evergreen", "Evergreen"),
        ("semi_evergreen", "Semi evergreen"),
    ],
};

pub static HABIT: Vocabulary = Vocabulary {
    field: "habit",
    flags: &[
        ("tufted", "Tufted"),
        ("trailing", "Trailing"),
        ("pendulous_weeping", "Pendulous weeping"),
        ("clump_forming", "Clump forming"),
        ("columnar_upright", "Columnar upright"),
        ("submerged", "Submerged"),
        ("suckering", "Suckering"),
        ("floating", "Floating"),
        ("mat_forming", "Matforming"),
        ("bushy", "Bushy"),
        ("climbing", "Climbing"),
    ],
};

/// Scalar choice field; display text appears in source data.
pub static EXPOSURE: Vocabulary = Vocabulary {
    field: "exposure",
    flags: &[
        ("exposed", "Exposed"),
        ("sheltered", "Sheltered"),
        ("exposed_or_sheltered", "Exposed or Sheltered"),
        ("sheltered_or_exposed", "Sheltered or Exposed"),
    ],
};

/// Shared by `harvest` and `planting`.
pub static SEASONS_MAX: Vocabulary = Vocabulary {
    field: "seasons_max",
    flags: &[
        ("winter", "Winter"),
        ("spring", "Spring"),
        ("mid_autumn", "Mid autumn"),
        ("mid_summer", "Mid summer"),
        ("summer", "Summer"),
        ("autumn", "Autumn"),
        ("late_autumn", "Late autumn"),
        ("all_year_around", "All year around"),
        ("mid_spring", "Mid spring"),
        ("mid_winter", "Mid winter"),
        ("late_summer", "Late summer"),
        ("early_autumn", "Early autumn"),
        ("late_winter", "Late winter"),
        ("early_summer", "Early summer"),
        ("late_spring", "Late spring"),
        ("early_spring", "Early spring"),
        ("early_winter", "Early winter"),
    ],
};

pub static DISTRIBUTION_STATUS: Vocabulary = Vocabulary {
    field: "statuses",
    flags: &[
        ("native", "Native"),
        ("introduced", "Introduced"),
        ("doubtful", "Doubtful"),
        ("absent", "Absent"),
        ("extinct", "Extinct"),
    ],
};

/// Group keys for growth tips. The misspelled value is wire format in the
/// upstream dataset and must stay as-is.
pub static GROWTH_TIP_TYPES: Vocabulary = Vocabulary {
    field: "tip_type",
    flags: &[
        ("propagation", "Propagation"),
        ("suggested_panting_places", "Suggested Planting Places"),
        ("pruning", "Pruning"),
    ],
};

/// Scalar choice field for regular-event frequency units.
pub static TIME_PARTS: Vocabulary = Vocabulary {
    field: "frequency_unit",
    flags: &[
        ("minute", "Minute"),
        ("hour", "Hour"),
        ("day", "Day"),
        ("week", "Week"),
        ("fortnight", "Fortnight"),
        ("month", "Month"),
        ("year", "Year"),
        ("century", "Century"),
    ],
};

/// Resolve the vocabulary backing a filterable bit-flag column.
///
/// `edible_part` and `fragrance` share `PLANT_PARTS`; `harvest` and
/// `planting` share `SEASONS_MAX`. Only bitmask-typed columns appear here;
/// scalar choice columns (duration, exposure) are equality-filtered and
/// never go through mask predicates.
pub fn field_vocabulary(name: &str) -> Option<&'static Vocabulary> {
    match name {
        "soil_type" => Some(&SOIL_TYPE),
        "soil_moisture" => Some(&SOIL_MOISTURE),
        "soil_ph" => Some(&SOIL_PH),
        "position_sunlight" => Some(&POSITION_SUNLIGHT),
        "position_side" => Some(&POSITION_SIDE),
        "edible_part" | "fragrance" => Some(&PLANT_PARTS),
        "harvest" | "planting" => Some(&SEASONS_MAX),
        "foliage" => Some(&FOLIAGE),
        "toxicity" => Some(&TOXICITY),
        "habit" => Some(&HABIT),
        "statuses" => Some(&DISTRIBUTION_STATUS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_every_filterable_field() {
        for name in [
            "soil_type",
            "soil_moisture",
            "soil_ph",
            "position_sunlight",
            "position_side",
            "edible_part",
            "fragrance",
            "harvest",
            "planting",
            "foliage",
            "toxicity",
            "habit",
            "statuses",
        ] {
            assert!(field_vocabulary(name).is_some(), "missing {name}");
        }
        assert!(field_vocabulary("duration").is_none());
        assert!(field_vocabulary("rating").is_none());
    }

    #[test]
    fn shared_vocabularies_are_the_same_instance() {
        let edible = field_vocabulary("edible_part").unwrap();
        let fragrance = field_vocabulary("fragrance").unwrap();
        assert!(std::ptr::eq(edible, fragrance));
    }

    #[test]
    fn values_are_unique_within_each_vocabulary() {
        for vocab in [
            &SOIL_PH,
            &SOIL_TYPE,
            &SOIL_MOISTURE,
            &DURATION,
            &PLANT_PARTS,
            &POSITION_SUNLIGHT,
            &POSITION_SIDE,
            &SEASONS,
            &TOXICITY,
            &FOLIAGE,
            &HABIT,
            &EXPOSURE,
            &SEASONS_MAX,
            &DISTRIBUTION_STATUS,
            &GROWTH_TIP_TYPES,
            &TIME_PARTS,
        ] {
            let mut values: Vec<_> = vocab.flags.iter().map(|(v, _)| *v).collect();
            values.sort_unstable();
            values.dedup();
            assert_eq!(values.len(), vocab.flags.len(), "{}", vocab.field);
        }
    }
}
