//! Daily exposure statistics derived from classified readings.

use serde::Serialize;

use super::category::NoiseCategory;

/// Listening time one reading stands for.
pub const MINUTES_PER_READING: u32 = 5;

/// Minutes spent in each tier over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureStats {
    pub total_safe_time: u32,
    pub total_moderate_time: u32,
    pub total_harmful_time: u32,
}

impl ExposureStats {
    /// Tallies categories at `MINUTES_PER_READING` each.
    pub fn from_categories(categories: impl IntoIterator<Item = NoiseCategory>) -> Self {
        categories
            .into_iter()
            .fold(Self::default(), |mut stats, category| {
                match category {
                    NoiseCategory::Safe => stats.total_safe_time += MINUTES_PER_READING,
                    NoiseCategory::Moderate => stats.total_moderate_time += MINUTES_PER_READING,
                    NoiseCategory::Harmful => stats.total_harmful_time += MINUTES_PER_READING,
                }
                stats
            })
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_safe_time + self.total_moderate_time + self.total_harmful_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(ExposureStats::from_categories(Vec::new()), ExposureStats::default());
    }

    #[test]
    fn counts_five_minutes_per_reading() {
        let stats = ExposureStats::from_categories([
            NoiseCategory::Safe,
            NoiseCategory::Safe,
            NoiseCategory::Harmful,
        ]);
        assert_eq!(stats.total_safe_time, 10);
        assert_eq!(stats.total_moderate_time, 0);
        assert_eq!(stats.total_harmful_time, 5);
        assert_eq!(stats.total_minutes(), 15);
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(ExposureStats::from_categories([NoiseCategory::Moderate]))
            .unwrap();
        assert_eq!(json["totalModerateTime"], 5);
    }
}
