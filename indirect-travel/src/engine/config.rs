//! Engine configuration.

use chrono::Duration;

use crate::domain::NationCode;

/// Tunable parameters of limitation validation.
#[derive(Debug, Clone)]
pub struct LimitationConfig {
    /// Ground time above which an international connection is a stopover
    /// (minutes).
    pub international_stopover_mins: i64,

    /// Ground time above which a domestic connection is a stopover (minutes).
    pub domestic_stopover_mins: i64,

    /// Largest meaningful departure limit; larger values are unlimited.
    pub max_departures: u32,

    /// Largest meaningful arrival limit; larger values are unlimited.
    pub max_arrivals: u32,

    /// Largest meaningful retransit limit.
    pub max_retransits: u32,

    /// Largest meaningful stopover limit.
    pub max_stopovers: u32,

    /// Largest meaningful domestic segment limit.
    pub max_domestic_segments: u32,

    /// Reservation status of a confirmed segment.
    pub confirmed_status: String,

    /// MPM published as this multiple of TPM.
    pub mpm_to_tpm_ratio: f64,

    /// Nations where a zero domestic-segment limit marks the component not
    /// priceable instead of failing it.
    pub not_priceable_nations: Vec<NationCode>,
}

impl LimitationConfig {
    /// Create a new configuration with the given parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        international_stopover_mins: i64,
        domestic_stopover_mins: i64,
        max_departures: u32,
        max_arrivals: u32,
        max_retransits: u32,
        max_stopovers: u32,
        max_domestic_segments: u32,
        confirmed_status: impl Into<String>,
        mpm_to_tpm_ratio: f64,
        not_priceable_nations: Vec<NationCode>,
    ) -> Self {
        Self {
            international_stopover_mins,
            domestic_stopover_mins,
            max_departures,
            max_arrivals,
            max_retransits,
            max_stopovers,
            max_domestic_segments,
            confirmed_status: confirmed_status.into(),
            mpm_to_tpm_ratio,
            not_priceable_nations,
        }
    }

    /// Returns the international stopover threshold as a Duration.
    pub fn international_stopover(&self) -> Duration {
        Duration::minutes(self.international_stopover_mins)
    }

    /// Returns the domestic stopover threshold as a Duration.
    pub fn domestic_stopover(&self) -> Duration {
        Duration::minutes(self.domestic_stopover_mins)
    }

    /// TPM estimated from a published MPM.
    pub fn tpm_from_mpm(&self, mpm: u32) -> u32 {
        (f64::from(mpm) / self.mpm_to_tpm_ratio).round() as u32
    }
}

impl Default for LimitationConfig {
    fn default() -> Self {
        Self {
            international_stopover_mins: 24 * 60, // 24 hours
            domestic_stopover_mins: 4 * 60,       // 4 hours
            max_departures: 99,
            max_arrivals: 99,
            max_retransits: 99,
            max_stopovers: 99,
            max_domestic_segments: 9,
            confirmed_status: "OK".to_string(),
            mpm_to_tpm_ratio: 1.2,
            not_priceable_nations: ["VN", "MM", "MG"]
                .into_iter()
                .filter_map(|c| NationCode::parse(c).ok())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LimitationConfig::default();

        assert_eq!(config.international_stopover_mins, 1440);
        assert_eq!(config.domestic_stopover_mins, 240);
        assert_eq!(config.max_departures, 99);
        assert_eq!(config.max_arrivals, 99);
        assert_eq!(config.max_retransits, 99);
        assert_eq!(config.max_stopovers, 99);
        assert_eq!(config.max_domestic_segments, 9);
        assert_eq!(config.confirmed_status, "OK");
        assert_eq!(config.mpm_to_tpm_ratio, 1.2);
        assert_eq!(
            config
                .not_priceable_nations
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>(),
            vec!["VN", "MM", "MG"]
        );
    }

    #[test]
    fn duration_methods() {
        let config = LimitationConfig::default();

        assert_eq!(config.international_stopover(), Duration::hours(24));
        assert_eq!(config.domestic_stopover(), Duration::hours(4));
    }

    #[test]
    fn custom_config() {
        let config = LimitationConfig::new(720, 120, 5, 6, 7, 8, 3, "HK", 1.25, vec![]);

        assert_eq!(config.international_stopover_mins, 720);
        assert_eq!(config.domestic_stopover_mins, 120);
        assert_eq!(config.max_departures, 5);
        assert_eq!(config.max_arrivals, 6);
        assert_eq!(config.max_retransits, 7);
        assert_eq!(config.max_stopovers, 8);
        assert_eq!(config.max_domestic_segments, 3);
        assert_eq!(config.confirmed_status, "HK");
        assert_eq!(config.mpm_to_tpm_ratio, 1.25);
        assert!(config.not_priceable_nations.is_empty());
    }

    #[test]
    fn tpm_from_mpm_rounds() {
        let config = LimitationConfig::default();

        assert_eq!(config.tpm_from_mpm(1200), 1000);
        assert_eq!(config.tpm_from_mpm(1000), 833);
        assert_eq!(config.tpm_from_mpm(0), 0);
    }
}
