//! Country-year observations and their numeric attributes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Marker for "value not available".
pub const MISSING: f64 = -999.0;

/// Returns true if `value` is the missing-data sentinel.
#[inline]
pub fn is_missing(value: f64) -> bool {
    value == MISSING
}

/// Numeric fields of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Country population.
    Population,
    /// World Happiness Report score.
    HappinessScore,
    /// GDP per capita (log scale in the source data).
    GdpPerCapita,
    /// Social support index.
    SocialSupport,
    /// Healthy life expectancy.
    HealthyLifeExpectancy,
    /// Freedom to make life choices.
    FreedomToMakeLifeChoices,
    /// Generosity index.
    Generosity,
    /// Perceptions of corruption.
    PerceptionsOfCorruption,
    /// Annual mean temperature (°C).
    Temperature,
    /// Fertility rate (births per woman).
    FertilityRate,
}

impl Attribute {
    /// Number of numeric attributes.
    pub const COUNT: usize = 10;

    /// All attributes in column order.
    pub const ALL: [Attribute; Self::COUNT] = [
        Attribute::Population,
        Attribute::HappinessScore,
        Attribute::GdpPerCapita,
        Attribute::SocialSupport,
        Attribute::HealthyLifeExpectancy,
        Attribute::FreedomToMakeLifeChoices,
        Attribute::Generosity,
        Attribute::PerceptionsOfCorruption,
        Attribute::Temperature,
        Attribute::FertilityRate,
    ];

    /// Attributes compared in the correlation matrix (population is an encoding, not a measure).
    pub const CORRELATED: [Attribute; 9] = [
        Attribute::HappinessScore,
        Attribute::GdpPerCapita,
        Attribute::SocialSupport,
        Attribute::HealthyLifeExpectancy,
        Attribute::FreedomToMakeLifeChoices,
        Attribute::Generosity,
        Attribute::PerceptionsOfCorruption,
        Attribute::Temperature,
        Attribute::FertilityRate,
    ];

    /// Data column key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Population => "population",
            Attribute::HappinessScore => "happiness_score",
            Attribute::GdpPerCapita => "gdp_per_capita",
            Attribute::SocialSupport => "social_support",
            Attribute::HealthyLifeExpectancy => "healthy_life_expectancy",
            Attribute::FreedomToMakeLifeChoices => "freedom_to_make_life_choices",
            Attribute::Generosity => "generosity",
            Attribute::PerceptionsOfCorruption => "perceptions_of_corruption",
            Attribute::Temperature => "temperature",
            Attribute::FertilityRate => "fertility_rate",
        }
    }

    /// Axis title used by the parallel coordinates view.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Attribute::Population => "Population",
            Attribute::HappinessScore => "Happiness Score",
            Attribute::GdpPerCapita => "GDP per Capita (GK$)",
            Attribute::SocialSupport => "Social Support",
            Attribute::HealthyLifeExpectancy => "Healthy Life expectancy",
            Attribute::FreedomToMakeLifeChoices => "Freedom",
            Attribute::Generosity => "Generosity",
            Attribute::PerceptionsOfCorruption => "Perception of Corruption",
            Attribute::Temperature => "Temperature",
            Attribute::FertilityRate => "Fertility rate",
        }
    }

    /// Position in [`Attribute::ALL`].
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.key() == s)
            .ok_or_else(|| Error::UnknownAttribute(s.to_string()))
    }
}

/// Turns a snake_case column key into a Title Case label (`gdp` stays `GDP`).
#[must_use]
pub fn format_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            if word.eq_ignore_ascii_case("gdp") {
                return "GDP".to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn missing() -> f64 {
    MISSING
}

/// Absent, `null` and non-finite inputs all load as [`MISSING`].
fn finite_or_missing<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).unwrap_or(MISSING))
}

/// One (country, year) observation. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Country name.
    pub country: Arc<str>,
    /// World region.
    pub region: Arc<str>,
    /// Observation year.
    pub year: i32,
    /// Country population.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub population: f64,
    /// Happiness score.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub happiness_score: f64,
    /// GDP per capita.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub gdp_per_capita: f64,
    /// Social support.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub social_support: f64,
    /// Healthy life expectancy.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub healthy_life_expectancy: f64,
    /// Freedom to make life choices.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub freedom_to_make_life_choices: f64,
    /// Generosity.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub generosity: f64,
    /// Perceptions of corruption.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub perceptions_of_corruption: f64,
    /// Annual mean temperature; [`MISSING`] if unknown.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub temperature: f64,
    /// Fertility rate; [`MISSING`] if unknown.
    #[serde(default = "missing", deserialize_with = "finite_or_missing")]
    pub fertility_rate: f64,
}

impl Record {
    /// Creates a record with every numeric attribute set to [`MISSING`].
    #[must_use]
    pub fn new(country: impl Into<Arc<str>>, region: impl Into<Arc<str>>, year: i32) -> Self {
        Self {
            country: country.into(),
            region: region.into(),
            year,
            population: MISSING,
            happiness_score: MISSING,
            gdp_per_capita: MISSING,
            social_support: MISSING,
            healthy_life_expectancy: MISSING,
            freedom_to_make_life_choices: MISSING,
            generosity: MISSING,
            perceptions_of_corruption: MISSING,
            temperature: MISSING,
            fertility_rate: MISSING,
        }
    }

    /// Builder-style setter for one attribute.
    #[must_use]
    pub fn with(mut self, attribute: Attribute, value: f64) -> Self {
        self.set(attribute, value);
        self
    }

    /// Reads one attribute.
    #[must_use]
    pub fn value(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Population => self.population,
            Attribute::HappinessScore => self.happiness_score,
            Attribute::GdpPerCapita => self.gdp_per_capita,
            Attribute::SocialSupport => self.social_support,
            Attribute::HealthyLifeExpectancy => self.healthy_life_expectancy,
            Attribute::FreedomToMakeLifeChoices => self.freedom_to_make_life_choices,
            Attribute::Generosity => self.generosity,
            Attribute::PerceptionsOfCorruption => self.perceptions_of_corruption,
            Attribute::Temperature => self.temperature,
            Attribute::FertilityRate => self.fertility_rate,
        }
    }

    /// Writes one attribute. Non-finite values are stored as [`MISSING`].
    pub fn set(&mut self, attribute: Attribute, value: f64) {
        let value = if value.is_finite() { value } else { MISSING };
        let slot = match attribute {
            Attribute::Population => &mut self.population,
            Attribute::HappinessScore => &mut self.happiness_score,
            Attribute::GdpPerCapita => &mut self.gdp_per_capita,
            Attribute::SocialSupport => &mut self.social_support,
            Attribute::HealthyLifeExpectancy => &mut self.healthy_life_expectancy,
            Attribute::FreedomToMakeLifeChoices => &mut self.freedom_to_make_life_choices,
            Attribute::Generosity => &mut self.generosity,
            Attribute::PerceptionsOfCorruption => &mut self.perceptions_of_corruption,
            Attribute::Temperature => &mut self.temperature,
            Attribute::FertilityRate => &mut self.fertility_rate,
        };
        *slot = value;
    }

    /// Returns the attribute value unless it is the sentinel.
    #[must_use]
    pub fn known(&self, attribute: Attribute) -> Option<f64> {
        let v = self.value(attribute);
        (!is_missing(v)).then_some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_keys_round_trip() {
        for attr in Attribute::ALL {
            assert_eq!(attr.key().parse::<Attribute>().unwrap(), attr);
        }
    }

    #[test]
    fn test_attribute_index_matches_all() {
        for (i, attr) in Attribute::ALL.iter().enumerate() {
            assert_eq!(attr.index(), i);
        }
    }

    #[test]
    fn test_unknown_attribute() {
        let err = "happiness".parse::<Attribute>().unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute(ref k) if k == "happiness"));
    }

    #[test]
    fn test_new_record_is_all_missing() {
        let r = Record::new("Finland", "Western Europe", 2019);
        for attr in Attribute::ALL {
            assert!(is_missing(r.value(attr)));
            assert_eq!(r.known(attr), None);
        }
    }

    #[test]
    fn test_with_and_value() {
        let r = Record::new("Finland", "Western Europe", 2019)
            .with(Attribute::HappinessScore, 7.8)
            .with(Attribute::FertilityRate, 1.4);
        assert_eq!(r.value(Attribute::HappinessScore), 7.8);
        assert_eq!(r.known(Attribute::FertilityRate), Some(1.4));
    }

    #[test]
    fn test_set_non_finite_becomes_missing() {
        let mut r = Record::new("X", "Y", 2020);
        r.set(Attribute::Temperature, f64::NAN);
        assert!(is_missing(r.temperature));
    }

    #[test]
    fn test_deserialize_non_finite_becomes_missing() {
        let yaml = "country: Chad\nregion: Sub-Saharan Africa\nyear: 2019\nhappiness_score: 4.3\ntemperature: .nan\nfertility_rate: .inf\n";
        let r: Record = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(r.known(Attribute::HappinessScore), Some(4.3));
        assert!(is_missing(r.temperature));
        assert!(is_missing(r.fertility_rate));
    }

    #[test]
    fn test_deserialize_null_and_absent_fields() {
        let yaml = "country: Chad\nregion: Sub-Saharan Africa\nyear: 2019\ngenerosity: ~\n";
        let r: Record = serde_yaml_ng::from_str(yaml).unwrap();
        for attr in Attribute::ALL {
            assert!(is_missing(r.value(attr)), "{attr} should load as missing");
        }
    }

    #[test]
    fn test_deserialized_nan_never_reaches_means() {
        let yaml = "- country: Chad\n  region: Sub-Saharan Africa\n  year: 2018\n  temperature: .nan\n- country: Niger\n  region: Sub-Saharan Africa\n  year: 2018\n  temperature: 29.0\n";
        let records: Vec<Record> = serde_yaml_ng::from_str(yaml).unwrap();
        let regions = crate::aggregate::average_by_region(&records);
        assert_eq!(regions[0].value(Attribute::Temperature), 29.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label("gdp_per_capita"), "GDP Per Capita");
        assert_eq!(format_label("happiness_score"), "Happiness Score");
        assert_eq!(format_label("temperature"), "Temperature");
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Attribute::FreedomToMakeLifeChoices.display_name(), "Freedom");
        assert_eq!(Attribute::GdpPerCapita.to_string(), "gdp_per_capita");
    }
}
