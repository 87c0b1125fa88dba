#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Street-crime category taxonomy.
//!
//! The police.uk feed tags every incident with a kebab-case category slug
//! (e.g. `"anti-social-behaviour"`). This crate defines the known slugs and
//! their display labels. Incidents always keep the raw slug verbatim; the
//! enum is only used for classification and labelling.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A police.uk street-level crime category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CrimeCategory {
    /// Nuisance and personal or environmental anti-social behaviour
    AntiSocialBehaviour,
    /// Theft of a bicycle
    BicycleTheft,
    /// Entry to a building to steal or cause damage
    Burglary,
    /// Criminal damage and arson
    CriminalDamageArson,
    /// Possession or supply of controlled drugs
    Drugs,
    /// Theft not covered by a more specific category
    OtherTheft,
    /// Possession of a weapon
    PossessionOfWeapons,
    /// Offences that cause fear, alarm or distress
    PublicOrder,
    /// Theft with the use or threat of force
    Robbery,
    /// Theft from shops or stalls
    Shoplifting,
    /// Theft directly from a person (pickpocketing, snatching)
    TheftFromThePerson,
    /// Theft of or from a vehicle, or interference with one
    VehicleCrime,
    /// Violence and sexual offences
    #[serde(alias = "violence-and-sexual-offences")]
    #[strum(to_string = "violent-crime", serialize = "violence-and-sexual-offences")]
    ViolentCrime,
    /// Everything the feed files under "other crime"
    OtherCrime,
}

impl CrimeCategory {
    /// Classifies a raw feed slug, falling back to [`Self::OtherCrime`] for
    /// slugs this taxonomy does not know about.
    #[must_use]
    pub fn classify(slug: &str) -> Self {
        slug.trim()
            .to_ascii_lowercase()
            .parse()
            .unwrap_or(Self::OtherCrime)
    }

    /// Human-readable label, as shown in marker tooltips.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AntiSocialBehaviour => "Anti-social behaviour",
            Self::BicycleTheft => "Bicycle theft",
            Self::Burglary => "Burglary",
            Self::CriminalDamageArson => "Criminal damage and arson",
            Self::Drugs => "Drugs",
            Self::OtherTheft => "Other theft",
            Self::PossessionOfWeapons => "Possession of weapons",
            Self::PublicOrder => "Public order",
            Self::Robbery => "Robbery",
            Self::Shoplifting => "Shoplifting",
            Self::TheftFromThePerson => "Theft from the person",
            Self::VehicleCrime => "Vehicle crime",
            Self::ViolentCrime => "Violence and sexual offences",
            Self::OtherCrime => "Other crime",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AntiSocialBehaviour,
            Self::BicycleTheft,
            Self::Burglary,
            Self::CriminalDamageArson,
            Self::Drugs,
            Self::OtherTheft,
            Self::PossessionOfWeapons,
            Self::PublicOrder,
            Self::Robbery,
            Self::Shoplifting,
            Self::TheftFromThePerson,
            Self::VehicleCrime,
            Self::ViolentCrime,
            Self::OtherCrime,
        ]
    }
}

/// The pseudo-category the police.uk API accepts to request every category
/// at once.
pub const ALL_CRIME: &str = "all-crime";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_roundtrip_through_display() {
        for cat in CrimeCategory::all() {
            let slug = cat.to_string();
            assert_eq!(CrimeCategory::classify(&slug), *cat, "slug {slug}");
        }
    }

    #[test]
    fn known_feed_slugs_classify() {
        assert_eq!(
            CrimeCategory::classify("anti-social-behaviour"),
            CrimeCategory::AntiSocialBehaviour
        );
        assert_eq!(
            CrimeCategory::classify("criminal-damage-arson"),
            CrimeCategory::CriminalDamageArson
        );
        assert_eq!(
            CrimeCategory::classify("violence-and-sexual-offences"),
            CrimeCategory::ViolentCrime
        );
        assert_eq!(
            CrimeCategory::classify(" Shoplifting "),
            CrimeCategory::Shoplifting
        );
    }

    #[test]
    fn unknown_slug_is_other_crime() {
        assert_eq!(
            CrimeCategory::classify("something-new"),
            CrimeCategory::OtherCrime
        );
        assert_eq!(CrimeCategory::classify(""), CrimeCategory::OtherCrime);
    }

    #[test]
    fn as_ref_matches_display() {
        for cat in CrimeCategory::all() {
            assert_eq!(cat.as_ref(), cat.to_string());
        }
        assert_eq!(CrimeCategory::TheftFromThePerson.as_ref(), "theft-from-the-person");
    }
}
