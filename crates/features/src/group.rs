//! Feature groups and the presets that select them.

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named family of movie attributes expanded into one or more columns.
///
/// The declaration order is the column order of every feature matrix:
/// continuous groups first, then categorical groups. `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureGroup {
    Popularity,
    ReleaseDate,
    VoteAverage,
    Runtime,
    Adult,
    Collection,
    Genre,
    Language,
}

impl FeatureGroup {
    /// Every group, in column order
    pub const ALL: [FeatureGroup; 8] = [
        FeatureGroup::Popularity,
        FeatureGroup::ReleaseDate,
        FeatureGroup::VoteAverage,
        FeatureGroup::Runtime,
        FeatureGroup::Adult,
        FeatureGroup::Collection,
        FeatureGroup::Genre,
        FeatureGroup::Language,
    ];

    /// Name used as the column-name prefix in the catalog
    pub fn name(self) -> &'static str {
        match self {
            FeatureGroup::Popularity => "popularity",
            FeatureGroup::ReleaseDate => "releaseDate",
            FeatureGroup::VoteAverage => "voteAverage",
            FeatureGroup::Runtime => "runtime",
            FeatureGroup::Adult => "adult",
            FeatureGroup::Collection => "collection",
            FeatureGroup::Genre => "genre",
            FeatureGroup::Language => "language",
        }
    }

    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            FeatureGroup::Popularity
                | FeatureGroup::ReleaseDate
                | FeatureGroup::VoteAverage
                | FeatureGroup::Runtime
        )
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureGroup {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureGroup::ALL
            .into_iter()
            .find(|group| group.name() == s)
            .ok_or_else(|| FeatureError::UnknownGroup(s.to_string()))
    }
}

/// Which groups a prediction run uses.
///
/// - BASIC: genre, releaseDate
/// - INTERMEDIATE: BASIC + popularity, voteAverage
/// - ADVANCED: INTERMEDIATE + runtime, adult
/// - ALL: ADVANCED + collection, language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeaturePreset {
    Basic,
    #[default]
    Intermediate,
    Advanced,
    All,
}

impl FeaturePreset {
    pub const VARIANTS: [FeaturePreset; 4] = [
        FeaturePreset::Basic,
        FeaturePreset::Intermediate,
        FeaturePreset::Advanced,
        FeaturePreset::All,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeaturePreset::Basic => "BASIC",
            FeaturePreset::Intermediate => "INTERMEDIATE",
            FeaturePreset::Advanced => "ADVANCED",
            FeaturePreset::All => "ALL",
        }
    }

    pub fn includes(self, group: FeatureGroup) -> bool {
        use FeatureGroup::*;
        match group {
            Genre | ReleaseDate => true,
            Popularity | VoteAverage => self != FeaturePreset::Basic,
            Runtime | Adult => matches!(self, FeaturePreset::Advanced | FeaturePreset::All),
            Collection | Language => self == FeaturePreset::All,
        }
    }

    /// Groups of this preset, always in column order
    pub fn groups(self) -> Vec<FeatureGroup> {
        FeatureGroup::ALL
            .into_iter()
            .filter(|group| self.includes(*group))
            .collect()
    }
}

impl fmt::Display for FeaturePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeaturePreset {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeaturePreset::VARIANTS
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FeatureError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_groups_keep_column_order() {
        assert_eq!(
            FeaturePreset::Basic.groups(),
            vec![FeatureGroup::ReleaseDate, FeatureGroup::Genre]
        );
        assert_eq!(
            FeaturePreset::Intermediate.groups(),
            vec![
                FeatureGroup::Popularity,
                FeatureGroup::ReleaseDate,
                FeatureGroup::VoteAverage,
                FeatureGroup::Genre
            ]
        );
        assert_eq!(FeaturePreset::Advanced.groups().len(), 6);
        assert_eq!(FeaturePreset::All.groups(), FeatureGroup::ALL.to_vec());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("all".parse::<FeaturePreset>().unwrap(), FeaturePreset::All);
        assert_eq!(
            "INTERMEDIATE".parse::<FeaturePreset>().unwrap(),
            FeaturePreset::Intermediate
        );
        assert!(matches!(
            "EVERYTHING".parse::<FeaturePreset>(),
            Err(FeatureError::UnknownPreset(_))
        ));

        assert_eq!(
            "releaseDate".parse::<FeatureGroup>().unwrap(),
            FeatureGroup::ReleaseDate
        );
        assert!("ReleaseDate".parse::<FeatureGroup>().is_err());
    }

    #[test]
    fn test_group_order() {
        let mut shuffled = vec![FeatureGroup::Language, FeatureGroup::Popularity, FeatureGroup::Adult];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![FeatureGroup::Popularity, FeatureGroup::Adult, FeatureGroup::Language]
        );
        assert!(FeatureGroup::Runtime.is_continuous());
        assert!(!FeatureGroup::Adult.is_continuous());
    }
}
