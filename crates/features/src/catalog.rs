//! The feature catalog: ordered column names of a feature matrix.
//!
//! Column names carry their group as a prefix (`genre_35`,
//! `popularity_MinTo0.38`, `language_unknown`). The prefix is parsed exactly
//! once, when the catalog is constructed; every later question about group
//! membership is answered from the parsed columns.

use crate::error::{FeatureError, Result};
use crate::group::FeatureGroup;
use std::fs;
use std::io::Write;
use std::path::Path;

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub group: FeatureGroup,
}

/// Ordered list of column names with their parsed groups
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureCatalog {
    columns: Vec<CatalogColumn>,
}

impl FeatureCatalog {
    /// Build a catalog from column names.
    ///
    /// Fails if a name has no known group prefix, or if groups are not laid
    /// out contiguously in column order.
    pub fn new(names: Vec<String>) -> Result<Self> {
        let columns = names
            .into_iter()
            .map(|name| {
                let group = group_of(&name)?;
                Ok(CatalogColumn { name, group })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(pair) = columns.windows(2).find(|w| w[0].group > w[1].group) {
            return Err(FeatureError::SchemaInconsistency(format!(
                "column '{}' ({}) follows '{}' ({}), groups out of order",
                pair[1].name, pair[1].group, pair[0].name, pair[0].group
            )));
        }
        Ok(Self { columns })
    }

    /// Parse a catalog from text, one column name per line.
    pub fn parse(text: &str) -> Result<Self> {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(names)
    }

    /// Read a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Write one column name per line.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        for column in &self.columns {
            writeln!(writer, "{}", column.name)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[CatalogColumn] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Distinct groups present, in column order
    pub fn groups(&self) -> Vec<FeatureGroup> {
        let mut groups: Vec<FeatureGroup> = self.columns.iter().map(|c| c.group).collect();
        groups.dedup();
        groups
    }

    /// Number of columns belonging to `group`
    pub fn width_of(&self, group: FeatureGroup) -> usize {
        self.columns.iter().filter(|c| c.group == group).count()
    }

    /// Positions of every column that belongs to one of `groups`, ascending.
    pub fn indices_of(&self, groups: &[FeatureGroup]) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| groups.contains(&column.group))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Catalog restricted to the given column positions.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: indices.iter().map(|&idx| self.columns[idx].clone()).collect(),
        }
    }
}

fn group_of(name: &str) -> Result<FeatureGroup> {
    let (prefix, suffix) = name.split_once('_').ok_or_else(|| {
        FeatureError::SchemaInconsistency(format!("column '{}' has no group prefix", name))
    })?;
    if suffix.is_empty() {
        return Err(FeatureError::SchemaInconsistency(format!(
            "column '{}' has an empty suffix",
            name
        )));
    }
    prefix.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "popularity_MinTo1.5\npopularity_1.5ToMax\nreleaseDate_MinTo1990\nreleaseDate_1990ToMax\nadult_isAdult\ngenre_35\ngenre_18\ngenre_unknown\n";

    #[test]
    fn test_parse_groups() {
        let catalog = FeatureCatalog::parse(CATALOG).unwrap();
        assert_eq!(catalog.len(), 8);
        assert_eq!(
            catalog.groups(),
            vec![
                FeatureGroup::Popularity,
                FeatureGroup::ReleaseDate,
                FeatureGroup::Adult,
                FeatureGroup::Genre
            ]
        );
        assert_eq!(catalog.width_of(FeatureGroup::Genre), 3);
        assert_eq!(catalog.width_of(FeatureGroup::Language), 0);
    }

    #[test]
    fn test_indices_and_select() {
        let catalog = FeatureCatalog::parse(CATALOG).unwrap();
        let indices = catalog.indices_of(&[FeatureGroup::Genre, FeatureGroup::ReleaseDate]);
        assert_eq!(indices, vec![2, 3, 5, 6, 7]);

        let sub = catalog.select(&indices);
        assert_eq!(
            sub.names().collect::<Vec<_>>(),
            vec![
                "releaseDate_MinTo1990",
                "releaseDate_1990ToMax",
                "genre_35",
                "genre_18",
                "genre_unknown"
            ]
        );
    }

    #[test]
    fn test_rejects_bad_names() {
        assert!(matches!(
            FeatureCatalog::parse("budget_high\n"),
            Err(FeatureError::UnknownGroup(_))
        ));
        assert!(matches!(
            FeatureCatalog::parse("genre\n"),
            Err(FeatureError::SchemaInconsistency(_))
        ));
        assert!(matches!(
            FeatureCatalog::parse("genre_35\npopularity_MinTo1\n"),
            Err(FeatureError::SchemaInconsistency(_))
        ));
    }

    #[test]
    fn test_write_then_parse() {
        let catalog = FeatureCatalog::parse(CATALOG).unwrap();
        let mut out = Vec::new();
        catalog.write(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), CATALOG);
    }
}
