//! Pairwise cosine distances between every two movies of a store.
//!
//! Output is one line per unordered pair `(i, j)` with `i > j`, so the file
//! grows quadratically with the number of movies.

use anyhow::{Context, Result};
use features::{FeatureStore, cosine_distance};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const DISTANCE_HEADER: &str = "movieId,movieId,distance";

/// Write every pair's distance; returns the number of pairs written.
pub fn write_pairwise_distances<W: Write>(store: &FeatureStore, mut writer: W) -> Result<usize> {
    writeln!(writer, "{}", DISTANCE_HEADER)?;
    let mut pairs = 0;
    for i in 0..store.len() {
        let row_i = store.row_at(i);
        for j in 0..i {
            let distance = cosine_distance(row_i, store.row_at(j));
            writeln!(
                writer,
                "{},{},{}",
                store.movie_id_at(i),
                store.movie_id_at(j),
                distance
            )?;
            pairs += 1;
        }
    }
    writer.flush()?;
    Ok(pairs)
}

pub fn write_distance_file(store: &FeatureStore, output: &Path) -> Result<usize> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create distance file {}", output.display()))?;
    let pairs = write_pairwise_distances(store, BufWriter::new(file))?;
    info!("Wrote {} movie distances to {}", pairs, output.display());
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use features::{FeatureCatalog, FeatureMatrix};

    #[test]
    fn test_lower_triangle() {
        let catalog = FeatureCatalog::parse("genre_35\ngenre_unknown\n").unwrap();
        let matrix = FeatureMatrix::from_rows(
            vec!["1".to_string(), "2".to_string(), "3".to_string()],
            2,
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .unwrap();
        let store = FeatureStore::new(matrix, catalog).unwrap();

        let mut out = Vec::new();
        assert_eq!(write_pairwise_distances(&store, &mut out).unwrap(), 3);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["movieId,movieId,distance", "2,1,1", "3,1,0", "3,2,1"]
        );
    }
}
