//! Dense feature matrix keyed by movie id, backed by `ndarray`.

use crate::error::{FeatureError, Result};
use data_loader::MovieId;
use ndarray::{Array2, Axis};

/// Rows are movies in first-seen order, columns follow the catalog.
///
/// The array is always kept in standard (row-major) layout so a row can be
/// handed out as a plain slice.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    movie_ids: Vec<MovieId>,
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Wrap row-major `data`; its length must be `movie_ids.len() * n_cols`.
    pub fn new(movie_ids: Vec<MovieId>, n_cols: usize, data: Vec<f64>) -> Result<Self> {
        let n_values = data.len();
        let data = Array2::from_shape_vec((movie_ids.len(), n_cols), data).map_err(|_| {
            FeatureError::SchemaInconsistency(format!(
                "{} values cannot form {} rows of {} columns",
                n_values,
                movie_ids.len(),
                n_cols
            ))
        })?;
        Ok(Self { movie_ids, data })
    }

    /// Build from per-row vectors, all of width `n_cols`.
    pub fn from_rows(movie_ids: Vec<MovieId>, n_cols: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.len() != movie_ids.len() {
            return Err(FeatureError::SchemaInconsistency(format!(
                "{} rows for {} movie ids",
                rows.len(),
                movie_ids.len()
            )));
        }
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (row, movie_id) in rows.into_iter().zip(&movie_ids) {
            if row.len() != n_cols {
                return Err(FeatureError::SchemaInconsistency(format!(
                    "row for movie {} has {} columns, expected {}",
                    movie_id,
                    row.len(),
                    n_cols
                )));
            }
            data.extend(row);
        }
        Self::new(movie_ids, n_cols, data)
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values()[idx * n_cols..(idx + 1) * n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        self.values()
            .chunks_exact(self.n_cols().max(1))
            .take(self.n_rows())
    }

    pub fn movie_id(&self, idx: usize) -> &str {
        &self.movie_ids[idx]
    }

    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    /// Raw row-major values
    pub fn values(&self) -> &[f64] {
        // Standard layout is kept by every constructor
        self.data.as_slice().unwrap_or(&[])
    }

    pub fn array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Copy of the matrix restricted to the given columns, in that order.
    pub fn select_columns(&self, columns: &[usize]) -> Self {
        let data = if columns.is_empty() {
            Array2::zeros((self.n_rows(), 0))
        } else {
            let selected = self.data.select(Axis(1), columns);
            selected.as_standard_layout().into_owned()
        };
        Self {
            movie_ids: self.movie_ids.clone(),
            data,
        }
    }

    /// Divide every row by its Euclidean norm.
    ///
    /// A zero row has no direction; it is left as the zero vector instead of
    /// being filled with NaN. Returns how many rows were zero.
    pub fn normalize_rows(&mut self) -> usize {
        if self.n_cols() == 0 {
            return self.n_rows();
        }
        let mut zero_rows = 0;
        for mut row in self.data.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm == 0.0 {
                zero_rows += 1;
                continue;
            }
            row.mapv_inplace(|v| v / norm);
        }
        zero_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<MovieId> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_shape_checked() {
        assert!(FeatureMatrix::new(ids(2), 3, vec![0.0; 6]).is_ok());
        assert!(matches!(
            FeatureMatrix::new(ids(2), 3, vec![0.0; 5]),
            Err(FeatureError::SchemaInconsistency(_))
        ));
        assert!(FeatureMatrix::from_rows(ids(2), 2, vec![vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn test_normalize_rows() {
        let mut matrix =
            FeatureMatrix::from_rows(ids(3), 2, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![0.0, 0.0]])
                .unwrap();
        let zero_rows = matrix.normalize_rows();

        assert_eq!(zero_rows, 1);
        assert!((matrix.row(0)[0] - 0.4472136).abs() < 1e-6);
        assert!((matrix.row(0)[1] - 0.8944272).abs() < 1e-6);
        assert_eq!(matrix.row(1), &[0.6, 0.8]);
        assert_eq!(matrix.row(2), &[0.0, 0.0]);
    }

    #[test]
    fn test_select_columns() {
        let matrix =
            FeatureMatrix::from_rows(ids(2), 3, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
                .unwrap();
        let sub = matrix.select_columns(&[0, 2]);
        assert_eq!(sub.n_cols(), 2);
        assert_eq!(sub.row(1), &[4.0, 6.0]);
        assert_eq!(sub.values(), &[1.0, 3.0, 4.0, 6.0]);
        assert_eq!(sub.movie_id(1), "2");
        assert_eq!(sub.rows().count(), 2);
        assert_eq!(sub.array().dim(), (2, 2));
    }

    #[test]
    fn test_empty_selection_keeps_rows() {
        let matrix = FeatureMatrix::from_rows(ids(2), 2, vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .unwrap();
        let sub = matrix.select_columns(&[]);
        assert_eq!(sub.n_rows(), 2);
        assert_eq!(sub.n_cols(), 0);
        assert!(sub.row(1).is_empty());
    }
}
