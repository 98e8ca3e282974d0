//! Column-major feature matrix with a missing-value bitmap.
//!
//! [`FeatureMatrixBuilder`] takes a dense row-major `ndarray` block plus
//! optional labels, weights, query ids and feature metadata, validates it
//! once, and produces the [`FeatureMatrix`] consumed by training and
//! prediction.

use crate::core::constants::DEFAULT_MAX_CATEGORIES;
use crate::core::error::{DatasetError, Result, XGBoostError};
use crate::core::types::{FeatureIndex, FeatureType, Label};
use crate::dataset::meta::{group_sizes_to_ptr, qid_to_group_ptr, MetaInfo};
use crate::dataset::schema::FeatureSchema;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

/// One bit per row, set when the value is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingBitmap {
    bits: Vec<u64>,
    count: usize,
}

impl MissingBitmap {
    pub fn new(n_rows: usize) -> Self {
        MissingBitmap {
            bits: vec![0; (n_rows + 63) / 64],
            count: 0,
        }
    }

    #[inline]
    pub fn set(&mut self, row: usize) {
        let (word, bit) = (row / 64, row % 64);
        if self.bits[word] & (1 << bit) == 0 {
            self.bits[word] |= 1 << bit;
            self.count += 1;
        }
    }

    #[inline]
    pub fn is_missing(&self, row: usize) -> bool {
        self.bits[row / 64] & (1 << (row % 64)) != 0
    }

    /// Number of missing rows.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Training or prediction input in column-major layout.
///
/// Missing entries are recorded in a per-column bitmap and stored as `NaN`
/// in the value buffer.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    n_rows: usize,
    columns: Vec<Vec<f32>>,
    missing: Vec<MissingBitmap>,
    num_categories: Vec<usize>,
    schema: FeatureSchema,
    info: MetaInfo,
}

impl FeatureMatrix {
    /// Starts a builder over a dense row-major block.
    pub fn builder(data: Array2<f32>) -> FeatureMatrixBuilder {
        FeatureMatrixBuilder::new(data)
    }

    /// Numeric matrix without labels, `NaN` marking missing values.
    pub fn from_dense(data: Array2<f32>) -> Result<Self> {
        FeatureMatrixBuilder::new(data).build()
    }

    pub fn num_rows(&self) -> usize {
        self.n_rows
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, feature: FeatureIndex) -> &[f32] {
        &self.columns[feature]
    }

    /// Value at `(row, feature)`, `NaN` when missing.
    #[inline]
    pub fn value(&self, row: usize, feature: FeatureIndex) -> f32 {
        self.columns[feature][row]
    }

    #[inline]
    pub fn is_missing(&self, row: usize, feature: FeatureIndex) -> bool {
        self.missing[feature].is_missing(row)
    }

    pub fn missing_bitmap(&self, feature: FeatureIndex) -> &MissingBitmap {
        &self.missing[feature]
    }

    /// Number of categories of a categorical feature (max code + 1), 0 otherwise.
    pub fn num_categories(&self, feature: FeatureIndex) -> usize {
        self.num_categories[feature]
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn feature_type(&self, feature: FeatureIndex) -> FeatureType {
        self.schema.feature_type(feature)
    }

    pub fn info(&self) -> &MetaInfo {
        &self.info
    }

    /// Replaces the per-row starting margin, e.g. to boost from a prior model.
    pub fn set_base_margin(&mut self, margin: Array2<f32>) -> Result<()> {
        if margin.nrows() != self.n_rows {
            return Err(DatasetError::RowCountMismatch {
                field: "base_margin",
                expected: self.n_rows,
                actual: margin.nrows(),
            }
            .into());
        }
        self.info.base_margin = Some(margin);
        Ok(())
    }
}

/// Builder validating raw input into a [`FeatureMatrix`].
#[derive(Debug, Clone)]
pub struct FeatureMatrixBuilder {
    data: Array2<f32>,
    missing: f32,
    labels: Option<Array2<Label>>,
    weights: Option<Array1<f32>>,
    qid: Option<Vec<u64>>,
    group: Option<Vec<usize>>,
    base_margin: Option<Array2<f32>>,
    feature_names: Option<Vec<String>>,
    feature_types: Option<Vec<FeatureType>>,
    feature_weights: Option<Vec<f32>>,
    max_categories: usize,
}

impl FeatureMatrixBuilder {
    pub fn new(data: Array2<f32>) -> Self {
        FeatureMatrixBuilder {
            data,
            missing: f32::NAN,
            labels: None,
            weights: None,
            qid: None,
            group: None,
            base_margin: None,
            feature_names: None,
            feature_types: None,
            feature_weights: None,
            max_categories: DEFAULT_MAX_CATEGORIES,
        }
    }

    /// Value treated as missing in addition to `NaN`.
    pub fn missing(mut self, sentinel: f32) -> Self {
        self.missing = sentinel;
        self
    }

    /// Single-target labels.
    pub fn labels(mut self, labels: Array1<Label>) -> Self {
        self.labels = Some(labels.insert_axis(Axis(1)));
        self
    }

    /// Multi-target or multi-label labels, `n_rows x n_targets`.
    pub fn labels_2d(mut self, labels: Array2<Label>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn weights(mut self, weights: Array1<f32>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Per-row query ids; rows of one query must be contiguous.
    pub fn qid(mut self, qid: Vec<u64>) -> Self {
        self.qid = Some(qid);
        self
    }

    /// Query group sizes, an alternative to [`FeatureMatrixBuilder::qid`].
    pub fn group(mut self, sizes: Vec<usize>) -> Self {
        self.group = Some(sizes);
        self
    }

    pub fn base_margin(mut self, margin: Array2<f32>) -> Self {
        self.base_margin = Some(margin);
        self
    }

    pub fn feature_names<S: Into<String>>(mut self, names: Vec<S>) -> Self {
        self.feature_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn feature_types(mut self, types: Vec<FeatureType>) -> Self {
        self.feature_types = Some(types);
        self
    }

    pub fn feature_weights(mut self, weights: Vec<f32>) -> Self {
        self.feature_weights = Some(weights);
        self
    }

    /// Largest cardinality accepted for native categorical columns.
    pub fn max_categories(mut self, max: usize) -> Self {
        self.max_categories = max;
        self
    }

    fn check_rows(field: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(DatasetError::RowCountMismatch {
                field,
                expected,
                actual,
            }
            .into());
        }
        Ok(())
    }

    pub fn build(self) -> Result<FeatureMatrix> {
        let (n_rows, n_cols) = self.data.dim();
        if n_rows == 0 || n_cols == 0 {
            return Err(DatasetError::Empty.into());
        }

        let types = match self.feature_types {
            Some(types) => {
                Self::check_rows("feature_types", n_cols, types.len())?;
                types
            }
            None => vec![FeatureType::Quantitative; n_cols],
        };
        let schema = FeatureSchema::new(self.feature_names, types)?;

        if let Some(labels) = &self.labels {
            Self::check_rows("label", n_rows, labels.nrows())?;
            if labels.ncols() == 0 || labels.iter().all(|l| l.is_nan()) {
                return Err(DatasetError::LabelUnset.into());
            }
            if let Some((index, &value)) = labels.iter().enumerate().find(|(_, l)| l.is_infinite()) {
                return Err(DatasetError::InvalidValue {
                    field: "label",
                    index,
                    value,
                }
                .into());
            }
        }

        if let Some(weights) = &self.weights {
            Self::check_rows("weight", n_rows, weights.len())?;
            if let Some((index, &value)) = weights
                .iter()
                .enumerate()
                .find(|(_, w)| !w.is_finite() || **w < 0.0)
            {
                return Err(DatasetError::InvalidValue {
                    field: "weight",
                    index,
                    value,
                }
                .into());
            }
        }

        let group_ptr = match (self.qid, self.group) {
            (Some(_), Some(_)) => {
                return Err(XGBoostError::invalid_input(
                    "only one of qid and group may be given",
                ))
            }
            (Some(qid), None) => {
                Self::check_rows("qid", n_rows, qid.len())?;
                Some(qid_to_group_ptr(&qid)?)
            }
            (None, Some(sizes)) => {
                let ptr = group_sizes_to_ptr(&sizes);
                Self::check_rows("group", n_rows, *ptr.last().unwrap_or(&0))?;
                Some(ptr)
            }
            (None, None) => None,
        };

        if let Some(margin) = &self.base_margin {
            Self::check_rows("base_margin", n_rows, margin.nrows())?;
        }

        if let Some(weights) = &self.feature_weights {
            Self::check_rows("feature_weights", n_cols, weights.len())?;
            if let Some((index, &value)) = weights
                .iter()
                .enumerate()
                .find(|(_, w)| !w.is_finite() || **w < 0.0)
            {
                return Err(DatasetError::InvalidValue {
                    field: "feature_weights",
                    index,
                    value,
                }
                .into());
            }
        }

        let sentinel = self.missing;
        let data = &self.data;
        let max_categories = self.max_categories;

        let built: Vec<(Vec<f32>, MissingBitmap, usize)> = (0..n_cols)
            .into_par_iter()
            .map(|feature| -> Result<(Vec<f32>, MissingBitmap, usize)> {
                let mut values = Vec::with_capacity(n_rows);
                let mut bitmap = MissingBitmap::new(n_rows);
                let categorical = schema.feature_type(feature).is_categorical();
                let mut max_code: Option<usize> = None;

                for (row, &raw) in data.column(feature).iter().enumerate() {
                    if raw.is_nan() || raw == sentinel {
                        bitmap.set(row);
                        values.push(f32::NAN);
                        continue;
                    }
                    if categorical {
                        if raw < 0.0 || raw.fract() != 0.0 || !raw.is_finite() {
                            return Err(DatasetError::InvalidCategory {
                                index: feature,
                                value: raw,
                            }
                            .into());
                        }
                        let code = raw as usize;
                        max_code = Some(max_code.map_or(code, |m| m.max(code)));
                    }
                    values.push(raw);
                }

                let n_categories = max_code.map_or(0, |m| m + 1);
                if n_categories > max_categories {
                    return Err(DatasetError::TooManyCategories {
                        index: feature,
                        count: n_categories,
                        max: max_categories,
                    }
                    .into());
                }
                Ok((values, bitmap, n_categories))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut columns = Vec::with_capacity(n_cols);
        let mut missing = Vec::with_capacity(n_cols);
        let mut num_categories = Vec::with_capacity(n_cols);
        for (values, bitmap, n_categories) in built {
            columns.push(values);
            missing.push(bitmap);
            num_categories.push(n_categories);
        }

        log::debug!(
            "Built feature matrix with {} rows, {} columns, {} missing entries",
            n_rows,
            n_cols,
            missing.iter().map(MissingBitmap::count).sum::<usize>()
        );

        Ok(FeatureMatrix {
            n_rows,
            columns,
            missing,
            num_categories,
            schema,
            info: MetaInfo {
                n_rows,
                labels: self.labels,
                weights: self.weights,
                group_ptr,
                base_margin: self.base_margin,
                feature_weights: self.feature_weights,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_missing_bitmap() {
        let mut bitmap = MissingBitmap::new(130);
        bitmap.set(0);
        bitmap.set(129);
        bitmap.set(129);
        assert!(bitmap.is_missing(0));
        assert!(bitmap.is_missing(129));
        assert!(!bitmap.is_missing(64));
        assert_eq!(bitmap.count(), 2);
    }

    #[test]
    fn test_build_normalizes_missing_sentinel() {
        let data = array![[1.0, -999.0], [f32::NAN, 2.0], [3.0, 4.0]];
        let matrix = FeatureMatrix::builder(data).missing(-999.0).build().unwrap();
        assert_eq!(matrix.num_rows(), 3);
        assert_eq!(matrix.num_cols(), 2);
        assert!(matrix.is_missing(0, 1));
        assert!(matrix.is_missing(1, 0));
        assert!(matrix.value(0, 1).is_nan());
        assert_eq!(matrix.value(2, 1), 4.0);
        assert_eq!(matrix.missing_bitmap(0).count(), 1);
    }

    #[test]
    fn test_label_row_mismatch() {
        let data = Array2::<f32>::zeros((4, 2));
        let err = FeatureMatrix::builder(data)
            .labels(array![0.0, 1.0, 0.0])
            .build()
            .unwrap_err();
        assert!(matches!(err, XGBoostError::InvalidInput { .. }));
    }

    #[test]
    fn test_entirely_unset_label() {
        let data = Array2::<f32>::zeros((2, 2));
        let err = FeatureMatrix::builder(data)
            .labels(array![f32::NAN, f32::NAN])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unset"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let data = Array2::<f32>::zeros((2, 1));
        let result = FeatureMatrix::builder(data)
            .labels(array![0.0, 1.0])
            .weights(array![1.0, -1.0])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_categorical_cardinality_limit() {
        let data = array![[0.0], [5.0], [2.0]];
        let err = FeatureMatrix::builder(data.clone())
            .feature_types(vec![FeatureType::Categorical])
            .max_categories(4)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("too many categories"));

        let matrix = FeatureMatrix::builder(data)
            .feature_types(vec![FeatureType::Categorical])
            .build()
            .unwrap();
        assert_eq!(matrix.num_categories(0), 6);
    }

    #[test]
    fn test_fractional_category_rejected() {
        let data = array![[0.5]];
        let result = FeatureMatrix::builder(data)
            .feature_types(vec![FeatureType::Categorical])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_qid_groups() {
        let data = Array2::<f32>::zeros((5, 1));
        let matrix = FeatureMatrix::builder(data)
            .labels(array![1.0, 0.0, 2.0, 1.0, 0.0])
            .qid(vec![10, 10, 11, 11, 11])
            .build()
            .unwrap();
        assert_eq!(matrix.info().group_ptr(), Some(&[0, 2, 5][..]));

        let data = Array2::<f32>::zeros((3, 1));
        assert!(FeatureMatrix::builder(data).qid(vec![1, 2, 1]).build().is_err());
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let data = Array2::<f32>::zeros((0, 3));
        assert!(FeatureMatrix::from_dense(data).is_err());
    }
}
