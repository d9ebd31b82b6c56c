use std::slice;

/// Covariance of a Gaussian component, tagged by shape.
///
/// A diagonal covariance is stored as its variance vector (the single row of a
/// `1 × D` matrix). A full covariance keeps every row; rows read back from a
/// codebook file may be empty, which marks a hole left by the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Covariance {
    Diagonal(Vec<f64>),
    Full(Vec<Vec<f64>>),
}

impl Covariance {
    /// Classify a row-major matrix by its row count.
    ///
    /// One row is diagonal, more rows is full, no rows is an absent covariance.
    pub fn from_rows(mut rows: Vec<Vec<f64>>) -> Option<Self> {
        match rows.len() {
            0 => None,
            1 => rows.pop().map(Self::Diagonal),
            _ => Some(Self::Full(rows)),
        }
    }

    /// The matrix as stored, one slice entry per row.
    pub fn rows(&self) -> &[Vec<f64>] {
        match self {
            Self::Diagonal(variances) => slice::from_ref(variances),
            Self::Full(rows) => rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Feature dimension, taken from the length of the first row.
    pub fn dimension(&self) -> usize {
        self.rows().first().map_or(0, Vec::len)
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(self, Self::Diagonal(_))
    }

    pub fn variances(&self) -> Option<&[f64]> {
        match self {
            Self::Diagonal(variances) => Some(variances),
            Self::Full(_) => None,
        }
    }

    pub(crate) fn zeros(dimension: usize, diagonal: bool) -> Self {
        if diagonal {
            Self::Diagonal(vec![0.0; dimension])
        } else {
            Self::Full(vec![vec![0.0; dimension]; dimension])
        }
    }
}
