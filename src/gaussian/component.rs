use std::io::{self, Read, Write};

use crate::error::{CodebookError, RangeTarget, Result};
use crate::numeric;
use crate::stream::{EndianReader, EndianWriter, MAX_PREALLOC};

use super::cluster::Cluster;
use super::covariance::Covariance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractMode {
    /// Shrink the requested length to what the source holds.
    Clamp,
    /// Reject any request that leaves the source bounds.
    Strict,
}

/// A single multivariate Gaussian of a codebook.
///
/// The inverse covariance, determinant and both normalisation constants are
/// recomputed by every covariance setter, so they always describe the current
/// covariance. Components restored with [`GaussianComponent::read`] keep the
/// derived values stored in the file.
#[derive(Debug, PartialEq, Default)]
pub struct GaussianComponent {
    mean: Option<Vec<f64>>,
    covariance: Option<Covariance>,
    inv_covariance: Option<Covariance>,
    determinant: f64,
    constant_term: f64,
    constant_term_log: f64,
}

impl GaussianComponent {
    /// An empty component with no mean and no covariance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-initialised component of the given dimension.
    ///
    /// A dimension of zero gives the empty component.
    pub fn with_dimension(dimension: usize, diagonal: bool) -> Self {
        let mut component = Self::new();
        if dimension > 0 {
            component.mean = Some(vec![0.0; dimension]);
            component.covariance = Some(Covariance::zeros(dimension, diagonal));
            component.refresh_derived();
        }
        component
    }

    /// Component holding copies of `mean` and `covariance`.
    ///
    /// A single covariance row is taken as the diagonal variance vector.
    pub fn from_parts(mean: &[f64], covariance: &[Vec<f64>]) -> Self {
        let mut component = Self::new();
        component.set_mean(mean);
        component.set_covariance(covariance);
        debug_assert!(
            covariance.iter().all(|row| row.len() == mean.len()),
            "mean dimension {} does not match every covariance row",
            mean.len()
        );
        component
    }

    pub fn from_cluster(cluster: &Cluster) -> Self {
        Self::from_parts(&cluster.mean, &cluster.covariance)
    }

    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    pub fn covariance(&self) -> Option<&Covariance> {
        self.covariance.as_ref()
    }

    /// Variance vector when the covariance is diagonal.
    pub fn covariance_diagonal(&self) -> Option<&[f64]> {
        self.covariance.as_ref().and_then(Covariance::variances)
    }

    /// Inverse covariance, `None` when the covariance is absent or singular.
    pub fn inv_covariance(&self) -> Option<&Covariance> {
        self.inv_covariance.as_ref()
    }

    pub fn determinant(&self) -> f64 {
        self.determinant
    }

    pub fn constant_term(&self) -> f64 {
        self.constant_term
    }

    pub fn constant_term_log(&self) -> f64 {
        self.constant_term_log
    }

    /// Length of the mean vector, zero when absent.
    pub fn dimension(&self) -> usize {
        self.mean.as_ref().map_or(0, Vec::len)
    }

    /// True for a diagonal covariance whose length matches a mean of more than one entry.
    pub fn is_diagonal(&self) -> bool {
        match (&self.mean, &self.covariance) {
            (Some(mean), Some(Covariance::Diagonal(variances))) => {
                mean.len() > 1 && variances.len() == mean.len()
            }
            _ => false,
        }
    }

    pub fn set_mean(&mut self, mean: &[f64]) {
        self.set_mean_range(mean, 0, mean.len());
    }

    /// Copy `len` entries of `source` starting at `offset` into the mean.
    ///
    /// A range running past the end of `source` is shortened to fit. An empty
    /// source or an empty range leaves the mean absent.
    pub fn set_mean_range(&mut self, source: &[f64], offset: usize, len: usize) {
        // Clamping never fails
        let _ = self.extract_mean(source, offset, len, ExtractMode::Clamp);
    }

    /// Like [`set_mean_range`](Self::set_mean_range) but fails instead of clamping.
    ///
    /// The component is left unchanged on error.
    pub fn try_set_mean_range(&mut self, source: &[f64], offset: usize, len: usize) -> Result<()> {
        self.extract_mean(source, offset, len, ExtractMode::Strict)
    }

    fn extract_mean(
        &mut self,
        source: &[f64],
        offset: usize,
        mut len: usize,
        mode: ExtractMode,
    ) -> Result<()> {
        if source.is_empty() || len == 0 {
            self.mean = None;
            return Ok(());
        }

        let available = source.len().saturating_sub(offset);
        if len > available {
            if mode == ExtractMode::Strict {
                return Err(CodebookError::RangeViolation {
                    what: RangeTarget::Mean,
                    offset,
                    requested: len,
                    available: source.len(),
                });
            }
            log::debug!("Mean range {offset}+{len} clamped to {available} entries");
            len = available;
        }

        self.mean = (len > 0).then(|| source[offset..offset + len].to_vec());
        Ok(())
    }

    /// Replace the covariance with a copy of `matrix`.
    ///
    /// One row selects the diagonal form, several rows the full form and an
    /// empty matrix clears the covariance.
    pub fn set_covariance(&mut self, matrix: &[Vec<f64>]) {
        let len = match matrix {
            [] => 0,
            [variances] => variances.len(),
            rows => rows.len(),
        };
        self.set_covariance_range(matrix, 0, 0, len);
    }

    /// Copy a `len × len` block of `source` starting at (`row_offset`, `col_offset`).
    ///
    /// For a single-row (diagonal) source the larger offset selects where the
    /// variance run starts. Requests running past the source are shortened to
    /// fit, and a request that ends up empty clears the covariance.
    pub fn set_covariance_range(
        &mut self,
        source: &[Vec<f64>],
        row_offset: usize,
        col_offset: usize,
        len: usize,
    ) {
        // Clamping never fails
        let _ = self.extract_covariance(source, row_offset, col_offset, len, ExtractMode::Clamp);
    }

    /// Like [`set_covariance_range`](Self::set_covariance_range) but fails instead of clamping.
    ///
    /// The component is left unchanged on error.
    pub fn try_set_covariance_range(
        &mut self,
        source: &[Vec<f64>],
        row_offset: usize,
        col_offset: usize,
        len: usize,
    ) -> Result<()> {
        self.extract_covariance(source, row_offset, col_offset, len, ExtractMode::Strict)
    }

    /// Drop the covariance and reset every derived value.
    pub fn clear_covariance(&mut self) {
        self.covariance = None;
        self.refresh_derived();
    }

    fn extract_covariance(
        &mut self,
        source: &[Vec<f64>],
        row_offset: usize,
        col_offset: usize,
        len: usize,
        mode: ExtractMode,
    ) -> Result<()> {
        let extracted = match source {
            _ if len == 0 => None,
            [] => None,
            [variances] => {
                let start = row_offset.max(col_offset);
                let len = fit(len, start, variances.len(), RangeTarget::CovarianceColumns, mode)?;
                (len > 0).then(|| Covariance::Diagonal(variances[start..start + len].to_vec()))
            }
            rows => {
                let shortest = rows.iter().map(Vec::len).min().unwrap_or(0);
                let len = fit(len, col_offset, shortest, RangeTarget::CovarianceColumns, mode)?;
                let len = fit(len, row_offset, rows.len(), RangeTarget::CovarianceRows, mode)?;
                if len == 0 {
                    self.covariance = None;
                    self.refresh_derived();
                    return Ok(());
                }
                let block: Vec<Vec<f64>> = rows[row_offset..row_offset + len]
                    .iter()
                    .map(|row| row[col_offset..col_offset + len].to_vec())
                    .collect();
                Covariance::from_rows(block)
            }
        };

        self.covariance = extracted;
        self.refresh_derived();
        Ok(())
    }

    fn refresh_derived(&mut self) {
        match &self.covariance {
            Some(covariance) => {
                let rows = covariance.rows();
                self.inv_covariance = numeric::inverse(rows).and_then(Covariance::from_rows);
                if self.inv_covariance.is_none() {
                    log::debug!(
                        "Covariance of dimension {} is singular, no inverse available",
                        covariance.dimension()
                    );
                }
                self.determinant = numeric::determinant(rows);
                let dimension = covariance.dimension();
                self.constant_term = numeric::gaussian_constant(dimension, self.determinant);
                self.constant_term_log = numeric::gaussian_constant_log(dimension, self.determinant);
            }
            None => {
                self.inv_covariance = None;
                self.determinant = 0.0;
                self.constant_term = 0.0;
                self.constant_term_log = 0.0;
            }
        }
    }

    /// Density of `x` under this component.
    ///
    /// A component without mean, covariance or usable inverse has density zero.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `x` and the mean differ in length. Release
    /// builds skip the check and only evaluate the shorter of the two.
    pub fn probability(&self, x: &[f64]) -> f64 {
        let Some(mean) = self.mean.as_deref() else {
            return 0.0;
        };
        debug_assert_eq!(x.len(), mean.len(), "feature vector dimension mismatch");

        match (&self.covariance, &self.inv_covariance) {
            (Some(Covariance::Diagonal(variances)), _) => {
                numeric::gaussian_density_diagonal(x, mean, variances, self.constant_term)
            }
            (Some(Covariance::Full(_)), Some(inverse)) => {
                numeric::gaussian_density_full(x, mean, self.determinant, inverse.rows())
            }
            _ => 0.0,
        }
    }

    /// Log density of `x`, using the log-domain normaliser.
    ///
    /// Returns negative infinity wherever [`probability`](Self::probability)
    /// returns zero for lack of parameters.
    ///
    /// # Panics
    ///
    /// Same dimension check as [`probability`](Self::probability), debug builds only.
    pub fn log_probability(&self, x: &[f64]) -> f64 {
        let Some(mean) = self.mean.as_deref() else {
            return f64::NEG_INFINITY;
        };
        debug_assert_eq!(x.len(), mean.len(), "feature vector dimension mismatch");

        let distance = match (&self.covariance, &self.inv_covariance) {
            (Some(Covariance::Diagonal(variances)), _) => {
                numeric::mahalanobis_diagonal(x, mean, variances)
            }
            (Some(Covariance::Full(_)), Some(inverse)) => {
                numeric::mahalanobis_full(x, mean, inverse.rows())
            }
            _ => return f64::NEG_INFINITY,
        };
        self.constant_term_log - 0.5 * distance
    }

    /// Serialise the component as one codebook record.
    pub fn write<W: Write>(&self, writer: &mut EndianWriter<W>) -> io::Result<()> {
        writer.write_bool(self.is_diagonal())?;

        match &self.mean {
            Some(mean) => {
                writer.write_len(mean.len())?;
                writer.write_f64_slice(mean)?;
            }
            None => writer.write_i32(0)?,
        }

        write_matrix(writer, self.covariance.as_ref())?;
        write_matrix(writer, self.inv_covariance.as_ref())?;

        writer.write_f64(self.determinant)?;
        writer.write_f64(self.constant_term)?;
        writer.write_f64(self.constant_term_log)
    }

    /// Restore a component from one codebook record.
    ///
    /// Nothing is recomputed: the stored inverse, determinant and constants are
    /// taken as written. The leading diagonal flag is read and ignored, the
    /// shape follows from the stored row count.
    pub fn read<R: Read>(reader: &mut EndianReader<R>) -> Result<Self> {
        let _diagonal_flag = reader.read_bool()?;

        let mean_len = read_len(reader, "mean length")?;
        let mean = if mean_len > 0 {
            Some(reader.read_f64_vec(mean_len)?)
        } else {
            None
        };

        let covariance = read_matrix(reader, "covariance")?;
        let inv_covariance = read_matrix(reader, "inverse covariance")?;

        Ok(Self {
            mean,
            covariance,
            inv_covariance,
            determinant: reader.read_f64()?,
            constant_term: reader.read_f64()?,
            constant_term_log: reader.read_f64()?,
        })
    }
}

impl Clone for GaussianComponent {
    /// Deep copy of mean and covariance with freshly derived values.
    fn clone(&self) -> Self {
        let mut component = Self {
            mean: self.mean.clone(),
            covariance: self.covariance.clone(),
            ..Self::default()
        };
        component.refresh_derived();
        component
    }
}

impl From<&Cluster> for GaussianComponent {
    fn from(cluster: &Cluster) -> Self {
        Self::from_cluster(cluster)
    }
}

/// Check `offset + len` against `available`, shrinking `len` in clamp mode.
fn fit(
    len: usize,
    offset: usize,
    available: usize,
    what: RangeTarget,
    mode: ExtractMode,
) -> Result<usize> {
    let room = available.saturating_sub(offset);
    if len <= room {
        return Ok(len);
    }
    match mode {
        ExtractMode::Strict => Err(CodebookError::RangeViolation {
            what,
            offset,
            requested: len,
            available,
        }),
        ExtractMode::Clamp => {
            log::debug!("{what} range {offset}+{len} clamped to {room}");
            Ok(room)
        }
    }
}

fn write_matrix<W: Write>(writer: &mut EndianWriter<W>, matrix: Option<&Covariance>) -> io::Result<()> {
    let Some(matrix) = matrix else {
        return writer.write_i32(0);
    };
    let rows = matrix.rows();
    writer.write_len(rows.len())?;
    for row in rows {
        // An empty row is written as a zero-length hole
        writer.write_len(row.len())?;
        writer.write_f64_slice(row)?;
    }
    Ok(())
}

fn read_len<R: Read>(reader: &mut EndianReader<R>, field: &str) -> Result<usize> {
    let value = reader.read_i32()?;
    usize::try_from(value).map_err(|_| CodebookError::Format(format!("negative {field}: {value}")))
}

fn read_matrix<R: Read>(reader: &mut EndianReader<R>, name: &str) -> Result<Option<Covariance>> {
    let row_count = read_len(reader, &format!("{name} row count"))?;
    let mut rows = Vec::with_capacity(row_count.min(MAX_PREALLOC));
    for _ in 0..row_count {
        let len = read_len(reader, &format!("{name} row length"))?;
        rows.push(reader.read_f64_vec(len)?);
    }
    Ok(Covariance::from_rows(rows))
}
