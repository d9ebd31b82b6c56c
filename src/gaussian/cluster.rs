/// Mean and covariance produced by offline clustering.
///
/// The covariance follows the component convention: one row holds a diagonal
/// variance vector, `D` rows hold a full `D × D` matrix. A component copies
/// these values once and keeps no reference to the cluster.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cluster {
    pub mean: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
}

impl Cluster {
    pub fn new(mean: Vec<f64>, covariance: Vec<Vec<f64>>) -> Self {
        Self { mean, covariance }
    }

    /// Cluster with a diagonal covariance given by `variances`.
    pub fn diagonal(mean: Vec<f64>, variances: Vec<f64>) -> Self {
        Self {
            mean,
            covariance: vec![variances],
        }
    }

    pub fn dimension(&self) -> usize {
        self.mean.len()
    }
}
