use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::gaussian::GaussianComponent;
use crate::stream::{ByteOrder, EndianReader, EndianWriter, MAX_PREALLOC};

/// An indexed collection of Gaussian components.
///
/// Records are stored back to back. How many records a file holds is decided
/// by whoever frames the file, so reading takes an explicit count.
///
/// A codebook is only read after loading; share it behind an `Arc` once every
/// component has been set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Codebook {
    components: Vec<GaussianComponent>,
}

impl Codebook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[GaussianComponent] {
        &self.components
    }

    pub fn get(&self, index: usize) -> Option<&GaussianComponent> {
        self.components.get(index)
    }

    pub fn push(&mut self, component: GaussianComponent) {
        self.components.push(component);
    }

    /// Read `count` consecutive component records.
    pub fn read_from<R: Read>(reader: &mut EndianReader<R>, count: usize) -> Result<Self> {
        let mut components = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            components.push(GaussianComponent::read(reader)?);
        }
        Ok(Self { components })
    }

    /// Write every component record in index order.
    pub fn write_to<W: Write>(&self, writer: &mut EndianWriter<W>) -> io::Result<()> {
        for component in &self.components {
            component.write(writer)?;
        }
        Ok(())
    }

    /// Load `count` records from the start of the file at `path`.
    pub fn load(path: &Path, count: usize, order: ByteOrder) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = EndianReader::new(BufReader::new(file), order);
        let codebook = Self::read_from(&mut reader, count)?;
        log::info!(
            "Loaded {} Gaussian components from {}",
            codebook.len(),
            path.display()
        );
        Ok(codebook)
    }

    pub fn save(&self, path: &Path, order: ByteOrder) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = EndianWriter::new(BufWriter::new(file), order);
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::info!("Saved {} Gaussian components to {}", self.len(), path.display());
        Ok(())
    }

    /// Density of `x` under every component, in index order.
    pub fn probabilities(&self, x: &[f64]) -> Vec<f64> {
        self.components.iter().map(|c| c.probability(x)).collect()
    }

    /// Density of `x` under the candidate components only.
    ///
    /// Candidates are typically the contextual neighbourhood picked by the
    /// mapper. Indices past the end of the codebook are skipped.
    pub fn probabilities_for(&self, x: &[f64], candidates: &[usize]) -> Vec<(usize, f64)> {
        candidates
            .iter()
            .filter_map(|&i| self.components.get(i).map(|c| (i, c.probability(x))))
            .collect()
    }
}

impl FromIterator<GaussianComponent> for Codebook {
    fn from_iter<I: IntoIterator<Item = GaussianComponent>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Codebook {
    type Item = &'a GaussianComponent;
    type IntoIter = std::slice::Iter<'a, GaussianComponent>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Codebook {
        vec![
            GaussianComponent::from_parts(&[0.0, 0.0], &[vec![1.0, 1.0]]),
            GaussianComponent::from_parts(&[3.0, 3.0], &[vec![1.0, 0.3], vec![0.3, 2.0]]),
            GaussianComponent::new(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_stream_round_trip() {
        let codebook = sample();
        let mut writer = EndianWriter::new(Vec::new(), ByteOrder::Big);
        codebook.write_to(&mut writer).unwrap();

        let mut reader = EndianReader::new(Cursor::new(writer.into_inner()), ByteOrder::Big);
        let back = Codebook::read_from(&mut reader, codebook.len()).unwrap();
        assert_eq!(back, codebook);
    }

    #[test]
    fn test_short_stream_fails() {
        let codebook = sample();
        let mut writer = EndianWriter::new(Vec::new(), ByteOrder::Big);
        codebook.write_to(&mut writer).unwrap();

        let mut reader = EndianReader::new(Cursor::new(writer.into_inner()), ByteOrder::Big);
        assert!(Codebook::read_from(&mut reader, 4).is_err());
    }

    #[test]
    fn test_probabilities_for_candidates() {
        let codebook = sample();
        let x = [0.0, 0.0];
        let all = codebook.probabilities(&x);
        assert_eq!(all.len(), 3);
        assert!(all[0] > all[1]);
        assert_eq!(all[2], 0.0);

        let picked = codebook.probabilities_for(&x, &[1, 7, 0]);
        assert_eq!(picked, vec![(1, all[1]), (0, all[0])]);
    }

    #[test]
    fn test_codebook_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codebook>();
    }
}
