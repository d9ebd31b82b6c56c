//! Buffering of synthesised audio before it is handed on as a stream.
//!
//! An [`AudioDestination`] collects raw bytes either in memory or in a
//! temporary file that is deleted once the data has been consumed. The choice
//! follows [`AudioStore`]; `Auto` starts in memory and moves to disk once the
//! buffer grows past a threshold.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{CodebookError, Result};

/// Buffered size at which an `Auto` destination moves to a temporary file.
pub const AUTO_SPILL_BYTES: usize = 16 * 1024 * 1024;

/// Where an [`AudioDestination`] keeps its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStore {
    #[default]
    Ram,
    File,
    Auto,
}

/// Layout of raw signed PCM data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// 8, 16, 24 or 32.
    pub bits_per_sample: u16,
    pub big_endian: bool,
}

impl AudioFormat {
    /// Bytes per frame (one sample for every channel).
    pub fn frame_size(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize).div_ceil(8)
    }
}

/// Reader over a temporary file that deletes the file when dropped.
struct TempFileReader {
    // Declared first so the handle closes before the file is removed
    reader: BufReader<File>,
    _file: NamedTempFile,
}

impl Read for TempFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

enum Buffer {
    Ram(Vec<u8>),
    File(BufWriter<NamedTempFile>),
}

/// Write target for audio bytes, backed by memory or a temporary file.
pub struct AudioDestination {
    buffer: Buffer,
    spill_threshold: Option<usize>,
    temp_dir: Option<PathBuf>,
}

impl AudioDestination {
    pub fn new(store: AudioStore) -> io::Result<Self> {
        Self::with_spill_threshold(store, AUTO_SPILL_BYTES)
    }

    /// Like [`new`](Self::new) with a custom spill threshold for `Auto`.
    pub fn with_spill_threshold(store: AudioStore, threshold: usize) -> io::Result<Self> {
        Self::build(store, threshold, None)
    }

    /// Like [`with_spill_threshold`](Self::with_spill_threshold), keeping
    /// temporary files in `dir` instead of the system temp directory.
    pub fn with_temp_dir(store: AudioStore, threshold: usize, dir: &Path) -> io::Result<Self> {
        Self::build(store, threshold, Some(dir.to_path_buf()))
    }

    fn build(store: AudioStore, threshold: usize, temp_dir: Option<PathBuf>) -> io::Result<Self> {
        let (buffer, spill_threshold) = match store {
            AudioStore::Ram => (Buffer::Ram(Vec::new()), None),
            AudioStore::Auto => (Buffer::Ram(Vec::new()), Some(threshold)),
            AudioStore::File => (Buffer::File(temp_writer(temp_dir.as_deref())?), None),
        };
        Ok(Self {
            buffer,
            spill_threshold,
            temp_dir,
        })
    }

    pub fn is_in_ram(&self) -> bool {
        matches!(self.buffer, Buffer::Ram(_))
    }

    pub fn is_file(&self) -> bool {
        !self.is_in_ram()
    }

    /// Move the in-memory bytes to a temporary file.
    ///
    /// The memory buffer is only replaced once every byte is on disk, so a
    /// failure leaves the destination as it was.
    fn spill(&mut self) -> io::Result<()> {
        let Buffer::Ram(bytes) = &self.buffer else {
            return Ok(());
        };
        let mut writer = temp_writer(self.temp_dir.as_deref())?;
        writer.write_all(bytes)?;
        log::debug!(
            "Audio buffer reached {} bytes, moving to {}",
            bytes.len(),
            writer.get_ref().path().display()
        );
        self.buffer = Buffer::File(writer);
        self.spill_threshold = None;
        Ok(())
    }

    fn into_reader(self) -> io::Result<(Box<dyn Read + Send>, u64)> {
        match self.buffer {
            Buffer::Ram(bytes) => {
                let len = bytes.len() as u64;
                Ok((Box::new(Cursor::new(bytes)), len))
            }
            Buffer::File(writer) => {
                let file = writer.into_inner().map_err(|e| e.into_error())?;
                let handle = file.reopen()?;
                let len = handle.metadata()?.len();
                let reader = TempFileReader {
                    reader: BufReader::new(handle),
                    _file: file,
                };
                Ok((Box::new(reader), len))
            }
        }
    }

    /// Treat the buffered bytes as raw PCM in `format`.
    pub fn into_stream(self, format: AudioFormat) -> Result<AudioStream> {
        let frame_size = format.frame_size();
        if frame_size == 0 {
            return Err(CodebookError::Config(format!(
                "audio format has no frame size: {format:?}"
            )));
        }
        let (reader, byte_len) = self.into_reader()?;
        Ok(AudioStream {
            format,
            frame_length: byte_len / frame_size as u64,
            reader,
        })
    }

    /// Treat the buffered bytes as a complete WAV file, header included.
    pub fn into_wav_reader(self) -> Result<hound::WavReader<Box<dyn Read + Send>>> {
        let (reader, _) = self.into_reader()?;
        Ok(hound::WavReader::new(reader)?)
    }
}

impl Write for AudioDestination {
    /// An `Auto` destination that cannot move to disk keeps buffering in
    /// memory and retries on the next write.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let over = match (&mut self.buffer, self.spill_threshold) {
            (Buffer::File(writer), _) => return writer.write(buf),
            (Buffer::Ram(bytes), threshold) => {
                bytes.extend_from_slice(buf);
                threshold.is_some_and(|t| bytes.len() > t)
            }
        };
        if over {
            if let Err(e) = self.spill() {
                log::warn!("Failed to move audio buffer to a temporary file: {e}");
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.buffer {
            Buffer::Ram(_) => Ok(()),
            Buffer::File(writer) => writer.flush(),
        }
    }
}

fn temp_writer(dir: Option<&Path>) -> io::Result<BufWriter<NamedTempFile>> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("voice-codebook-").suffix(".pcm");
    let file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    Ok(BufWriter::new(file))
}

/// Raw PCM audio with its format and length in frames.
pub struct AudioStream {
    pub format: AudioFormat,
    pub frame_length: u64,
    reader: Box<dyn Read + Send>,
}

impl AudioStream {
    pub fn duration_secs(&self) -> f64 {
        self.frame_length as f64 / self.format.sample_rate as f64
    }

    /// Write the PCM data as an integer WAV file.
    pub fn write_wav(mut self, path: &Path) -> Result<()> {
        let format = self.format;
        let width = match format.bits_per_sample {
            8 | 16 | 24 | 32 => format.bits_per_sample as usize / 8,
            bits => {
                return Err(CodebookError::Config(format!(
                    "unsupported sample width: {bits} bits"
                )))
            }
        };

        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;

        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        let whole_frames = self.frame_length as usize * format.frame_size();
        for chunk in data[..whole_frames.min(data.len())].chunks_exact(width) {
            writer.write_sample(decode_sample(chunk, format.big_endian))?;
        }
        writer.finalize()?;
        Ok(())
    }
}

impl Read for AudioStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Sign-extend one 1 to 4 byte PCM sample.
fn decode_sample(bytes: &[u8], big_endian: bool) -> i32 {
    let mut value: u32 = 0;
    if big_endian {
        for &b in bytes {
            value = (value << 8) | b as u32;
        }
    } else {
        for &b in bytes.iter().rev() {
            value = (value << 8) | b as u32;
        }
    }
    let shift = 32 - 8 * bytes.len() as u32;
    ((value << shift) as i32) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    const PCM16: AudioFormat = AudioFormat {
        sample_rate: 16000,
        channels: 1,
        bits_per_sample: 16,
        big_endian: false,
    };

    fn pcm16_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn temp_wav(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("voice-codebook-{}-{name}.wav", std::process::id()))
    }

    #[test]
    fn test_decode_sample() {
        assert_eq!(decode_sample(&[0xff, 0x7f], false), i16::MAX as i32);
        assert_eq!(decode_sample(&[0x80, 0x00], true), i16::MIN as i32);
        assert_eq!(decode_sample(&[0xff], false), -1);
        assert_eq!(decode_sample(&[0x00, 0x00, 0x80], false), -(1 << 23));
    }

    #[test]
    fn test_ram_stream() {
        let mut dest = AudioDestination::new(AudioStore::Ram).unwrap();
        assert!(dest.is_in_ram());
        dest.write_all(&pcm16_bytes(&[1, -2, 3])).unwrap();
        // Trailing partial frame
        dest.write_all(&[0x01]).unwrap();

        let mut stream = dest.into_stream(PCM16).unwrap();
        assert_eq!(stream.frame_length, 3);
        let mut data = Vec::new();
        stream.read_to_end(&mut data).unwrap();
        assert_eq!(data.len(), 7);
    }

    #[test]
    fn test_file_store_removes_temp_file() {
        let mut dest = AudioDestination::new(AudioStore::File).unwrap();
        assert!(dest.is_file());
        let path = match &dest.buffer {
            Buffer::File(writer) => writer.get_ref().path().to_path_buf(),
            Buffer::Ram(_) => unreachable!(),
        };
        dest.write_all(&pcm16_bytes(&[5, 6, 7, 8])).unwrap();

        let mut stream = dest.into_stream(PCM16).unwrap();
        assert_eq!(stream.frame_length, 4);
        let mut data = Vec::new();
        stream.read_to_end(&mut data).unwrap();
        assert_eq!(data, pcm16_bytes(&[5, 6, 7, 8]));
        assert!(path.exists());

        drop(stream);
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_spill_keeps_buffered_bytes() {
        let missing = std::env::temp_dir().join(format!(
            "voice-codebook-missing-{}/nested",
            std::process::id()
        ));
        let mut dest = AudioDestination::with_temp_dir(AudioStore::Auto, 4, &missing).unwrap();
        dest.write_all(&pcm16_bytes(&[1, 2])).unwrap();
        assert_eq!(dest.write(&pcm16_bytes(&[3])).unwrap(), 2);
        assert!(dest.is_in_ram());
        dest.write_all(&pcm16_bytes(&[4])).unwrap();

        let mut stream = dest.into_stream(PCM16).unwrap();
        assert_eq!(stream.frame_length, 4);
        let mut data = Vec::new();
        stream.read_to_end(&mut data).unwrap();
        assert_eq!(data, pcm16_bytes(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_spill_into_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut dest = AudioDestination::with_temp_dir(AudioStore::Auto, 2, dir.path()).unwrap();
        dest.write_all(&pcm16_bytes(&[7, 8])).unwrap();
        assert!(dest.is_file());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        drop(dest);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_auto_spills_past_threshold() {
        let mut dest = AudioDestination::with_spill_threshold(AudioStore::Auto, 8).unwrap();
        dest.write_all(&pcm16_bytes(&[1, 2, 3, 4])).unwrap();
        assert!(dest.is_in_ram());
        dest.write_all(&pcm16_bytes(&[5])).unwrap();
        assert!(dest.is_file());
        dest.write_all(&pcm16_bytes(&[6])).unwrap();

        let mut stream = dest.into_stream(PCM16).unwrap();
        assert_eq!(stream.frame_length, 6);
        let mut data = Vec::new();
        stream.read_to_end(&mut data).unwrap();
        assert_eq!(data, pcm16_bytes(&[1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_write_wav() {
        let samples = [0i16, 1000, -1000, i16::MAX, i16::MIN];
        let mut dest = AudioDestination::new(AudioStore::Ram).unwrap();
        dest.write_all(&pcm16_bytes(&samples)).unwrap();

        let path = temp_wav("write");
        dest.into_stream(PCM16).unwrap().write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        let back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(back, samples);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wav_reader_from_buffered_file() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut wav = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut wav, spec).unwrap();
            for s in [10i16, -20, 30] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }

        let mut dest = AudioDestination::new(AudioStore::File).unwrap();
        dest.write_all(wav.get_ref()).unwrap();
        let mut reader = dest.into_wav_reader().unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        let back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(back, vec![10, -20, 30]);
    }

    #[test]
    fn test_store_names() {
        let store: AudioStore = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(store, AudioStore::Auto);
        assert_eq!(AudioStore::default(), AudioStore::Ram);
    }
}
