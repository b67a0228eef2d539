use anyhow::Result;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkers_common::{Frame, StreamHeader};

/// The frame-submission boundary between the simulation core and the
/// rendering/encoding collaborator. Session-scoped: opened once before the
/// tick loop, finalized once after, on every exit path. Implementations must
/// treat submissions as append-only and order-sensitive.
pub trait FrameSink {
    fn submit_frame(&mut self, tick: u32, red: &[(f32, f32)], blue: &[(f32, f32)]) -> Result<()>;

    /// Flushes and closes the output artifact. Idempotent.
    fn finalize(&mut self) -> Result<()>;
}

/// Frame stream encodings the engine can produce. The visualizer consumes
/// the binary stream; the JSON-lines stream is for inspection and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    Bincode,
    JsonLines,
}

impl StreamFormat {
    pub fn from_config(format: Option<&str>) -> Result<Self> {
        match format {
            None | Some("bincode") => Ok(StreamFormat::Bincode),
            Some("jsonl") => Ok(StreamFormat::JsonLines),
            Some(other) => anyhow::bail!("Unknown frame stream format: '{}'.", other),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            StreamFormat::Bincode => "bin",
            StreamFormat::JsonLines => "jsonl",
        }
    }
}

/// Streams one serialized `Frame` per tick to a buffered file, header first.
pub struct StreamSink {
    path: PathBuf,
    writer: BufWriter<File>,
    format: StreamFormat,
    frames_written: u32,
    finalized: bool,
}

impl StreamSink {
    /// Opens the output file and writes the stream header.
    pub fn create<P: AsRef<Path>>(path: P, header: &StreamHeader, format: StreamFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create frame stream '{}': {}", path.display(), e))?;
        let mut writer = BufWriter::new(file);
        match format {
            StreamFormat::Bincode => bincode::serialize_into(&mut writer, header)?,
            StreamFormat::JsonLines => {
                serde_json::to_writer(&mut writer, header)?;
                writer.write_all(b"\n")?;
            }
        }
        info!("Opened frame stream {} ({:?}).", path.display(), format);
        Ok(Self { path, writer, format, frames_written: 0, finalized: false })
    }
}

impl FrameSink for StreamSink {
    fn submit_frame(&mut self, tick: u32, red: &[(f32, f32)], blue: &[(f32, f32)]) -> Result<()> {
        let frame = Frame {
            tick,
            red: red.to_vec(),
            blue: blue.to_vec(),
        };
        match self.format {
            StreamFormat::Bincode => bincode::serialize_into(&mut self.writer, &frame)?,
            StreamFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &frame)?;
                self.writer.write_all(b"\n")?;
            }
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.writer.flush()?;
        self.finalized = true;
        info!(
            "Frame stream {} finalized with {} frames.",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use walkers_common::Domain;

    fn test_header() -> StreamHeader {
        StreamHeader {
            domain: Domain::new(0.0, 10.0, 0.0, 10.0).unwrap(),
            frame_rate: 15,
            count_red: 2,
            count_blue: 1,
            total_ticks: 3,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("walkers-sink-test-{}-{}", std::process::id(), name));
        path
    }

    #[test]
    fn test_bincode_stream_round_trip() {
        let path = temp_path("roundtrip.bin");
        let header = test_header();
        {
            let mut sink = StreamSink::create(&path, &header, StreamFormat::Bincode).unwrap();
            for tick in 1..=3u32 {
                let red = vec![(1.0 + tick as f32, 2.0), (3.0, 4.0)];
                let blue = vec![(5.0, 6.0 - tick as f32)];
                sink.submit_frame(tick, &red, &blue).unwrap();
            }
            sink.finalize().unwrap();
            assert_eq!(sink.frames_written, 3);
        }

        let file = File::open(&path).unwrap();
        let mut reader = BufReader::new(file);
        let read_header: StreamHeader = bincode::deserialize_from(&mut reader).unwrap();
        assert_eq!(read_header.total_ticks, 3);
        assert_eq!(read_header.count_red, 2);
        for tick in 1..=3u32 {
            let frame: Frame = bincode::deserialize_from(&mut reader).unwrap();
            assert_eq!(frame.tick, tick);
            assert_eq!(frame.red.len(), 2);
            assert_eq!(frame.blue.len(), 1);
            assert_eq!(frame.red[0].0, 1.0 + tick as f32);
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_jsonl_stream_is_one_record_per_line() {
        let path = temp_path("stream.jsonl");
        let header = test_header();
        {
            let mut sink = StreamSink::create(&path, &header, StreamFormat::JsonLines).unwrap();
            sink.submit_frame(1, &[(4.5, 5.5)], &[(5.0, 5.0)]).unwrap();
            sink.submit_frame(2, &[(4.6, 5.4)], &[(5.1, 4.9)]).unwrap();
            sink.finalize().unwrap();
        }

        let reader = BufReader::new(File::open(&path).unwrap());
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 3); // header + 2 frames
        let frame: Frame = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(frame.tick, 1);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let path = temp_path("idempotent.bin");
        let mut sink = StreamSink::create(&path, &test_header(), StreamFormat::Bincode).unwrap();
        sink.finalize().unwrap();
        sink.finalize().unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(StreamFormat::from_config(Some("messagepack")).is_err());
        assert_eq!(StreamFormat::from_config(None).unwrap(), StreamFormat::Bincode);
        assert_eq!(StreamFormat::from_config(Some("jsonl")).unwrap(), StreamFormat::JsonLines);
    }
}
