//! Trajectory sinks.

use std::io::Write;

use crate::error::SinkError;
use crate::tracker::Trajectory;

/// Receiver of emitted trajectories.
pub trait TrajectorySink {
    /// Error type for storage failures.
    type Error: std::error::Error + Send + Sync + 'static;

    fn emit(&mut self, trajectory: Trajectory) -> Result<(), Self::Error>;

    /// Called once when the pipeline reaches the end of the stream.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl TrajectorySink for Vec<Trajectory> {
    type Error = std::convert::Infallible;

    fn emit(&mut self, trajectory: Trajectory) -> Result<(), Self::Error> {
        self.push(trajectory);
        Ok(())
    }
}

/// Writes one JSON object per trajectory, newline separated.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of trajectories written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TrajectorySink for JsonLinesSink<W> {
    type Error = SinkError;

    fn emit(&mut self, trajectory: Trajectory) -> Result<(), Self::Error> {
        serde_json::to_writer(&mut self.writer, &trajectory)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.writer.flush()?;
        Ok(())
    }
}
