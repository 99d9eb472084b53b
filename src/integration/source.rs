//! Trait for frame sources.

use ndarray::{Array2, Array3, Axis};

/// Trait for ordered, finite frame sequences.
///
/// Implement this trait to feed decoded video frames to the pipeline.
///
/// # Example
///
/// ```ignore
/// use densetrack_rs::FrameSource;
/// use ndarray::Array3;
///
/// struct MyDecoder {
///     // Your decoder here
/// }
///
/// impl FrameSource for MyDecoder {
///     type Error = std::io::Error;
///
///     fn next_frame(&mut self) -> Result<Option<Array3<u8>>, Self::Error> {
///         // Decode the next frame, or return Ok(None) at end of stream
///         Ok(None)
///     }
/// }
/// ```
pub trait FrameSource {
    /// Error type for decoding failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Next frame as `(height, width, channels)`, with channels in RGB(A)
    /// order or a single gray channel. `Ok(None)` ends the stream.
    fn next_frame(&mut self) -> Result<Option<Array3<u8>>, Self::Error>;
}

/// Frame source backed by an iterator of in-memory frames.
#[derive(Debug, Clone)]
pub struct IterFrames<I> {
    frames: I,
}

impl<I> IterFrames<I>
where
    I: Iterator<Item = Array3<u8>>,
{
    pub fn new<T>(frames: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl<I> FrameSource for IterFrames<I>
where
    I: Iterator<Item = Array3<u8>>,
{
    type Error = std::convert::Infallible;

    fn next_frame(&mut self) -> Result<Option<Array3<u8>>, Self::Error> {
        Ok(self.frames.next())
    }
}

/// Wrap a grayscale image as a single-channel frame.
pub fn gray_frame(image: Array2<u8>) -> Array3<u8> {
    image.insert_axis(Axis(2))
}
