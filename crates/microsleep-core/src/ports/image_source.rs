//! Image source port for batch prediction.

/// Raw bytes of one image plus where they came from.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Display path or identifier.
    pub path: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Port for loading images from a source.
pub trait ImageSource: Send + Sync {
    /// Returns an iterator over images from this source.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if an image fails to load.
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<ImageInput>> + Send + '_>;

    /// Returns the total number of images, if known.
    fn count_hint(&self) -> Option<usize>;
}
