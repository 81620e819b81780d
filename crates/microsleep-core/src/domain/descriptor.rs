//! Classifier input slot metadata.

use std::fmt;

use super::FloatTensor;

/// Declared numeric type of a classifier input.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// 32-bit float.
    F32,
    /// 16-bit float.
    F16,
    /// 64-bit float.
    F64,
    /// Unsigned 8-bit (quantized).
    U8,
    /// Signed 8-bit (quantized).
    I8,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Anything else the engine reports.
    Other,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F32 => "float32",
            Self::F16 => "float16",
            Self::F64 => "float64",
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Metadata for one classifier input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierInputDescriptor {
    /// Physical slot index.
    pub index: usize,
    /// Declared name (may carry export prefixes such as `serving_default_`).
    pub name: String,
    /// Declared shape; `None` marks a symbolic/dynamic dimension.
    pub shape: Vec<Option<usize>>,
    /// Declared element type.
    pub element_type: ElementType,
}

impl ClassifierInputDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        index: usize,
        name: impl Into<String>,
        shape: Vec<Option<usize>>,
        element_type: ElementType,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            shape,
            element_type,
        }
    }

    /// Number of declared dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// A batched image input: `(batch, height, width, channels)`.
    #[must_use]
    pub fn is_image_shaped(&self) -> bool {
        self.rank() == 4
    }

    /// A batched scalar feature input: `(batch, features)`.
    #[must_use]
    pub fn is_scalar_shaped(&self) -> bool {
        self.rank() == 2
    }

    /// Checks that `tensor` can be fed to this slot as-is.
    ///
    /// Symbolic dimensions match anything.
    ///
    /// # Errors
    ///
    /// Returns a description of the first mismatch.
    pub fn check_compatible(&self, tensor: &FloatTensor) -> Result<(), String> {
        if self.element_type != ElementType::F32 {
            return Err(format!(
                "input '{}' declares {} but prepared tensor is float32",
                self.name, self.element_type
            ));
        }
        if self.rank() != tensor.shape().len() {
            return Err(format!(
                "input '{}' declares rank {} but prepared tensor has shape {:?}",
                self.name,
                self.rank(),
                tensor.shape()
            ));
        }
        for (axis, (declared, actual)) in self.shape.iter().zip(tensor.shape()).enumerate() {
            if let Some(declared) = declared {
                if declared != actual {
                    return Err(format!(
                        "input '{}' axis {axis} declares {declared} but prepared tensor has {actual}",
                        self.name
                    ));
                }
            }
        }
        Ok(())
    }
}
