//! Resolution of the classifier's physical input order.
//!
//! Graph conversion can reorder declared inputs, and both slots may carry
//! ambiguous shapes afterwards, so roles are identified by name. Unknown
//! names fall back to image-first ordering and report it.

use tracing::warn;

use crate::domain::{ClassifierInputDescriptor, PredictError};

/// Name token identifying the image input (`img_input` in the trained model).
pub const IMAGE_INPUT_TOKEN: &str = "img_input";

/// Name token identifying the EAR input.
pub const EAR_INPUT_TOKEN: &str = "ear_input";

/// How a binding was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMethod {
    /// Slot 0's name carries the image token.
    ImageNameMatch,
    /// Slot 0's name carries the EAR token.
    EarNameMatch,
    /// Neither token found; image-first order assumed.
    Fallback,
}

/// Physical slot assignment for the two classifier inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBinding {
    /// Slot receiving the image tensor.
    pub image_slot: usize,
    /// Slot receiving the scaled EAR tensor.
    pub ear_slot: usize,
    /// Which rule produced this binding.
    pub method: BindingMethod,
}

impl InputBinding {
    /// Returns true if the name heuristics failed and the default was used.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.method == BindingMethod::Fallback
    }
}

/// Decides which slot takes the image and which the EAR from declared names.
///
/// Rules, in order: slot 0 named like the image input; slot 0 named like the
/// EAR input; otherwise image = 0, EAR = 1 with a warning. Matching is a
/// case-insensitive substring test. Only the names of the first two
/// descriptors are consulted.
#[must_use]
pub fn resolve_input_binding(descriptors: &[ClassifierInputDescriptor]) -> InputBinding {
    let name_of = |slot: usize| {
        descriptors
            .iter()
            .find(|d| d.index == slot)
            .map_or("", |d| d.name.as_str())
    };
    let first = name_of(0).to_lowercase();

    if first.contains(IMAGE_INPUT_TOKEN) {
        InputBinding {
            image_slot: 0,
            ear_slot: 1,
            method: BindingMethod::ImageNameMatch,
        }
    } else if first.contains(EAR_INPUT_TOKEN) {
        InputBinding {
            image_slot: 1,
            ear_slot: 0,
            method: BindingMethod::EarNameMatch,
        }
    } else {
        warn!(
            input0 = name_of(0),
            input1 = name_of(1),
            "Classifier input names not recognized, assuming image=0, ear=1"
        );
        InputBinding {
            image_slot: 0,
            ear_slot: 1,
            method: BindingMethod::Fallback,
        }
    }
}

/// Checks that the classifier declares exactly two slots, indexed 0 and 1,
/// one image-shaped (rank 4) and one scalar-shaped (rank 2).
///
/// # Errors
///
/// Returns [`PredictError::Internal`] describing the malformed metadata.
pub fn validate_descriptors(descriptors: &[ClassifierInputDescriptor]) -> Result<(), PredictError> {
    if descriptors.len() != 2 {
        return Err(PredictError::Internal(format!(
            "classifier must declare exactly 2 inputs, found {}",
            descriptors.len()
        )));
    }

    let mut indices: Vec<usize> = descriptors.iter().map(|d| d.index).collect();
    indices.sort_unstable();
    if indices != [0, 1] {
        return Err(PredictError::Internal(format!(
            "classifier input slots must be 0 and 1, found {indices:?}"
        )));
    }

    let images = descriptors.iter().filter(|d| d.is_image_shaped()).count();
    let scalars = descriptors.iter().filter(|d| d.is_scalar_shaped()).count();
    if images != 1 || scalars != 1 {
        let shapes: Vec<_> = descriptors.iter().map(|d| (&d.name, &d.shape)).collect();
        return Err(PredictError::Internal(format!(
            "classifier needs one 4-D image input and one 2-D scalar input, got {shapes:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ElementType;

    fn image(index: usize, name: &str) -> ClassifierInputDescriptor {
        ClassifierInputDescriptor::new(
            index,
            name,
            vec![None, Some(128), Some(128), Some(3)],
            ElementType::F32,
        )
    }

    fn scalar(index: usize, name: &str) -> ClassifierInputDescriptor {
        ClassifierInputDescriptor::new(index, name, vec![None, Some(1)], ElementType::F32)
    }

    #[test]
    fn test_image_first_by_name() {
        let binding = resolve_input_binding(&[image(0, "img_input"), scalar(1, "ear_input")]);
        assert_eq!(binding.image_slot, 0);
        assert_eq!(binding.ear_slot, 1);
        assert_eq!(binding.method, BindingMethod::ImageNameMatch);
        assert!(!binding.is_fallback());
    }

    #[test]
    fn test_ear_first_by_name() {
        let binding = resolve_input_binding(&[scalar(0, "ear_input"), image(1, "img_input")]);
        assert_eq!(binding.image_slot, 1);
        assert_eq!(binding.ear_slot, 0);
        assert_eq!(binding.method, BindingMethod::EarNameMatch);
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let binding = resolve_input_binding(&[image(0, "foo"), scalar(1, "bar")]);
        assert_eq!(binding.image_slot, 0);
        assert_eq!(binding.ear_slot, 1);
        assert!(binding.is_fallback());
    }

    #[test]
    fn test_case_insensitive_with_export_prefix() {
        let binding = resolve_input_binding(&[
            scalar(0, "serving_default_EAR_INPUT:0"),
            image(1, "serving_default_img_input:0"),
        ]);
        assert_eq!(binding.method, BindingMethod::EarNameMatch);
        assert_eq!(binding.image_slot, 1);
    }

    #[test]
    fn test_uses_slot_index_not_list_position() {
        let binding = resolve_input_binding(&[image(1, "img_input"), scalar(0, "ear_input")]);
        assert_eq!(binding.ear_slot, 0);
        assert_eq!(binding.image_slot, 1);
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(validate_descriptors(&[scalar(0, "a"), image(1, "b")]).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_count() {
        let err = validate_descriptors(&[image(0, "img_input")]);
        assert!(matches!(err, Err(PredictError::Internal(_))));

        let err = validate_descriptors(&[image(0, "a"), scalar(1, "b"), scalar(2, "c")]);
        assert!(err.is_err());
    }

    #[test]
    fn test_validate_rejects_two_images() {
        let err = validate_descriptors(&[image(0, "a"), image(1, "b")]);
        assert!(err.is_err_and(|e| e.to_string().contains("4-D")));
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let err = validate_descriptors(&[image(0, "a"), scalar(2, "b")]);
        assert!(err.is_err());
    }
}
