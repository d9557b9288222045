//! Variant generation: one resized (or untouched) rendition per table entry.

use image::{DynamicImage, GenericImageView};
use std::borrow::Cow;

use crate::config::{BoundingBox, VariantSpec};

/// A rendition of one oriented photo.
pub struct Variant<'a> {
    /// Variant name, also the output subdirectory
    pub name: &'a str,
    /// Borrowed for unbounded variants, owned for resized ones
    pub image: Cow<'a, DynamicImage>,
}

/// Generates the configured variant set from an oriented image.
pub struct VariantGenerator {
    specs: Vec<VariantSpec>,
}

impl VariantGenerator {
    /// Create a generator over an ordered variant table.
    pub fn new(specs: Vec<VariantSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[VariantSpec] {
        &self.specs
    }

    /// Produce every variant, in table order.
    ///
    /// The input is never modified; the unbounded variant borrows it.
    pub fn generate<'a>(&'a self, image: &'a DynamicImage) -> Vec<Variant<'a>> {
        self.specs
            .iter()
            .map(|spec| Variant {
                name: spec.name.as_str(),
                image: match spec.bounds {
                    Some(bounds) => Cow::Owned(fit_within(image, bounds)),
                    None => Cow::Borrowed(image),
                },
            })
            .collect()
    }
}

/// Downscale `image` to fit inside `bounds`, preserving aspect ratio.
///
/// An image already inside the box is copied at its own size; it is never
/// enlarged.
pub fn fit_within(image: &DynamicImage, bounds: BoundingBox) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= bounds.width && height <= bounds.height {
        return image.clone();
    }
    image.thumbnail(bounds.width, bounds.height)
}
