use crate::models::ReferenceImage;

/// Ordered collection of reference images; insertion order is display
/// order and the order sent to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceStore {
    images: Vec<ReferenceImage>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, images: impl IntoIterator<Item = ReferenceImage>) {
        self.images.extend(images);
    }

    /// Removes the image with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|image| image.id != id);
        self.images.len() != before
    }

    pub fn images(&self) -> &[ReferenceImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
