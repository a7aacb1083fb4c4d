use anyhow::Context;
use tract_onnx::prelude::*;

use crate::labels::ClassTable;
use crate::model::{Classifier, OnnxClassifier, Optimization};
use crate::preprocess::{self, Preprocessing};
use crate::ranking::Predictions;
use crate::source::Source;

/// Image bytes in, ranked predictions out.
#[derive(Debug, new)]
pub struct Pipeline<C: Classifier> {
    pub preprocessing: Preprocessing,
    pub classifier: C,
    pub labels: ClassTable,
}

impl Pipeline<OnnxClassifier> {
    /// Loads an ImageNet network and its label table with the default preprocessing.
    pub fn imagenet(
        model: &Source,
        labels: &Source,
        optimization: Optimization,
    ) -> TractResult<Pipeline<OnnxClassifier>> {
        let preprocessing = Preprocessing::default();
        let classifier = OnnxClassifier::load(model, preprocessing.input_shape(), optimization)?;
        let labels = ClassTable::load(labels)?;
        Ok(Pipeline::new(preprocessing, classifier, labels))
    }
}

impl<C: Classifier> Pipeline<C> {
    pub fn classify_tensor(&self, input: Tensor) -> TractResult<Predictions> {
        let logits = self.classifier.logits(input)?;
        debug!("Got {} scores", logits.len());
        Predictions::new(&logits, &self.labels)
    }

    pub fn classify_bytes(&self, bytes: &[u8]) -> TractResult<Predictions> {
        let image = preprocess::decode(bytes)?;
        debug!("Decoded {}x{} image", image.width(), image.height());
        let input = self.preprocessing.to_tensor(&image)?;
        self.classify_tensor(input)
    }

    /// Images are never cached: they are fetched each time.
    pub fn classify(&self, image: &Source) -> TractResult<Predictions> {
        let bytes = image.fetch()?;
        info!("Classifying {image} ({} bytes)", bytes.len());
        self.classify_bytes(&bytes).with_context(|| format!("Classifying {image}"))
    }
}
