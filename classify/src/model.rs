use std::fmt;
use std::str::FromStr;

use anyhow::{Context, bail, ensure};
use tract_onnx::prelude::*;

use crate::source::Source;

/// Anything turning a preprocessed image tensor into one score per class.
pub trait Classifier: fmt::Debug + Send + Sync {
    fn logits(&self, input: Tensor) -> TractResult<Vec<f32>>;
}

/// How far tract transforms the network before running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Optimization {
    /// Typed model, no graph rewriting.
    Plain,
    Decluttered,
    #[default]
    Optimized,
}

impl FromStr for Optimization {
    type Err = TractError;

    fn from_str(s: &str) -> TractResult<Optimization> {
        match s {
            "plain" => Ok(Optimization::Plain),
            "declutter" | "decluttered" => Ok(Optimization::Decluttered),
            "optimize" | "optimized" => Ok(Optimization::Optimized),
            _ => bail!("Unknown optimization level {s:?} (expected plain, declutter or optimize)"),
        }
    }
}

/// A pretrained ONNX network run by tract.
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    optimization: Optimization,
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("nodes", &self.plan.model().nodes().len())
            .field("optimization", &self.optimization)
            .finish()
    }
}

impl OnnxClassifier {
    pub fn load(
        source: &Source,
        input_shape: [usize; 4],
        optimization: Optimization,
    ) -> TractResult<OnnxClassifier> {
        let bytes = source.fetch_cached()?;
        Self::for_bytes(&bytes, input_shape, optimization)
            .with_context(|| format!("Loading model {source}"))
    }

    pub fn for_bytes(
        bytes: &[u8],
        input_shape: [usize; 4],
        optimization: Optimization,
    ) -> TractResult<OnnxClassifier> {
        let start = std::time::Instant::now();
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))?
            .with_input_fact(0, f32::fact(input_shape).into())?;
        let typed = match optimization {
            Optimization::Plain => model.into_typed()?,
            Optimization::Decluttered => model.into_typed()?.into_decluttered()?,
            Optimization::Optimized => model.into_optimized()?,
        };
        let classifier = Self::for_typed_model(typed, optimization)?;
        info!("Model ready ({optimization:?}) in {:?}", start.elapsed());
        Ok(classifier)
    }

    pub fn for_typed_model(
        model: TypedModel,
        optimization: Optimization,
    ) -> TractResult<OnnxClassifier> {
        ensure!(model.input_outlets()?.len() == 1, "Expected a network with a single input");
        ensure!(!model.output_outlets()?.is_empty(), "Network has no output");
        debug!("Network has {} nodes", model.nodes().len());
        let plan = model.into_runnable()?;
        Ok(OnnxClassifier { plan, optimization })
    }

    pub fn optimization(&self) -> Optimization {
        self.optimization
    }
}

impl Classifier for OnnxClassifier {
    fn logits(&self, input: Tensor) -> TractResult<Vec<f32>> {
        let start = std::time::Instant::now();
        let outputs = self.plan.run(tvec!(input.into()))?;
        info!("Forward pass in {:?}", start.elapsed());
        let output = outputs.first().context("Network produced no output")?;
        ensure!(
            output.datum_type().is_float(),
            "Expected float logits, got {:?}",
            output.datum_type()
        );
        let logits = output.cast_to::<f32>()?.as_slice::<f32>()?.to_vec();
        ensure!(!logits.is_empty(), "Network produced an empty output {:?}", output.shape());
        trace!("Logits shape {:?}", output.shape());
        Ok(logits)
    }
}
