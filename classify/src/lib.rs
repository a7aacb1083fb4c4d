#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate log;

pub mod cache;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod ranking;
pub mod render;
pub mod source;

pub use tract_onnx;

pub mod prelude {
    pub use crate::labels::ClassTable;
    pub use crate::model::{Classifier, OnnxClassifier, Optimization};
    pub use crate::pipeline::Pipeline;
    pub use crate::preprocess::Preprocessing;
    pub use crate::ranking::{Prediction, Predictions};
    pub use crate::source::Source;
    pub use tract_onnx::prelude::{TractResult, Tensor};
}

#[cfg(test)]
pub(crate) fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("CLASSIFY_LOG").try_init();
}
