//! Scoring Models

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Shape problems in an inline network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("network has no layers")]
    Empty,
    #[error("first layer has no inputs")]
    NoInputs,
    #[error("layer {0} has no outputs")]
    NoOutputs(usize),
    #[error("layer {layer} has {bias} bias terms for {outputs} outputs")]
    BiasMismatch {
        layer: usize,
        bias: usize,
        outputs: usize,
    },
    #[error("layer {0} has ragged weight rows")]
    RaggedWeights(usize),
    #[error("layer {0} has non-finite parameters")]
    NonFinite(usize),
    #[error("layer {layer} emits {emits} values but the next layer expects {expects}")]
    Unchained {
        layer: usize,
        emits: usize,
        expects: usize,
    },
    #[error("final layer must have 1 output, got {0}")]
    MultipleOutputs(usize),
}

/// Layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

/// Fully connected layer. `weights` is `outputs x inputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn inputs(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    pub fn outputs(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let z: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b;
                self.activation.apply(z)
            })
            .collect()
    }
}

/// Feed-forward network stored inline in the bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Build a network, checking that layer shapes chain and end in one output
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self, NetworkError> {
        let first = layers.first().ok_or(NetworkError::Empty)?;
        if first.inputs() == 0 {
            return Err(NetworkError::NoInputs);
        }

        for (idx, layer) in layers.iter().enumerate() {
            if layer.outputs() == 0 {
                return Err(NetworkError::NoOutputs(idx));
            }
            if layer.bias.len() != layer.outputs() {
                return Err(NetworkError::BiasMismatch {
                    layer: idx,
                    bias: layer.bias.len(),
                    outputs: layer.outputs(),
                });
            }
            if layer.weights.iter().any(|row| row.len() != layer.inputs()) {
                return Err(NetworkError::RaggedWeights(idx));
            }
            let values = layer.weights.iter().flatten().chain(&layer.bias);
            if values.into_iter().any(|v| !v.is_finite()) {
                return Err(NetworkError::NonFinite(idx));
            }
        }

        for (idx, pair) in layers.windows(2).enumerate() {
            if pair[0].outputs() != pair[1].inputs() {
                return Err(NetworkError::Unchained {
                    layer: idx,
                    emits: pair[0].outputs(),
                    expects: pair[1].inputs(),
                });
            }
        }

        let outputs = layers.last().map(DenseLayer::outputs).unwrap_or(0);
        if outputs != 1 {
            return Err(NetworkError::MultipleOutputs(outputs));
        }

        Ok(Self { layers })
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map(DenseLayer::inputs).unwrap_or(0)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Forward pass returning the single output unit
    pub fn forward(&self, input: &[f64]) -> f64 {
        let output = self
            .layers
            .iter()
            .fold(input.to_vec(), |acc, layer| layer.forward(&acc));
        output.first().copied().unwrap_or(f64::NAN)
    }
}

/// ONNX graph compiled with tract
pub struct OnnxModel {
    path: PathBuf,
    input_width: usize,
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxModel {
    /// Load and optimize an ONNX graph taking a `[1, input_width]` f32 tensor
    pub fn load(path: &Path, input_width: usize) -> Result<Self, InferenceError> {
        if !path.exists() {
            return Err(InferenceError::ArtifactMissing(path.to_path_buf()));
        }
        info!(path = %path.display(), input_width, "Loading ONNX model");

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, input_width]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ArtifactCorrupt {
                path: path.to_path_buf(),
                reason: format!("{e:#}"),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            input_width,
            plan,
        })
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the graph and read the positive-class probability
    pub fn predict(&self, input: &[f64]) -> Result<f64, InferenceError> {
        let data: Vec<f32> = input.iter().map(|&v| v as f32).collect();
        let tensor = Tensor::from_shape(&[1, data.len()], &data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        // [1, 1] holds the probability itself; [1, 2] holds both classes
        let classes = view.shape().last().copied().unwrap_or(0);
        let value = match classes {
            0 => None,
            1 => view.iter().next().copied(),
            _ => view.iter().nth(1).copied(),
        };
        value
            .map(f64::from)
            .ok_or_else(|| InferenceError::InferenceFailed("empty model output".to_string()))
    }
}

impl fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModel")
            .field("path", &self.path)
            .field("input_width", &self.input_width)
            .finish()
    }
}

/// Serialized model description under the bundle's `model` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSpec {
    /// Weights stored inline
    Dense { layers: Vec<DenseLayer> },
    /// ONNX file, relative paths resolve against the bundle's directory
    Onnx { path: PathBuf },
}

/// Model ready for inference
#[derive(Debug)]
pub enum ScoringModel {
    Dense(DenseNetwork),
    Onnx(OnnxModel),
}

impl ScoringModel {
    /// Materialize a spec read from `bundle_path`. ONNX graphs are fixed to
    /// `input_width` features and resolve relative to the bundle's directory.
    pub fn from_spec(
        spec: ModelSpec,
        bundle_path: &Path,
        input_width: usize,
    ) -> Result<Self, InferenceError> {
        match spec {
            ModelSpec::Dense { layers } => DenseNetwork::new(layers)
                .map(ScoringModel::Dense)
                .map_err(|e| InferenceError::ArtifactCorrupt {
                    path: bundle_path.to_path_buf(),
                    reason: format!("dense model: {e}"),
                }),
            ModelSpec::Onnx { path } => {
                let path = if path.is_absolute() {
                    path
                } else {
                    bundle_path.parent().unwrap_or_else(|| Path::new(".")).join(path)
                };
                OnnxModel::load(&path, input_width).map(ScoringModel::Onnx)
            }
        }
    }

    /// Number of features the model consumes
    pub fn input_width(&self) -> usize {
        match self {
            ScoringModel::Dense(net) => net.input_width(),
            ScoringModel::Onnx(model) => model.input_width(),
        }
    }

    /// Single forward pass
    pub fn predict(&self, input: &[f64]) -> Result<f64, InferenceError> {
        if input.len() != self.input_width() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.input_width(),
                actual: input.len(),
            });
        }
        let output = match self {
            ScoringModel::Dense(net) => net.forward(input),
            ScoringModel::Onnx(model) => model.predict(input)?,
        };
        debug!(output, "Model forward pass complete");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(weights: Vec<Vec<f64>>, bias: Vec<f64>, activation: Activation) -> DenseLayer {
        DenseLayer {
            weights,
            bias,
            activation,
        }
    }

    #[test]
    fn test_single_sigmoid_unit() {
        let net = DenseNetwork::new(vec![layer(
            vec![vec![0.0, 0.0]],
            vec![0.0],
            Activation::Sigmoid,
        )])
        .unwrap();
        assert_eq!(net.input_width(), 2);
        assert_eq!(net.forward(&[3.0, -1.0]), 0.5);
    }

    #[test]
    fn test_hidden_layer() {
        // relu(x0 - x1) and relu(x1 - x0), then summed linearly
        let net = DenseNetwork::new(vec![
            layer(
                vec![vec![1.0, -1.0], vec![-1.0, 1.0]],
                vec![0.0, 0.0],
                Activation::Relu,
            ),
            layer(vec![vec![1.0, 1.0]], vec![0.5], Activation::Linear),
        ])
        .unwrap();
        assert_eq!(net.forward(&[3.0, 1.0]), 2.5);
        assert_eq!(net.forward(&[1.0, 3.0]), 2.5);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(DenseNetwork::new(vec![]), Err(NetworkError::Empty));
        assert_eq!(
            DenseNetwork::new(vec![layer(
                vec![vec![1.0], vec![1.0]],
                vec![0.0, 0.0],
                Activation::Sigmoid
            )]),
            Err(NetworkError::MultipleOutputs(2))
        );
        assert_eq!(
            DenseNetwork::new(vec![layer(vec![vec![1.0, 1.0]], vec![], Activation::Sigmoid)]),
            Err(NetworkError::BiasMismatch {
                layer: 0,
                bias: 0,
                outputs: 1
            })
        );
        assert_eq!(
            DenseNetwork::new(vec![
                layer(vec![vec![1.0]], vec![0.0], Activation::Relu),
                layer(vec![vec![1.0, 1.0]], vec![0.0], Activation::Sigmoid),
            ]),
            Err(NetworkError::Unchained {
                layer: 0,
                emits: 1,
                expects: 2
            })
        );
        assert_eq!(
            DenseNetwork::new(vec![layer(vec![vec![f64::NAN]], vec![0.0], Activation::Sigmoid)]),
            Err(NetworkError::NonFinite(0))
        );
    }

    #[test]
    fn test_unchained_message() {
        let err = NetworkError::Unchained {
            layer: 0,
            emits: 1,
            expects: 2,
        };
        assert_eq!(err.to_string(), "layer 0 emits 1 values but the next layer expects 2");
    }

    #[test]
    fn test_corrupt_dense_model_names_bundle_file() {
        let err = ScoringModel::from_spec(
            ModelSpec::Dense { layers: vec![] },
            Path::new("/models/churn_bundle.json"),
            2,
        )
        .unwrap_err();
        match err {
            InferenceError::ArtifactCorrupt { path, reason } => {
                assert_eq!(path, PathBuf::from("/models/churn_bundle.json"));
                assert!(reason.contains("no layers"));
            }
            other => panic!("expected ArtifactCorrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_predict_checks_width() {
        let model = ScoringModel::Dense(
            DenseNetwork::new(vec![layer(vec![vec![1.0, 1.0]], vec![0.0], Activation::Sigmoid)])
                .unwrap(),
        );
        let err = model.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InvalidInputShape {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_spec_deserialize() {
        let spec: ModelSpec = serde_json::from_str(
            r#"{"kind": "dense", "layers": [
                {"weights": [[0.5]], "bias": [0.0], "activation": "sigmoid"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(spec, ModelSpec::Dense { ref layers } if layers.len() == 1));

        let spec: ModelSpec =
            serde_json::from_str(r#"{"kind": "onnx", "path": "churn.onnx"}"#).unwrap();
        assert_eq!(
            spec,
            ModelSpec::Onnx {
                path: PathBuf::from("churn.onnx")
            }
        );
    }

    #[test]
    fn test_missing_onnx_file() {
        let err = ScoringModel::from_spec(
            ModelSpec::Onnx {
                path: PathBuf::from("does-not-exist.onnx"),
            },
            Path::new("/nonexistent/churn_bundle.json"),
            13,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "artifact_missing");
    }
}
