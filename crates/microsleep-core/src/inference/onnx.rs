//! ONNX graph loading and evaluation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_onnx::onnx::{
    self, tensor_proto::DataType, tensor_shape_proto::dimension, type_proto,
};
use tracing::debug;

use crate::domain::{ClassifierInputDescriptor, ElementType, FloatTensor};

/// A parsed ONNX model with its runtime inputs resolved.
///
/// Evaluation borrows the model immutably, so one graph can serve
/// concurrent callers.
pub struct OnnxGraph {
    model: onnx::ModelProto,
    inputs: Vec<ClassifierInputDescriptor>,
    outputs: Vec<String>,
}

impl OnnxGraph {
    /// Reads and parses an ONNX file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or has no graph.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading ONNX graph from {}", path.display());

        let model = candle_onnx::read_file(path)
            .with_context(|| format!("Failed to read ONNX model: {}", path.display()))?;
        Self::from_model(model)
            .with_context(|| format!("Invalid ONNX model: {}", path.display()))
    }

    /// Wraps an already-parsed model.
    ///
    /// Graph inputs that are also initializers are weights, not runtime
    /// inputs, and are left out of [`OnnxGraph::inputs`].
    ///
    /// # Errors
    ///
    /// Returns an error if the model has no graph.
    pub fn from_model(model: onnx::ModelProto) -> Result<Self> {
        let graph = model.graph.as_ref().context("ONNX model has no graph")?;

        let initializers: HashSet<&str> =
            graph.initializer.iter().map(|t| t.name.as_str()).collect();
        let inputs = graph
            .input
            .iter()
            .filter(|info| !initializers.contains(info.name.as_str()))
            .enumerate()
            .map(|(index, info)| describe(index, info))
            .collect();
        let outputs = graph.output.iter().map(|info| info.name.clone()).collect();

        Ok(Self {
            model,
            inputs,
            outputs,
        })
    }

    /// Runtime inputs in declared order.
    #[must_use]
    pub fn inputs(&self) -> &[ClassifierInputDescriptor] {
        &self.inputs
    }

    /// Output names in declared order.
    #[must_use]
    pub fn output_names(&self) -> &[String] {
        &self.outputs
    }

    /// Evaluates the graph with `inputs[i]` fed to runtime input `i`.
    ///
    /// # Errors
    ///
    /// Returns an error on an input count mismatch, an evaluation failure,
    /// or a missing output.
    pub fn run(&self, inputs: &[FloatTensor]) -> Result<Vec<FloatTensor>> {
        if inputs.len() != self.inputs.len() {
            bail!(
                "graph expects {} inputs, got {}",
                self.inputs.len(),
                inputs.len()
            );
        }

        let mut feed = HashMap::with_capacity(inputs.len());
        for (descriptor, tensor) in self.inputs.iter().zip(inputs) {
            let value = Tensor::from_slice(tensor.data(), tensor.shape(), &Device::Cpu)
                .with_context(|| format!("Failed to bind input '{}'", descriptor.name))?;
            feed.insert(descriptor.name.clone(), value);
        }

        let mut results =
            candle_onnx::simple_eval(&self.model, feed).context("ONNX evaluation failed")?;

        self.outputs
            .iter()
            .map(|name| {
                let value = results
                    .remove(name)
                    .with_context(|| format!("ONNX graph produced no output '{name}'"))?;
                let shape = value.dims().to_vec();
                let data = value
                    .to_dtype(DType::F32)?
                    .flatten_all()?
                    .to_vec1::<f32>()?;
                FloatTensor::new(shape, data)
            })
            .collect()
    }
}

fn describe(index: usize, info: &onnx::ValueInfoProto) -> ClassifierInputDescriptor {
    let tensor_type = info
        .r#type
        .as_ref()
        .and_then(|t| t.value.as_ref())
        .and_then(|value| match value {
            type_proto::Value::TensorType(tensor) => Some(tensor),
            _ => None,
        });

    let (shape, element_type) = tensor_type.map_or((Vec::new(), ElementType::Other), |tensor| {
        let shape = tensor
            .shape
            .as_ref()
            .map(|shape| {
                shape
                    .dim
                    .iter()
                    .map(|dim| match &dim.value {
                        Some(dimension::Value::DimValue(size)) if *size > 0 => {
                            usize::try_from(*size).ok()
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        (shape, element_type(tensor.elem_type))
    });

    ClassifierInputDescriptor::new(index, info.name.clone(), shape, element_type)
}

fn element_type(code: i32) -> ElementType {
    match DataType::try_from(code) {
        Ok(DataType::Float) => ElementType::F32,
        Ok(DataType::Float16) => ElementType::F16,
        Ok(DataType::Double) => ElementType::F64,
        Ok(DataType::Uint8) => ElementType::U8,
        Ok(DataType::Int8) => ElementType::I8,
        Ok(DataType::Int32) => ElementType::I32,
        Ok(DataType::Int64) => ElementType::I64,
        _ => ElementType::Other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use candle_onnx::onnx::{
        tensor_shape_proto::Dimension, GraphProto, ModelProto, NodeProto, TensorProto,
        TensorShapeProto, TypeProto, ValueInfoProto,
    };

    fn value_info(name: &str, dims: &[i64], elem_type: DataType) -> ValueInfoProto {
        let dim = dims
            .iter()
            .map(|&d| Dimension {
                value: Some(if d > 0 {
                    dimension::Value::DimValue(d)
                } else {
                    dimension::Value::DimParam("batch".to_string())
                }),
                ..Default::default()
            })
            .collect();
        ValueInfoProto {
            name: name.to_string(),
            r#type: Some(TypeProto {
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type: elem_type as i32,
                    shape: Some(TensorShapeProto { dim }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn add_model() -> ModelProto {
        ModelProto {
            graph: Some(GraphProto {
                node: vec![NodeProto {
                    op_type: "Add".to_string(),
                    input: vec!["a".to_string(), "b".to_string()],
                    output: vec!["sum".to_string()],
                    ..Default::default()
                }],
                input: vec![
                    value_info("a", &[-1, 1], DataType::Float),
                    value_info("b", &[1, 1], DataType::Float),
                ],
                output: vec![value_info("sum", &[-1, 1], DataType::Float)],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_describes_inputs() {
        let graph = OnnxGraph::from_model(add_model()).unwrap();
        let inputs = graph.inputs();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].index, 0);
        assert_eq!(inputs[0].name, "a");
        assert_eq!(inputs[0].shape, vec![None, Some(1)]);
        assert_eq!(inputs[0].element_type, ElementType::F32);
        assert_eq!(inputs[1].shape, vec![Some(1), Some(1)]);
        assert_eq!(graph.output_names(), &["sum".to_string()]);
    }

    #[test]
    fn test_initializers_are_not_runtime_inputs() {
        let mut model = add_model();
        let graph = model.graph.as_mut().unwrap();
        graph.initializer.push(TensorProto {
            name: "b".to_string(),
            dims: vec![1, 1],
            data_type: DataType::Float as i32,
            float_data: vec![2.0],
            ..Default::default()
        });

        let graph = OnnxGraph::from_model(model).unwrap();
        assert_eq!(graph.inputs().len(), 1);
        assert_eq!(graph.inputs()[0].name, "a");
    }

    #[test]
    fn test_element_type_mapping() {
        assert_eq!(element_type(DataType::Float as i32), ElementType::F32);
        assert_eq!(element_type(DataType::Float16 as i32), ElementType::F16);
        assert_eq!(element_type(DataType::Uint8 as i32), ElementType::U8);
        assert_eq!(element_type(DataType::String as i32), ElementType::Other);
        assert_eq!(element_type(9999), ElementType::Other);
    }

    #[test]
    fn test_run_evaluates_graph() {
        let graph = OnnxGraph::from_model(add_model()).unwrap();
        let outputs = graph
            .run(&[FloatTensor::scalar(0.25), FloatTensor::scalar(0.5)])
            .unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].shape(), &[1, 1]);
        assert!((outputs[0].data()[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_run_rejects_wrong_input_count() {
        let graph = OnnxGraph::from_model(add_model()).unwrap();
        assert!(graph.run(&[FloatTensor::scalar(1.0)]).is_err());
    }

    #[test]
    fn test_missing_graph_is_error() {
        assert!(OnnxGraph::from_model(ModelProto::default()).is_err());
    }
}
