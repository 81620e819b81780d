//! Tiny ONNX graphs with fixed outputs for exercising the detectors.

use candle_onnx::onnx::{
    tensor_proto::DataType,
    tensor_shape_proto::{dimension, Dimension},
    type_proto, GraphProto, ModelProto, NodeProto, TensorProto, TensorShapeProto, TypeProto,
    ValueInfoProto,
};

use super::OnnxGraph;

fn value_info(name: &str, dims: &[i64]) -> ValueInfoProto {
    let dim = dims
        .iter()
        .map(|&d| Dimension {
            value: Some(dimension::Value::DimValue(d)),
            ..Default::default()
        })
        .collect();
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float as i32,
                shape: Some(TensorShapeProto { dim }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A graph taking one float `input` of `input_dims` (ignored) and emitting
/// each `(name, dims, values)` unchanged.
pub fn constant_outputs(input_dims: &[i64], outputs: &[(&str, Vec<i64>, Vec<f32>)]) -> OnnxGraph {
    let mut graph = GraphProto {
        input: vec![value_info("input", input_dims)],
        ..Default::default()
    };

    for (name, dims, values) in outputs {
        let source = format!("{name}_value");
        graph.initializer.push(TensorProto {
            name: source.clone(),
            dims: dims.clone(),
            data_type: DataType::Float as i32,
            raw_data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ..Default::default()
        });
        graph.node.push(NodeProto {
            op_type: "Identity".to_string(),
            input: vec![source],
            output: vec![(*name).to_string()],
            ..Default::default()
        });
        graph.output.push(value_info(name, dims));
    }

    let model = ModelProto {
        graph: Some(graph),
        ..Default::default()
    };
    match OnnxGraph::from_model(model) {
        Ok(graph) => graph,
        Err(e) => panic!("test graph is malformed: {e:#}"),
    }
}

/// A `BlazeFace`-shaped graph where only `anchor` fires, regressing `raw`
/// (centre offset and size in input pixels). Scores are declared before
/// boxes.
pub fn blazeface_with_face(anchor: usize, raw: [f32; 4]) -> OnnxGraph {
    let mut scores = vec![-100.0; 896];
    scores[anchor] = 10.0;
    let mut boxes = vec![0.0; 896 * 16];
    boxes[anchor * 16..anchor * 16 + 4].copy_from_slice(&raw);

    constant_outputs(
        &[1, 128, 128, 3],
        &[
            ("classificators", vec![1, 896, 1], scores),
            ("regressors", vec![1, 896, 16], boxes),
        ],
    )
}
