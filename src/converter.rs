//! Top-level conversion API
//!
//! Orchestrates one conversion: validate arguments, lower the trace,
//! run the transform pipeline, emit the Caffe artifacts. Each conversion
//! owns a private [`IRGraph`](crate::graph::IRGraph) and context, so
//! independent conversions may run concurrently on separate threads.

use crate::backend::{validate_path, CaffeConverter};
use crate::error::{ConvertError, ConvertResult};
use crate::frontend::{lower_trace, TraceArtifact, TraceGraph, TraceLoader};
use crate::transform::{IRTransform, TransformerRule};

/// Run-level configuration of one conversion
#[derive(Debug, Clone)]
pub struct ConversionContext {
    /// Emit zero-length blob payloads instead of the real parameter data
    pub omit_blobs: bool,
    /// Transform pass roster, in execution order
    pub rules: Vec<TransformerRule>,
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self {
            omit_blobs: false,
            rules: IRTransform::default_pipeline().rules().to_vec(),
        }
    }
}

impl ConversionContext {
    /// Default context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether blob payloads are omitted
    pub fn with_omit_blobs(mut self, omit: bool) -> Self {
        self.omit_blobs = omit;
        self
    }

    /// Override the pass roster
    pub fn with_rules(mut self, rules: impl Into<Vec<TransformerRule>>) -> Self {
        self.rules = rules.into();
        self
    }
}

/// Lower, transform, and convert a trace in memory
///
/// Stops before `dump`, returning the buffered converter so the caller can
/// pick artifact paths.
pub fn convert_trace(
    trace: &dyn TraceGraph,
    ctx: &ConversionContext,
) -> ConvertResult<CaffeConverter> {
    let mut graph = lower_trace(trace)?;
    IRTransform::new(ctx.rules.clone()).transform(&mut graph)?;
    let mut converter = CaffeConverter::new(graph, ctx.omit_blobs);
    converter.convert()?;
    Ok(converter)
}

/// Convert a traced module and save the Caffe model to `prototxt` and
/// `caffemodel`
///
/// Path arguments are validated before any IR work begins; a failure at
/// any later stage aborts the conversion without writing partial output.
pub fn tracedmodule_to_caffe(
    trace: &dyn TraceGraph,
    prototxt: &str,
    caffemodel: &str,
    omit_blobs: bool,
) -> ConvertResult<()> {
    validate_path(prototxt, "prototxt")?;
    validate_path(caffemodel, "caffemodel")?;

    let ctx = ConversionContext::new().with_omit_blobs(omit_blobs);
    let converter = convert_trace(trace, &ctx)?;
    converter.dump(prototxt, caffemodel)
}

/// Convert a trace artifact, resolving a path input through the supplied
/// loader
pub fn trace_artifact_to_caffe(
    artifact: TraceArtifact<'_>,
    loader: Option<&dyn TraceLoader>,
    prototxt: &str,
    caffemodel: &str,
    omit_blobs: bool,
) -> ConvertResult<()> {
    artifact.validate()?;
    match artifact {
        TraceArtifact::Module(trace) => {
            tracedmodule_to_caffe(trace, prototxt, caffemodel, omit_blobs)
        }
        TraceArtifact::Path(path) => {
            let loader = loader.ok_or_else(|| {
                ConvertError::InputValidation(
                    "a trace path input requires a trace loader".to_string(),
                )
            })?;
            let module = loader.load(path)?;
            tracedmodule_to_caffe(&module, prototxt, caffemodel, omit_blobs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{TraceNode, TraceTensor, TracedModule};
    use crate::graph::AttrValue;
    use crate::proto::NetParameter;
    use crate::tensor::{Blob, TensorSpec};
    use prost::Message;

    fn spec(shape: Vec<usize>) -> TensorSpec {
        TensorSpec::f32(shape)
    }

    /// conv2d -> dropout -> hsigmoid, ending in a linear head
    fn make_trace() -> TracedModule {
        let conv_w = Blob::from_f32(vec![2, 1, 1, 1], &[0.5, -0.5]).unwrap();
        let fc_w = Blob::from_f32(vec![2, 8], &[0.1; 16]).unwrap();

        let mut tm = TracedModule::new("demo");
        tm.push_input("data", spec(vec![1, 1, 2, 2]));
        tm.push_node(
            TraceNode::new(
                "conv_0",
                "conv2d",
                vec!["data".to_string()],
                vec![TraceTensor::new("conv_out", spec(vec![1, 2, 2, 2]))],
            )
            .with_attr("stride", AttrValue::Ints(vec![1, 1]))
            .with_param(conv_w),
        );
        tm.push_node(TraceNode::new(
            "dropout_0",
            "dropout",
            vec!["conv_out".to_string()],
            vec![TraceTensor::new("drop_out", spec(vec![1, 2, 2, 2]))],
        ));
        tm.push_node(TraceNode::new(
            "hsig_0",
            "hsigmoid",
            vec!["drop_out".to_string()],
            vec![TraceTensor::new("hsig_out", spec(vec![1, 2, 2, 2]))],
        ));
        tm.push_node(
            TraceNode::new(
                "flatten_0",
                "flatten",
                vec!["hsig_out".to_string()],
                vec![TraceTensor::new("flat_out", spec(vec![1, 8]))],
            )
            .with_attr("axis", AttrValue::Int(1)),
        );
        tm.push_node(
            TraceNode::new(
                "fc_0",
                "linear",
                vec!["flat_out".to_string()],
                vec![TraceTensor::new("y", spec(vec![1, 2]))],
            )
            .with_param(fc_w),
        );
        tm.set_outputs(vec!["y".to_string()]);
        tm
    }

    fn tmp_paths(tag: &str) -> (String, String) {
        let pid = std::process::id();
        (
            format!("/tmp/t2c_{}_{}.prototxt", tag, pid),
            format!("/tmp/t2c_{}_{}.caffemodel", tag, pid),
        )
    }

    #[test]
    fn test_end_to_end() {
        let tm = make_trace();
        let (prototxt, caffemodel) = tmp_paths("e2e");

        tracedmodule_to_caffe(&tm, &prototxt, &caffemodel, false).unwrap();

        let text = std::fs::read_to_string(&prototxt).unwrap();
        assert!(text.contains("name: \"demo\""));
        assert!(text.contains("type: \"Convolution\""));
        // Dropout and hard-sigmoid never reach the artifacts.
        assert!(!text.contains("Dropout"));
        assert!(text.contains("type: \"ReLU6\""));
        assert!(text.contains("type: \"Power\""));

        let bytes = std::fs::read(&caffemodel).unwrap();
        let net = NetParameter::decode(bytes.as_slice()).unwrap();
        let conv_layer = net
            .layer
            .iter()
            .find(|l| l.r#type.as_deref() == Some("Convolution"))
            .unwrap();
        assert_eq!(conv_layer.blobs[0].data, vec![0.5, -0.5]);

        std::fs::remove_file(&prototxt).ok();
        std::fs::remove_file(&caffemodel).ok();
    }

    #[test]
    fn test_omit_blobs_identical_structure() {
        let tm = make_trace();
        let (p1, c1) = tmp_paths("full");
        let (p2, c2) = tmp_paths("empty");

        tracedmodule_to_caffe(&tm, &p1, &c1, false).unwrap();
        tracedmodule_to_caffe(&tm, &p2, &c2, true).unwrap();

        assert_eq!(std::fs::read(&p1).unwrap(), std::fs::read(&p2).unwrap());

        let full = NetParameter::decode(std::fs::read(&c1).unwrap().as_slice()).unwrap();
        let empty = NetParameter::decode(std::fs::read(&c2).unwrap().as_slice()).unwrap();
        assert!(full.layer.iter().any(|l| l.blobs.iter().any(|b| !b.data.is_empty())));
        assert!(empty
            .layer
            .iter()
            .all(|l| l.blobs.iter().all(|b| b.data.is_empty())));

        for f in [&p1, &c1, &p2, &c2] {
            std::fs::remove_file(f).ok();
        }
    }

    #[test]
    fn test_empty_path_writes_nothing() {
        let tm = make_trace();
        let (_, caffemodel) = tmp_paths("nopath");

        let err = tracedmodule_to_caffe(&tm, "", &caffemodel, false);
        assert!(matches!(err, Err(ConvertError::InputValidation(_))));
        assert!(!std::path::Path::new(&caffemodel).exists());
    }

    #[test]
    fn test_unsupported_op_skips_pipeline_rule() {
        // With an empty rule list the dropout node survives to the backend,
        // which must reject it by name.
        let tm = make_trace();
        let ctx = ConversionContext::new().with_rules(vec![]);
        match convert_trace(&tm, &ctx) {
            Err(ConvertError::UnsupportedTargetOperator(kind)) => assert_eq!(kind, "Dropout"),
            other => panic!("expected UnsupportedTargetOperator, got {:?}", other),
        }
    }

    #[test]
    fn test_artifact_path_requires_loader() {
        let (prototxt, caffemodel) = tmp_paths("loader");
        let err = trace_artifact_to_caffe(
            TraceArtifact::Path("model.tm"),
            None,
            &prototxt,
            &caffemodel,
            false,
        );
        assert!(matches!(err, Err(ConvertError::InputValidation(_))));
        assert!(!std::path::Path::new(&prototxt).exists());
    }

    #[test]
    fn test_artifact_path_resolved_through_loader() {
        struct StubLoader;
        impl TraceLoader for StubLoader {
            fn load(&self, path: &str) -> ConvertResult<TracedModule> {
                assert_eq!(path, "model.tm");
                Ok(make_trace())
            }
        }

        let (prototxt, caffemodel) = tmp_paths("stub");
        trace_artifact_to_caffe(
            TraceArtifact::Path("model.tm"),
            Some(&StubLoader),
            &prototxt,
            &caffemodel,
            false,
        )
        .unwrap();

        assert!(std::path::Path::new(&prototxt).exists());
        std::fs::remove_file(&prototxt).ok();
        std::fs::remove_file(&caffemodel).ok();
    }
}
