//! Artifact writers
//!
//! Renders the buffered net as prototxt text and encodes the weights as a
//! prost `NetParameter`. The structural text never contains payload data,
//! so it is byte-identical whether or not blobs are omitted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use prost::Message;

use crate::error::ConvertResult;
use crate::proto::{BlobProto, BlobShape, LayerParameter, NetParameter};

use super::CaffeNet;

/// Render the structural prototxt text
pub fn render_prototxt(net: &CaffeNet) -> String {
    let mut out = String::new();
    out.push_str(&format!("name: {:?}\n", net.name));
    for layer in &net.layers {
        layer.render(&mut out);
    }
    out
}

/// Encode the weights artifact
///
/// With `omit_blobs`, payloads keep their shape but carry zero data
/// elements.
pub fn encode_caffemodel(net: &CaffeNet, omit_blobs: bool) -> ConvertResult<Vec<u8>> {
    let mut proto = NetParameter {
        name: Some(net.name.clone()),
        layer: Vec::with_capacity(net.layers.len()),
    };

    for layer in &net.layers {
        let mut blobs = Vec::with_capacity(layer.blobs.len());
        for blob in &layer.blobs {
            let data = if omit_blobs {
                Vec::new()
            } else {
                blob.as_f32_vec()?
            };
            blobs.push(BlobProto {
                data,
                shape: Some(BlobShape {
                    dim: blob.spec.shape.iter().map(|&d| d as i64).collect(),
                }),
            });
        }
        proto.layer.push(LayerParameter {
            name: Some(layer.name.clone()),
            r#type: Some(layer.kind.to_string()),
            bottom: layer.bottoms.clone(),
            top: layer.tops.clone(),
            blobs,
        });
    }

    Ok(proto.encode_to_vec())
}

/// Write the prototxt artifact
pub fn write_prototxt<P: AsRef<Path>>(net: &CaffeNet, path: P) -> ConvertResult<()> {
    let text = render_prototxt(net);
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write the caffemodel artifact
pub fn write_caffemodel<P: AsRef<Path>>(
    net: &CaffeNet,
    path: P,
    omit_blobs: bool,
) -> ConvertResult<()> {
    let bytes = encode_caffemodel(net, omit_blobs)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::layer::{CaffeLayer, LayerParam};
    use crate::tensor::Blob;

    fn make_net() -> CaffeNet {
        CaffeNet {
            name: "net".to_string(),
            layers: vec![CaffeLayer {
                name: "fc_0".to_string(),
                kind: "InnerProduct",
                bottoms: vec!["data".to_string()],
                tops: vec!["fc_0".to_string()],
                param: LayerParam::InnerProduct {
                    num_output: 2,
                    bias_term: false,
                },
                blobs: vec![Blob::from_f32(vec![2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()],
            }],
        }
    }

    #[test]
    fn test_prototxt_structure() {
        let text = render_prototxt(&make_net());
        assert!(text.starts_with("name: \"net\"\n"));
        assert!(text.contains("layer {"));
        assert!(text.contains("inner_product_param {"));
    }

    #[test]
    fn test_caffemodel_round_trip() {
        use prost::Message;

        let bytes = encode_caffemodel(&make_net(), false).unwrap();
        let decoded = NetParameter::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.name.as_deref(), Some("net"));
        assert_eq!(decoded.layer.len(), 1);
        assert_eq!(decoded.layer[0].blobs[0].data.len(), 6);
        assert_eq!(
            decoded.layer[0].blobs[0].shape.as_ref().unwrap().dim,
            vec![2, 3]
        );
    }

    #[test]
    fn test_omit_blobs_keeps_shape_drops_data() {
        use prost::Message;

        let bytes = encode_caffemodel(&make_net(), true).unwrap();
        let decoded = NetParameter::decode(bytes.as_slice()).unwrap();
        assert!(decoded.layer[0].blobs[0].data.is_empty());
        assert_eq!(
            decoded.layer[0].blobs[0].shape.as_ref().unwrap().dim,
            vec![2, 3]
        );
    }
}
