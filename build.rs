//! Build script for trace2caffe
//!
//! Generates Rust code from the Caffe protobuf definitions using prost-build.

use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_path = PathBuf::from("proto/caffe.proto");

    if !proto_path.exists() {
        return Err(format!(
            "Caffe proto file not found at: {}\n\
             Please ensure proto/caffe.proto exists.",
            proto_path.display()
        )
        .into());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    // Ensure a protoc binary is available even when the system does not
    // provide one, by falling back to the vendored compiler.
    if env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            env::set_var("PROTOC", protoc);
        }
    }

    let mut config = prost_build::Config::new();
    config.out_dir(&out_dir);
    config.compile_protos(&[&proto_path], &["proto/"])?;

    println!("cargo:rerun-if-changed=proto/caffe.proto");
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
