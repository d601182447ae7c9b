/// Generates the gRPC client and server bindings for `proto/snowseq.proto`.
///
/// A file descriptor set is written next to the generated code so the server
/// can expose it through gRPC reflection. The generated code is available
/// via:
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("snowseq");
/// }
/// ```
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let descriptor_path = out_dir.join("snowseq_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/snowseq.proto");
    tonic_prost_build::configure().compile_with_config(
        config,
        &["proto/snowseq.proto"],
        &["proto"],
    )?;
    Ok(())
}
