//! Build script for duplex API
//!
//! Compiles the Protocol Buffer definitions into Rust code with
//! tonic-prost-build. A vendored `protoc` is used unless `PROTOC` is already
//! set, so no system install is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_prost_build::configure()
        .build_server(true)
        // Client code is used by the end-to-end tests
        .build_client(true)
        .compile_protos(&["proto/greeter.proto", "proto/blog.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/greeter.proto");
    println!("cargo:rerun-if-changed=proto/blog.proto");

    Ok(())
}
