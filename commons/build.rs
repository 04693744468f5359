fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/rpc/proto/pingpong.proto");

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["src/rpc/proto/pingpong.proto"], &["src/rpc/proto"])?;
    Ok(())
}
