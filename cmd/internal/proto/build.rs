fn main() -> Result<(), Box<dyn std::error::Error>> {
    // no system protoc required
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    tonic_build::compile_protos("proto/lockservice.proto")?;
    println!("cargo:rerun-if-changed=proto/lockservice.proto");
    Ok(())
}
