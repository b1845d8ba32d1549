pub mod lockservice {
    tonic::include_proto!("lockservice");
}
