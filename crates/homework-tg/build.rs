fn main() {
    vergen::EmitBuilder::builder()
        .build_timestamp()
        .cargo_target_triple()
        .cargo_debug()
        .emit()
        .unwrap();
}
