//! Benchmark crate for the MOK manager; see `benches/`.
