pub mod rust;
pub mod rust_gen;

/* Default output directory for generated sources */
pub const OUTPUT_DIR: &str = "generated";
