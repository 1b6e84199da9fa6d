pub mod canonical;
pub mod filesystem;
pub mod imports;
pub mod pipeline;
pub mod symbols;
