//! Static-analysis pipeline: discovery, parsing, extraction, qualification
//! and linking.

pub mod cache;
pub mod filesystem;
pub mod imports;
pub mod linker;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod symbols;
