// Utility Module
// File helpers shared by the library and the CLI

pub mod file_ops;

pub use file_ops::{read_file, read_json, write_file_atomic, write_json, FileError, FileResult};
