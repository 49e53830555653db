//! File format handlers

pub mod cue;

pub use cue::{file_references, parse_file_line, rewrite_file_lines, CueFileLine};
