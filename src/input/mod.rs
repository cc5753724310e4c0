pub mod line_parser;
pub mod payload;

pub use line_parser::{parse_log_line, read_log_file};
pub use payload::{decode_payload, parse_payload};
