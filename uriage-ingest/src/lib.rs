//! uriage-ingest: turn a pasted chat blob into resolved, ordered report
//! blocks.

pub mod extract;
pub mod parser;

pub use extract::extract_item;
pub use parser::{parse_and_order, parse_report, render_normalized, IngestError, ParsedReport};
