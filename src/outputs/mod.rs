//! Output sinks.
//!
//! # Submodules
//!
//! - [`jsonl`]: Appends one JSON object per accepted article, flushing each line
//!
//! # Output shapes
//!
//! ```text
//! {"entity":..,"headline":..,"publication":..,"article_type":..,"content_quality":..,
//!  "key_sentences":[..],"url":..,"collected_at":..}
//! {"entity":..,"url":..,"publish_date":..|null,"collected_at":..,"text_preview":..}   (--format debug)
//! ```

pub mod jsonl;

pub use jsonl::{OutputFormat, RecordSink, SinkMode};
