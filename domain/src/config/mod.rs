//! Presentation-independent configuration values.

mod output_format;

pub use output_format::OutputFormat;
