// app/src/services/report/mod.rs

pub mod pdf;
pub mod sections;

pub use pdf::{render_report, write_report, ReportInput, DISCLAIMER};
pub use sections::{parse_sections, ParsedSections, Section};
