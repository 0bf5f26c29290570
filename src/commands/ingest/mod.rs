//! The `run` pipeline: acquisition, text extraction, listing parsers, CSV
//! output, archiving and session reporting.

mod acquisition;
mod archive;
mod business_parse;
mod csv_output;
mod extraction;
mod field_patterns;
mod index_store;
mod personnel_parse;
mod pipeline;
mod run;
mod session;

pub use run::run;
