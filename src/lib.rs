pub mod config;
pub mod error;
pub mod io;
pub mod process;

pub use error::PipelineError;
pub use process::{Abbreviations, Pipeline, PipelineReport, Stage};
