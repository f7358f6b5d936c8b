pub mod report;
pub mod srt;

pub use report::{write_run_summary, write_segment_report};
pub use srt::{render_source_srt, render_target_srt};
