//! Pipeline stages for one run.
//!
//! - `crawl`: walk the paginated listing
//! - `diff`: mark books absent from the previous snapshot as new
//! - `enrich`: fill detail fields, reusing cached ones
//! - `run`: sequence the stages and persist the snapshot

pub mod crawl;
pub mod diff;
pub mod enrich;
pub mod run;

pub use crawl::crawl_listing;
pub use diff::{SnapshotIndex, mark_new};
pub use enrich::{DetailFailure, EnrichOutcome, apply_cache, carry_forward, enrich_details};
pub use run::{PipelineOptions, RunReport, RunStage, run_pipeline};
