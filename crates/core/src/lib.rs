//! # Minify Core
//!
//! Verifier-guided reduction of proof annotations.
//!
//! ## Pipeline
//!
//! ```text
//! Baseline run ──> per-attempt deadline
//!     │
//!     └──> Reducer (per file, name order)
//!            ├─> CandidatePool (eligible lines, rotated after each acceptance)
//!            ├─> chop (neutralize one line, line count unchanged)
//!            ├─> Workspace (rewrite whole file set)
//!            ├─> Oracle (Pass / Fail / Timeout under the deadline)
//!            └─> SnapshotSink (<name>.working after each acceptance)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use minify_core::{
//!     AssertAnnotation, ExecInfo, ProcessOracle, Reducer, ReducerConfig, SourceSet,
//!     VerifierConfig, WorkingCopySink, Workspace,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut sources = SourceSet::new();
//!     sources.insert("a.go", std::fs::read_to_string("pkg/a.go")?);
//!
//!     let oracle = ProcessOracle::new(
//!         ExecInfo {
//!             interpreter: "java".into(),
//!             verifier_jar: "gobra.jar".into(),
//!             root: ".".into(),
//!         },
//!         VerifierConfig::default(),
//!     );
//!     let config = ReducerConfig {
//!         deadline: Duration::from_secs(60),
//!         predicate: Box::new(AssertAnnotation::default()),
//!     };
//!     let reducer = Reducer::new(
//!         sources,
//!         Workspace::create()?,
//!         oracle,
//!         WorkingCopySink::new("out"),
//!         config,
//!     );
//!     for reduction in reducer.reduce_all().await? {
//!         println!("{}: removed {} lines", reduction.file, reduction.removed.len());
//!     }
//!     Ok(())
//! }
//! ```

mod baseline;
mod candidate;
mod chop;
mod config;
mod engine;
mod error;
mod oracle;
mod sink;
mod source;
mod workspace;

pub use baseline::{calibrate, deadline_from_elapsed, Baseline};
pub use candidate::{AssertAnnotation, CandidatePool, CandidatePredicate, Line, PatternPredicate};
pub use chop::{chop, chop_text, line_count, ANNOTATION_SIGIL, CHOP_MARKER, NEUTRAL_SIGIL};
pub use config::{parse_duration, MinifyConfig, VerifierConfig, VERIFIER_JAR_ENV};
pub use engine::{Reducer, ReducerConfig, Reduction};
pub use error::{MinifyError, Result};
pub use oracle::{
    classify_line, stream_verdict, ExecInfo, Oracle, ProcessOracle, Verdict, ERROR_MARKER,
    SUCCESS_MARKER,
};
pub use sink::{SnapshotSink, WorkingCopySink, WORKING_SUFFIX};
pub use source::SourceSet;
pub use workspace::Workspace;
