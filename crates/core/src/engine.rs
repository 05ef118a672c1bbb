//! Greedy fixpoint reduction.
//!
//! Each single pass walks the candidate pool in order and stops at the first
//! line whose removal the verifier accepts. The accepted line is chopped, the
//! snapshot persisted, and the pool rotated so the next single pass resumes
//! right after it. The loop ends on the first single pass that accepts nothing.
//!
//! A pass, as reported in [`Reduction::passes`], is one full sweep of the pool:
//! a file whose candidates are all removable takes one sweep to remove them and
//! a second to confirm nothing else goes.

use crate::candidate::{CandidatePool, CandidatePredicate};
use crate::chop::chop;
use crate::oracle::{Oracle, Verdict};
use crate::sink::SnapshotSink;
use crate::workspace::Workspace;
use crate::{MinifyError, Result, SourceSet};
use std::time::{Duration, Instant};

/// Settings for a reduction run.
pub struct ReducerConfig {
    /// Deadline for every attempt
    pub deadline: Duration,
    /// Which lines may be chopped
    pub predicate: Box<dyn CandidatePredicate>,
}

/// Result of reducing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub file: String,
    /// Pool size before the first pass
    pub candidates: usize,
    /// Accepted line indices, in acceptance order
    pub removed: Vec<usize>,
    /// Verifier invocations
    pub attempts: usize,
    /// Sweeps over the pool, including the final one that accepts nothing
    pub passes: usize,
    /// Single-pass scans run; each stops at its first accepted line
    pub single_passes: usize,
    /// Content at fixpoint
    pub content: String,
}

/// Counts sweeps over a pool that is rotated after every acceptance.
///
/// `unscanned` entries at the front of the pool have not been offered yet in
/// the current sweep; the rest were. Rotation keeps that split contiguous.
#[derive(Debug, Default)]
struct SweepCounter {
    passes: usize,
    unscanned: usize,
}

impl SweepCounter {
    fn begin_scan(&mut self, pool_len: usize) {
        if self.unscanned == 0 {
            self.passes += 1;
            self.unscanned = pool_len;
        }
    }

    /// The entry at `position` of a `pool_len` pool was accepted and is
    /// about to be dropped.
    fn accepted_at(&mut self, position: usize, pool_len: usize) {
        if position >= self.unscanned {
            // the scan ran past the sweep's last entry, so a new sweep began there
            self.passes += 1;
            self.unscanned += pool_len - 1 - position;
        } else {
            self.unscanned -= position + 1;
        }
    }

    /// The whole pool was offered without an acceptance.
    fn exhausted(&mut self, pool_len: usize) {
        if pool_len > self.unscanned {
            self.passes += 1;
        }
        self.unscanned = 0;
    }
}

/// Drives the pass/rotate loop over a fixed source set.
pub struct Reducer<O, S> {
    sources: SourceSet,
    workspace: Workspace,
    oracle: O,
    sink: S,
    config: ReducerConfig,
}

impl<O: Oracle, S: SnapshotSink> Reducer<O, S> {
    pub fn new(
        sources: SourceSet,
        workspace: Workspace,
        oracle: O,
        sink: S,
        config: ReducerConfig,
    ) -> Self {
        Self {
            sources,
            workspace,
            oracle,
            sink,
            config,
        }
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Reduce every file, one after another, in name order.
    ///
    /// Every file is reduced against the original contents of the others.
    pub async fn reduce_all(&self) -> Result<Vec<Reduction>> {
        let mut reductions = Vec::with_capacity(self.sources.len());
        for name in self.sources.names() {
            reductions.push(self.reduce_file(name).await?);
        }
        Ok(reductions)
    }

    /// Chop lines from `name` until no single further chop is accepted.
    pub async fn reduce_file(&self, name: &str) -> Result<Reduction> {
        let mut content = self
            .sources
            .get(name)
            .ok_or_else(|| MinifyError::UnknownFile(name.to_string()))?
            .to_string();
        let mut pool = CandidatePool::build(&content, self.config.predicate.as_ref());
        log::info!("reducing {name}: {} candidate lines", pool.len());

        let mut reduction = Reduction {
            file: name.to_string(),
            candidates: pool.len(),
            removed: Vec::new(),
            attempts: 0,
            passes: 0,
            single_passes: 0,
            content: String::new(),
        };
        let mut sweeps = SweepCounter::default();

        loop {
            reduction.single_passes += 1;
            sweeps.begin_scan(pool.len());
            let Some(index) = self.single_pass(name, &content, &pool, &mut reduction).await? else {
                sweeps.exhausted(pool.len());
                break;
            };
            if let Some(position) = pool.position(index) {
                sweeps.accepted_at(position, pool.len());
            }

            content = chop(&content, index)?;
            self.sink.persist(name, &content)?;
            reduction.removed.push(index);

            let original = pool
                .iter()
                .find(|line| line.index == index)
                .map(|line| line.text.trim())
                .unwrap_or_default();
            log::info!(
                "removed line {} in {name}: {original} ({} removed so far)",
                index + 1,
                reduction.removed.len()
            );

            pool.rotate_and_drop(index);
        }

        reduction.passes = sweeps.passes;
        log::info!(
            "{name}: fixpoint after {} passes, {} of {} lines removed, {} attempts",
            reduction.passes,
            reduction.removed.len(),
            reduction.candidates,
            reduction.attempts
        );
        reduction.content = content;
        Ok(reduction)
    }

    /// Offer each eligible pool entry in order; return the first accepted one.
    async fn single_pass(
        &self,
        name: &str,
        content: &str,
        pool: &CandidatePool,
        reduction: &mut Reduction,
    ) -> Result<Option<usize>> {
        for line in pool.iter() {
            if !self.config.predicate.eligible(&line.text) {
                continue;
            }

            let candidate = chop(content, line.index)?;
            self.workspace
                .materialize_with(&self.sources, name, &candidate)?;

            log::debug!("trying line {} in {name}", line.index + 1);
            let started = Instant::now();
            let verdict = self
                .oracle
                .verify(self.workspace.path(), Some(self.config.deadline))
                .await?;
            reduction.attempts += 1;
            let took = started.elapsed();

            match verdict {
                Verdict::Pass => {
                    log::debug!("line {} accepted after {took:?}", line.index + 1);
                    return Ok(Some(line.index));
                }
                Verdict::Fail | Verdict::Timeout => {
                    log::debug!("line {} rejected ({verdict}) after {took:?}", line.index + 1);
                }
            }
        }
        Ok(None)
    }
}
