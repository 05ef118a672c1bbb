use crate::oracle::{Oracle, Verdict};
use crate::workspace::Workspace;
use crate::{Result, SourceSet};
use std::time::{Duration, Instant};

/// Timing of one unmodified verifier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    pub elapsed: Duration,
    pub verdict: Verdict,
    /// Per-attempt deadline derived from `elapsed`
    pub deadline: Duration,
}

/// Baseline duration plus 10%.
pub fn deadline_from_elapsed(elapsed: Duration) -> Duration {
    elapsed + elapsed / 10
}

/// Run the verifier once on the unmodified sources, without a deadline.
pub async fn calibrate<O: Oracle>(
    oracle: &O,
    workspace: &Workspace,
    sources: &SourceSet,
) -> Result<Baseline> {
    workspace.materialize(sources)?;

    log::info!("running verifier on baseline");
    let started = Instant::now();
    let verdict = oracle.verify(workspace.path(), None).await?;
    let elapsed = started.elapsed();

    if !verdict.is_pass() {
        log::warn!("baseline does not verify ({verdict}); every candidate is likely to be rejected");
    }

    let deadline = deadline_from_elapsed(elapsed);
    log::info!("baseline took {elapsed:?}, using deadline {deadline:?}");
    Ok(Baseline {
        elapsed,
        verdict,
        deadline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    struct SlowOracle {
        delay: Duration,
        verdict: Verdict,
    }

    #[async_trait]
    impl Oracle for SlowOracle {
        async fn verify(&self, target: &Path, deadline: Option<Duration>) -> Result<Verdict> {
            assert!(deadline.is_none(), "baseline must run unbounded");
            assert!(target.join("a.go").is_file());
            tokio::time::sleep(self.delay).await;
            Ok(self.verdict)
        }
    }

    #[test]
    fn adds_ten_percent() {
        assert_eq!(
            deadline_from_elapsed(Duration::from_secs(10)),
            Duration::from_secs(11)
        );
        assert_eq!(
            deadline_from_elapsed(Duration::from_millis(250)),
            Duration::from_millis(275)
        );
        assert_eq!(deadline_from_elapsed(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test]
    async fn deadline_covers_measured_run() {
        let sources: SourceSet = [("a.go", "// +gobra\n")].into_iter().collect();
        let workspace = Workspace::create().unwrap();
        let oracle = SlowOracle {
            delay: Duration::from_millis(50),
            verdict: Verdict::Pass,
        };

        let baseline = calibrate(&oracle, &workspace, &sources).await.unwrap();

        assert_eq!(baseline.verdict, Verdict::Pass);
        assert!(baseline.elapsed >= Duration::from_millis(50));
        assert_eq!(baseline.deadline, deadline_from_elapsed(baseline.elapsed));
    }

    #[tokio::test]
    async fn failing_baseline_is_reported_not_fatal() {
        let sources: SourceSet = [("a.go", "// +gobra\n")].into_iter().collect();
        let workspace = Workspace::create().unwrap();
        let oracle = SlowOracle {
            delay: Duration::from_millis(1),
            verdict: Verdict::Fail,
        };

        let baseline = calibrate(&oracle, &workspace, &sources).await.unwrap();
        assert_eq!(baseline.verdict, Verdict::Fail);
    }
}
