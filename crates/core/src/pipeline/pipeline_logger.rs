use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Instant;

use crate::pipeline::frame_pipeline::TickOutcome;

/// Observer for detection-loop events.
///
/// Workers report through a shared `Mutex`, so implementations only need
/// to be `Send`.
pub trait PipelineLogger: Send {
    /// Record how long a named stage (`capture`, `detect`, `render`) took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. requests in flight).
    fn metric(&mut self, name: &str, value: f64);

    /// Record how one detection tick ended.
    fn outcome(&mut self, outcome: TickOutcome);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by the desktop panel and by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn outcome(&mut self, _outcome: TickOutcome) {}
}

/// Accumulates per-stage timings and tick outcomes for a CLI summary.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    outcomes: BTreeMap<&'static str, usize>,
    start_time: Instant,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            outcomes: BTreeMap::new(),
            start_time: Instant::now(),
        }
    }

    pub fn ticks(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn outcome_count(&self, outcome: TickOutcome) -> usize {
        self.outcomes.get(outcome.as_str()).copied().unwrap_or(0)
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    /// Returns the formatted summary, or `None` if no tick was recorded.
    pub fn summary_string(&self) -> Option<String> {
        let ticks = self.ticks();
        if ticks == 0 {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Detection summary ({ticks} ticks, {elapsed_s:.1}s):"
        )];

        let outcomes: Vec<String> = self
            .outcomes
            .iter()
            .map(|(name, count)| format!("{name} {count}"))
            .collect();
        lines.push(format!("  outcomes: {}", outcomes.join(", ")));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let avg_ms = mean(durations);
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!("  {stage:8}: avg {avg_ms:7.1}ms  max {max_ms:7.1}ms"));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        Some(lines.join("\n"))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn outcome(&mut self, outcome: TickOutcome) {
        *self.outcomes.entry(outcome.as_str()).or_default() += 1;
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.timing("detect", 5.0);
        logger.metric("in_flight", 2.0);
        logger.outcome(TickOutcome::Failed);
        logger.summary();
    }

    #[test]
    fn test_counts_outcomes() {
        let mut logger = StdoutPipelineLogger::new();
        logger.outcome(TickOutcome::Rendered);
        logger.outcome(TickOutcome::Rendered);
        logger.outcome(TickOutcome::Failed);

        assert_eq!(logger.ticks(), 3);
        assert_eq!(logger.outcome_count(TickOutcome::Rendered), 2);
        assert_eq!(logger.outcome_count(TickOutcome::Failed), 1);
        assert_eq!(logger.outcome_count(TickOutcome::Discarded), 0);
    }

    #[test]
    fn test_records_timings_and_metrics() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.metric("in_flight", 1.0);
        logger.metric("in_flight", 2.0);

        assert_relative_eq!(mean(logger.timings_for("detect").unwrap()), 25.0);
        assert_relative_eq!(mean(logger.metrics_for("in_flight").unwrap()), 1.5);
        assert!(logger.timings_for("render").is_none());
    }

    #[test]
    fn test_summary_lists_outcomes_and_stages() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("detect", 40.0);
        logger.timing("capture", 4.0);
        logger.outcome(TickOutcome::Rendered);
        logger.outcome(TickOutcome::Skipped);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Detection summary (2 ticks"));
        assert!(summary.contains("rendered 1"));
        assert!(summary.contains("skipped 1"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("capture"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("detect", 1.0);
        assert!(logger.summary_string().is_none());
    }
}
