use cosmos_solver::SolveProfile;
use std::collections::BTreeMap;
use std::time::Duration;

/// Fixed-capacity history of durations, oldest overwritten first.
#[derive(Debug, Clone)]
struct RingHistory {
    samples: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl RingHistory {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    fn record(&mut self, d: Duration) {
        self.samples[self.index] = d;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn count(&self) -> usize {
        if self.filled { self.capacity } else { self.index }
    }

    fn window(&self) -> &[Duration] {
        &self.samples[..self.count()]
    }

    fn stats(&self) -> PhaseStats {
        let window = self.window();
        if window.is_empty() {
            return PhaseStats::default();
        }
        let total: Duration = window.iter().sum();
        PhaseStats {
            samples: window.len(),
            average: total / window.len() as u32,
            min: window.iter().copied().min().unwrap_or_default(),
            max: window.iter().copied().max().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    pub samples: usize,
    pub average: Duration,
    pub min: Duration,
    pub max: Duration,
}

/// Rolling per-phase timings over the last `capacity` ticks.
#[derive(Debug, Clone)]
pub struct TickProfiler {
    capacity: usize,
    total: RingHistory,
    phases: BTreeMap<&'static str, RingHistory>,
    entropy_lengths: u64,
    ticks: u64,
    budget: Duration,
    over_budget: u64,
}

impl TickProfiler {
    /// `budget` is the wall time a tick may take before it counts as late,
    /// usually the fixed delta.
    pub fn new(capacity: usize, budget: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            total: RingHistory::new(capacity),
            phases: BTreeMap::new(),
            entropy_lengths: 0,
            ticks: 0,
            budget,
            over_budget: 0,
        }
    }

    pub fn record(&mut self, profile: &SolveProfile) {
        self.total.record(profile.total);
        let capacity = self.capacity;
        for &(name, d) in &profile.phases {
            self.phases
                .entry(name)
                .or_insert_with(|| RingHistory::new(capacity))
                .record(d);
        }
        self.ticks += 1;
        self.entropy_lengths += profile.entropy_length as u64;
        if profile.total > self.budget {
            self.over_budget += 1;
            tracing::debug!(
                total_us = profile.total.as_micros() as u64,
                budget_us = self.budget.as_micros() as u64,
                "tick over budget"
            );
        }
    }

    pub fn total(&self) -> PhaseStats {
        self.total.stats()
    }

    pub fn phase(&self, name: &str) -> Option<PhaseStats> {
        self.phases.get(name).map(RingHistory::stats)
    }

    /// Phases ordered by average cost, most expensive first.
    pub fn hottest(&self) -> Vec<(&'static str, PhaseStats)> {
        let mut all: Vec<_> = self.phases.iter().map(|(n, h)| (*n, h.stats())).collect();
        all.sort_by(|a, b| b.1.average.cmp(&a.1.average).then(a.0.cmp(b.0)));
        all
    }

    /// Ticks recorded since creation, not just the ones in the window.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn over_budget(&self) -> u64 {
        self.over_budget
    }

    pub fn mean_entropy_length(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.entropy_lengths as f64 / self.ticks as f64
        }
    }
}
