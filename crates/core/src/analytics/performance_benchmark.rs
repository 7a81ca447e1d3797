use std::cmp::Ordering;
use std::fmt;
use std::thread;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use super::memory_probe::{MemoryProbe, ProcessMemoryProbe};
use super::provider_failure::ProviderFailure;
use super::samples::ProviderSamples;
use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::provider_error::ProviderError;
use crate::conversion::infrastructure::converter_registry::ConverterRegistry;
use crate::shared::math::mean;

/// One timed conversion.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkRun {
    pub elapsed_secs: f64,
    /// Resident memory growth across the run; zero when it shrank or could not be sampled.
    pub memory_bytes: u64,
    /// Size of the compact canonical JSON the run produced.
    pub output_bytes: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderBenchmark {
    pub provider: String,
    pub runs: Vec<BenchmarkRun>,
}

impl ProviderBenchmark {
    pub fn mean_elapsed_secs(&self) -> f64 {
        let values: Vec<f64> = self.runs.iter().map(|r| r.elapsed_secs).collect();
        mean(&values).unwrap_or(0.0)
    }

    pub fn mean_memory_bytes(&self) -> f64 {
        let values: Vec<f64> = self.runs.iter().map(|r| r.memory_bytes as f64).collect();
        mean(&values).unwrap_or(0.0)
    }

    pub fn mean_output_bytes(&self) -> f64 {
        let values: Vec<f64> = self.runs.iter().map(|r| r.output_bytes as f64).collect();
        mean(&values).unwrap_or(0.0)
    }
}

/// Provider names ordered best-first, one list per metric. The lists may disagree.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub fastest: Vec<String>,
    pub lowest_memory: Vec<String>,
    pub smallest_output: Vec<String>,
}

impl Rankings {
    fn from_benchmarks(benchmarks: &[ProviderBenchmark]) -> Self {
        let rank = |metric: fn(&ProviderBenchmark) -> f64| {
            let mut scored: Vec<(&str, f64)> = benchmarks
                .iter()
                .map(|b| (b.provider.as_str(), metric(b)))
                .collect();
            scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            scored.into_iter().map(|(n, _)| n.to_string()).collect()
        };
        Self {
            fastest: rank(ProviderBenchmark::mean_elapsed_secs),
            lowest_memory: rank(ProviderBenchmark::mean_memory_bytes),
            smallest_output: rank(ProviderBenchmark::mean_output_bytes),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceReport {
    iterations: usize,
    parallel: bool,
    benchmarks: Vec<ProviderBenchmark>,
    rankings: Rankings,
    failures: Vec<ProviderFailure>,
}

impl PerformanceReport {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn benchmarks(&self) -> &[ProviderBenchmark] {
        &self.benchmarks
    }

    pub fn benchmark(&self, provider: &str) -> Option<&ProviderBenchmark> {
        self.benchmarks.iter().find(|b| b.provider == provider)
    }

    pub fn rankings(&self) -> &Rankings {
        &self.rankings
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PERFORMANCE BENCHMARK ({} iteration(s){})",
            self.iterations,
            if self.parallel { ", parallel" } else { "" }
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<12} {:>12} {:>14} {:>14}",
            "provider", "mean ms", "mean mem KiB", "output bytes"
        )?;
        for b in &self.benchmarks {
            writeln!(
                f,
                "{:<12} {:>12.3} {:>14.1} {:>14.0}",
                b.provider,
                b.mean_elapsed_secs() * 1000.0,
                b.mean_memory_bytes() / 1024.0,
                b.mean_output_bytes()
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "{failure}")?;
        }
        writeln!(f)?;
        writeln!(f, "fastest:         {}", self.rankings.fastest.join(" > "))?;
        writeln!(f, "lowest memory:   {}", self.rankings.lowest_memory.join(" > "))?;
        writeln!(f, "smallest output: {}", self.rankings.smallest_output.join(" > "))
    }
}

/// Times repeated conversions per provider.
///
/// A provider's iterations always run back to back on one thread. With [`parallel`]
/// enabled each provider gets its own scoped thread; results are gathered over a channel
/// and reported in request order.
///
/// [`parallel`]: PerformanceBenchmark::parallel
pub struct PerformanceBenchmark<'r> {
    registry: &'r ConverterRegistry,
    iterations: usize,
    parallel: bool,
    probe: Box<dyn MemoryProbe>,
}

impl<'r> PerformanceBenchmark<'r> {
    pub fn new(registry: &'r ConverterRegistry, iterations: usize) -> Result<Self, &'static str> {
        if iterations == 0 {
            return Err("iterations must be at least 1");
        }
        Ok(Self {
            registry,
            iterations,
            parallel: false,
            probe: Box::new(ProcessMemoryProbe::new()),
        })
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn run(&self, samples: &ProviderSamples) -> Result<PerformanceReport, ProviderError> {
        let inputs = samples.resolve(self.registry)?;
        let outcomes = if self.parallel {
            self.run_parallel(&inputs)
        } else {
            inputs
                .iter()
                .map(|(converter, sample)| self.bench_provider(*converter, sample))
                .collect()
        };

        let mut benchmarks = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(b) => benchmarks.push(b),
                Err(f) => failures.push(f),
            }
        }
        let rankings = Rankings::from_benchmarks(&benchmarks);
        log::info!(
            "performance: {} provider(s) benchmarked over {} iteration(s), {} failed",
            benchmarks.len(),
            self.iterations,
            failures.len()
        );
        Ok(PerformanceReport {
            iterations: self.iterations,
            parallel: self.parallel,
            benchmarks,
            rankings,
            failures,
        })
    }

    fn run_parallel(
        &self,
        inputs: &[(&dyn Converter, &Value)],
    ) -> Vec<Result<ProviderBenchmark, ProviderFailure>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::scope(|scope| {
            for (index, (converter, sample)) in inputs.iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move || {
                    let outcome = self.bench_provider(*converter, sample);
                    // The receiver outlives the scope, so this cannot fail.
                    let _ = tx.send((index, outcome));
                });
            }
        });
        drop(tx);

        let mut collected: Vec<_> = rx.iter().collect();
        collected.sort_by_key(|(index, _)| *index);
        collected.into_iter().map(|(_, outcome)| outcome).collect()
    }

    fn bench_provider(
        &self,
        converter: &dyn Converter,
        sample: &Value,
    ) -> Result<ProviderBenchmark, ProviderFailure> {
        let name = converter.provider_name();
        let mut runs = Vec::with_capacity(self.iterations);
        for _ in 0..self.iterations {
            let before = self.probe.resident_bytes();
            let start = Instant::now();
            let doc = converter
                .convert_to_canonical(sample)
                .map_err(|e| ProviderFailure::new(name, e))?;
            let elapsed = start.elapsed();
            let after = self.probe.resident_bytes();

            let output = doc.to_value().map_err(|e| ProviderFailure::new(name, e))?;
            runs.push(BenchmarkRun {
                elapsed_secs: elapsed.as_secs_f64(),
                memory_bytes: match (before, after) {
                    (Some(b), Some(a)) => a.saturating_sub(b),
                    _ => 0,
                },
                output_bytes: output.to_string().len(),
            });
        }
        log::debug!("{name}: {} run(s) recorded", runs.len());
        Ok(ProviderBenchmark {
            provider: name.to_string(),
            runs,
        })
    }
}
