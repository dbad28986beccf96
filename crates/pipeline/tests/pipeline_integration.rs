//! End-to-end runs over in-memory and on-disk light curves

use light_curve::{LoadError, MemorySource, SeriesSource, TimeSeries};
use pipeline::{rebuild_index, Pipeline, PipelineConfig, PipelineError};
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Deterministic xorshift64 generator for reproducible noise
struct XorShift(u64);

impl XorShift {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn daily_times(n: usize) -> Vec<f64> {
    (0..n).map(|i| 59000.0 + i as f64).collect()
}

fn sinusoid(identifier: &str, n: usize, phase: f64) -> TimeSeries {
    let times = daily_times(n);
    let mags = times
        .iter()
        .map(|t| 18.0 + 0.5 * (2.0 * PI * t / 5.0 + phase).sin())
        .collect();
    TimeSeries::new(identifier, times, mags).unwrap()
}

fn noise(identifier: &str, n: usize) -> TimeSeries {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let times = daily_times(n);
    let mags = times.iter().map(|_| 18.0 + (rng.next_f64() - 0.5)).collect();
    TimeSeries::new(identifier, times, mags).unwrap()
}

fn write_csv(dir: &Path, series: &TimeSeries) {
    let mut text = String::from("mjd,mag\n");
    for (t, m) in series.times().iter().zip(series.magnitudes()) {
        writeln!(text, "{},{}", t, m).unwrap();
    }
    fs::write(dir.join(series.identifier()), text).unwrap();
}

fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        input_dir: dir.join("curves"),
        feature_table_path: dir.join("rounded_power.csv"),
        inverse_index_path: dir.join("binned_inverse_index.csv"),
        workers: 3,
        ..Default::default()
    }
}

fn three_curves() -> Vec<TimeSeries> {
    vec![
        sinusoid("a.csv", 20, 0.0),
        noise("b.csv", 20),
        sinusoid("c.csv", 20, PI),
    ]
}

#[tokio::test]
async fn test_shared_power_groups_matching_curves() {
    let dir = TempDir::new().unwrap();
    let source: MemorySource = three_curves().into_iter().collect();

    let output = Pipeline::new(config_in(dir.path()))
        .run(Arc::new(source))
        .await
        .unwrap();

    assert_eq!(output.table.identifiers(), vec!["a.csv", "b.csv", "c.csv"]);
    assert_eq!(output.table.get("a.csv").unwrap().powers, vec![0.97; 4]);
    assert_eq!(output.table.get("c.csv").unwrap().powers, vec![0.97; 4]);
    assert_eq!(output.table.get("b.csv").unwrap().powers, vec![0.42; 4]);

    assert_eq!(output.index.len(), 2);
    assert_eq!(
        output.index.get(0.97).unwrap().identifiers,
        vec!["a.csv", "c.csv"]
    );
    assert_eq!(output.index.get(0.42).unwrap().identifiers, vec!["b.csv"]);
    assert_eq!(output.index.neighbors("a.csv"), vec!["c.csv"]);
    assert!(output.index.neighbors("b.csv").is_empty());

    let table_text = fs::read_to_string(dir.path().join("rounded_power.csv")).unwrap();
    assert_eq!(
        table_text,
        "a.csv,b.csv,c.csv\n\
         0.97,0.42,0.97\n\
         0.97,0.42,0.97\n\
         0.97,0.42,0.97\n\
         0.97,0.42,0.97\n"
    );
    let index_text = fs::read_to_string(dir.path().join("binned_inverse_index.csv")).unwrap();
    assert_eq!(index_text, "0.42,b.csv\n0.97,a.csv;c.csv\n");

    assert_eq!(output.report.retained, 3);
    assert_eq!(output.report.index_entries, Some(2));
    assert!(output.report.is_balanced());
}

#[tokio::test]
async fn test_constant_curve_is_a_spectral_failure() {
    let dir = TempDir::new().unwrap();
    let mut curves = three_curves();
    curves.push(TimeSeries::new("flat.csv", daily_times(20), vec![18.0; 20]).unwrap());
    let source: MemorySource = curves.into_iter().collect();

    let output = Pipeline::new(config_in(dir.path()))
        .run(Arc::new(source))
        .await
        .unwrap();

    assert_eq!(output.table.identifiers(), vec!["a.csv", "b.csv", "c.csv"]);
    assert!(output.index.neighbors("flat.csv").is_empty());
    assert_eq!(output.report.discovered, 4);
    assert_eq!(output.report.spectral_failures, 1);
    assert_eq!(output.report.retained, 3);
    assert!(output.report.is_balanced());

    let table_text = fs::read_to_string(dir.path().join("rounded_power.csv")).unwrap();
    assert!(!table_text.contains("flat.csv"));
}

#[tokio::test]
async fn test_unwritable_output_is_fatal() {
    let dir = TempDir::new().unwrap();
    let source: MemorySource = three_curves().into_iter().collect();
    let config = PipelineConfig {
        feature_table_path: dir.path().join("absent").join("rounded_power.csv"),
        ..config_in(dir.path())
    };

    let result = Pipeline::new(config).run(Arc::new(source)).await;

    assert!(matches!(result, Err(PipelineError::Write(_))));
    // the table is written first, so the index is never reached
    assert!(!dir.path().join("binned_inverse_index.csv").exists());
}

#[tokio::test]
async fn test_minimum_observation_boundary() {
    let dir = TempDir::new().unwrap();
    let source: MemorySource = vec![
        sinusoid("fourteen.csv", 14, 0.0),
        sinusoid("fifteen.csv", 15, 0.0),
        sinusoid("ten.csv", 10, 0.0),
    ]
    .into_iter()
    .collect();

    let (table, report) = Pipeline::new(config_in(dir.path()))
        .extract(Arc::new(source))
        .await
        .unwrap();

    assert_eq!(table.identifiers(), vec!["fifteen.csv"]);
    assert_eq!(report.insufficient_data, 2);
    assert_eq!(report.retained, 1);
}

#[tokio::test]
async fn test_discovery_order_does_not_change_artifacts() {
    let forward = TempDir::new().unwrap();
    let reverse = TempDir::new().unwrap();

    let mut curves = three_curves();
    let first: MemorySource = curves.clone().into_iter().collect();
    curves.reverse();
    let second: MemorySource = curves.into_iter().collect();

    Pipeline::new(config_in(forward.path()))
        .run(Arc::new(first))
        .await
        .unwrap();
    Pipeline::new(PipelineConfig {
        workers: 1,
        ..config_in(reverse.path())
    })
    .run(Arc::new(second))
    .await
    .unwrap();

    for name in ["rounded_power.csv", "binned_inverse_index.csv"] {
        assert_eq!(
            fs::read(forward.path().join(name)).unwrap(),
            fs::read(reverse.path().join(name)).unwrap(),
            "{} differs",
            name
        );
    }
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let curves = dir.path().join("curves");
    fs::create_dir(&curves).unwrap();
    for series in three_curves() {
        write_csv(&curves, &series);
    }

    let pipeline = Pipeline::new(config_in(dir.path()));
    pipeline
        .run(Arc::new(pipeline.directory_source()))
        .await
        .unwrap();
    let table = fs::read(dir.path().join("rounded_power.csv")).unwrap();
    let index = fs::read(dir.path().join("binned_inverse_index.csv")).unwrap();

    pipeline
        .run(Arc::new(pipeline.directory_source()))
        .await
        .unwrap();
    assert_eq!(fs::read(dir.path().join("rounded_power.csv")).unwrap(), table);
    assert_eq!(fs::read(dir.path().join("binned_inverse_index.csv")).unwrap(), index);
}

#[tokio::test]
async fn test_directory_run_skips_bad_files() {
    let dir = TempDir::new().unwrap();
    let curves = dir.path().join("curves");
    fs::create_dir(&curves).unwrap();
    for series in three_curves() {
        write_csv(&curves, &series);
    }
    write_csv(&curves, &sinusoid("short.csv", 12, 0.0));
    fs::write(curves.join("empty.csv"), "").unwrap();
    fs::write(curves.join("garbage.csv"), "time,flux\n1,2\n").unwrap();
    fs::create_dir(curves.join("nested")).unwrap();

    let pipeline = Pipeline::new(config_in(dir.path()));
    let output = pipeline
        .run(Arc::new(pipeline.directory_source()))
        .await
        .unwrap();

    assert_eq!(output.table.identifiers(), vec!["a.csv", "b.csv", "c.csv"]);
    assert_eq!(output.report.discovered, 6);
    assert_eq!(output.report.parse_failures, 2);
    assert_eq!(output.report.insufficient_data, 1);
    assert!(output.report.is_balanced());

    // the two-step workflow reproduces the index from the persisted table
    let rebuilt_path = dir.path().join("rebuilt.csv");
    let rebuilt = rebuild_index(&dir.path().join("rounded_power.csv"), &rebuilt_path).unwrap();
    assert_eq!(rebuilt, output.index);
    assert_eq!(
        fs::read(&rebuilt_path).unwrap(),
        fs::read(dir.path().join("binned_inverse_index.csv")).unwrap()
    );
}

#[tokio::test]
async fn test_missing_input_dir_is_fatal() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()));
    let result = pipeline.run(Arc::new(pipeline.directory_source())).await;

    assert!(matches!(result, Err(PipelineError::Discovery(_))));
    assert!(!dir.path().join("rounded_power.csv").exists());
    assert!(!dir.path().join("binned_inverse_index.csv").exists());
}

#[tokio::test]
async fn test_empty_directory_writes_empty_artifacts() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("curves")).unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()));
    let output = pipeline
        .run(Arc::new(pipeline.directory_source()))
        .await
        .unwrap();

    assert!(output.table.is_empty());
    assert!(output.index.is_empty());
    assert!(fs::read(dir.path().join("rounded_power.csv")).unwrap().is_empty());
    assert!(fs::read(dir.path().join("binned_inverse_index.csv")).unwrap().is_empty());
}

/// Wraps a source and stalls on one identifier
struct SlowSource {
    inner: MemorySource,
    slow: &'static str,
    delay: Duration,
}

impl SeriesSource for SlowSource {
    fn describe(&self) -> String {
        format!("slow {}", self.inner.describe())
    }

    fn discover(&self) -> Result<Vec<String>, LoadError> {
        self.inner.discover()
    }

    fn load(&self, identifier: &str) -> Result<TimeSeries, LoadError> {
        if identifier == self.slow {
            std::thread::sleep(self.delay);
        }
        self.inner.load(identifier)
    }
}

#[tokio::test]
async fn test_timed_out_series_is_excluded() {
    let dir = TempDir::new().unwrap();
    let source = SlowSource {
        inner: three_curves().into_iter().collect(),
        slow: "b.csv",
        delay: Duration::from_millis(1500),
    };
    let config = PipelineConfig {
        series_timeout_ms: 200,
        ..config_in(dir.path())
    };

    let started = Instant::now();
    let (table, report) = Pipeline::new(config)
        .extract(Arc::new(source))
        .await
        .unwrap();

    // the run does not wait for the stalled load
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(table.identifiers(), vec!["a.csv", "c.csv"]);
    assert_eq!(report.timeouts, 1);
    assert!(report.is_balanced());
}

/// Reports every identifier twice
struct RepeatingSource(MemorySource);

impl SeriesSource for RepeatingSource {
    fn describe(&self) -> String {
        self.0.describe()
    }

    fn discover(&self) -> Result<Vec<String>, LoadError> {
        let ids = self.0.discover()?;
        Ok(ids.iter().chain(ids.iter()).cloned().collect())
    }

    fn load(&self, identifier: &str) -> Result<TimeSeries, LoadError> {
        self.0.load(identifier)
    }
}

#[tokio::test]
async fn test_duplicate_identifiers_counted_once() {
    let dir = TempDir::new().unwrap();
    let source = RepeatingSource(three_curves().into_iter().collect());

    let (table, report) = Pipeline::new(config_in(dir.path()))
        .extract(Arc::new(source))
        .await
        .unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(report.discovered, 6);
    assert_eq!(report.duplicates, 3);
    assert!(report.is_balanced());
}
