// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Integration tests for the metrics accumulation and reporting stack

use suda::Observation;
use suda_eval::{aggregate, Metrics, MetricsConfig, ParallelUpdater, Report, Reporter};

/// A task pairs an accumulator with its identifier for aggregation.
struct Task {
    id: String,
    metrics: Metrics,
}

impl Task {
    fn new(id: &str, workers: usize) -> Self {
        Self {
            id: id.to_string(),
            metrics: Metrics::new(&MetricsConfig { workers }).unwrap(),
        }
    }
}

impl Reporter for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn report(&self) -> Report {
        self.metrics.report()
    }
}

#[test]
fn test_mixed_observation_stream() {
    let metrics = Metrics::new(&MetricsConfig::default()).unwrap();

    // generative example with an exact match
    let result = metrics.update(
        &Observation::new().with_text("It is Paris!"),
        &["it is paris"],
    );
    assert!(result.correct);

    // ranking example, match at rank 2
    metrics.update(
        &Observation::new().with_candidates(["london", "paris", "berlin"]),
        &["paris"],
    );

    // agent-supplied metrics only
    let mut obs = Observation::new();
    obs.insert_metric("loss", 1.5);
    obs.insert_metric("ppl", 4.5);
    metrics.update(&obs, &[] as &[&str]);

    let report = metrics.report();
    assert_eq!(report.exs, 3);
    assert_eq!(report.get("accuracy"), Some(1.0));
    assert_eq!(report.get("f1"), Some(1.0));
    assert_eq!(report.get("hits@1"), Some(0.0));
    assert_eq!(report.get("hits@5"), Some(1.0));
    assert_eq!(report.get("loss"), Some(1.5));
    assert_eq!(report.get("ppl"), Some(4.5));
    assert_eq!(report.get("intra-distinct-1"), Some(1.0));
}

#[test]
fn test_parallel_shards_aggregate() {
    let qa = Task::new("qa", 4);
    let chitchat = Task::new("chitchat", 4);

    let qa_batch: Vec<(Observation, Vec<&str>)> = (0..40)
        .map(|i| {
            let text = if i % 4 == 0 { "right" } else { "wrong" };
            (Observation::new().with_text(text), vec!["right"])
        })
        .collect();
    let chitchat_batch: Vec<(Observation, Vec<&str>)> = (0..10)
        .map(|i| {
            let text = if i % 2 == 0 { "good answer" } else { "bad" };
            (Observation::new().with_text(text), vec!["good answer"])
        })
        .collect();

    let updater = ParallelUpdater::new().with_threads(4);
    updater.run(&qa.metrics, &qa_batch).unwrap();
    updater.run(&chitchat.metrics, &chitchat_batch).unwrap();

    assert_eq!(qa.report().get("accuracy"), Some(0.25));
    assert_eq!(chitchat.report().get("accuracy"), Some(0.5));

    let combined = aggregate(&[&qa, &chitchat]);
    assert_eq!(combined.exs, 50);
    // equal-weight mean over the two tasks
    assert_eq!(combined.mean("accuracy"), Some(0.375));
    assert_eq!(combined.task("qa").unwrap().exs, 40);
    assert_eq!(combined.task("chitchat").unwrap().exs, 10);
}

#[test]
fn test_clear_between_epochs() {
    let metrics = Metrics::new(&MetricsConfig::default()).unwrap();

    metrics.update(&Observation::new().with_text("wrong"), &["right"]);
    assert_eq!(metrics.report().get("accuracy"), Some(0.0));

    metrics.clear();
    assert_eq!(metrics.report(), Report::new(0));

    // second epoch accumulates from scratch, including frequency tables
    metrics.update(&Observation::new().with_text("right"), &["right"]);
    let report = metrics.report();
    assert_eq!(report.exs, 1);
    assert_eq!(report.get("accuracy"), Some(1.0));
    assert_eq!(report.get("inter-distinct-1"), Some(1.0));
}

#[test]
fn test_combined_report_json_shape() {
    let task = Task::new("convai", 1);
    task.metrics
        .update(&Observation::new().with_text("hello there"), &["hello there"]);

    let combined = aggregate(&[&task]);
    let json = serde_json::to_value(&combined).unwrap();

    assert_eq!(json["exs"], 1);
    assert_eq!(json["accuracy"], 1.0);
    assert_eq!(json["tasks"]["convai"]["exs"], 1);
    assert_eq!(json["tasks"]["convai"]["f1"], 1.0);
}

#[cfg(all(feature = "bleu", feature = "rouge"))]
#[test]
fn test_full_key_set_on_textual_run() {
    let metrics = Metrics::new(&MetricsConfig::default()).unwrap();
    metrics.update(
        &Observation::new().with_text("cat sat on mat today"),
        &["cat sat on mat today"],
    );

    let report = metrics.report();
    for key in [
        "accuracy",
        "f1",
        "bleu-1",
        "bleu-2",
        "bleu-3",
        "bleu-4",
        "rouge-1",
        "rouge-2",
        "rouge-l",
        "intra-distinct-1",
        "inter-distinct-1",
    ] {
        assert!(report.contains(key), "missing key: {key}");
    }
    // no ranking examples seen, so no hits keys
    assert!(!report.contains("hits@1"));
}
