//! Average metrics for humans vs animals.
//!
//! Gives a quick numeric overview of the dataset. Used by `gait stats` and
//! the REPL `stats` command.

use std::fmt::Write;

use crate::models::{Entity, Kind};
use crate::store::EntityStore;

/// Averages for one kind. `None` means no entity of that kind carries the
/// metric.
#[derive(Debug, Clone, PartialEq)]
pub struct KindStats {
    pub kind: Kind,
    pub count: usize,
    pub cadence: Option<f64>,
    pub vertical_oscillation: Option<f64>,
    pub stride_length: Option<f64>,
    pub efficiency_score: Option<f64>,
}

pub fn kind_stats(entities: &EntityStore, kind: Kind) -> KindStats {
    let group: Vec<&Entity> = entities.of_kind(kind).map(|(_, e)| e).collect();
    KindStats {
        kind,
        count: group.len(),
        cadence: mean(group.iter().map(|e| e.cadence as f64)),
        vertical_oscillation: mean(group.iter().map(|e| e.vertical_oscillation)),
        stride_length: mean(group.iter().filter_map(|e| e.stride_length)),
        efficiency_score: mean(group.iter().filter_map(|e| e.efficiency_score)),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Render the averages report.
pub fn format_stats(entities: &EntityStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Average Metrics");
    let _ = writeln!(out, "{}", "-".repeat(40));

    for (heading, kind) in [("Humans", Kind::Human), ("Animals", Kind::Animal)] {
        let stats = kind_stats(entities, kind);
        let _ = writeln!(out, "{} ({}):", heading, stats.count);
        let _ = writeln!(
            out,
            "  - Average cadence: {} steps/minute",
            format_avg(stats.cadence)
        );
        let _ = writeln!(
            out,
            "  - Average vertical oscillation: {} cm",
            format_avg(stats.vertical_oscillation)
        );
        if let Some(stride) = stats.stride_length {
            let _ = writeln!(out, "  - Average stride length: {:.1} meters", stride);
        }
        if let Some(score) = stats.efficiency_score {
            let _ = writeln!(out, "  - Average efficiency score: {:.1}/100", score);
        }
    }
    out
}

fn format_avg(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "n/a".to_string(),
    }
}
