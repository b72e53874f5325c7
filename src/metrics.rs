//! Flow metrics computed from the task set.
//!
//! Everything here is a pure function of the tasks, the config and "now".
//! Per-status dwell time is not recorded, so flow efficiency is
//! approximated as cycle time over lead time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingItem {
    pub id: u32,
    pub title: String,
    pub status: String,
    pub age_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    #[serde(with = "crate::date::instant")]
    pub generated_at: DateTime<Utc>,
    pub throughput_7d: usize,
    pub throughput_30d: usize,
    pub completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_lead_time_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_lead_time_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cycle_time_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_cycle_time_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_efficiency: Option<f64>,
    pub aging: Vec<AgingItem>,
}

fn hours(d: Duration) -> f64 {
    d.num_seconds().max(0) as f64 / 3600.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Tasks completed within `(now - window, now]`.
pub fn throughput(tasks: &[Task], window: Duration, now: DateTime<Utc>) -> usize {
    let start = now - window;
    tasks
        .iter()
        .filter_map(|t| t.completed)
        .filter(|c| *c > start && *c <= now)
        .count()
}

pub fn compute(cfg: &Config, tasks: &[Task], now: DateTime<Utc>) -> Metrics {
    let completed: Vec<&Task> = tasks.iter().filter(|t| t.completed.is_some()).collect();

    let mut lead = Vec::with_capacity(completed.len());
    let mut cycle = Vec::with_capacity(completed.len());
    let mut efficiency = Vec::new();
    for task in &completed {
        let Some(done) = task.completed else { continue };
        let lead_h = hours(done - task.created);
        let cycle_h = task.started.map_or(0.0, |s| hours(done - s));
        lead.push(lead_h);
        cycle.push(cycle_h);
        if lead_h > 0.0 {
            efficiency.push((cycle_h / lead_h).min(1.0));
        }
    }

    let mut aging: Vec<AgingItem> = tasks
        .iter()
        .filter(|t| !cfg.is_terminal(&t.status))
        .map(|t| AgingItem {
            id: t.id,
            title: t.title.clone(),
            status: t.status.clone(),
            age_hours: round2(hours(now - t.updated)),
        })
        .collect();
    aging.sort_by(|a, b| b.age_hours.total_cmp(&a.age_hours).then(a.id.cmp(&b.id)));

    Metrics {
        generated_at: now,
        throughput_7d: throughput(tasks, Duration::days(7), now),
        throughput_30d: throughput(tasks, Duration::days(30), now),
        completed: completed.len(),
        avg_lead_time_hours: mean(&lead).map(round2),
        median_lead_time_hours: median(&lead).map(round2),
        avg_cycle_time_hours: mean(&cycle).map(round2),
        median_cycle_time_hours: median(&cycle).map(round2),
        flow_efficiency: mean(&efficiency).map(round2),
        aging,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap()
    }

    fn done(id: u32, created_h: i64, started_h: Option<i64>, completed_h: i64) -> Task {
        let mut t = Task::new(id, format!("t{id}"), now() - Duration::hours(created_h));
        t.status = "done".into();
        t.started = started_h.map(|h| now() - Duration::hours(h));
        t.completed = Some(now() - Duration::hours(completed_h));
        t
    }

    #[test]
    fn test_empty_board() {
        let cfg = Config::new_default(Path::new("/tmp"), "x");
        let m = compute(&cfg, &[], now());
        assert_eq!(m.completed, 0);
        assert!(m.avg_lead_time_hours.is_none());
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("flow_efficiency").is_none());
        assert_eq!(json["aging"], serde_json::json!([]));
    }

    #[test]
    fn test_lead_cycle_and_efficiency() {
        let cfg = Config::new_default(Path::new("/tmp"), "x");
        let tasks = vec![
            done(1, 100, Some(60), 40), // lead 60, cycle 20
            done(2, 50, Some(30), 10),  // lead 40, cycle 20
            done(3, 30, None, 10),      // lead 20, cycle 0
        ];
        let m = compute(&cfg, &tasks, now());
        assert_eq!(m.completed, 3);
        assert_eq!(m.avg_lead_time_hours, Some(40.0));
        assert_eq!(m.median_lead_time_hours, Some(40.0));
        assert_eq!(m.median_cycle_time_hours, Some(20.0));
        assert_eq!(m.flow_efficiency, Some(round2((20.0 / 60.0 + 0.5 + 0.0) / 3.0)));
    }

    #[test]
    fn test_throughput_windows() {
        let cfg = Config::new_default(Path::new("/tmp"), "x");
        let tasks = vec![
            done(1, 500, None, 24),       // 1 day ago
            done(2, 500, None, 24 * 10),  // 10 days ago
            done(3, 900, None, 24 * 40),  // 40 days ago
            done(4, 900, None, 24 * 7),   // exactly 7 days ago: outside (now-7d, now]
        ];
        let m = compute(&cfg, &tasks, now());
        assert_eq!(m.throughput_7d, 1);
        assert_eq!(m.throughput_30d, 3);
    }

    #[test]
    fn test_aging_ranks_oldest_first() {
        let cfg = Config::new_default(Path::new("/tmp"), "x");
        let mut a = Task::new(1, "a", now() - Duration::hours(5));
        a.status = "todo".into();
        let mut b = Task::new(2, "b", now() - Duration::hours(50));
        b.status = "in-progress".into();
        let c = done(3, 500, None, 1);
        let m = compute(&cfg, &[a, b, c], now());
        let ids: Vec<u32> = m.aging.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(m.aging[0].age_hours, 50.0);
    }
}
