//! Prometheus exposition of group counters

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::error::{Error, Result};
use crate::group::Group;

fn metric_err(e: prometheus::Error) -> Error {
    Error::Internal(format!("metrics: {}", e))
}

/// Render the current counters of `groups` in the text exposition format.
///
/// Counters live in the groups themselves, so each scrape builds a fresh
/// registry from their snapshots.
pub fn render_metrics(groups: &[Arc<Group>]) -> Result<String> {
    let registry = Registry::new();

    let events = IntCounterVec::new(
        Opts::new("zcache_group_events_total", "Group lookup events by kind"),
        &["group", "event"],
    )
    .map_err(metric_err)?;
    let cache_bytes = IntGaugeVec::new(
        Opts::new("zcache_cache_bytes", "Bytes held in the local store"),
        &["group"],
    )
    .map_err(metric_err)?;
    let cache_items = IntGaugeVec::new(
        Opts::new("zcache_cache_items", "Entries held in the local store"),
        &["group"],
    )
    .map_err(metric_err)?;

    registry
        .register(Box::new(events.clone()))
        .map_err(metric_err)?;
    registry
        .register(Box::new(cache_bytes.clone()))
        .map_err(metric_err)?;
    registry
        .register(Box::new(cache_items.clone()))
        .map_err(metric_err)?;

    for group in groups {
        let snapshot = group.snapshot();
        let name = snapshot.name.as_str();
        for (event, value) in snapshot.stats.counters() {
            events.with_label_values(&[name, event]).inc_by(value);
        }
        cache_bytes.with_label_values(&[name]).set(snapshot.cache_bytes);
        cache_items
            .with_label_values(&[name])
            .set(snapshot.cache_items as i64);
    }

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .map_err(metric_err)?;
    String::from_utf8(buffer).map_err(|e| Error::Internal(format!("metrics: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Getter, GetterFn};

    #[tokio::test]
    async fn test_renders_counters_per_group() {
        let getter: Arc<dyn Getter> =
            Arc::new(GetterFn::new(|key: &str| Ok(key.as_bytes().to_vec())));
        let group = Arc::new(Group::new("scores", 2 << 10, getter));
        group.get("zurich").await.unwrap();
        group.get("zurich").await.unwrap();

        let output = render_metrics(&[group]).unwrap();

        assert!(output.contains(r#"zcache_group_events_total{event="gets",group="scores"} 2"#));
        assert!(output
            .contains(r#"zcache_group_events_total{event="cache_hits",group="scores"} 1"#));
        assert!(output.contains(r#"zcache_cache_items{group="scores"} 1"#));
        assert!(output.contains(r#"zcache_cache_bytes{group="scores"} 12"#));
    }

    #[test]
    fn test_no_groups() {
        let output = render_metrics(&[]).unwrap();
        assert!(!output.contains("group=\""));
    }
}
