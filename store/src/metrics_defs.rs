//! Metrics definitions for the store.

use shared::metrics_defs::{MetricDef, MetricType};

pub const STORE_RETRY: MetricDef = MetricDef {
    name: "store.retry",
    metric_type: MetricType::Counter,
    description: "Backend calls retried after a transient failure. Tagged with operation.",
};

pub const STORE_RETRIES_EXHAUSTED: MetricDef = MetricDef {
    name: "store.retries_exhausted",
    metric_type: MetricType::Counter,
    description: "Backend calls that failed on every attempt. Tagged with operation.",
};

pub const CACHE_HIT: MetricDef = MetricDef {
    name: "store.cache.hit",
    metric_type: MetricType::Counter,
    description: "Cache lookups that found a live entry",
};

pub const CACHE_MISS: MetricDef = MetricDef {
    name: "store.cache.miss",
    metric_type: MetricType::Counter,
    description: "Cache lookups that found nothing or an expired entry",
};

pub const ALL_METRICS: &[MetricDef] = &[STORE_RETRY, STORE_RETRIES_EXHAUSTED, CACHE_HIT, CACHE_MISS];
