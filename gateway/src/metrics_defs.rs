//! Metric definitions for the gateway.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

pub const REDIRECTS_ISSUED: MetricDef = MetricDef {
    name: "redirects.issued",
    metric_type: MetricType::Counter,
    description: "Redirects issued. Tagged with reason.",
};

pub const REQUESTS_FORWARDED: MetricDef = MetricDef {
    name: "requests.forwarded",
    metric_type: MetricType::Counter,
    description: "Requests passed through to the upstream",
};

pub const UPSTREAM_ERRORS: MetricDef = MetricDef {
    name: "upstream.errors",
    metric_type: MetricType::Counter,
    description: "Failed or timed-out upstream requests",
};

pub const ALL_METRICS: &[MetricDef] = &[REDIRECTS_ISSUED, REQUESTS_FORWARDED, UPSTREAM_ERRORS];
