use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub requests_total: IntCounterVec,
    pub refresh_latency_seconds: HistogramVec,
    pub fare_quotes_total: IntCounterVec,
    pub searches_superseded_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Ride service operations by outcome"),
            &["operation", "outcome"],
        )
        .expect("valid requests_total metric");

        let refresh_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "refresh_latency_seconds",
                "Latency of snapshot refreshes in seconds",
            ),
            &["snapshot"],
        )
        .expect("valid refresh_latency_seconds metric");

        let fare_quotes_total = IntCounterVec::new(
            Opts::new("fare_quotes_total", "Fare quotes shown by source"),
            &["source"],
        )
        .expect("valid fare_quotes_total metric");

        let searches_superseded_total = IntCounter::new(
            "searches_superseded_total",
            "Place searches aborted by a newer query",
        )
        .expect("valid searches_superseded_total metric");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("register requests_total");
        registry
            .register(Box::new(refresh_latency_seconds.clone()))
            .expect("register refresh_latency_seconds");
        registry
            .register(Box::new(fare_quotes_total.clone()))
            .expect("register fare_quotes_total");
        registry
            .register(Box::new(searches_superseded_total.clone()))
            .expect("register searches_superseded_total");

        Self {
            registry,
            requests_total,
            refresh_latency_seconds,
            fare_quotes_total,
            searches_superseded_total,
        }
    }

    pub fn record_request(&self, operation: &str, outcome: &str) {
        self.requests_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
