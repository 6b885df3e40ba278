use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub route_computations_total: IntCounterVec,
    pub route_latency_seconds: HistogramVec,
    pub triggers_in_queue: IntGauge,
    pub fixes_total: IntCounterVec,
    pub resolutions_total: IntCounterVec,
    pub live_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let route_computations_total = IntCounterVec::new(
            Opts::new(
                "route_computations_total",
                "Route recomputations by outcome",
            ),
            &["outcome"],
        )
        .expect("valid route_computations_total metric");

        let route_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "route_latency_seconds",
                "Latency of route recomputation in seconds",
            ),
            &["outcome"],
        )
        .expect("valid route_latency_seconds metric");

        let triggers_in_queue = IntGauge::new(
            "triggers_in_queue",
            "Current number of pending route recompute triggers",
        )
        .expect("valid triggers_in_queue metric");

        let fixes_total = IntCounterVec::new(
            Opts::new("fixes_total", "Ingested driver fixes by result"),
            &["result"],
        )
        .expect("valid fixes_total metric");

        let resolutions_total = IntCounterVec::new(
            Opts::new("resolutions_total", "Address resolutions by outcome"),
            &["outcome"],
        )
        .expect("valid resolutions_total metric");

        let live_subscribers = IntGauge::new(
            "live_subscribers",
            "Currently connected live-tracking subscribers",
        )
        .expect("valid live_subscribers metric");

        registry
            .register(Box::new(route_computations_total.clone()))
            .expect("register route_computations_total");
        registry
            .register(Box::new(route_latency_seconds.clone()))
            .expect("register route_latency_seconds");
        registry
            .register(Box::new(triggers_in_queue.clone()))
            .expect("register triggers_in_queue");
        registry
            .register(Box::new(fixes_total.clone()))
            .expect("register fixes_total");
        registry
            .register(Box::new(resolutions_total.clone()))
            .expect("register resolutions_total");
        registry
            .register(Box::new(live_subscribers.clone()))
            .expect("register live_subscribers");

        Self {
            registry,
            route_computations_total,
            route_latency_seconds,
            triggers_in_queue,
            fixes_total,
            resolutions_total,
            live_subscribers,
        }
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
