/// Process-wide Prometheus registry. Names registered here are exported with
/// the `snipe_` prefix.
#[cfg(feature = "metrics")]
pub struct Metrics {
    registry: prometheus::Registry,
}

#[cfg(feature = "metrics")]
impl Metrics {
    pub fn new() -> Self {
        let registry = prometheus::Registry::new_custom(Some("snipe".to_string()), None)
            .unwrap_or_default();
        Self { registry }
    }

    pub fn registry(&self) -> &prometheus::Registry {
        &self.registry
    }

    pub fn counter(&self, name: &str, help: &str) -> prometheus::Result<prometheus::IntCounter> {
        let counter = prometheus::IntCounter::with_opts(prometheus::Opts::new(name, help))?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    pub fn counter_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> prometheus::Result<prometheus::IntCounterVec> {
        let counters = prometheus::IntCounterVec::new(prometheus::Opts::new(name, help), labels)?;
        self.registry.register(Box::new(counters.clone()))?;
        Ok(counters)
    }

    /// Text exposition of everything registered.
    pub fn gather(&self) -> String {
        use prometheus::Encoder;

        let mut buf = Vec::new();
        let _ = prometheus::TextEncoder::new().encode(&self.registry.gather(), &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(feature = "metrics")]
impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct Metrics;

#[cfg(not(feature = "metrics"))]
impl Metrics {
    pub fn new() -> Self {
        Metrics
    }

    pub fn gather(&self) -> String {
        String::new()
    }
}
