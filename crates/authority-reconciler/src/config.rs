/// Reconciler-tunable knobs sourced from `authority_config::Config`
/// (`refuse-offer-seconds` in the configuration table).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileConfig {
    pub refuse_offer_seconds: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            refuse_offer_seconds: 5.0,
        }
    }
}
