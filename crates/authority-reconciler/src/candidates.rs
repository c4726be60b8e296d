use authority_broker::Offer;
use authority_kernel::domain::ResourceRequirements;
use authority_kernel::State;
use authority_types::InstanceId;

/// Selects which `Scheduled`/`Running`-goal instances fit `offer`, in
/// oldest-first first-fit order, subtracting each selected instance's
/// resource requirements from the running total before testing the
/// next candidate.
pub fn select_candidates(state: &State, offer: &Offer) -> Vec<InstanceId> {
    let mut available = ResourceRequirements {
        cpus: offer.cpus,
        mem_mb: offer.mem_mb,
        disk_mb: offer.disk_mb,
    };
    let mut selected = Vec::new();

    for instance in state.instances_oldest_first() {
        if !instance.is_offer_candidate() {
            continue;
        }
        let Some(run_spec) = state.get_run_spec(&instance.run_spec_ref) else {
            continue;
        };
        if !run_spec.resources.fits_within(&available) {
            continue;
        }
        if !run_spec.constraints.iter().all(|c| c.is_satisfied_by(&offer.attributes)) {
            continue;
        }

        available.cpus -= run_spec.resources.cpus;
        available.mem_mb -= run_spec.resources.mem_mb;
        available.disk_mb -= run_spec.resources.disk_mb;
        selected.push(instance.id);
    }

    selected
}
