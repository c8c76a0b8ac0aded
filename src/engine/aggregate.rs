//! Per-facility aggregation.

use std::collections::HashMap;

use crate::domain::{EmissionRecord, FacilityMetrics, ValidatedDataset};
use crate::engine::metrics::compute_metrics;

/// Group accepted records by facility and compute metrics for each group.
///
/// Output order is the order in which facilities first appear in the input.
pub fn aggregate_by_facility(dataset: &ValidatedDataset) -> Vec<FacilityMetrics> {
    let mut groups: Vec<(&str, Vec<&EmissionRecord>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in dataset.records() {
        let id = record.facility_id.as_str();
        let slot = *index.entry(id).or_insert_with(|| {
            groups.push((id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }

    groups
        .into_iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(id, records)| FacilityMetrics {
            id: id.to_string(),
            name: records.iter().find_map(|r| r.facility_name.clone()),
            metrics: compute_metrics(records.iter().copied(), dataset.intensity_scale()),
        })
        .collect()
}
