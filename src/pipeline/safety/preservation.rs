//! Re-derives every critical record from its raw entry and compares.

use crate::pipeline::critical::{extract_resource, preservation_hash, CriticalRecord};
use crate::pipeline::parser::{ClinicalBundle, Resource};

/// Fields of `record` that differ from a fresh extraction of its source entry.
///
/// Returns `["resource"]` when the source entry cannot be found or no longer
/// yields a record in the same category, and `"preservation_hash"` when the
/// stored hash does not match the record's current fields.
pub fn drifted_fields(bundle: &ClinicalBundle, record: &CriticalRecord) -> Vec<&'static str> {
    let Some(entry) = bundle.entries.get(record.source.index) else {
        return vec!["resource"];
    };

    let reparsed = Resource::from_value(&entry.raw);
    let Some(expected) = extract_resource(&reparsed).into_iter().nth(record.position) else {
        return vec!["resource"];
    };
    if expected.category() != record.category() {
        return vec!["resource"];
    }

    let mut drifted: Vec<&'static str> = expected
        .fields()
        .into_iter()
        .zip(record.data.fields())
        .filter(|((_, want), (_, have))| want != have)
        .map(|((name, _), _)| name)
        .collect();

    let current_hash = preservation_hash(&record.data.fields());
    if current_hash != record.metadata.preservation_hash
        || current_hash != preservation_hash(&expected.fields())
    {
        drifted.push("preservation_hash");
    }

    drifted
}
