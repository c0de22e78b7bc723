use serde::Serialize;
use serde_json::Value;

use super::fhir::Resource;

/// Points back at the bundle entry a record or segment came from.
///
/// `id` is the resource's own id and is never serialized or logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceRef {
    pub resource_type: String,
    pub index: usize,
    #[serde(skip)]
    pub id: Option<String>,
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.resource_type, self.index)
    }
}

/// Non-fatal parser observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub index: usize,
    pub full_url: Option<String>,
    pub resource: Resource,
    /// The entry's `resource` object exactly as received.
    pub raw: Value,
}

impl BundleEntry {
    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            resource_type: self.resource.resource_type().to_string(),
            index: self.index,
            id: self
                .raw
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// A parsed bundle. Nothing mutates it after [`parse_bundle`](super::parse_bundle).
#[derive(Debug, Clone)]
pub struct ClinicalBundle {
    pub id: Option<String>,
    pub bundle_type: Option<String>,
    pub entries: Vec<BundleEntry>,
    pub warnings: Vec<ParseWarning>,
}

impl ClinicalBundle {
    pub fn opaque_count(&self) -> usize {
        self.entries.iter().filter(|e| e.resource.is_opaque()).count()
    }

    pub fn unreadable_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.resource, Resource::Unreadable { .. }))
            .count()
    }

    /// Patient id: the first Patient resource, else the first `Patient/...`
    /// subject reference on a medication.
    pub fn patient_id(&self) -> Option<&str> {
        let from_patient = self.entries.iter().find_map(|e| match &e.resource {
            Resource::Patient(p) => p.id.as_deref().filter(|id| !id.trim().is_empty()),
            _ => None,
        });
        from_patient.or_else(|| {
            self.entries.iter().find_map(|e| match &e.resource {
                Resource::MedicationRequest(m) | Resource::MedicationStatement(m) => m
                    .subject
                    .as_ref()
                    .and_then(|s| s.reference.as_deref())
                    .and_then(|r| r.strip_prefix("Patient/"))
                    .filter(|id| !id.is_empty()),
                _ => None,
            })
        })
    }
}
