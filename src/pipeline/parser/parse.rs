use serde_json::Value;

use super::fhir::Resource;
use super::types::{BundleEntry, ClinicalBundle, ParseWarning};
use super::ParseError;

/// Parse bundle JSON text.
pub fn parse_bundle_str(raw: &str) -> Result<ClinicalBundle, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson {
        line: e.line(),
        column: e.column(),
    })?;
    parse_bundle(&value)
}

/// Validate the top-level shape and type every entry.
///
/// Only the bundle shape is fatal. Entries that cannot be typed are kept as
/// `Opaque` or `Unreadable` so later stages decide what they mean.
pub fn parse_bundle(value: &Value) -> Result<ClinicalBundle, ParseError> {
    let object = value.as_object().ok_or(ParseError::NotAnObject)?;

    match object.get("resourceType").and_then(Value::as_str) {
        Some("Bundle") => {}
        Some(other) => return Err(ParseError::NotABundle(other.to_string())),
        None => return Err(ParseError::MissingResourceType),
    }

    let raw_entries = match object.get("entry") {
        None | Some(Value::Null) => return Err(ParseError::MissingEntries),
        Some(Value::Array(items)) if items.is_empty() => return Err(ParseError::EmptyEntries),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ParseError::EntriesNotArray),
    };

    let mut entries = Vec::with_capacity(raw_entries.len());
    let mut warnings = Vec::new();

    for (index, item) in raw_entries.iter().enumerate() {
        let full_url = item
            .get("fullUrl")
            .and_then(Value::as_str)
            .map(str::to_string);

        let (resource, raw) = match item.get("resource") {
            Some(raw @ Value::Object(_)) => {
                let resource = Resource::from_value(raw);
                if resource.resource_type().is_empty() {
                    warnings.push(ParseWarning {
                        index,
                        message: "Entry resource has no resourceType".into(),
                    });
                }
                (resource, raw.clone())
            }
            _ => {
                warnings.push(ParseWarning {
                    index,
                    message: "Entry has no resource object".into(),
                });
                (
                    Resource::Opaque {
                        resource_type: String::new(),
                    },
                    Value::Null,
                )
            }
        };

        if let Resource::Unreadable { resource_type, reason } = &resource {
            tracing::debug!(index, resource_type = %resource_type, "Unreadable resource kept");
            warnings.push(ParseWarning {
                index,
                message: reason.clone(),
            });
        }

        entries.push(BundleEntry {
            index,
            full_url,
            resource,
            raw,
        });
    }

    let bundle = ClinicalBundle {
        id: object.get("id").and_then(Value::as_str).map(str::to_string),
        bundle_type: object.get("type").and_then(Value::as_str).map(str::to_string),
        entries,
        warnings,
    };

    tracing::debug!(
        entries = bundle.entries.len(),
        opaque = bundle.opaque_count(),
        unreadable = bundle.unreadable_count(),
        warnings = bundle.warnings.len(),
        "Bundle parsed"
    );

    Ok(bundle)
}
