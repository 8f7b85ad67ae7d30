// Service resource shared by the trace and log pipelines

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use std::collections::BTreeMap;

pub const SERVICE_NAME_KEY: &str = "service.name";

/// Resource attributes identifying this process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResource {
    attributes: BTreeMap<String, String>,
}

impl ServiceResource {
    /// Merge the base service name with a raw `key=value,key=value` list
    ///
    /// Returns the resource and the segments that were rejected. Empty
    /// segments are skipped; a segment without `=` or with an empty key is
    /// rejected. Later keys override earlier ones, including `service.name`.
    pub fn build(service_name: &str, raw: &str) -> (Self, Vec<String>) {
        let mut attributes = BTreeMap::new();
        attributes.insert(SERVICE_NAME_KEY.to_string(), service_name.to_string());

        let mut rejected = Vec::new();
        for segment in raw.split(',') {
            if segment.trim().is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    attributes.insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => rejected.push(segment.to_string()),
            }
        }

        (Self { attributes }, rejected)
    }

    pub fn service_name(&self) -> &str {
        self.get(SERVICE_NAME_KEY).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// SDK resource with exactly these attributes (no detectors)
    pub fn to_otel(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(
                self.attributes()
                    .map(|(k, v)| KeyValue::new(k.to_string(), v.to_string())),
            )
            .build()
    }
}
