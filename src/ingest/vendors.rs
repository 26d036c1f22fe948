use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::{read_json_array, record_label, IngestError, LoadOutcome};
use crate::scoring::{
    AiUsage, DataSensitivity, HostingLocation, Materiality, ServiceCriticality, Subcontractors,
    VendorProfile,
};

/// A third-party supplier as described in the vendor JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub vendor_name: String,
    #[serde(default)]
    pub service_type: String,
    pub data_sensitivity: DataSensitivity,
    pub hosting_location: HostingLocation,
    pub ai_usage: AiUsage,
    pub subcontractors: Subcontractors,
    pub service_criticality: ServiceCriticality,
    #[serde(default)]
    pub certifications: Vec<String>,
    pub outsourcing_type: Materiality,
    #[serde(default)]
    pub risk_owner: String,
    #[serde(default)]
    pub review_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: String,
}

impl VendorRecord {
    pub fn profile(&self) -> VendorProfile {
        VendorProfile {
            data_sensitivity: self.data_sensitivity,
            hosting_location: self.hosting_location,
            ai_usage: self.ai_usage,
            subcontractors: self.subcontractors,
            service_criticality: self.service_criticality,
            certifications: self.certifications.clone(),
            materiality: self.outsourcing_type,
        }
    }
}

pub fn parse_vendors(items: Vec<serde_json::Value>) -> LoadOutcome<VendorRecord> {
    let mut outcome = LoadOutcome::new();
    let mut seen = HashSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let label = record_label(&item, "vendor_name", index);
        match serde_json::from_value::<VendorRecord>(item) {
            Ok(vendor) if vendor.vendor_name.trim().is_empty() => {
                outcome
                    .rejected
                    .push(IngestError::malformed(label, "vendor_name is empty"));
            }
            Ok(vendor) => {
                if seen.insert(vendor.vendor_name.trim().to_lowercase()) {
                    outcome.records.push(vendor);
                } else {
                    outcome.rejected.push(IngestError::DuplicateId { record: label });
                }
            }
            Err(e) => outcome.rejected.push(IngestError::malformed(label, e.to_string())),
        }
    }

    debug!(
        accepted = outcome.records.len(),
        rejected = outcome.rejected.len(),
        "parsed vendors"
    );
    outcome
}

pub fn load_vendors(path: &Path) -> Result<LoadOutcome<VendorRecord>> {
    let items = read_json_array(path).context("Failed to load vendors")?;
    Ok(parse_vendors(items))
}
