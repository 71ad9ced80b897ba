//! Azure provider implementation
//!
//! Region values are the portal display names ("East US"); the source key
//! is the short code ("eastus"). The coarse family is the VM series
//! (Standard_D2s_v3 -> D).

use regex::Regex;

use crate::catalog::{FieldMapping, InstanceRecord};
use crate::provider::{Provider, ProviderSpec};

pub struct AzureSpec;

static MAPPING: FieldMapping = FieldMapping {
    vcpus: "vCpus",
    memory: "memoryGiB",
    price: "linuxPrice",
    family: "family",
    family_name: "familyName",
    processor: "processorArchitecture",
    generation: "generation",
    arm: "isARM",
    extra_flags: &[],
};

// type, vCPUs, memory GiB, $/hr, family, family name, processor,
// current gen, arm
const SAMPLE: &[(&str, u32, f64, f64, &str, &str, &str, bool, bool)] = &[
    ("Standard_B1s", 1, 1.0, 0.0104, "B", "Burstable", "Intel", true, false),
    ("Standard_B2s", 2, 4.0, 0.0416, "B", "Burstable", "Intel", true, false),
    ("Standard_D2s_v3", 2, 8.0, 0.096, "Dsv3", "General purpose", "Intel", true, false),
    ("Standard_D4s_v3", 4, 16.0, 0.192, "Dsv3", "General purpose", "Intel", true, false),
    ("Standard_F2s_v2", 2, 4.0, 0.085, "Fsv2", "Compute optimized", "Intel", true, false),
    ("Standard_F4s_v2", 4, 8.0, 0.169, "Fsv2", "Compute optimized", "Intel", true, false),
    ("Standard_E2s_v3", 2, 16.0, 0.126, "Esv3", "Memory optimized", "Intel", true, false),
    ("Standard_E4s_v3", 4, 32.0, 0.252, "Esv3", "Memory optimized", "Intel", true, false),
    ("Standard_Dpds_v5", 2, 8.0, 0.077, "Dpdsv5", "General purpose", "ARM", true, true),
    ("Standard_D2as_v4", 2, 8.0, 0.086, "Dasv4", "General purpose", "AMD", true, false),
    ("Standard_A1_v2", 1, 2.0, 0.085, "Av2", "General purpose", "Intel", false, false),
];

fn region_short_code(region: &str) -> Option<&'static str> {
    Some(match region {
        "East US" => "eastus",
        "East US 2" => "eastus2",
        "West US" => "westus",
        "West US 2" => "westus2",
        "West US 3" => "westus3",
        "Central US" => "centralus",
        "North Central US" => "northcentralus",
        "South Central US" => "southcentralus",
        "West Central US" => "westcentralus",
        "North Europe" => "northeurope",
        "West Europe" => "westeurope",
        "France Central" => "francecentral",
        "Germany West Central" => "germanywestcentral",
        "UK South" => "uksouth",
        "UK West" => "ukwest",
        "East Asia" => "eastasia",
        "Southeast Asia" => "southeastasia",
        "Australia East" => "australiaeast",
        "Australia Southeast" => "australiasoutheast",
        "Central India" => "centralindia",
        "South India" => "southindia",
        "Japan East" => "japaneast",
        "Japan West" => "japanwest",
        "Korea Central" => "koreacentral",
        "Brazil South" => "brazilsouth",
        _ => return None,
    })
}

impl ProviderSpec for AzureSpec {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    fn field_mapping(&self) -> &'static FieldMapping {
        &MAPPING
    }

    fn sample_records(&self, region: &str) -> Vec<InstanceRecord> {
        SAMPLE
            .iter()
            .map(
                |&(ty, vcpus, memory, price, family, family_name, processor, current, arm)| {
                    super::sample_record(
                        ty, vcpus, memory, price, family, family_name, processor, current, arm,
                        region,
                    )
                },
            )
            .collect()
    }

    /// "East US" -> eastus; unmapped names lowercase with separators
    /// removed.
    fn normalize_region_key(&self, region: &str) -> String {
        let region = region.trim();
        match region_short_code(region) {
            Some(code) => code.to_string(),
            None => region.to_lowercase().replace([' ', '-'], ""),
        }
    }

    fn is_arm(&self, record: &InstanceRecord) -> bool {
        record.has_flag(crate::catalog::ARM_FLAG) || record.processor == "ARM"
    }

    /// Standard_D2s_v3 -> D2s
    fn family_of(&self, instance_type: &str) -> String {
        Regex::new(r"^Standard_([A-Z][a-z]*\d*[a-z]*)")
            .ok()
            .and_then(|re| re.captures(instance_type).map(|c| c[1].to_string()))
            .unwrap_or_default()
    }

    /// VM series: Standard_D2s_v3 -> D
    fn main_family_of(&self, instance_type: &str) -> String {
        Regex::new(r"^Standard_([A-Z]+[a-z]*)")
            .ok()
            .and_then(|re| re.captures(instance_type).map(|c| c[1].to_string()))
            .unwrap_or_default()
    }
}
