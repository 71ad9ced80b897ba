//! AWS provider implementation
//!
//! Region payloads use the AWS pricing export field names
//! (`memorySizeInGiB`, `onDemandLinuxHr`, ...). Graviton instances carry
//! the `arm` tag; Nitro Enclaves support becomes an extra capability tag.

use regex::Regex;

use crate::catalog::{FieldMapping, InstanceRecord, ARM_FLAG, NITRO_FLAG};
use crate::provider::{Provider, ProviderSpec};

pub struct AwsSpec;

static MAPPING: FieldMapping = FieldMapping {
    vcpus: "vCpus",
    memory: "memorySizeInGiB",
    price: "onDemandLinuxHr",
    family: "instanceFamily",
    family_name: "instanceFamilyName",
    processor: "processorManufacturer",
    generation: "currentGeneration",
    arm: "isGraviton",
    extra_flags: &[(NITRO_FLAG, "nitroEnclavesSupport")],
};

// type, vCPUs, memory GiB, $/hr, family, family name, processor,
// current gen, graviton, nitro
const SAMPLE: &[(&str, u32, f64, f64, &str, &str, &str, bool, bool, bool)] = &[
    ("t3.nano", 2, 0.5, 0.0052, "t3", "General purpose", "Intel", true, false, false),
    ("t3.micro", 2, 1.0, 0.0104, "t3", "General purpose", "Intel", true, false, false),
    ("m5.large", 2, 8.0, 0.096, "m5", "General purpose", "Intel", true, false, true),
    ("c5.large", 2, 4.0, 0.085, "c5", "Compute optimized", "Intel", true, false, true),
    ("r5.large", 2, 16.0, 0.126, "r5", "Memory optimized", "Intel", true, false, true),
    ("t4g.micro", 2, 1.0, 0.0084, "t4g", "General purpose", "AWS", true, true, false),
    ("m6g.large", 2, 8.0, 0.077, "m6g", "General purpose", "AWS", true, true, false),
    ("c6g.large", 2, 4.0, 0.068, "c6g", "Compute optimized", "AWS", true, true, false),
    ("t2.micro", 1, 1.0, 0.0116, "t2", "General purpose", "Intel", false, false, false),
    ("t1.micro", 1, 0.61, 0.02, "t1", "Micro instances", "Intel", false, false, false),
    ("a1.medium", 1, 2.0, 0.0255, "a1", "General purpose", "AWS", false, true, false),
    ("c7a.medium", 1, 2.0, 0.0513, "c7a", "Compute optimized", "AMD", true, false, true),
    ("p3.2xlarge", 8, 61.0, 3.06, "p3", "GPU instance", "Intel", true, false, true),
];

impl ProviderSpec for AwsSpec {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    fn field_mapping(&self) -> &'static FieldMapping {
        &MAPPING
    }

    fn sample_records(&self, region: &str) -> Vec<InstanceRecord> {
        SAMPLE
            .iter()
            .map(
                |&(ty, vcpus, memory, price, family, family_name, processor, current, arm, nitro)| {
                    let mut record = super::sample_record(
                        ty, vcpus, memory, price, family, family_name, processor, current, arm,
                        region,
                    );
                    if nitro {
                        record.architecture_flags.insert(NITRO_FLAG.to_string());
                    }
                    record
                },
            )
            .collect()
    }

    /// us-east-1 -> us_east_1
    fn normalize_region_key(&self, region: &str) -> String {
        region.trim().to_lowercase().replace(['-', ' '], "_")
    }

    /// m5.large -> m5
    fn family_of(&self, instance_type: &str) -> String {
        Regex::new(r"^([a-z]+\d+[a-z]*)")
            .ok()
            .and_then(|re| re.captures(instance_type).map(|c| c[1].to_string()))
            .unwrap_or_default()
    }

    /// m5.large -> m, inf1.xlarge -> inf
    fn main_family_of(&self, instance_type: &str) -> String {
        let lower = instance_type.to_lowercase();
        Regex::new(r"^([a-z]+)")
            .ok()
            .and_then(|re| re.captures(&lower).map(|c| c[1].to_string()))
            .unwrap_or_default()
    }

    fn display_processor(&self, record: &InstanceRecord) -> String {
        if record.processor == "AWS" && self.is_arm(record) {
            "Graviton2/3".to_string()
        } else {
            record.processor.clone()
        }
    }
}
