//! GCP provider implementation
//!
//! Region values are zone names ("us-central1-a"); the source key is the
//! underscored region ("us_central1"). The coarse family is the machine
//! series (n2-standard-4 -> n2); ARM means the Tau T2A line.

use regex::Regex;

use crate::catalog::{FieldMapping, InstanceRecord};
use crate::provider::{Provider, ProviderSpec};

pub struct GcpSpec;

static MAPPING: FieldMapping = FieldMapping {
    vcpus: "vCpus",
    memory: "memoryGiB",
    price: "hourlyPrice",
    family: "series",
    family_name: "seriesName",
    processor: "cpuPlatform",
    generation: "generation",
    arm: "isARM",
    extra_flags: &[],
};

// type, vCPUs, memory GiB, $/hr, series, series name, processor,
// current gen, arm
const SAMPLE: &[(&str, u32, f64, f64, &str, &str, &str, bool, bool)] = &[
    ("n1-standard-1", 1, 3.75, 0.0475, "n1", "General purpose", "Intel", false, false),
    ("n1-standard-2", 2, 7.5, 0.095, "n1", "General purpose", "Intel", false, false),
    ("n2-standard-2", 2, 8.0, 0.097, "n2", "General purpose", "Intel", true, false),
    ("n2-standard-4", 4, 16.0, 0.194, "n2", "General purpose", "Intel", true, false),
    ("c2-standard-4", 4, 16.0, 0.168, "c2", "Compute optimized", "Intel", true, false),
    ("c2-standard-8", 8, 32.0, 0.336, "c2", "Compute optimized", "Intel", true, false),
    ("n1-highmem-2", 2, 13.0, 0.118, "n1", "Memory optimized", "Intel", false, false),
    ("n2-highmem-2", 2, 16.0, 0.13, "n2", "Memory optimized", "Intel", true, false),
    ("t2a-standard-1", 1, 4.0, 0.0353, "t2a", "General purpose", "ARM", true, true),
    ("t2a-standard-2", 2, 8.0, 0.0706, "t2a", "General purpose", "ARM", true, true),
    ("n2d-standard-2", 2, 8.0, 0.087, "n2d", "General purpose", "AMD", true, false),
    ("e2-micro", 1, 1.0, 0.0084, "e2", "Shared-core", "Intel", true, false),
    ("e2-small", 1, 2.0, 0.0168, "e2", "Shared-core", "Intel", true, false),
    ("n1-standard-4-k80", 4, 15.0, 0.845, "n1", "GPU instances", "Intel", false, false),
];

fn zone_region_key(zone: &str) -> Option<&'static str> {
    Some(match zone {
        "us-central1-a" | "us-central1-b" | "us-central1-c" | "us-central1-f" => "us_central1",
        "us-east1-a" | "us-east1-b" | "us-east1-c" | "us-east1-d" => "us_east1",
        "us-west1-a" | "us-west1-b" | "us-west1-c" => "us_west1",
        "europe-west1-a" | "europe-west1-b" | "europe-west1-c" | "europe-west1-d" => {
            "europe_west1"
        }
        "asia-east1-a" | "asia-east1-b" | "asia-east1-c" => "asia_east1",
        _ => return None,
    })
}

impl ProviderSpec for GcpSpec {
    fn provider(&self) -> Provider {
        Provider::Gcp
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

    /// us-central1-a -> us_central1; unmapped zones collapse to
    /// lowercase with separators underscored.
    fn normalize_region_key(&self, region: &str) -> String {
        let region = region.trim();
        match zone_region_key(region) {
            Some(key) => key.to_string(),
            None => region.to_lowercase().replace([' ', '-'], "_"),
        }
    }

    fn is_arm(&self, record: &InstanceRecord) -> bool {
        record.has_flag(crate::catalog::ARM_FLAG)
            || record.processor == "ARM"
            || record.instance_type.contains("t2a")
    }

    /// n2-standard-4 -> n2-standard
    fn family_of(&self, instance_type: &str) -> String {
        Regex::new(r"^([a-z]+\d*[a-z]*-[a-z]+)")
            .ok()
            .and_then(|re| re.captures(instance_type).map(|c| c[1].to_string()))
            .unwrap_or_default()
    }

    /// Machine series: n2-standard-4 -> n2, t2a-standard-2 -> t2a
    fn main_family_of(&self, instance_type: &str) -> String {
        Regex::new(r"^([a-z]+\d*[a-z]*)")
            .ok()
            .and_then(|re| re.captures(instance_type).map(|c| c[1].to_string()))
            .unwrap_or_default()
    }
}
