//! Regional pharmacy availability.
//!
//! The built-in table is mock data: five US regions and a handful of
//! pharmacies. A replacement table can be loaded from JSON shaped like
//! [`RegionTable`]'s serialized form:
//!
//! ```json
//! {
//!   "regions": [{"region_code": "NY", "region_name": "New York"}],
//!   "pharmacies": {
//!     "NY": [{"pharmacy_name": "NY Health Pharmacy",
//!             "address": "123 Main St, New York, NY",
//!             "available_medicines": ["Aspirin"]}]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use canonical::fold_name;
use serde::{Deserialize, Serialize};

use crate::BootstrapError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_code: String,
    pub region_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pharmacy {
    pub pharmacy_name: String,
    pub address: String,
    #[serde(default)]
    pub available_medicines: Vec<String>,
}

/// Regions and the pharmacies stocked in each. Region codes are stored
/// upper-case and looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTable {
    #[serde(default)]
    regions: Vec<Region>,
    #[serde(default)]
    pharmacies: BTreeMap<String, Vec<Pharmacy>>,
}

impl RegionTable {
    pub fn new(regions: Vec<Region>, pharmacies: BTreeMap<String, Vec<Pharmacy>>) -> Self {
        let regions = regions
            .into_iter()
            .map(|region| Region {
                region_code: region_key(&region.region_code),
                region_name: region.region_name,
            })
            .collect();
        let pharmacies = pharmacies
            .into_iter()
            .map(|(code, stock)| (region_key(&code), stock))
            .collect();
        Self {
            regions,
            pharmacies,
        }
    }

    /// The mock table served by default.
    pub fn builtin() -> Self {
        let regions = [
            ("NY", "New York"),
            ("CA", "California"),
            ("TX", "Texas"),
            ("FL", "Florida"),
            ("IL", "Illinois"),
        ]
        .into_iter()
        .map(|(code, name)| Region {
            region_code: code.to_owned(),
            region_name: name.to_owned(),
        })
        .collect();

        let pharmacy = |name: &str, address: &str, stock: &[&str]| Pharmacy {
            pharmacy_name: name.to_owned(),
            address: address.to_owned(),
            available_medicines: stock.iter().map(|m| (*m).to_owned()).collect(),
        };

        let mut pharmacies = BTreeMap::new();
        pharmacies.insert(
            "NY".to_owned(),
            vec![
                pharmacy("NY Health Pharmacy", "123 Main St, New York, NY", &["Aspirin", "Ibuprofen"]),
                pharmacy("Manhattan Meds", "456 Park Ave, New York, NY", &["Paracetamol", "Cetirizine"]),
            ],
        );
        pharmacies.insert(
            "CA".to_owned(),
            vec![
                pharmacy("CA Wellness", "789 Sunset Blvd, Los Angeles, CA", &["Aspirin", "Cetirizine"]),
                pharmacy("Bay Area Pharmacy", "101 Market St, San Francisco, CA", &["Ibuprofen", "Paracetamol"]),
            ],
        );
        pharmacies.insert(
            "TX".to_owned(),
            vec![pharmacy("Texas Meds", "202 Lone Star Rd, Houston, TX", &["Aspirin", "Paracetamol"])],
        );
        pharmacies.insert(
            "FL".to_owned(),
            vec![pharmacy("Florida Health", "303 Ocean Dr, Miami, FL", &["Ibuprofen", "Cetirizine"])],
        );
        pharmacies.insert(
            "IL".to_owned(),
            vec![pharmacy("Chicago Pharmacy", "404 Lake Shore Dr, Chicago, IL", &["Aspirin", "Ibuprofen"])],
        );

        Self::new(regions, pharmacies)
    }

    pub fn from_json_str(source: &str) -> Result<Self, serde_json::Error> {
        let raw: RegionTable = serde_json::from_str(source)?;
        Ok(Self::new(raw.regions, raw.pharmacies))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BootstrapError> {
        let path = path.as_ref();
        let regions_err = |message: String| BootstrapError::Regions {
            path: path.display().to_string(),
            message,
        };
        let source = std::fs::read_to_string(path).map_err(|e| regions_err(e.to_string()))?;
        Self::from_json_str(&source).map_err(|e| regions_err(e.to_string()))
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Pharmacies in `region_code`. Unknown regions have none.
    pub fn pharmacies(&self, region_code: &str) -> &[Pharmacy] {
        self.pharmacies
            .get(&region_key(region_code))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `true` when any pharmacy in the region stocks `medicine`, compared
    /// case-insensitively after cleaning.
    pub fn stocks(&self, region_code: &str, medicine: &str) -> bool {
        let wanted = fold_name(medicine);
        self.pharmacies(region_code).iter().any(|pharmacy| {
            pharmacy
                .available_medicines
                .iter()
                .any(|stocked| fold_name(stocked) == wanted)
        })
    }
}

fn region_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Availability of `entry_name` in the requested region.
///
/// `None` when no region was requested (absent or blank). An unknown region
/// is `Some(false)`, not an error.
pub fn annotate(entry_name: &str, region_code: Option<&str>, table: &RegionTable) -> Option<bool> {
    let code = region_code.filter(|code| !code.trim().is_empty())?;
    Some(table.stocks(code, entry_name))
}
