//! Static table of weighted risk factors.
//!
//! Entries are immutable. An assessment activates the entries its responses
//! trigger by copying them into owned [`RiskFactor`] values; the table itself
//! is never touched.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Professional,
    Security,
    Geographic,
    Travel,
    Threat,
}

/// A risk factor as reported in an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub id: String,
    pub category: RiskCategory,
    pub name: String,
    /// 1 (minor) to 5 (severe)
    pub weight: u8,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub category: RiskCategory,
    pub name: &'static str,
    pub weight: u8,
}

impl CatalogEntry {
    const fn new(id: &'static str, category: RiskCategory, name: &'static str, weight: u8) -> Self {
        Self {
            id,
            category,
            name,
            weight,
        }
    }

    pub fn activate(&self) -> RiskFactor {
        self.to_factor(true)
    }

    pub fn to_factor(&self, is_active: bool) -> RiskFactor {
        RiskFactor {
            id: self.id.to_string(),
            category: self.category,
            name: self.name.to_string(),
            weight: self.weight,
            is_active,
        }
    }
}

pub const HIGH_PROFILE_CATEGORIES: [&str; 4] = ["celebrity", "government", "diplomat", "high_profile"];

pub const PRIVACY_DISCRETION: &str = "privacy_discretion";
pub const SECURITY_AWARENESS: &str = "security_awareness";
pub const INTERNATIONAL_SPECIALIZED: &str = "international_specialized";

/// Travel frequencies that make movements predictable.
pub const PREDICTABLE_FREQUENCIES: [&str; 2] = ["daily", "weekly"];

use RiskCategory::*;

pub const PROFESSIONAL_WEIGHTS: &[CatalogEntry] = &[
    CatalogEntry::new("celebrity", Professional, "Celebrity / public figure", 5),
    CatalogEntry::new("government", Professional, "Government official", 4),
    CatalogEntry::new("diplomat", Professional, "Diplomatic status", 5),
    CatalogEntry::new("high_profile", Professional, "High-profile individual", 4),
    CatalogEntry::new("executive", Professional, "Corporate executive", 3),
    CatalogEntry::new("entrepreneur", Professional, "Entrepreneur", 2),
    CatalogEntry::new("legal_professional", Professional, "Legal professional", 2),
    CatalogEntry::new("private_individual", Professional, "Private individual", 1),
];

pub const SECURITY_REQUIREMENT_WEIGHTS: &[CatalogEntry] = &[
    CatalogEntry::new(PRIVACY_DISCRETION, Security, "Privacy and discretion required", 4),
    CatalogEntry::new(SECURITY_AWARENESS, Security, "Heightened security awareness", 3),
    CatalogEntry::new("family_protection", Security, "Family members in scope", 3),
    CatalogEntry::new("event_security", Security, "Public event exposure", 2),
    CatalogEntry::new("visible_deterrent", Security, "Visible deterrent requested", 2),
    CatalogEntry::new("secure_transport", Security, "Secure transport requested", 2),
];

pub const GEOGRAPHIC_WEIGHTS: &[CatalogEntry] = &[
    CatalogEntry::new(INTERNATIONAL_SPECIALIZED, Geographic, "International specialised coverage", 4),
    CatalogEntry::new("european", Geographic, "European coverage", 3),
    CatalogEntry::new("uk_wide", Geographic, "UK-wide coverage", 2),
    CatalogEntry::new("greater_london", Geographic, "Greater London coverage", 1),
    CatalogEntry::new("central_london", Geographic, "Central London coverage", 1),
];

pub const TRAVEL_WEIGHTS: &[CatalogEntry] = &[
    CatalogEntry::new("daily", Travel, "Daily travel pattern (predictability)", 3),
    CatalogEntry::new("weekly", Travel, "Weekly travel pattern (predictability)", 2),
];

pub const THREAT_WEIGHTS: &[CatalogEntry] = &[
    CatalogEntry::new("received_threats", Threat, "Threats received", 5),
    CatalogEntry::new("legal_proceedings", Threat, "Ongoing legal proceedings", 3),
    CatalogEntry::new("previous_incidents", Threat, "Previous security incidents", 4),
    CatalogEntry::new("controversial_work", Threat, "Controversial work", 3),
];

const TABLES: [&[CatalogEntry]; 5] = [
    PROFESSIONAL_WEIGHTS,
    SECURITY_REQUIREMENT_WEIGHTS,
    GEOGRAPHIC_WEIGHTS,
    TRAVEL_WEIGHTS,
    THREAT_WEIGHTS,
];

/// Every catalog entry across all categories.
pub fn entries() -> impl Iterator<Item = &'static CatalogEntry> {
    TABLES.into_iter().flatten()
}

pub fn lookup(category: RiskCategory, id: &str) -> Option<&'static CatalogEntry> {
    entries().find(|entry| entry.category == category && entry.id == id)
}

/// First entry with this id in any category.
pub fn find(id: &str) -> Option<&'static CatalogEntry> {
    entries().find(|entry| entry.id == id)
}

pub fn is_high_profile(category: &str) -> bool {
    HIGH_PROFILE_CATEGORIES.contains(&category)
}
