use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calculator::ProtectionLevel;
use crate::path::{self, AssessmentPath};
use crate::responses::ResponseMap;

/// Bookable service tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceTier {
    #[serde(rename = "armora-standard")]
    Standard,
    #[serde(rename = "armora-executive")]
    Executive,
    #[serde(rename = "armora-shadow")]
    Shadow,
}

impl ServiceTier {
    pub const ALL: [ServiceTier; 3] = [ServiceTier::Standard, ServiceTier::Executive, ServiceTier::Shadow];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceTier::Standard => "armora-standard",
            ServiceTier::Executive => "armora-executive",
            ServiceTier::Shadow => "armora-shadow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_str() == value.trim())
    }

    /// Enhanced protection has no dedicated tier and books as Shadow.
    pub fn for_protection_level(level: ProtectionLevel) -> Self {
        match level {
            ProtectionLevel::Essential => ServiceTier::Standard,
            ProtectionLevel::Executive => ServiceTier::Executive,
            ProtectionLevel::Shadow | ProtectionLevel::Enhanced => ServiceTier::Shadow,
        }
    }

    pub fn for_path(path: &AssessmentPath) -> Self {
        Self::for_protection_level(path.protection_level)
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service tier for the (possibly escalated) path these responses resolve to.
pub fn get_service_recommendation(responses: &ResponseMap) -> ServiceTier {
    ServiceTier::for_path(&path::determine_assessment_path(responses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::keys;

    #[test]
    fn empty_responses_recommend_standard() {
        assert_eq!(get_service_recommendation(&ResponseMap::new()), ServiceTier::Standard);
    }

    #[test]
    fn escalated_diplomat_recommends_executive() {
        let responses = ResponseMap::new().with(keys::PROFESSIONAL_PROFILE, "diplomat");
        assert_eq!(get_service_recommendation(&responses), ServiceTier::Executive);
    }

    #[test]
    fn enhanced_protection_books_as_shadow() {
        assert_eq!(
            ServiceTier::for_protection_level(ProtectionLevel::Enhanced),
            ServiceTier::Shadow
        );
    }

    #[test]
    fn tiers_serialize_as_catalog_identifiers() {
        assert_eq!(
            serde_json::to_value(ServiceTier::Executive).unwrap(),
            serde_json::json!("armora-executive")
        );
        assert_eq!(ServiceTier::parse("armora-shadow"), Some(ServiceTier::Shadow));
        assert_eq!(ServiceTier::parse("armora-gold"), None);
    }
}
