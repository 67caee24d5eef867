use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calculator::{self, ProtectionLevel, RiskAssessment, RiskLevel};
use crate::catalog;
use crate::error::AssessmentError;
use crate::responses::{ResponseMap, keys};
use crate::steps::{ConditionalModule, StepId, ids};

/// Number of numbered base steps every path starts from.
pub const BASE_QUESTION_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Standard,
    Enhanced,
    Significant,
    Critical,
}

impl AssessmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentType::Standard => "standard",
            AssessmentType::Enhanced => "enhanced",
            AssessmentType::Significant => "significant",
            AssessmentType::Critical => "critical",
        }
    }
}

/// Depth of the Seven Ps threat profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SevenPsLevel {
    Basic,
    Standard,
    Comprehensive,
}

impl SevenPsLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SevenPsLevel::Basic => "basic",
            SevenPsLevel::Standard => "standard",
            SevenPsLevel::Comprehensive => "comprehensive",
        }
    }
}

/// Which optional modules a risk tier requires.
///
/// Only ever one of the four canonical paths: `risk_level` and
/// `assessment_type` move together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentPath {
    pub risk_level: RiskLevel,
    pub assessment_type: AssessmentType,
    pub question_count: usize,
    pub requires_seven_ps: bool,
    pub seven_ps_level: SevenPsLevel,
    pub requires_enhanced_emergency_contacts: bool,
    pub requires_medical_data: bool,
    pub required_modules: Vec<String>,
    pub additional_steps: Vec<StepId>,
    pub protection_level: ProtectionLevel,
}

impl AssessmentPath {
    pub fn canonical(level: RiskLevel) -> Self {
        let (assessment_type, seven_ps_level, modules, additional_steps) = match level {
            RiskLevel::Green => (
                AssessmentType::Standard,
                SevenPsLevel::Basic,
                vec!["core_profile", "threat_screening"],
                vec![],
            ),
            RiskLevel::Yellow => (
                AssessmentType::Enhanced,
                SevenPsLevel::Basic,
                vec!["core_profile", "threat_screening", "seven_ps_basic"],
                vec![ids::SEVEN_PS],
            ),
            RiskLevel::Orange => (
                AssessmentType::Significant,
                SevenPsLevel::Standard,
                vec![
                    "core_profile",
                    "threat_screening",
                    "seven_ps_standard",
                    "enhanced_emergency_contacts",
                    "medical_data",
                ],
                vec![ids::SEVEN_PS, ids::ENHANCED_EMERGENCY_CONTACTS, ids::MEDICAL_DATA],
            ),
            RiskLevel::Red => (
                AssessmentType::Critical,
                SevenPsLevel::Comprehensive,
                vec![
                    "core_profile",
                    "threat_screening",
                    "seven_ps_comprehensive",
                    "risk_matrix",
                    "enhanced_emergency_contacts",
                    "medical_data",
                ],
                vec![
                    ids::SEVEN_PS,
                    ids::RISK_MATRIX,
                    ids::ENHANCED_EMERGENCY_CONTACTS,
                    ids::MEDICAL_DATA,
                ],
            ),
        };

        Self {
            risk_level: level,
            assessment_type,
            question_count: BASE_QUESTION_COUNT + additional_steps.len(),
            requires_seven_ps: additional_steps.contains(&ids::SEVEN_PS),
            seven_ps_level,
            requires_enhanced_emergency_contacts: additional_steps
                .contains(&ids::ENHANCED_EMERGENCY_CONTACTS),
            requires_medical_data: additional_steps.contains(&ids::MEDICAL_DATA),
            required_modules: modules.into_iter().map(str::to_string).collect(),
            additional_steps,
            protection_level: level.protection_level(),
        }
    }

    pub fn requires(&self, module: ConditionalModule) -> bool {
        match module {
            ConditionalModule::SevenPs => self.requires_seven_ps,
            ConditionalModule::EnhancedEmergencyContacts => self.requires_enhanced_emergency_contacts,
            ConditionalModule::MedicalData => self.requires_medical_data,
            ConditionalModule::RiskMatrix => self.additional_steps.contains(&ids::RISK_MATRIX),
        }
    }
}

/// A signal that forces escalation regardless of score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "trigger", content = "value", rename_all = "snake_case")]
pub enum EscalationTrigger {
    HighProfileCategory(String),
    SensitiveRequirement(String),
    ThreatIndicator(String),
}

/// Full output of path resolution: the score, the tier it implied, and the path actually used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResolution {
    pub assessment: RiskAssessment,
    pub computed_level: RiskLevel,
    pub path: AssessmentPath,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub escalation_triggers: Vec<EscalationTrigger>,
}

impl PathResolution {
    pub fn fallback_at(now: DateTime<Utc>) -> Self {
        Self {
            assessment: RiskAssessment::baseline_at(now),
            computed_level: RiskLevel::Green,
            path: AssessmentPath::canonical(RiskLevel::Green),
            escalation_triggers: Vec::new(),
        }
    }

    pub fn escalated(&self) -> bool {
        self.path.risk_level != self.computed_level
    }
}

/// Qualitative red flags in the responses. Any one escalates by a single tier.
pub fn escalation_triggers(
    responses: &ResponseMap,
) -> Result<Vec<EscalationTrigger>, AssessmentError> {
    let mut triggers = Vec::new();

    if let Some(category) = responses.choice(keys::PROFESSIONAL_PROFILE)? {
        if catalog::is_high_profile(category) {
            triggers.push(EscalationTrigger::HighProfileCategory(category.to_string()));
        }
    }

    for requirement in responses.selections(keys::SECURITY_REQUIREMENTS)? {
        if requirement == catalog::PRIVACY_DISCRETION || requirement == catalog::SECURITY_AWARENESS {
            triggers.push(EscalationTrigger::SensitiveRequirement(requirement.to_string()));
        }
    }

    if let Some(indicators) = responses.threat_indicators()? {
        let flags = [
            (indicators.has_received_threats, "hasReceivedThreats"),
            (indicators.has_legal_proceedings, "hasLegalProceedings"),
            (indicators.has_previous_incidents, "hasPreviousIncidents"),
            (indicators.has_controversial_work, "hasControversialWork"),
        ];
        for (raised, name) in flags {
            if raised {
                triggers.push(EscalationTrigger::ThreatIndicator(name.to_string()));
            }
        }
    }

    Ok(triggers)
}

pub fn try_resolve_assessment_path_at(
    responses: &ResponseMap,
    now: DateTime<Utc>,
) -> Result<PathResolution, AssessmentError> {
    let assessment = calculator::try_calculate_risk_from_responses_at(responses, now)?;
    let computed_level = assessment.level();
    let triggers = escalation_triggers(responses)?;

    // Whole next-tier table, not a merge of individual module flags.
    let level = if triggers.is_empty() {
        computed_level
    } else {
        computed_level.escalate()
    };
    if level != computed_level {
        tracing::debug!(
            from = %computed_level,
            to = %level,
            triggers = triggers.len(),
            "escalated assessment path"
        );
    }

    Ok(PathResolution {
        assessment,
        computed_level,
        path: AssessmentPath::canonical(level),
        escalation_triggers: triggers,
    })
}

pub fn resolve_assessment_path_at(responses: &ResponseMap, now: DateTime<Utc>) -> PathResolution {
    match try_resolve_assessment_path_at(responses, now) {
        Ok(resolution) => resolution,
        Err(err) => {
            tracing::warn!(error = %err, "assessment path resolution failed, using GREEN path");
            PathResolution::fallback_at(now)
        }
    }
}

pub fn resolve_assessment_path(responses: &ResponseMap) -> PathResolution {
    resolve_assessment_path_at(responses, Utc::now())
}

/// The (possibly escalated) canonical path for these responses.
pub fn determine_assessment_path(responses: &ResponseMap) -> AssessmentPath {
    resolve_assessment_path(responses).path
}
