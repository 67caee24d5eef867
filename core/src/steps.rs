use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::calculator::RiskLevel;
use crate::error::AssessmentError;
use crate::path::SevenPsLevel;

/// Position of a step in the questionnaire.
///
/// Fixed-point rather than fractional: `2.5` is `{ major: 2, tenth: 5 }`.
/// Conditional steps slot between base steps without renumbering, and ids
/// compare exactly. Displays as `2.5`, keys answers as `step2_5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId {
    major: u8,
    tenth: u8,
}

impl StepId {
    pub const fn new(major: u8, tenth: u8) -> Self {
        Self { major, tenth }
    }

    pub const fn whole(major: u8) -> Self {
        Self { major, tenth: 0 }
    }

    pub fn major(self) -> u8 {
        self.major
    }

    pub fn tenth(self) -> u8 {
        self.tenth
    }

    /// Key under which the form layer stores this step's answer.
    pub fn response_key(self) -> String {
        if self.tenth == 0 {
            format!("step{}", self.major)
        } else {
            format!("step{}_{}", self.major, self.tenth)
        }
    }

    /// Arithmetic neighbour one whole step away, keeping the fractional part.
    pub fn offset(self, delta: i16) -> Self {
        let major = (self.major as i16 + delta).clamp(0, u8::MAX as i16) as u8;
        Self {
            major,
            tenth: self.tenth,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tenth == 0 {
            write!(f, "{}", self.major)
        } else {
            write!(f, "{}.{}", self.major, self.tenth)
        }
    }
}

impl FromStr for StepId {
    type Err = AssessmentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AssessmentError::InvalidStepId(raw.to_string());
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix("step").unwrap_or(trimmed);
        let (major, tenth) = match body.split_once(['.', '_']) {
            Some((major, tenth)) => (major, Some(tenth)),
            None => (body, None),
        };
        let major = major.parse::<u8>().map_err(|_| invalid())?;
        let tenth = match tenth {
            None => 0,
            Some(t) if t.len() == 1 => t.parse::<u8>().map_err(|_| invalid())?,
            Some(_) => return Err(invalid()),
        };
        Ok(Self { major, tenth })
    }
}

impl TryFrom<String> for StepId {
    type Error = AssessmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StepId> for String {
    fn from(id: StepId) -> Self {
        id.to_string()
    }
}

pub mod ids {
    use super::StepId;

    pub const PROFESSIONAL_PROFILE: StepId = StepId::whole(1);
    pub const SECURITY_REQUIREMENTS: StepId = StepId::whole(2);
    pub const THREAT_ASSESSMENT: StepId = StepId::new(2, 5);
    pub const SEVEN_PS: StepId = StepId::new(2, 6);
    pub const RISK_MATRIX: StepId = StepId::new(2, 7);
    pub const TRANSPORT_PREFERENCES: StepId = StepId::whole(3);
    pub const TRAVEL_FREQUENCY: StepId = StepId::whole(4);
    pub const COVERAGE_AREAS: StepId = StepId::whole(5);
    pub const EMERGENCY_CONTACT: StepId = StepId::whole(6);
    pub const ENHANCED_EMERGENCY_CONTACTS: StepId = StepId::new(6, 5);
    pub const SPECIAL_REQUIREMENTS: StepId = StepId::whole(7);
    pub const CONTACT_PREFERENCES: StepId = StepId::whole(8);
    pub const MEDICAL_DATA: StepId = StepId::new(8, 5);
    pub const REVIEW: StepId = StepId::whole(9);

    /// Every id a conditional step may occupy. 7.5 and 9.5 are reserved.
    pub const ADDITIONAL_STEP_SPACE: [StepId; 6] = [
        StepId::new(2, 6),
        StepId::new(2, 7),
        StepId::new(6, 5),
        StepId::new(7, 5),
        StepId::new(8, 5),
        StepId::new(9, 5),
    ];
}

/// Optional questionnaire modules that progressive disclosure can splice in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalModule {
    SevenPs,
    RiskMatrix,
    EnhancedEmergencyContacts,
    MedicalData,
}

impl ConditionalModule {
    pub const ALL: [ConditionalModule; 4] = [
        ConditionalModule::SevenPs,
        ConditionalModule::RiskMatrix,
        ConditionalModule::EnhancedEmergencyContacts,
        ConditionalModule::MedicalData,
    ];

    pub fn step_id(self) -> StepId {
        match self {
            ConditionalModule::SevenPs => ids::SEVEN_PS,
            ConditionalModule::RiskMatrix => ids::RISK_MATRIX,
            ConditionalModule::EnhancedEmergencyContacts => ids::ENHANCED_EMERGENCY_CONTACTS,
            ConditionalModule::MedicalData => ids::MEDICAL_DATA,
        }
    }

    pub fn from_step_id(id: StepId) -> Option<Self> {
        Self::ALL.into_iter().find(|module| module.step_id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionalModule::SevenPs => "seven_ps",
            ConditionalModule::RiskMatrix => "risk_matrix",
            ConditionalModule::EnhancedEmergencyContacts => "enhanced_emergency_contacts",
            ConditionalModule::MedicalData => "medical_data",
        }
    }
}

/// Seven Ps threat profile dimensions, in presentation order.
pub const SEVEN_PS_DIMENSIONS: [&str; 7] = [
    "people",
    "places",
    "personality",
    "prejudices",
    "personal_history",
    "political",
    "private_lifestyle",
];

/// Populated dimensions a comprehensive Seven Ps profile must carry.
pub const COMPREHENSIVE_SEVEN_PS_MIN_KEYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn option(value: &str, label: &str) -> StepOption {
    StepOption {
        value: value.to_string(),
        label: label.to_string(),
        description: None,
    }
}

fn described(value: &str, label: &str, description: &str) -> StepOption {
    StepOption {
        description: Some(description.to_string()),
        ..option(value, label)
    }
}

/// What kind of input a step presents, and the data that kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Radio { options: Vec<StepOption> },
    Checkbox { options: Vec<StepOption> },
    Input { fields: Vec<String> },
    ThreatAssessment,
    SevenPsAssessment {
        level: SevenPsLevel,
        dimensions: Vec<String>,
    },
    EnhancedEmergencyContacts,
    RiskMatrix,
    MedicalData,
}

/// Static per-step rules carried on the step definition itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepValidationRule {
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,
}

impl StepValidationRule {
    pub const fn required() -> Self {
        Self {
            required: true,
            min_selections: None,
            max_selections: None,
        }
    }

    pub const fn optional() -> Self {
        Self {
            required: false,
            min_selections: None,
            max_selections: None,
        }
    }

    pub const fn selections(min: usize, max: Option<usize>) -> Self {
        Self {
            required: min > 0,
            min_selections: Some(min),
            max_selections: max,
        }
    }
}

/// Why a conditional step was disclosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisclosureTrigger {
    pub module: ConditionalModule,
    pub risk_level: RiskLevel,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionnaireStep {
    pub id: StepId,
    pub title: String,
    pub question: String,
    #[serde(flatten)]
    pub kind: StepKind,
    pub validation: StepValidationRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progressive_disclosure: Option<DisclosureTrigger>,
}

impl QuestionnaireStep {
    fn base(id: StepId, title: &str, question: &str, kind: StepKind, validation: StepValidationRule) -> Self {
        Self {
            id,
            title: title.to_string(),
            question: question.to_string(),
            kind,
            validation,
            progressive_disclosure: None,
        }
    }

    pub fn response_key(&self) -> String {
        self.id.response_key()
    }

    pub fn is_conditional(&self) -> bool {
        self.progressive_disclosure.is_some()
    }
}

static BASE_STEPS: LazyLock<Vec<QuestionnaireStep>> = LazyLock::new(|| {
    vec![
        QuestionnaireStep::base(
            ids::PROFESSIONAL_PROFILE,
            "Professional Profile",
            "Which best describes your professional profile?",
            StepKind::Radio {
                options: vec![
                    described("celebrity", "Celebrity / Public Figure", "Entertainment, sport or media profile"),
                    described("government", "Government Official", "Elected or senior civil service role"),
                    described("diplomat", "Diplomat", "Accredited diplomatic or consular staff"),
                    described("high_profile", "High-Profile Individual", "Widely recognised or frequently reported on"),
                    option("executive", "Corporate Executive"),
                    option("entrepreneur", "Entrepreneur / Business Owner"),
                    option("legal_professional", "Legal Professional"),
                    option("private_individual", "Private Individual"),
                    option("other", "Other"),
                ],
            },
            StepValidationRule::required(),
        ),
        QuestionnaireStep::base(
            ids::SECURITY_REQUIREMENTS,
            "Security Requirements",
            "What matters most to you about your protection?",
            StepKind::Checkbox {
                options: vec![
                    described("privacy_discretion", "Privacy & Discretion", "Low visibility, no public attention"),
                    described("security_awareness", "Security Awareness", "Officers trained to spot and avoid threats"),
                    option("visible_deterrent", "Visible Deterrent"),
                    option("secure_transport", "Secure Transport"),
                    option("family_protection", "Family Protection"),
                    option("event_security", "Event Security"),
                ],
            },
            StepValidationRule::selections(1, Some(4)),
        ),
        QuestionnaireStep::base(
            ids::THREAT_ASSESSMENT,
            "Threat Assessment",
            "Have any of the following applied to you in the last two years?",
            StepKind::ThreatAssessment,
            StepValidationRule::required(),
        ),
        QuestionnaireStep::base(
            ids::TRANSPORT_PREFERENCES,
            "Transport Preferences",
            "Which vehicles are you comfortable travelling in?",
            StepKind::Checkbox {
                options: vec![
                    option("standard_vehicle", "Standard Executive Vehicle"),
                    option("luxury_vehicle", "Luxury Vehicle"),
                    option("armoured_vehicle", "Armoured Vehicle"),
                    option("no_preference", "No Preference"),
                ],
            },
            StepValidationRule::selections(1, None),
        ),
        QuestionnaireStep::base(
            ids::TRAVEL_FREQUENCY,
            "Travel Frequency",
            "How often will you need protected transport?",
            StepKind::Radio {
                options: vec![
                    option("daily", "Daily"),
                    option("weekly", "Weekly"),
                    option("monthly", "Monthly"),
                    option("occasional", "Occasionally"),
                    option("one_time", "One-off Journey"),
                ],
            },
            StepValidationRule::required(),
        ),
        QuestionnaireStep::base(
            ids::COVERAGE_AREAS,
            "Coverage Areas",
            "Where will you need protection?",
            StepKind::Checkbox {
                options: vec![
                    option("central_london", "Central London"),
                    option("greater_london", "Greater London"),
                    option("uk_wide", "UK-Wide"),
                    option("european", "Europe"),
                    described(
                        "international_specialized",
                        "International (Specialised)",
                        "Destinations requiring specialist risk planning",
                    ),
                ],
            },
            StepValidationRule::selections(1, None),
        ),
        QuestionnaireStep::base(
            ids::EMERGENCY_CONTACT,
            "Emergency Contact",
            "Who should we contact in an emergency?",
            StepKind::Input {
                fields: vec!["name".to_string(), "phone".to_string(), "relationship".to_string()],
            },
            StepValidationRule::required(),
        ),
        QuestionnaireStep::base(
            ids::SPECIAL_REQUIREMENTS,
            "Special Requirements",
            "Anything your protection officer should know in advance?",
            StepKind::Checkbox {
                options: vec![
                    option("accessibility", "Accessibility Needs"),
                    option("female_officer", "Female Officer Preferred"),
                    option("language", "Language Requirements"),
                    option("pets", "Travelling With Pets"),
                    option("children", "Travelling With Children"),
                ],
            },
            StepValidationRule::selections(0, None),
        ),
        QuestionnaireStep::base(
            ids::CONTACT_PREFERENCES,
            "Contact Preferences",
            "How should we keep you updated?",
            StepKind::Checkbox {
                options: vec![
                    option("phone", "Phone Call"),
                    option("sms", "SMS"),
                    option("email", "Email"),
                    option("app_notification", "App Notification"),
                    option("whatsapp", "WhatsApp"),
                ],
            },
            StepValidationRule::selections(1, Some(3)),
        ),
        QuestionnaireStep::base(
            ids::REVIEW,
            "Review & Consent",
            "Please confirm your answers and consent to us processing them.",
            StepKind::Radio {
                options: vec![option("confirm", "I confirm and consent")],
            },
            StepValidationRule::required(),
        ),
    ]
});

/// The unconditional step sequence: ids 1, 2, 2.5, 3 through 9.
pub fn base_steps() -> &'static [QuestionnaireStep] {
    &BASE_STEPS
}

pub fn seven_ps_step(level: SevenPsLevel, risk_level: RiskLevel) -> QuestionnaireStep {
    let (title, question) = match level {
        SevenPsLevel::Basic => (
            "Personal Security Profile",
            "Tell us briefly about the people and places in your routine.",
        ),
        SevenPsLevel::Standard => (
            "Seven Ps Threat Profile",
            "Help us build your threat profile across the Seven Ps.",
        ),
        SevenPsLevel::Comprehensive => (
            "Comprehensive Seven Ps Threat Profile",
            "Your profile calls for a full Seven Ps assessment. Please complete at least five areas.",
        ),
    };
    QuestionnaireStep {
        id: ids::SEVEN_PS,
        title: title.to_string(),
        question: question.to_string(),
        kind: StepKind::SevenPsAssessment {
            level,
            dimensions: SEVEN_PS_DIMENSIONS.iter().map(|d| d.to_string()).collect(),
        },
        validation: if level == SevenPsLevel::Comprehensive {
            StepValidationRule::required()
        } else {
            StepValidationRule::optional()
        },
        progressive_disclosure: Some(DisclosureTrigger {
            module: ConditionalModule::SevenPs,
            risk_level,
            reason: format!("{} risk profile requires a {} Seven Ps assessment", risk_level, level.as_str()),
        }),
    }
}

pub fn risk_matrix_step(risk_level: RiskLevel, reason: &str) -> QuestionnaireStep {
    QuestionnaireStep {
        id: ids::RISK_MATRIX,
        title: "Your Risk Matrix".to_string(),
        question: "Here is how your answers place you on the probability and impact matrix."
            .to_string(),
        kind: StepKind::RiskMatrix,
        validation: StepValidationRule::optional(),
        progressive_disclosure: Some(DisclosureTrigger {
            module: ConditionalModule::RiskMatrix,
            risk_level,
            reason: reason.to_string(),
        }),
    }
}

pub fn enhanced_emergency_contacts_step(risk_level: RiskLevel) -> QuestionnaireStep {
    QuestionnaireStep {
        id: ids::ENHANCED_EMERGENCY_CONTACTS,
        title: "Enhanced Emergency Contacts".to_string(),
        question: "Please give us a next of kin and any additional contacts for escalation."
            .to_string(),
        kind: StepKind::EnhancedEmergencyContacts,
        validation: StepValidationRule::required(),
        progressive_disclosure: Some(DisclosureTrigger {
            module: ConditionalModule::EnhancedEmergencyContacts,
            risk_level,
            reason: format!("{risk_level} risk profile requires an escalation contact chain"),
        }),
    }
}

pub fn medical_data_step(risk_level: RiskLevel) -> QuestionnaireStep {
    QuestionnaireStep {
        id: ids::MEDICAL_DATA,
        title: "Medical Information".to_string(),
        question: "What should your officer do in a medical emergency?".to_string(),
        kind: StepKind::MedicalData,
        validation: if matches!(risk_level, RiskLevel::Orange | RiskLevel::Red) {
            StepValidationRule::required()
        } else {
            StepValidationRule::optional()
        },
        progressive_disclosure: Some(DisclosureTrigger {
            module: ConditionalModule::MedicalData,
            risk_level,
            reason: format!("{risk_level} risk profile requires medical emergency procedures"),
        }),
    }
}
