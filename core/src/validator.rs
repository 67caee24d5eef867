use serde::{Deserialize, Serialize};

use crate::composer::calculate_progressive_steps;
use crate::path::SevenPsLevel;
use crate::responses::{EnhancedEmergencyContacts, MedicalData, ResponseMap, ResponseValue};
use crate::steps::{COMPREHENSIVE_SEVEN_PS_MIN_KEYS, QuestionnaireStep, StepId, StepKind};

/// Advisory result: the form layer blocks advancing on `is_valid == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StepValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error_message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: Some(message.into()),
        }
    }
}

/// Validate an answer for a step against the sequence composed for `responses`.
///
/// Steps the composer would hide are always valid.
pub fn validate_progressive_step_data(
    step_id: StepId,
    value: Option<&ResponseValue>,
    responses: &ResponseMap,
) -> StepValidation {
    let composed = calculate_progressive_steps(responses);
    let Some(step) = composed.iter().find(|step| step.id == step_id) else {
        return StepValidation::valid();
    };
    validate_step(step, value)
}

pub fn validate_step(step: &QuestionnaireStep, value: Option<&ResponseValue>) -> StepValidation {
    let empty = ResponseValue::Empty;
    let value = value.unwrap_or(&empty);
    match &step.kind {
        StepKind::ThreatAssessment => validate_threat_assessment(value),
        StepKind::SevenPsAssessment { level, .. } => validate_seven_ps(*level, value),
        StepKind::EnhancedEmergencyContacts => validate_enhanced_contacts(value),
        StepKind::MedicalData => validate_medical_data(value),
        StepKind::RiskMatrix => StepValidation::valid(),
        StepKind::Radio { .. } | StepKind::Checkbox { .. } | StepKind::Input { .. } => {
            validate_static_rule(step, value)
        }
    }
}

fn validate_threat_assessment(value: &ResponseValue) -> StepValidation {
    match value {
        ResponseValue::Record(_) if value.is_answered() => StepValidation::valid(),
        _ => StepValidation::invalid("Please complete the threat assessment"),
    }
}

fn validate_seven_ps(level: SevenPsLevel, value: &ResponseValue) -> StepValidation {
    if level != SevenPsLevel::Comprehensive {
        return StepValidation::valid();
    }
    let populated = value.populated_key_count();
    if populated >= COMPREHENSIVE_SEVEN_PS_MIN_KEYS {
        StepValidation::valid()
    } else {
        StepValidation::invalid(format!(
            "Please complete at least {COMPREHENSIVE_SEVEN_PS_MIN_KEYS} areas of the Seven Ps assessment ({populated} completed)"
        ))
    }
}

fn validate_enhanced_contacts(value: &ResponseValue) -> StepValidation {
    let contacts = match value.decode::<EnhancedEmergencyContacts>("step6_5", "a contacts record") {
        Ok(contacts) => contacts.unwrap_or_default(),
        Err(_) => return StepValidation::invalid("Emergency contact details are not in a recognised format"),
    };
    match contacts.next_of_kin {
        Some(next_of_kin) if next_of_kin.is_reachable() => StepValidation::valid(),
        _ => StepValidation::invalid("Please provide a next of kin name and primary phone number"),
    }
}

fn validate_medical_data(value: &ResponseValue) -> StepValidation {
    let medical = match value.decode::<MedicalData>("step8_5", "a medical record") {
        Ok(medical) => medical.unwrap_or_default(),
        Err(_) => return StepValidation::invalid("Medical information is not in a recognised format"),
    };
    if medical.emergency_procedures.trim().is_empty() {
        StepValidation::invalid("Please describe your medical emergency procedures")
    } else {
        StepValidation::valid()
    }
}

fn validate_static_rule(step: &QuestionnaireStep, value: &ResponseValue) -> StepValidation {
    let rule = step.validation;
    if rule.required && !value.is_answered() {
        return StepValidation::invalid(format!("{} is required", step.title));
    }

    let selected = match value {
        ResponseValue::Selections(items) => items.iter().filter(|i| !i.trim().is_empty()).count(),
        ResponseValue::Text(text) if !text.trim().is_empty() => 1,
        _ => 0,
    };
    if let Some(min) = rule.min_selections {
        if selected < min {
            return StepValidation::invalid(format!(
                "Please select at least {min} option{}",
                if min == 1 { "" } else { "s" }
            ));
        }
    }
    if let Some(max) = rule.max_selections {
        if selected > max {
            return StepValidation::invalid(format!("Please select no more than {max} options"));
        }
    }
    StepValidation::valid()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::responses::keys;
    use crate::steps::ids;

    fn red_responses() -> ResponseMap {
        ResponseMap::new()
            .with(keys::PROFESSIONAL_PROFILE, "celebrity")
            .with(keys::SECURITY_REQUIREMENTS, vec!["privacy_discretion"])
            .with(keys::COVERAGE_AREAS, vec!["international_specialized"])
            .with(keys::TRAVEL_FREQUENCY, "daily")
    }

    fn orange_responses() -> ResponseMap {
        // score 9 (YELLOW), escalated by the profile
        ResponseMap::new()
            .with(keys::PROFESSIONAL_PROFILE, "celebrity")
            .with(keys::COVERAGE_AREAS, vec!["international_specialized"])
    }

    #[test]
    fn hidden_steps_are_always_valid() {
        let responses = ResponseMap::new();
        let result = validate_progressive_step_data(ids::MEDICAL_DATA, None, &responses);
        assert_eq!(result, StepValidation::valid());
        let result = validate_progressive_step_data(ids::ENHANCED_EMERGENCY_CONTACTS, None, &responses);
        assert!(result.is_valid);
    }

    #[test]
    fn threat_assessment_needs_a_populated_record() {
        let responses = ResponseMap::new();
        assert!(!validate_progressive_step_data(ids::THREAT_ASSESSMENT, None, &responses).is_valid);
        let text = ResponseValue::text("no threats");
        assert!(!validate_progressive_step_data(ids::THREAT_ASSESSMENT, Some(&text), &responses).is_valid);
        let record = ResponseValue::record(json!({ "hasReceivedThreats": false }));
        assert!(validate_progressive_step_data(ids::THREAT_ASSESSMENT, Some(&record), &responses).is_valid);
    }

    #[test]
    fn comprehensive_seven_ps_needs_five_populated_areas() {
        let responses = red_responses();
        let four = ResponseValue::record(json!({
            "people": "household staff",
            "places": "office, residence",
            "personality": "outgoing",
            "prejudices": "",
            "political": "none"
        }));
        let result = validate_progressive_step_data(ids::SEVEN_PS, Some(&four), &responses);
        assert!(!result.is_valid);
        assert!(result.error_message.unwrap().contains("(4 completed)"));

        let five = ResponseValue::record(json!({
            "people": "household staff",
            "places": "office, residence",
            "personality": "outgoing",
            "prejudices": "stalker history",
            "political": "none"
        }));
        assert!(validate_progressive_step_data(ids::SEVEN_PS, Some(&five), &responses).is_valid);
    }

    #[test]
    fn basic_seven_ps_has_no_minimum() {
        let responses = ResponseMap::new().with(keys::PROFESSIONAL_PROFILE, "diplomat");
        assert!(validate_progressive_step_data(ids::SEVEN_PS, None, &responses).is_valid);
    }

    #[test]
    fn enhanced_contacts_need_next_of_kin_name_and_phone() {
        let responses = orange_responses();
        let missing_phone = ResponseValue::record(json!({ "nextOfKin": { "name": "Sam Doe" } }));
        let result = validate_progressive_step_data(ids::ENHANCED_EMERGENCY_CONTACTS, Some(&missing_phone), &responses);
        assert!(!result.is_valid);

        let complete = ResponseValue::record(json!({
            "nextOfKin": { "name": "Sam Doe", "primaryPhone": "+44 7700 900123", "relationship": "sibling" }
        }));
        assert!(
            validate_progressive_step_data(ids::ENHANCED_EMERGENCY_CONTACTS, Some(&complete), &responses).is_valid
        );

        let wrong_shape = ResponseValue::selections(["Sam Doe"]);
        assert!(
            !validate_progressive_step_data(ids::ENHANCED_EMERGENCY_CONTACTS, Some(&wrong_shape), &responses).is_valid
        );
    }

    #[test]
    fn medical_data_needs_emergency_procedures() {
        let responses = orange_responses();
        let blank = ResponseValue::record(json!({ "bloodType": "O-", "emergencyProcedures": "  " }));
        assert!(!validate_progressive_step_data(ids::MEDICAL_DATA, Some(&blank), &responses).is_valid);

        let filled = ResponseValue::record(json!({ "emergencyProcedures": "EpiPen in left jacket pocket" }));
        assert!(validate_progressive_step_data(ids::MEDICAL_DATA, Some(&filled), &responses).is_valid);
    }

    #[test]
    fn base_steps_use_their_static_rules() {
        let responses = ResponseMap::new();
        assert!(!validate_progressive_step_data(ids::PROFESSIONAL_PROFILE, None, &responses).is_valid);
        let profile = ResponseValue::text("executive");
        assert!(validate_progressive_step_data(ids::PROFESSIONAL_PROFILE, Some(&profile), &responses).is_valid);

        let too_many = ResponseValue::selections(["phone", "sms", "email", "whatsapp"]);
        let result = validate_progressive_step_data(ids::CONTACT_PREFERENCES, Some(&too_many), &responses);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Please select no more than 3 options")
        );

        assert!(validate_progressive_step_data(ids::SPECIAL_REQUIREMENTS, None, &responses).is_valid);
    }

    #[test]
    fn risk_matrix_step_never_blocks() {
        let responses = red_responses();
        assert!(validate_progressive_step_data(ids::RISK_MATRIX, None, &responses).is_valid);
    }
}
