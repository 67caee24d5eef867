use armora_core::calculator::{self, RiskAssessment};
use armora_core::catalog;
use armora_core::composer;
use armora_core::error::{AssessmentError, ErrorReport};
use armora_core::path;
use armora_core::responses::ResponseMap;
use armora_core::service::ServiceTier;
use serde_json::{Value, json};

use crate::util::{EXIT_OK, EXIT_USAGE, emit, exit_error, print_error, read_responses};

pub fn run(responses_path: Option<&str>, raw: bool) -> i32 {
    let responses = read_responses(responses_path)
        .unwrap_or_else(|e| exit_error(&e, Some("Pass --responses <file> or '-' for stdin")));
    emit(&questionnaire_report(&responses), raw, EXIT_OK)
}

pub fn run_manual(
    factor_ids: &[String],
    probability: Option<u8>,
    impact: Option<u8>,
    raw: bool,
) -> i32 {
    match manual_report(factor_ids, probability, impact) {
        Ok(report) => emit(&report, raw, EXIT_OK),
        Err(err) => {
            let known: Vec<&str> = catalog::entries().map(|entry| entry.id).collect();
            print_error(
                &ErrorReport::from(&err).with_hint(format!("Known factors: {}", known.join(", "))),
            );
            EXIT_USAGE
        }
    }
}

fn questionnaire_report(responses: &ResponseMap) -> Value {
    let resolution = path::resolve_assessment_path(responses);
    let triggered = composer::triggered_modules(&resolution.path, responses);
    json!({
        "assessment": resolution.assessment,
        "computed_level": resolution.computed_level,
        "escalated": resolution.escalated(),
        "escalation_triggers": resolution.escalation_triggers,
        "path": resolution.path,
        "triggered_modules": triggered,
        "service_tier": ServiceTier::for_path(&resolution.path),
    })
}

fn manual_report(
    factor_ids: &[String],
    probability: Option<u8>,
    impact: Option<u8>,
) -> Result<Value, AssessmentError> {
    let factors = calculator::factors_from_ids(factor_ids)?;
    let assessment: RiskAssessment = calculator::assess_risk(&factors, probability, impact);
    let tier = ServiceTier::for_protection_level(assessment.matrix.protection_level);
    Ok(json!({
        "assessment": assessment,
        "service_tier": tier,
    }))
}

#[cfg(test)]
mod tests {
    use armora_core::responses::keys;

    use super::*;

    #[test]
    fn questionnaire_report_shows_escalation() {
        let responses = ResponseMap::new().with(keys::PROFESSIONAL_PROFILE, "diplomat");
        let report = questionnaire_report(&responses);
        assert_eq!(report["computed_level"], "GREEN");
        assert_eq!(report["path"]["risk_level"], "YELLOW");
        assert_eq!(report["escalated"], true);
        assert_eq!(report["service_tier"], "armora-executive");
        assert_eq!(report["triggered_modules"], json!(["seven_ps"]));
    }

    #[test]
    fn manual_report_applies_overrides() {
        let ids = vec!["celebrity".to_string()];
        let report = manual_report(&ids, Some(5), Some(4)).unwrap();
        assert_eq!(report["assessment"]["matrix"]["score"], 20);
        assert_eq!(report["assessment"]["matrix"]["level"], "RED");
        assert_eq!(report["service_tier"], "armora-shadow");
    }

    #[test]
    fn manual_report_rejects_unknown_factor() {
        let ids = vec!["astronaut".to_string()];
        assert!(matches!(
            manual_report(&ids, None, None),
            Err(AssessmentError::InvalidRiskInput(_))
        ));
    }
}
