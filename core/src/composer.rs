use crate::path::{self, AssessmentPath, BASE_QUESTION_COUNT};
use crate::responses::{ResponseMap, keys};
use crate::steps::{self, ConditionalModule, QuestionnaireStep};

/// Ordered steps to present for these responses: the base sequence with the
/// conditional modules the resolved path calls for spliced in.
///
/// Scoring failures fall back to the base sequence alone.
pub fn calculate_progressive_steps(responses: &ResponseMap) -> Vec<QuestionnaireStep> {
    match path::try_resolve_assessment_path_at(responses, chrono::Utc::now()) {
        Ok(resolution) => compose_for_path(&resolution.path, responses),
        Err(err) => {
            tracing::warn!(error = %err, "step composition failed, using base sequence");
            steps::base_steps().to_vec()
        }
    }
}

/// Conditional modules disclosed for this path and these responses.
///
/// The risk matrix shows once the threat assessment has any answer, or when
/// the path itself lists it.
pub fn triggered_modules(path: &AssessmentPath, responses: &ResponseMap) -> Vec<ConditionalModule> {
    ConditionalModule::ALL
        .into_iter()
        .filter(|module| match module {
            ConditionalModule::RiskMatrix => {
                path.requires(*module) || responses.is_answered(keys::THREAT_ASSESSMENT)
            }
            _ => path.requires(*module),
        })
        .collect()
}

pub fn compose_for_path(path: &AssessmentPath, responses: &ResponseMap) -> Vec<QuestionnaireStep> {
    let mut composed = steps::base_steps().to_vec();

    for module in triggered_modules(path, responses) {
        let step = match module {
            ConditionalModule::SevenPs => steps::seven_ps_step(path.seven_ps_level, path.risk_level),
            ConditionalModule::RiskMatrix => {
                let reason = if responses.is_answered(keys::THREAT_ASSESSMENT) {
                    "threat assessment answered"
                } else {
                    "critical risk profile"
                };
                steps::risk_matrix_step(path.risk_level, reason)
            }
            ConditionalModule::EnhancedEmergencyContacts => {
                steps::enhanced_emergency_contacts_step(path.risk_level)
            }
            ConditionalModule::MedicalData => steps::medical_data_step(path.risk_level),
        };
        splice(&mut composed, step);
    }

    tracing::debug!(
        level = %path.risk_level,
        steps = composed.len(),
        "composed questionnaire"
    );
    composed
}

/// Insert in id order; an id that is already present is left as is.
fn splice(composed: &mut Vec<QuestionnaireStep>, step: QuestionnaireStep) {
    match composed.binary_search_by_key(&step.id, |existing| existing.id) {
        Ok(_) => {}
        Err(position) => composed.insert(position, step),
    }
}

/// Step count for progress display: the nine numbered base steps plus one per
/// disclosed module. Not used for flow control.
pub fn get_total_steps_for_user_type(user_type: &str, responses: &ResponseMap) -> usize {
    let triggered = match path::try_resolve_assessment_path_at(responses, chrono::Utc::now()) {
        Ok(resolution) => triggered_modules(&resolution.path, responses).len(),
        Err(err) => {
            tracing::warn!(error = %err, "step count fell back to base sequence");
            0
        }
    };
    let total = BASE_QUESTION_COUNT + triggered;
    tracing::trace!(user_type, total, "total steps");
    total
}

/// Whether the composer would present this step for these responses.
pub fn is_step_included(id: steps::StepId, responses: &ResponseMap) -> bool {
    calculate_progressive_steps(responses)
        .iter()
        .any(|step| step.id == id)
}
