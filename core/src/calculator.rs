use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, RiskCategory, RiskFactor};
use crate::error::AssessmentError;
use crate::responses::{ResponseMap, keys};

pub const MIN_AXIS: u8 = 1;
pub const MAX_AXIS: u8 = 5;

/// Confidence bounds for questionnaire-derived assessments (percent).
pub const CONFIDENCE_FLOOR: u8 = 30;
pub const CONFIDENCE_CEILING: u8 = 95;
/// Confidence reported by a manual assessment with no active factors.
pub const MANUAL_DEFAULT_CONFIDENCE: u8 = 50;
/// Manual assessments gain this much confidence per active factor.
pub const MANUAL_CONFIDENCE_PER_FACTOR: u32 = 20;
/// Impact is derived from the mean factor weight scaled by this ratio.
pub const MANUAL_IMPACT_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Green,
        RiskLevel::Yellow,
        RiskLevel::Orange,
        RiskLevel::Red,
    ];

    /// Band a 1-25 matrix score: GREEN 1-6, YELLOW 7-12, ORANGE 13-19, RED 20-25.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=6 => RiskLevel::Green,
            7..=12 => RiskLevel::Yellow,
            13..=19 => RiskLevel::Orange,
            _ => RiskLevel::Red,
        }
    }

    /// Next tier up, capped at RED.
    pub fn escalate(self) -> Self {
        match self {
            RiskLevel::Green => RiskLevel::Yellow,
            RiskLevel::Yellow => RiskLevel::Orange,
            RiskLevel::Orange | RiskLevel::Red => RiskLevel::Red,
        }
    }

    pub fn protection_level(self) -> ProtectionLevel {
        match self {
            RiskLevel::Green => ProtectionLevel::Essential,
            RiskLevel::Yellow => ProtectionLevel::Executive,
            RiskLevel::Orange => ProtectionLevel::Shadow,
            RiskLevel::Red => ProtectionLevel::Enhanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Green => "GREEN",
            RiskLevel::Yellow => "YELLOW",
            RiskLevel::Orange => "ORANGE",
            RiskLevel::Red => "RED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended protection tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProtectionLevel {
    Essential,
    Executive,
    Shadow,
    Enhanced,
}

impl ProtectionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtectionLevel::Essential => "Essential",
            ProtectionLevel::Executive => "Executive",
            ProtectionLevel::Shadow => "Shadow",
            ProtectionLevel::Enhanced => "Enhanced",
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability x impact grid. Always rebuilt from scratch, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMatrix {
    pub probability: u8,
    pub impact: u8,
    pub score: u8,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub protection_level: ProtectionLevel,
}

impl RiskMatrix {
    /// Shared scoring path: clamp each axis to 1-5, multiply, band.
    pub fn from_components(probability: i32, impact: i32, factors: Vec<RiskFactor>) -> Self {
        let probability = clamp_axis(probability);
        let impact = clamp_axis(impact);
        let score = probability * impact;
        let level = RiskLevel::from_score(score);
        Self {
            probability,
            impact,
            score,
            level,
            factors,
            protection_level: level.protection_level(),
        }
    }

    pub fn baseline() -> Self {
        Self::from_components(MIN_AXIS as i32, MIN_AXIS as i32, Vec::new())
    }
}

fn clamp_axis(value: i32) -> u8 {
    value.clamp(MIN_AXIS as i32, MAX_AXIS as i32) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentSource {
    /// Derived from questionnaire responses.
    Questionnaire,
    /// Caller-supplied factors and/or axis overrides.
    Manual,
    /// Scoring failed and the baseline was substituted.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub matrix: RiskMatrix,
    /// Percent, 30-95 for questionnaire assessments.
    pub confidence: u8,
    pub last_updated: DateTime<Utc>,
    pub source: AssessmentSource,
}

impl RiskAssessment {
    pub fn baseline_at(now: DateTime<Utc>) -> Self {
        Self {
            matrix: RiskMatrix::baseline(),
            confidence: CONFIDENCE_FLOOR,
            last_updated: now,
            source: AssessmentSource::Fallback,
        }
    }

    pub fn level(&self) -> RiskLevel {
        self.matrix.level
    }
}

/// Coverage heuristic over the nine canonical base steps, clamped to 30-95.
///
/// The denominator stays at nine even when conditional steps are disclosed.
pub fn questionnaire_confidence(answered_base_steps: usize) -> u8 {
    let percent = (answered_base_steps as f64 / keys::CANONICAL_BASE.len() as f64) * 100.0;
    percent
        .round()
        .clamp(CONFIDENCE_FLOOR as f64, CONFIDENCE_CEILING as f64) as u8
}

/// Score a response map. Never fails: malformed input degrades to the GREEN baseline.
pub fn calculate_risk_from_responses(responses: &ResponseMap) -> RiskAssessment {
    calculate_risk_from_responses_at(responses, Utc::now())
}

pub fn calculate_risk_from_responses_at(
    responses: &ResponseMap,
    now: DateTime<Utc>,
) -> RiskAssessment {
    match try_calculate_risk_from_responses_at(responses, now) {
        Ok(assessment) => assessment,
        Err(err) => {
            tracing::warn!(error = %err, "risk scoring failed, using GREEN baseline");
            RiskAssessment::baseline_at(now)
        }
    }
}

pub fn try_calculate_risk_from_responses_at(
    responses: &ResponseMap,
    now: DateTime<Utc>,
) -> Result<RiskAssessment, AssessmentError> {
    let mut probability: i32 = MIN_AXIS as i32;
    let mut impact: i32 = MIN_AXIS as i32;
    let mut factors = Vec::new();

    if let Some(category) = responses.choice(keys::PROFESSIONAL_PROFILE)? {
        if catalog::is_high_profile(category) {
            probability += 1;
            impact += 1;
            activate(&mut factors, RiskCategory::Professional, category);
        }
    }

    let requirements = responses.selections(keys::SECURITY_REQUIREMENTS)?;
    if requirements.contains(&catalog::PRIVACY_DISCRETION) {
        probability += 1;
        impact += 1;
        activate(&mut factors, RiskCategory::Security, catalog::PRIVACY_DISCRETION);
    }
    if requirements.contains(&catalog::SECURITY_AWARENESS) {
        probability += 1;
        activate(&mut factors, RiskCategory::Security, catalog::SECURITY_AWARENESS);
    }

    let coverage = responses.selections(keys::COVERAGE_AREAS)?;
    if coverage.contains(&catalog::INTERNATIONAL_SPECIALIZED) {
        probability += 1;
        impact += 1;
        activate(
            &mut factors,
            RiskCategory::Geographic,
            catalog::INTERNATIONAL_SPECIALIZED,
        );
    }

    if let Some(frequency) = responses.choice(keys::TRAVEL_FREQUENCY)? {
        if catalog::PREDICTABLE_FREQUENCIES.contains(&frequency) {
            probability += 1;
            activate(&mut factors, RiskCategory::Travel, frequency);
        }
    }

    let matrix = RiskMatrix::from_components(probability, impact, factors);
    let confidence = questionnaire_confidence(responses.answered_base_steps());
    tracing::debug!(
        probability = matrix.probability,
        impact = matrix.impact,
        score = matrix.score,
        level = %matrix.level,
        confidence,
        "scored responses"
    );

    Ok(RiskAssessment {
        matrix,
        confidence,
        last_updated: now,
        source: AssessmentSource::Questionnaire,
    })
}

fn activate(factors: &mut Vec<RiskFactor>, category: RiskCategory, id: &str) {
    if let Some(entry) = catalog::lookup(category, id) {
        factors.push(entry.activate());
    }
}

/// Manual assessment over explicitly chosen factors.
///
/// Each axis uses its override when given; otherwise it is derived from the
/// mean weight of the active factors (impact scaled by 0.8).
pub fn assess_risk(
    factors: &[RiskFactor],
    manual_probability: Option<u8>,
    manual_impact: Option<u8>,
) -> RiskAssessment {
    assess_risk_at(factors, manual_probability, manual_impact, Utc::now())
}

pub fn assess_risk_at(
    factors: &[RiskFactor],
    manual_probability: Option<u8>,
    manual_impact: Option<u8>,
    now: DateTime<Utc>,
) -> RiskAssessment {
    let active: Vec<RiskFactor> = factors.iter().filter(|f| f.is_active).cloned().collect();
    let average_weight = if active.is_empty() {
        0.0
    } else {
        active.iter().map(|f| f.weight as f64).sum::<f64>() / active.len() as f64
    };

    let probability = manual_probability
        .map(i32::from)
        .unwrap_or_else(|| average_weight.round() as i32);
    let impact = manual_impact
        .map(i32::from)
        .unwrap_or_else(|| (average_weight * MANUAL_IMPACT_RATIO).round() as i32);

    let confidence = if active.is_empty() {
        MANUAL_DEFAULT_CONFIDENCE
    } else {
        (active.len() as u32 * MANUAL_CONFIDENCE_PER_FACTOR).min(CONFIDENCE_CEILING as u32) as u8
    };

    RiskAssessment {
        matrix: RiskMatrix::from_components(probability, impact, active),
        confidence,
        last_updated: now,
        source: AssessmentSource::Manual,
    }
}

/// Resolve catalog ids into active factors for [`assess_risk`].
pub fn factors_from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Vec<RiskFactor>, AssessmentError> {
    ids.iter()
        .map(|id| {
            catalog::find(id.as_ref())
                .map(|entry| entry.activate())
                .ok_or_else(|| {
                    AssessmentError::InvalidRiskInput(format!(
                        "unknown risk factor '{}'",
                        id.as_ref()
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::responses::ResponseValue;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn score(responses: &ResponseMap) -> RiskAssessment {
        calculate_risk_from_responses_at(responses, fixed_now())
    }

    #[test]
    fn empty_responses_yield_the_baseline() {
        let assessment = score(&ResponseMap::new());
        assert_eq!(assessment.matrix.probability, 1);
        assert_eq!(assessment.matrix.impact, 1);
        assert_eq!(assessment.matrix.score, 1);
        assert_eq!(assessment.level(), RiskLevel::Green);
        assert_eq!(assessment.matrix.protection_level, ProtectionLevel::Essential);
        assert_eq!(assessment.confidence, 30);
        assert_eq!(assessment.source, AssessmentSource::Questionnaire);
        assert!(assessment.matrix.factors.is_empty());
    }

    #[test]
    fn stacked_signals_clamp_probability_and_reach_red() {
        let responses = ResponseMap::new()
            .with(keys::PROFESSIONAL_PROFILE, "celebrity")
            .with(keys::SECURITY_REQUIREMENTS, vec!["privacy_discretion"])
            .with(keys::COVERAGE_AREAS, vec!["international_specialized"])
            .with(keys::TRAVEL_FREQUENCY, "daily");

        let matrix = score(&responses).matrix;
        // four probability increments over a baseline of one, three for impact
        assert_eq!(matrix.probability, 5);
        assert_eq!(matrix.impact, 4);
        assert_eq!(matrix.score, 20);
        assert_eq!(matrix.level, RiskLevel::Red);
        assert_eq!(matrix.protection_level, ProtectionLevel::Enhanced);
        let ids: Vec<&str> = matrix.factors.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["celebrity", "privacy_discretion", "international_specialized", "daily"]
        );
        assert!(matrix.factors.iter().all(|f| f.is_active));
    }

    #[test]
    fn every_signal_saturates_probability_at_five() {
        let responses = ResponseMap::new()
            .with(keys::PROFESSIONAL_PROFILE, "diplomat")
            .with(
                keys::SECURITY_REQUIREMENTS,
                vec!["privacy_discretion", "security_awareness"],
            )
            .with(keys::COVERAGE_AREAS, vec!["international_specialized"])
            .with(keys::TRAVEL_FREQUENCY, "weekly");

        let matrix = score(&responses).matrix;
        assert_eq!(matrix.probability, 5);
        assert_eq!(matrix.impact, 4);
        assert_eq!(matrix.factors.len(), 5);
    }

    #[test]
    fn low_profile_answers_do_not_move_the_matrix() {
        let responses = ResponseMap::new()
            .with(keys::PROFESSIONAL_PROFILE, "private_individual")
            .with(keys::SECURITY_REQUIREMENTS, vec!["secure_transport"])
            .with(keys::TRAVEL_FREQUENCY, "monthly");
        let assessment = score(&responses);
        assert_eq!(assessment.matrix.score, 1);
        assert!(assessment.matrix.factors.is_empty());
    }

    #[test]
    fn level_bands_are_inclusive() {
        assert_eq!(RiskLevel::from_score(1), RiskLevel::Green);
        assert_eq!(RiskLevel::from_score(6), RiskLevel::Green);
        assert_eq!(RiskLevel::from_score(7), RiskLevel::Yellow);
        assert_eq!(RiskLevel::from_score(12), RiskLevel::Yellow);
        assert_eq!(RiskLevel::from_score(13), RiskLevel::Orange);
        assert_eq!(RiskLevel::from_score(19), RiskLevel::Orange);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Red);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Red);
    }

    #[test]
    fn escalation_is_capped_at_red() {
        assert_eq!(RiskLevel::Green.escalate(), RiskLevel::Yellow);
        assert_eq!(RiskLevel::Orange.escalate(), RiskLevel::Red);
        assert_eq!(RiskLevel::Red.escalate(), RiskLevel::Red);
    }

    #[test]
    fn confidence_scales_with_answered_base_steps() {
        assert_eq!(questionnaire_confidence(0), 30);
        assert_eq!(questionnaire_confidence(2), 30);
        assert_eq!(questionnaire_confidence(3), 33);
        assert_eq!(questionnaire_confidence(6), 67);
        assert_eq!(questionnaire_confidence(9), 95);
    }

    #[test]
    fn conditional_step_answers_do_not_count_toward_confidence() {
        let responses = ResponseMap::new()
            .with(keys::THREAT_ASSESSMENT, ResponseValue::record(json!({"hasReceivedThreats": true})))
            .with(keys::SEVEN_PS, ResponseValue::record(json!({"people": "staff"})))
            .with("step1", "executive")
            .with("step2", vec!["visible_deterrent"])
            .with("step3", vec!["luxury_vehicle"])
            .with("step4", "monthly");
        assert_eq!(score(&responses).confidence, 44);
    }

    #[test]
    fn malformed_known_key_degrades_to_fallback() {
        let responses = ResponseMap::new().with(keys::PROFESSIONAL_PROFILE, vec!["celebrity", "diplomat"]);
        assert!(try_calculate_risk_from_responses_at(&responses, fixed_now()).is_err());

        let assessment = score(&responses);
        assert_eq!(assessment.source, AssessmentSource::Fallback);
        assert_eq!(assessment.level(), RiskLevel::Green);
        assert_eq!(assessment.confidence, 30);
    }

    #[test]
    fn scoring_is_idempotent() {
        let responses = ResponseMap::new()
            .with(keys::PROFESSIONAL_PROFILE, "government")
            .with(keys::SECURITY_REQUIREMENTS, vec!["security_awareness"]);
        assert_eq!(score(&responses), score(&responses));
    }

    #[test]
    fn manual_overrides_take_precedence() {
        let assessment = assess_risk_at(&[], Some(4), Some(5), fixed_now());
        assert_eq!(assessment.matrix.score, 20);
        assert_eq!(assessment.level(), RiskLevel::Red);
        assert_eq!(assessment.confidence, 50);
        assert_eq!(assessment.source, AssessmentSource::Manual);
    }

    #[test]
    fn manual_axes_derive_from_mean_active_weight() {
        // weights 5 (celebrity) and 4 (privacy_discretion): mean 4.5
        let factors = factors_from_ids(&["celebrity", "privacy_discretion"]).unwrap();
        let assessment = assess_risk_at(&factors, None, None, fixed_now());
        assert_eq!(assessment.matrix.probability, 5);
        assert_eq!(assessment.matrix.impact, 4);
        assert_eq!(assessment.matrix.score, 20);
        assert_eq!(assessment.confidence, 40);
    }

    #[test]
    fn manual_assessment_ignores_inactive_factors() {
        let mut factors = factors_from_ids(&["celebrity", "daily"]).unwrap();
        factors[0].is_active = false;
        let assessment = assess_risk_at(&factors, None, None, fixed_now());
        // daily weighs 3: probability 3, impact round(2.4) = 2
        assert_eq!(assessment.matrix.probability, 3);
        assert_eq!(assessment.matrix.impact, 2);
        assert_eq!(assessment.matrix.factors.len(), 1);
        assert_eq!(assessment.confidence, 20);
    }

    #[test]
    fn manual_confidence_caps_at_ninety_five() {
        let factors = factors_from_ids(&[
            "celebrity",
            "diplomat",
            "privacy_discretion",
            "security_awareness",
            "international_specialized",
            "daily",
        ])
        .unwrap();
        assert_eq!(assess_risk_at(&factors, None, None, fixed_now()).confidence, 95);
    }

    #[test]
    fn manual_with_nothing_clamps_to_baseline_axes() {
        let assessment = assess_risk_at(&[], None, None, fixed_now());
        assert_eq!(assessment.matrix.probability, 1);
        assert_eq!(assessment.matrix.impact, 1);
        assert_eq!(assessment.matrix.level, RiskLevel::Green);
    }

    #[test]
    fn unknown_factor_ids_are_rejected() {
        let err = factors_from_ids(&["celebrity", "astronaut"]).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidRiskInput(msg) if msg.contains("astronaut")));
    }

    #[test]
    fn risk_level_serializes_upper_case() {
        assert_eq!(serde_json::to_value(RiskLevel::Orange).unwrap(), json!("ORANGE"));
        assert_eq!(RiskLevel::parse("red"), Some(RiskLevel::Red));
    }

    fn arb_responses() -> impl Strategy<Value = ResponseMap> {
        let profile = prop::option::of(prop::sample::select(vec![
            "celebrity",
            "government",
            "diplomat",
            "high_profile",
            "executive",
            "private_individual",
        ]));
        let requirements = prop::sample::subsequence(
            vec!["privacy_discretion", "security_awareness", "visible_deterrent", "family_protection"],
            0..=4,
        );
        let coverage = prop::sample::subsequence(
            vec!["central_london", "uk_wide", "european", "international_specialized"],
            0..=4,
        );
        let frequency = prop::option::of(prop::sample::select(vec![
            "daily", "weekly", "monthly", "occasional",
        ]));
        let extra = prop::sample::subsequence(vec!["step3", "step6", "step7", "step8", "step9"], 0..=5);

        (profile, requirements, coverage, frequency, extra).prop_map(
            |(profile, requirements, coverage, frequency, extra)| {
                let mut map = ResponseMap::new();
                if let Some(p) = profile {
                    map.insert(keys::PROFESSIONAL_PROFILE, p);
                }
                if !requirements.is_empty() {
                    map.insert(keys::SECURITY_REQUIREMENTS, requirements);
                }
                if !coverage.is_empty() {
                    map.insert(keys::COVERAGE_AREAS, coverage);
                }
                if let Some(f) = frequency {
                    map.insert(keys::TRAVEL_FREQUENCY, f);
                }
                for key in extra {
                    map.insert(key, "answered");
                }
                map
            },
        )
    }

    proptest! {
        #[test]
        fn matrix_stays_in_bounds(responses in arb_responses()) {
            let assessment = score(&responses);
            let m = &assessment.matrix;
            prop_assert!((1..=5).contains(&m.probability));
            prop_assert!((1..=5).contains(&m.impact));
            prop_assert_eq!(m.score, m.probability * m.impact);
            prop_assert!((1..=25).contains(&m.score));
            prop_assert_eq!(m.level, RiskLevel::from_score(m.score));
            prop_assert!((30..=95).contains(&assessment.confidence));
        }

        #[test]
        fn adding_a_weighted_signal_never_lowers_the_score(responses in arb_responses()) {
            let before = score(&responses).matrix.score;
            let mut requirements: Vec<String> = responses
                .selections(keys::SECURITY_REQUIREMENTS)
                .unwrap()
                .into_iter()
                .map(str::to_string)
                .collect();
            requirements.push("privacy_discretion".to_string());
            let mut with_signal = responses.clone();
            with_signal.insert(keys::SECURITY_REQUIREMENTS, ResponseValue::Selections(requirements));
            prop_assert!(score(&with_signal).matrix.score >= before);
        }

        #[test]
        fn rescoring_is_identical(responses in arb_responses()) {
            prop_assert_eq!(score(&responses), score(&responses));
        }
    }
}
