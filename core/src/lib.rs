//! Progressive disclosure risk assessment for close-protection bookings.
//!
//! Answers from the questionnaire are scored into a 5x5 probability/impact
//! matrix, mapped to a four-tier risk level and then to an assessment path
//! that decides which conditional steps the questionnaire reveals.

pub mod calculator;
pub mod catalog;
pub mod composer;
pub mod error;
pub mod navigator;
pub mod path;
pub mod responses;
pub mod service;
pub mod snapshot;
pub mod steps;
pub mod validator;

pub use calculator::{
    RiskAssessment, RiskLevel, RiskMatrix, assess_risk, calculate_risk_from_responses,
};
pub use composer::{calculate_progressive_steps, get_total_steps_for_user_type};
pub use error::{AssessmentError, ErrorReport};
pub use navigator::{get_next_progressive_step, get_previous_progressive_step};
pub use path::{AssessmentPath, determine_assessment_path};
pub use responses::{ResponseMap, ResponseValue};
pub use service::{ServiceTier, get_service_recommendation};
pub use snapshot::{AssessmentSnapshot, InMemoryRecordStore, RecordStore, SnapshotFilter};
pub use steps::{QuestionnaireStep, StepId};
pub use validator::{StepValidation, validate_progressive_step_data};
