use armora_core::responses::{ResponseMap, ResponseValue};
use armora_core::steps::StepId;
use armora_core::validator::{self, StepValidation};
use serde_json::Value;

use crate::util::{EXIT_INVALID, EXIT_OK, emit, exit_error, fail, read_responses};

pub fn run(step: &str, value: Option<&str>, responses_path: Option<&str>, raw: bool) -> i32 {
    let step: StepId = match step.parse() {
        Ok(id) => id,
        Err(err) => return fail(&err),
    };
    let responses = read_responses(responses_path)
        .unwrap_or_else(|e| exit_error(&e, Some("Pass --responses <file> or '-' for stdin")));

    let result = check(step, value.map(parse_value).as_ref(), &responses);
    let code = if result.is_valid { EXIT_OK } else { EXIT_INVALID };
    emit(&result, raw, code)
}

/// `--value` is JSON when it parses as JSON, otherwise a plain text answer.
fn parse_value(raw: &str) -> ResponseValue {
    let json: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    serde_json::from_value(json.clone()).unwrap_or(ResponseValue::Other(json))
}

fn check(step: StepId, value: Option<&ResponseValue>, responses: &ResponseMap) -> StepValidation {
    validator::validate_progressive_step_data(step, value, responses)
}

#[cfg(test)]
mod tests {
    use armora_core::steps::ids;

    use super::*;

    #[test]
    fn bare_words_are_text_answers() {
        assert_eq!(parse_value("executive"), ResponseValue::text("executive"));
        assert_eq!(
            parse_value(r#"["phone","email"]"#),
            ResponseValue::selections(["phone", "email"])
        );
        assert!(matches!(parse_value(r#"{"hasReceivedThreats":true}"#), ResponseValue::Record(_)));
    }

    #[test]
    fn missing_required_answer_is_invalid() {
        let result = check(ids::PROFESSIONAL_PROFILE, None, &ResponseMap::new());
        assert!(!result.is_valid);
        let answer = parse_value("executive");
        assert!(check(ids::PROFESSIONAL_PROFILE, Some(&answer), &ResponseMap::new()).is_valid);
    }
}
