use armora_core::composer;
use armora_core::responses::ResponseMap;
use serde_json::{Value, json};

use crate::util::{EXIT_OK, emit, exit_error, read_responses};

pub fn run(responses_path: Option<&str>, user_type: &str, raw: bool) -> i32 {
    let responses = read_responses(responses_path)
        .unwrap_or_else(|e| exit_error(&e, Some("Pass --responses <file> or '-' for stdin")));
    emit(&step_listing(&responses, user_type), raw, EXIT_OK)
}

fn step_listing(responses: &ResponseMap, user_type: &str) -> Value {
    let steps = composer::calculate_progressive_steps(responses);
    let answered = steps
        .iter()
        .filter(|step| responses.is_answered(&step.response_key()))
        .count();
    json!({
        "total_steps": composer::get_total_steps_for_user_type(user_type, responses),
        "answered": answered,
        "steps": steps,
    })
}
