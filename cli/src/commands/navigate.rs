use armora_core::navigator;
use armora_core::responses::ResponseMap;
use armora_core::steps::StepId;
use serde_json::{Value, json};

use crate::util::{EXIT_OK, emit, exit_error, fail, read_responses};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

pub fn run(direction: Direction, current: &str, responses_path: Option<&str>, raw: bool) -> i32 {
    let current: StepId = match current.parse() {
        Ok(id) => id,
        Err(err) => return fail(&err),
    };
    let responses = read_responses(responses_path)
        .unwrap_or_else(|e| exit_error(&e, Some("Pass --responses <file> or '-' for stdin")));
    emit(&navigation(direction, current, &responses), raw, EXIT_OK)
}

fn navigation(direction: Direction, current: StepId, responses: &ResponseMap) -> Value {
    let target = match direction {
        Direction::Next => navigator::get_next_progressive_step(current, responses),
        Direction::Previous => navigator::get_previous_progressive_step(current, responses),
    };
    json!({
        "current": current,
        "target": target,
        "response_key": target.response_key(),
        "end_of_flow": navigator::is_end_of_flow(target, responses),
    })
}

#[cfg(test)]
mod tests {
    use armora_core::responses::keys;
    use armora_core::steps::ids;

    use super::*;

    #[test]
    fn next_from_threat_step_enters_seven_ps_for_diplomat() {
        let responses = ResponseMap::new().with(keys::PROFESSIONAL_PROFILE, "diplomat");
        let out = navigation(Direction::Next, ids::THREAT_ASSESSMENT, &responses);
        assert_eq!(out["target"], "2.6");
        assert_eq!(out["response_key"], "step2_6");
        assert_eq!(out["end_of_flow"], false);
    }

    #[test]
    fn previous_from_first_step_leaves_the_flow() {
        let out = navigation(Direction::Previous, ids::PROFESSIONAL_PROFILE, &ResponseMap::new());
        assert_eq!(out["target"], "0");
        assert_eq!(out["end_of_flow"], true);
    }
}
