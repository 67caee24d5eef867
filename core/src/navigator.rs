//! Next/previous step resolution over the composed sequence.
//!
//! Ids are sparse (2.5, 2.6, 6.5, ...), so neighbours come from the composed
//! list for the current responses, not from arithmetic. When the current id is
//! not in that list, usually because an earlier answer changed and its module
//! disappeared, the navigator moves one whole step instead. It never fails: an
//! id with no matching step means the flow has ended.

use crate::composer::calculate_progressive_steps;
use crate::responses::ResponseMap;
use crate::steps::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

fn neighbour(current: StepId, responses: &ResponseMap, direction: Direction) -> StepId {
    let composed = calculate_progressive_steps(responses);
    let delta = match direction {
        Direction::Forward => 1,
        Direction::Backward => -1,
    };

    let Some(index) = composed.iter().position(|step| step.id == current) else {
        tracing::debug!(%current, "step not in composed sequence, using arithmetic neighbour");
        return current.offset(delta);
    };

    let target = match direction {
        Direction::Forward => composed.get(index + 1),
        Direction::Backward => index.checked_sub(1).and_then(|i| composed.get(i)),
    };
    target.map(|step| step.id).unwrap_or_else(|| current.offset(delta))
}

pub fn get_next_progressive_step(current: StepId, responses: &ResponseMap) -> StepId {
    neighbour(current, responses, Direction::Forward)
}

pub fn get_previous_progressive_step(current: StepId, responses: &ResponseMap) -> StepId {
    neighbour(current, responses, Direction::Backward)
}

/// True when `id` names no step in the composed sequence.
pub fn is_end_of_flow(id: StepId, responses: &ResponseMap) -> bool {
    calculate_progressive_steps(responses)
        .iter()
        .all(|step| step.id != id)
}
