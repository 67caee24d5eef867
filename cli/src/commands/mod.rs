pub mod assess;
pub mod navigate;
pub mod snapshot;
pub mod steps;
pub mod validate;
