pub mod parser;
pub mod runner;

pub use parser::{OnFail, ParseError, Sequence, Step, TimeExpr};
pub use runner::{Runner, RunnerError};
