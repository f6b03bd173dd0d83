pub mod evaluator;
pub mod stack;
pub mod token;
pub mod trace;
pub mod variables;

use std::fmt;

pub use evaluator::{Evaluation, EvaluationError, Evaluator, UnboundPolicy};
pub use token::{tokenize, MalformedInputError, Operator, Token};
pub use trace::{EvaluationTrace, Step};
pub use variables::{Variable, VariableStore};

/// Failure of a single line: either it would not tokenize or it would not
/// evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    Malformed(MalformedInputError),
    Evaluation(EvaluationError),
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcError::Malformed(e) => write!(f, "{e}"),
            CalcError::Evaluation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CalcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalcError::Malformed(e) => Some(e),
            CalcError::Evaluation(e) => Some(e),
        }
    }
}

impl From<MalformedInputError> for CalcError {
    fn from(e: MalformedInputError) -> Self {
        CalcError::Malformed(e)
    }
}

impl From<EvaluationError> for CalcError {
    fn from(e: EvaluationError) -> Self {
        CalcError::Evaluation(e)
    }
}

/// A variable store plus the evaluator that reads and writes it. One per
/// session; variables live as long as the calculator does.
pub struct Calculator {
    store: VariableStore,
    evaluator: Evaluator,
}

impl Calculator {
    pub fn new() -> Self {
        Self::with_policy(UnboundPolicy::default())
    }

    pub fn with_policy(policy: UnboundPolicy) -> Self {
        Calculator {
            store: VariableStore::new(),
            evaluator: Evaluator::with_policy(policy),
        }
    }

    pub fn calculate(&mut self, line: &str) -> Result<Evaluation, CalcError> {
        let mut trace = EvaluationTrace::new(false);
        self.calculate_traced(line, &mut trace)
    }

    pub fn calculate_traced(
        &mut self,
        line: &str,
        trace: &mut EvaluationTrace,
    ) -> Result<Evaluation, CalcError> {
        let tokens = tokenize(line)?;
        let evaluation = self
            .evaluator
            .evaluate_traced(&tokens, &mut self.store, trace)?;
        Ok(evaluation)
    }

    pub fn variables(&self) -> &VariableStore {
        &self.store
    }

    pub fn policy(&self) -> UnboundPolicy {
        self.evaluator.policy()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_errors_surface_as_malformed() {
        let mut calc = Calculator::new();
        assert!(matches!(
            calc.calculate("2 # 2"),
            Err(CalcError::Malformed(MalformedInputError::UnexpectedCharacter { character: '#', .. }))
        ));
    }

    #[test]
    fn evaluation_errors_surface_as_evaluation() {
        let mut calc = Calculator::new();
        assert!(matches!(calc.calculate("(2 + 3"), Err(CalcError::Evaluation(_))));
    }

    #[test]
    fn variables_persist_across_lines() {
        let mut calc = Calculator::new();
        calc.calculate("r = 2").unwrap();
        let area = calc.calculate("pi * r ^ 2").unwrap();
        assert!((area.value - std::f64::consts::PI * 4.0).abs() < 1e-12);
        assert_eq!(calc.variables().lookup("r"), Some(2.0));
    }
}
