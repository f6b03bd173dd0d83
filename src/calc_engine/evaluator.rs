use std::fmt;

use tracing::{debug, trace};

use super::stack::Stack;
use super::token::{Operator, Token};
use super::trace::EvaluationTrace;
use super::variables::VariableStore;

/// Entry on the operator stack: a deferred operator or the `(` boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Op(Operator),
    LeftParen,
}

/// What to do when an expression reads a name that has no binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnboundPolicy {
    /// Bind the name to `0.0` and read that.
    #[default]
    AutoDeclare,
    /// Fail the evaluation with [`EvaluationError::UnboundVariable`].
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    /// Target name when the line had the form `name = expr`.
    pub assigned: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    EmptyExpression,
    /// A value was needed but the value stack was empty.
    StackUnderflow,
    MissingOperand { position: usize },
    UnmatchedLeftParen,
    UnmatchedRightParen,
    /// A pending operator other than `+`/`-` met a sum resolution.
    UnexpectedOperator { operator: Operator },
    UnexpectedAssign { position: usize },
    InvalidAssignmentTarget,
    ExtraOperand,
    UnboundVariable { name: String },
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyExpression => write!(f, "Empty expression"),
            Self::StackUnderflow => write!(f, "Missing operand: expression is incomplete"),
            Self::MissingOperand { position } => {
                write!(f, "Expected a number or variable at token {}", position + 1)
            }
            Self::UnmatchedLeftParen => write!(f, "Missing closing parenthesis"),
            Self::UnmatchedRightParen => write!(f, "Closing parenthesis without matching '('"),
            Self::UnexpectedOperator { operator } => {
                write!(f, "Operator '{operator}' has no right operand")
            }
            Self::UnexpectedAssign { position } => {
                write!(f, "Unexpected '=' at token {}", position + 1)
            }
            Self::InvalidAssignmentTarget => {
                write!(f, "Only a variable name can appear left of '='")
            }
            Self::ExtraOperand => write!(f, "Two operands without an operator between them"),
            Self::UnboundVariable { name } => write!(f, "Unknown variable '{name}'"),
        }
    }
}

impl std::error::Error for EvaluationError {}

/// `true` when `current` should be applied now rather than deferred behind
/// `pending`. Parentheses never reach this check: the scan handles them first.
fn has_precedence(pending: Pending, current: Operator) -> bool {
    match pending {
        Pending::Op(Operator::Pow) => false,
        Pending::Op(op) if op.is_multiplicative() && current.is_additive() => false,
        _ => true,
    }
}

/// Two-stack evaluator. The stacks are cleared at the start of every
/// evaluation, so one instance can be reused for many lines.
pub struct Evaluator {
    values: Stack<f64>,
    operators: Stack<Pending>,
    policy: UnboundPolicy,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_policy(UnboundPolicy::default())
    }

    pub fn with_policy(policy: UnboundPolicy) -> Self {
        Evaluator {
            values: Stack::new(),
            operators: Stack::new(),
            policy,
        }
    }

    pub fn policy(&self) -> UnboundPolicy {
        self.policy
    }

    pub fn evaluate(
        &mut self,
        tokens: &[Token],
        store: &mut VariableStore,
    ) -> Result<Evaluation, EvaluationError> {
        let mut trace = EvaluationTrace::new(false);
        self.evaluate_traced(tokens, store, &mut trace)
    }

    pub fn evaluate_traced(
        &mut self,
        tokens: &[Token],
        store: &mut VariableStore,
        trace: &mut EvaluationTrace,
    ) -> Result<Evaluation, EvaluationError> {
        self.values.clear();
        self.operators.clear();

        if tokens.is_empty() {
            return Err(EvaluationError::EmptyExpression);
        }

        let (target, start) = match tokens {
            [first, Token::Assign, _, ..] => match first {
                Token::Identifier(name) => (Some(name.as_str()), 2),
                _ => return Err(EvaluationError::InvalidAssignmentTarget),
            },
            _ => (None, 0),
        };
        debug!(tokens = tokens.len(), assignment = target.is_some(), "evaluating expression");

        self.scan(tokens, start, store, trace)?;
        let value = self.resolve_remaining(trace)?;

        if let Some(name) = target {
            store.assign(name, value);
            trace.add_step(format!("{name} = {value}"), value);
        }

        Ok(Evaluation {
            value,
            assigned: target.map(str::to_string),
        })
    }

    fn scan(
        &mut self,
        tokens: &[Token],
        start: usize,
        store: &mut VariableStore,
        trace: &mut EvaluationTrace,
    ) -> Result<(), EvaluationError> {
        let mut i = start;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Number(n) => {
                    self.values.push(*n);
                    i += 1;
                }
                Token::Identifier(name) => {
                    let value = self.read_variable(name, store)?;
                    self.values.push(value);
                    i += 1;
                }
                Token::LeftParen => {
                    self.operators.push(Pending::LeftParen);
                    i += 1;
                }
                Token::RightParen => {
                    self.collapse_parenthesis(trace)?;
                    self.absorb_multiplicative(trace)?;
                    i += 1;
                }
                Token::Assign => return Err(EvaluationError::UnexpectedAssign { position: i }),
                Token::Operator(Operator::Pow) => {
                    self.operators.push(Pending::Op(Operator::Pow));
                    i = self.resolve_exponents(tokens, i, store, trace)?;
                    self.absorb_multiplicative(trace)?;
                }
                Token::Operator(op) => {
                    let op = *op;
                    let top = self
                        .operators
                        .peek()
                        .copied()
                        .unwrap_or(Pending::Op(Operator::Add));

                    if has_precedence(top, op) && op.is_multiplicative() {
                        let next = tokens.get(i + 1);
                        let right_needs_resolution = matches!(next, Some(Token::LeftParen))
                            || matches!(tokens.get(i + 2), Some(Token::Operator(Operator::Pow)));

                        if right_needs_resolution {
                            self.operators.push(Pending::Op(op));
                            i += 1;
                        } else {
                            let operand = match next {
                                Some(token) if token.is_operand() => {
                                    self.resolve_operand(token, store)?
                                }
                                _ => return Err(EvaluationError::MissingOperand { position: i + 1 }),
                            };
                            self.calculate(op, operand, trace)?;
                            i += 2;
                        }
                    } else {
                        self.operators.push(Pending::Op(op));
                        i += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn read_variable(&self, name: &str, store: &mut VariableStore) -> Result<f64, EvaluationError> {
        match store.lookup(name) {
            Some(value) => Ok(value),
            None => match self.policy {
                UnboundPolicy::AutoDeclare => {
                    store.declare_if_absent(name);
                    Ok(0.0)
                }
                UnboundPolicy::Reject => Err(EvaluationError::UnboundVariable {
                    name: name.to_string(),
                }),
            },
        }
    }

    /// Numeric value of a number or identifier token.
    fn resolve_operand(&self, token: &Token, store: &mut VariableStore) -> Result<f64, EvaluationError> {
        match token {
            Token::Number(n) => Ok(*n),
            Token::Identifier(name) => self.read_variable(name, store),
            _ => Err(EvaluationError::StackUnderflow),
        }
    }

    fn pop_value(&mut self) -> Result<f64, EvaluationError> {
        self.values.pop().ok_or(EvaluationError::StackUnderflow)
    }

    /// Pops the left operand, applies `op` against `operand`, pushes the result.
    fn calculate(
        &mut self,
        op: Operator,
        operand: f64,
        trace: &mut EvaluationTrace,
    ) -> Result<(), EvaluationError> {
        let left = self.pop_value()?;
        let result = op.apply(left, operand);
        trace!(%op, left, operand, result, "calculate");
        trace.add_step(format!("{left} {op} {operand}"), result);
        self.values.push(result);
        Ok(())
    }

    /// After a `)` or an exponent chain, a `*`, `/` or `%` left waiting on the
    /// operator stack takes the freshly produced value as its right operand.
    fn absorb_multiplicative(&mut self, trace: &mut EvaluationTrace) -> Result<(), EvaluationError> {
        if let Some(&Pending::Op(op)) = self.operators.peek() {
            if op.is_multiplicative() {
                self.operators.pop();
                let operand = self.pop_value()?;
                self.calculate(op, operand, trace)?;
            }
        }
        Ok(())
    }

    /// Collects `operand ^ operand ^ ...` following the `^` at `index` and
    /// folds it right to left. Returns the index of the first token not
    /// consumed.
    fn resolve_exponents(
        &mut self,
        tokens: &[Token],
        index: usize,
        store: &mut VariableStore,
        trace: &mut EvaluationTrace,
    ) -> Result<usize, EvaluationError> {
        let mut offset = 1;
        while index + offset < tokens.len() {
            let token = &tokens[index + offset];
            if offset % 2 == 1 {
                if !token.is_operand() {
                    return Err(EvaluationError::MissingOperand {
                        position: index + offset,
                    });
                }
                let value = self.resolve_operand(token, store)?;
                self.values.push(value);
            } else if *token == Token::Operator(Operator::Pow) {
                self.operators.push(Pending::Op(Operator::Pow));
            } else {
                break;
            }
            offset += 1;
        }

        while let Some(Pending::Op(Operator::Pow)) = self.operators.peek() {
            let exponent = self.pop_value()?;
            let base = self.pop_value()?;
            self.operators.pop();
            let result = base.powf(exponent);
            trace!(base, exponent, result, "power");
            trace.add_step(format!("{base} ^ {exponent}"), result);
            self.values.push(result);
        }

        Ok(index + offset)
    }

    fn collapse_parenthesis(&mut self, trace: &mut EvaluationTrace) -> Result<(), EvaluationError> {
        let total = self.sum_deferred(true, trace)?;
        self.values.push(total);
        Ok(())
    }

    /// Sums the deferred `+`/`-` terms left after the scan; the total is the
    /// expression's value.
    fn resolve_remaining(&mut self, trace: &mut EvaluationTrace) -> Result<f64, EvaluationError> {
        let total = self.sum_deferred(false, trace)?;
        if !self.values.is_empty() {
            return Err(EvaluationError::ExtraOperand);
        }
        Ok(total)
    }

    /// Pops value/operator pairs, negating values paired with `-`. Stops after
    /// popping `(` when `until_paren`, otherwise once the operator stack is
    /// empty, adding the one value that remains.
    fn sum_deferred(
        &mut self,
        until_paren: bool,
        trace: &mut EvaluationTrace,
    ) -> Result<f64, EvaluationError> {
        let mut total = 0.0;
        let mut terms = Vec::new();

        loop {
            if !until_paren && self.operators.is_empty() {
                let value = self.pop_value()?;
                total += value;
                terms.push(value.to_string());
                break;
            }

            let value = self.pop_value()?;
            match self.operators.pop() {
                None => return Err(EvaluationError::UnmatchedRightParen),
                Some(Pending::LeftParen) if until_paren => {
                    total += value;
                    terms.push(value.to_string());
                    break;
                }
                Some(Pending::LeftParen) => return Err(EvaluationError::UnmatchedLeftParen),
                Some(Pending::Op(Operator::Add)) => {
                    total += value;
                    terms.push(format!("+ {value}"));
                }
                Some(Pending::Op(Operator::Sub)) => {
                    total -= value;
                    terms.push(format!("- {value}"));
                }
                Some(Pending::Op(operator)) => {
                    return Err(EvaluationError::UnexpectedOperator { operator })
                }
            }
        }

        if trace.detailed_mode {
            terms.reverse();
            let sum = terms.join(" ");
            if until_paren {
                trace.add_step(format!("({sum})"), total);
            } else if terms.len() > 1 {
                trace.add_step(sum, total);
            }
        }

        Ok(total)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc_engine::token::tokenize;
    use std::f64::consts::PI;

    fn eval_in(store: &mut VariableStore, line: &str) -> Result<Evaluation, EvaluationError> {
        let tokens = tokenize(line).unwrap();
        Evaluator::new().evaluate(&tokens, store)
    }

    fn eval(line: &str) -> f64 {
        eval_in(&mut VariableStore::new(), line).unwrap().value
    }

    fn eval_err(line: &str) -> EvaluationError {
        eval_in(&mut VariableStore::new(), line).unwrap_err()
    }

    #[test]
    fn standard_precedence_without_parentheses() {
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("2 * 3 + 4 * 5"), 26.0);
        assert_eq!(eval("2 - 3 * 4"), -10.0);
        assert_eq!(eval("2 * 3 - 4"), 2.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("8 / 2 / 2"), 2.0);
        assert_eq!(eval("6 / 2 * 3"), 9.0);
        assert_eq!(eval("1 + 2 - 3 + 4"), 4.0);
    }

    #[test]
    fn exponent_is_right_associative() {
        assert_eq!(eval("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval("2 ^ 2 ^ 3"), 256.0);
        assert_eq!(eval("2 ^ 3 + 1"), 9.0);
        assert_eq!(eval("2 ^ 3 * 2"), 16.0);
    }

    #[test]
    fn product_waits_for_exponent_on_its_right() {
        assert_eq!(eval("2 * 3 ^ 2"), 18.0);
        assert_eq!(eval("2 * 3 ^ 2 ^ 2"), 162.0);
        assert_eq!(eval("1 + 2 * 3 ^ 2"), 19.0);
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("2 * (3 + 4)"), 14.0);
        assert_eq!(eval("1 - (2 - 3)"), 2.0);
        assert_eq!(eval("((1 + 2) * (3 + 4))"), 21.0);
        assert_eq!(eval("(2 * (3 + 1))"), 8.0);
    }

    #[test]
    fn parenthesized_base_absorbs_pending_product_before_exponent() {
        // `*` is applied as soon as `)` exposes it, so the square covers 2 * 3.
        assert_eq!(eval("2 * (3) ^ 2"), 36.0);
    }

    #[test]
    fn modulus_and_ieee_results() {
        assert_eq!(eval("7 % 3"), 1.0);
        assert_eq!(eval("7.5 % 2"), 1.5);
        assert_eq!(eval("1 / 0"), f64::INFINITY);
        assert!(eval("0 % 0").is_nan());
    }

    #[test]
    fn constants_resolve() {
        assert_eq!(eval("pi"), PI);
        assert_eq!(eval("2 * pi"), 2.0 * PI);
    }

    #[test]
    fn assignment_binds_and_returns_value() {
        let mut store = VariableStore::new();
        let result = eval_in(&mut store, "x = 2 + 3").unwrap();
        assert_eq!(result.value, 5.0);
        assert_eq!(result.assigned.as_deref(), Some("x"));
        assert_eq!(eval_in(&mut store, "x + 1").unwrap().value, 6.0);
        assert_eq!(eval_in(&mut store, "2 * x").unwrap().value, 10.0);
    }

    #[test]
    fn assignment_can_read_its_own_target() {
        let mut store = VariableStore::new();
        eval_in(&mut store, "n = n + 1").unwrap();
        eval_in(&mut store, "n = n + 1").unwrap();
        assert_eq!(store.lookup("n"), Some(2.0));
    }

    #[test]
    fn constant_assignment_is_ignored() {
        let mut store = VariableStore::new();
        let result = eval_in(&mut store, "pi = 3").unwrap();
        assert_eq!(result.value, 3.0);
        assert_eq!(eval_in(&mut store, "pi").unwrap().value, PI);
    }

    #[test]
    fn unbound_read_auto_declares_zero() {
        let mut store = VariableStore::new();
        assert_eq!(eval_in(&mut store, "y + 1").unwrap().value, 1.0);
        assert_eq!(store.lookup("y"), Some(0.0));
        assert_eq!(eval_in(&mut store, "y * 5").unwrap().value, 0.0);
    }

    #[test]
    fn reject_policy_leaves_store_untouched() {
        let mut store = VariableStore::new();
        let tokens = tokenize("y + 1").unwrap();
        let err = Evaluator::with_policy(UnboundPolicy::Reject)
            .evaluate(&tokens, &mut store)
            .unwrap_err();
        assert_eq!(err, EvaluationError::UnboundVariable { name: "y".to_string() });
        assert_eq!(store.get("y"), None);
    }

    #[test]
    fn malformed_expressions_fail() {
        assert_eq!(eval_err("* 3"), EvaluationError::StackUnderflow);
        assert_eq!(eval_err("(2 + 3"), EvaluationError::UnmatchedLeftParen);
        assert_eq!(eval_err("2 + 3)"), EvaluationError::UnmatchedRightParen);
        assert_eq!(eval_err("2 +"), EvaluationError::StackUnderflow);
        assert_eq!(eval_err("2 *"), EvaluationError::MissingOperand { position: 2 });
        assert_eq!(eval_err("2 ^"), EvaluationError::StackUnderflow);
        assert_eq!(eval_err("2 ^ (1)"), EvaluationError::MissingOperand { position: 2 });
        assert_eq!(eval_err("2 3"), EvaluationError::ExtraOperand);
        assert_eq!(eval_err("-3"), EvaluationError::StackUnderflow);
        assert_eq!(eval_err("3 = 4"), EvaluationError::InvalidAssignmentTarget);
        assert_eq!(eval_err("x ="), EvaluationError::UnexpectedAssign { position: 1 });
        assert_eq!(eval_err("1 + x = 2"), EvaluationError::UnexpectedAssign { position: 3 });
        assert_eq!(eval_err(""), EvaluationError::EmptyExpression);
    }

    #[test]
    fn stacks_do_not_leak_between_evaluations() {
        let mut evaluator = Evaluator::new();
        let mut store = VariableStore::new();
        let broken = tokenize("(1 + 2 * (3").unwrap();
        assert!(evaluator.evaluate(&broken, &mut store).is_err());
        let ok = tokenize("4 + 4").unwrap();
        assert_eq!(evaluator.evaluate(&ok, &mut store).unwrap().value, 8.0);
    }

    #[test]
    fn trace_records_each_step() {
        let mut store = VariableStore::new();
        let tokens = tokenize("x = 2 + 3 * 4").unwrap();
        let mut trace = EvaluationTrace::new(true);
        Evaluator::new()
            .evaluate_traced(&tokens, &mut store, &mut trace)
            .unwrap();
        let steps: Vec<(&str, f64)> = trace
            .steps
            .iter()
            .map(|s| (s.operation.as_str(), s.result))
            .collect();
        assert_eq!(steps, [("3 * 4", 12.0), ("2 + 12", 14.0), ("x = 14", 14.0)]);
    }

    #[test]
    fn disabled_trace_stays_empty() {
        let mut store = VariableStore::new();
        let tokens = tokenize("(1 + 2) ^ 2").unwrap();
        let mut trace = EvaluationTrace::new(false);
        let result = Evaluator::new()
            .evaluate_traced(&tokens, &mut store, &mut trace)
            .unwrap();
        assert_eq!(result.value, 9.0);
        assert!(trace.steps.is_empty());
    }
}
