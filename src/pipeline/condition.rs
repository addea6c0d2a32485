use std::fmt;
use std::sync::LazyLock;
use regex::Regex;
use crate::errors::FlowError;
use super::state::PipelineState;

/// `field op number`. Nothing else is accepted.
static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|==|>|<)\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*$")
        .expect("static condition pattern")
});

/// Split a condition string into `(field, operator, value)` without
/// interpreting it.
pub fn parse_condition(condition: &str) -> Result<(String, String, String), FlowError> {
    let caps = CONDITION_RE.captures(condition).ok_or_else(|| {
        FlowError::Compile(format!(
            "Invalid condition '{}': expected `field op number` with op one of >, <, >=, <=, ==",
            condition
        ))
    })?;
    Ok((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl Comparator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            "==" => Some(Self::Eq),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Eq => "==",
        }
    }

    pub fn compare(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }
}

/// A validated edge condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Comparator,
    pub threshold: f64,
}

impl Condition {
    pub fn parse(condition: &str) -> Result<Self, FlowError> {
        let (field, op, value) = parse_condition(condition)?;
        let op = Comparator::from_symbol(&op)
            .ok_or_else(|| FlowError::Compile(format!("Unsupported operator '{}'", op)))?;
        let threshold = value
            .parse::<f64>()
            .map_err(|e| FlowError::Compile(format!("Invalid threshold '{}': {}", value, e)))?;
        Ok(Self { field, op, threshold })
    }

    /// Resolve the field on the state, then on the latest result, else 0.
    pub fn resolve(&self, state: &PipelineState) -> f64 {
        state
            .numeric_field(&self.field)
            .or_else(|| {
                state
                    .agent_results
                    .last()
                    .and_then(|r| r.numeric_field(&self.field))
            })
            .unwrap_or(0.0)
    }

    pub fn evaluate(&self, state: &PipelineState) -> bool {
        self.op.compare(self.resolve(state), self.threshold)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op.symbol(), self.threshold)
    }
}
