//! Built-in `condition` dialect.
//!
//! Constraint text is a JSON document pattern-matching one fact type:
//!
//! ```json
//! {
//!   "fact_type": "Person",
//!   "match": "all",
//!   "conditions": [
//!     {"field": "name", "op": "eq", "value": {"var": "name"}}
//!   ]
//! }
//! ```
//!
//! A condition's right-hand side is either a literal or `{"var": ...}`,
//! which dereferences the owning instance's variable scope at evaluation
//! time. The same text therefore discriminates between instances that
//! carry different variable values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RuleError;
use crate::facts::Fact;
use crate::value::DataValue;

use super::compiler::{BindingContext, CompiledConstraint, ConstraintCompiler};

#[derive(Deserialize, Serialize, Debug, Clone)]
struct ConditionSet {
    fact_type: String,
    #[serde(default, rename = "match")]
    combine: Combine,
    #[serde(default)]
    conditions: Vec<FieldCondition>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Combine {
    #[default]
    All,
    Any,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
struct FieldCondition {
    field: String,
    op: ComparisonOp,
    #[serde(default)]
    value: Operand,
}

/// Right-hand side of a condition: a literal, or a reference into the
/// owning instance's variable scope.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
enum Operand {
    Variable { var: String },
    Literal(Value),
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Literal(Value::Null)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    In,
    Empty,
    NotEmpty,
}

/// Compiler for the `condition` dialect.
pub struct ConditionCompiler;

impl ConstraintCompiler for ConditionCompiler {
    fn dialect(&self) -> &str {
        "condition"
    }

    fn compile(&self, text: &str) -> Result<Box<dyn CompiledConstraint>, RuleError> {
        let set: ConditionSet =
            serde_json::from_str(text).map_err(|e| RuleError::Compile(e.to_string()))?;
        let referenced = set
            .conditions
            .iter()
            .filter_map(|c| match &c.value {
                Operand::Variable { var } => Some(var.clone()),
                Operand::Literal(_) => None,
            })
            .collect();
        Ok(Box::new(CompiledCondition { set, referenced }))
    }
}

struct CompiledCondition {
    set: ConditionSet,
    referenced: Vec<String>,
}

impl CompiledConstraint for CompiledCondition {
    fn fact_type(&self) -> &str {
        &self.set.fact_type
    }

    fn referenced_variables(&self) -> Vec<String> {
        self.referenced.clone()
    }

    fn matches(&self, fact: &Fact, ctx: &BindingContext<'_>) -> Result<bool, RuleError> {
        if fact.type_name() != self.set.fact_type {
            return Ok(false);
        }
        match self.set.combine {
            Combine::All => {
                for cond in &self.set.conditions {
                    if !evaluate_condition(cond, fact, ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Combine::Any => {
                for cond in &self.set.conditions {
                    if evaluate_condition(cond, fact, ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn evaluate_condition(
    cond: &FieldCondition,
    fact: &Fact,
    ctx: &BindingContext<'_>,
) -> Result<bool, RuleError> {
    let none = DataValue::None;
    let actual = fact.field(&cond.field).unwrap_or(&none);
    let expected = match &cond.value {
        Operand::Literal(v) => DataValue::from_value(v),
        Operand::Variable { var } => ctx.variable(var)?.clone(),
    };

    let result = match cond.op {
        ComparisonOp::Eq => *actual == expected,
        ComparisonOp::Ne => *actual != expected,
        ComparisonOp::Gt => numeric(actual, &expected, |a, b| a > b),
        ComparisonOp::Lt => numeric(actual, &expected, |a, b| a < b),
        ComparisonOp::Ge => numeric(actual, &expected, |a, b| a >= b),
        ComparisonOp::Le => numeric(actual, &expected, |a, b| a <= b),
        ComparisonOp::Contains => eval_contains(actual, &expected),
        ComparisonOp::StartsWith => actual
            .to_display_string()
            .starts_with(&expected.to_display_string()),
        ComparisonOp::EndsWith => actual
            .to_display_string()
            .ends_with(&expected.to_display_string()),
        ComparisonOp::In => eval_in(actual, &expected),
        ComparisonOp::Empty => actual.is_empty(),
        ComparisonOp::NotEmpty => !actual.is_empty(),
    };
    Ok(result)
}

fn numeric(actual: &DataValue, expected: &DataValue, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn eval_contains(actual: &DataValue, expected: &DataValue) -> bool {
    match actual {
        DataValue::String(s) => s.contains(&expected.to_display_string()),
        DataValue::Array(items) => items.iter().any(|item| item == expected),
        _ => false,
    }
}

fn eval_in(actual: &DataValue, expected: &DataValue) -> bool {
    match expected {
        DataValue::Array(items) => items.iter().any(|item| item == actual),
        _ => false,
    }
}
