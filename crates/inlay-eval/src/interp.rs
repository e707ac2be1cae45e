//! Tree-walking evaluator with JavaScript-flavored operator semantics.

use crate::error::EvalFault;
use crate::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::scope::ScopeBindings;
use crate::value::Value;

/// Evaluate a parsed expression against scope bindings.
///
/// Every call runs in a fresh context; nothing persists between calls.
pub fn eval_expr(expr: &Expr, bindings: &ScopeBindings<'_>) -> Result<Value, EvalFault> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Boolean(b) => Ok(Value::Boolean(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Ident(name) => bindings
            .resolve(name)
            .ok_or_else(|| EvalFault::Reference(name.clone())),
        Expr::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_expr(item, bindings)?);
            }
            Ok(Value::Array(values))
        }
        Expr::Object(entries) => {
            let mut map = std::collections::BTreeMap::new();
            for (key, value_expr) in entries {
                map.insert(key.clone(), eval_expr(value_expr, bindings)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Member { object, property } => {
            let object = eval_expr(object, bindings)?;
            member_access(&object, property)
        }
        Expr::Index { object, index } => {
            let object = eval_expr(object, bindings)?;
            let index = eval_expr(index, bindings)?;
            index_access(&object, &index)
        }
        Expr::Unary { op, operand } => {
            let operand = eval_expr(operand, bindings)?;
            apply_unary(*op, &operand)
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, bindings)?;
            let rhs = eval_expr(rhs, bindings)?;
            apply_binary(*op, &lhs, &rhs)
        }
        Expr::Logical { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, bindings)?;
            match op {
                LogicalOp::And if !lhs.is_truthy() => Ok(lhs),
                LogicalOp::Or if lhs.is_truthy() => Ok(lhs),
                _ => eval_expr(rhs, bindings),
            }
        }
        Expr::Conditional {
            condition,
            consequent,
            alternate,
        } => {
            if eval_expr(condition, bindings)?.is_truthy() {
                eval_expr(consequent, bindings)
            } else {
                eval_expr(alternate, bindings)
            }
        }
    }
}

fn member_access(object: &Value, property: &str) -> Result<Value, EvalFault> {
    if object.is_nullish() {
        return Err(EvalFault::Type(format!(
            "cannot read properties of {} (reading '{}')",
            object.to_display_string(),
            property
        )));
    }

    Ok(match object {
        Value::Object(map) => map.get(property).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) if property == "length" => Value::Number(items.len() as f64),
        Value::String(s) if property == "length" => Value::Number(s.chars().count() as f64),
        _ => Value::Undefined,
    })
}

fn index_access(object: &Value, index: &Value) -> Result<Value, EvalFault> {
    if object.is_nullish() {
        return Err(EvalFault::Type(format!(
            "cannot read properties of {}",
            object.to_display_string()
        )));
    }

    match (object, index) {
        (Value::Array(items), Value::Number(n)) => {
            if n.fract() == 0.0 && *n >= 0.0 && (*n as usize) < items.len() {
                Ok(items[*n as usize].clone())
            } else {
                Ok(Value::Undefined)
            }
        }
        (Value::String(s), Value::Number(n)) => {
            if n.fract() == 0.0 && *n >= 0.0 {
                Ok(s.chars()
                    .nth(*n as usize)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Undefined))
            } else {
                Ok(Value::Undefined)
            }
        }
        (Value::Object(map), Value::String(key)) => {
            Ok(map.get(key).cloned().unwrap_or(Value::Undefined))
        }
        (Value::Object(_), _) | (Value::Array(_), _) => Ok(Value::Undefined),
        _ => Err(EvalFault::Type(format!(
            "cannot index a {}",
            object.kind()
        ))),
    }
}

fn apply_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalFault> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(EvalFault::Type(format!("cannot negate a {}", other.kind()))),
        },
        UnaryOp::Pos => match operand {
            Value::Number(n) => Ok(Value::Number(*n)),
            other => Err(EvalFault::Type(format!(
                "cannot coerce a {} to a number",
                other.kind()
            ))),
        },
    }
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalFault> {
    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
                "{}{}",
                lhs.to_display_string(),
                rhs.to_display_string()
            ))),
            _ => Err(type_fault("+", lhs, rhs)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (a, b) = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => (*a, *b),
                _ => return Err(type_fault(op_symbol(op), lhs, rhs)),
            };
            Ok(Value::Number(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => unreachable!(),
            }))
        }
        BinaryOp::Eq => Ok(Value::Boolean(strict_eq(lhs, rhs))),
        BinaryOp::NotEq => Ok(Value::Boolean(!strict_eq(lhs, rhs))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
                _ => return Err(type_fault(op_symbol(op), lhs, rhs)),
            };
            let Some(ordering) = ordering else {
                // NaN comparisons are always false
                return Ok(Value::Boolean(false));
            };
            Ok(Value::Boolean(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::LtEq => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                BinaryOp::GtEq => ordering.is_ge(),
                _ => unreachable!(),
            }))
        }
    }
}

fn strict_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        // NaN is not equal to itself
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => lhs == rhs,
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
    }
}

fn type_fault(op: &str, lhs: &Value, rhs: &Value) -> EvalFault {
    EvalFault::Type(format!(
        "'{}' is not supported between {} and {}",
        op,
        lhs.kind(),
        rhs.kind()
    ))
}
