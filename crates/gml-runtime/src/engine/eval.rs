use std::cmp::Ordering;

use gml_core::{is_true, to_int32, GmlError, GmlValue};
use gml_parser::{BinaryOp, Expr, ExprKind, UnaryOp};

use super::Interpreter;
use crate::world::World;

impl<W: World> Interpreter<W> {
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<GmlValue, GmlError> {
        match &expr.kind {
            ExprKind::Number(value) => Ok(GmlValue::Real(*value)),
            ExprKind::Str(text) => Ok(GmlValue::Str(text.clone())),
            ExprKind::Var(var) => {
                let resolved = self.resolve_var(var)?;
                self.read_var(&resolved)
            }
            ExprKind::Call(call) => self.eval_call(call),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                let a = self.expect_number(
                    &value,
                    "Wrong type of arguments to unary operator.",
                    operand.offset,
                )?;
                Ok(match op {
                    UnaryOp::Not => GmlValue::from_bool(!is_true(a)),
                    UnaryOp::Negate => GmlValue::Real(-a),
                    UnaryOp::BitNot => GmlValue::Real(f64::from(!to_int32(a))),
                })
            }
            ExprKind::Binary {
                op,
                op_offset,
                lhs,
                rhs,
            } => self.eval_binary(*op, *op_offset, lhs, rhs),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        op_offset: usize,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<GmlValue, GmlError> {
        match op {
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                let message = format!("Wrong type of arguments for {}.", op.symbol());
                let a = self.eval_number(lhs, &message)?;
                let b = self.eval_number(rhs, &message)?;
                let (a, b) = (is_true(a), is_true(b));
                let result = match op {
                    BinaryOp::And => a && b,
                    BinaryOp::Or => a || b,
                    _ => a != b,
                };
                Ok(GmlValue::from_bool(result))
            }
            BinaryOp::Less
            | BinaryOp::LessEq
            | BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEq => {
                let b = self.eval_expr(rhs)?;
                let a = self.eval_expr(lhs)?;
                if !a.same_type(&b) {
                    let error = GmlError::type_mismatch("Cannot compare arguments.");
                    return Err(self.locate(error, op_offset));
                }
                Ok(GmlValue::from_bool(compare(op, &a, &b)))
            }
            BinaryOp::Add => {
                let a = self.eval_expr(lhs)?;
                let b = self.eval_expr(rhs)?;
                match (a, b) {
                    (GmlValue::Real(a), GmlValue::Real(b)) => Ok(GmlValue::Real(a + b)),
                    (GmlValue::Str(mut a), GmlValue::Str(b)) => {
                        a.push_str(&b);
                        Ok(GmlValue::Str(a))
                    }
                    _ => {
                        let error = GmlError::type_mismatch("Wrong type of arguments to +.");
                        Err(self.locate(error, op_offset))
                    }
                }
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
                let message = format!("Wrong type of arguments for {}.", op.symbol());
                let a = to_int32(self.eval_number(lhs, &message)?);
                let b = to_int32(self.eval_number(rhs, &message)?);
                let shift = (b as u32) & 31;
                let result = match op {
                    BinaryOp::BitAnd => a & b,
                    BinaryOp::BitOr => a | b,
                    BinaryOp::BitXor => a ^ b,
                    BinaryOp::Shl => a.wrapping_shl(shift),
                    _ => a >> shift,
                };
                Ok(GmlValue::Real(f64::from(result)))
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::IntDiv | BinaryOp::Mod => {
                let message = format!("Wrong type of arguments to {}.", op.symbol());
                let a = self.eval_number(lhs, &message)?;
                let b = self.eval_number(rhs, &message)?;
                let result = match op {
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::IntDiv => (a / b).floor(),
                    _ => a % b,
                };
                Ok(GmlValue::Real(result))
            }
        }
    }

    fn eval_number(&mut self, expr: &Expr, message: &str) -> Result<f64, GmlError> {
        let value = self.eval_expr(expr)?;
        self.expect_number(&value, message, expr.offset)
    }

    pub(super) fn expect_number(
        &self,
        value: &GmlValue,
        message: &str,
        offset: usize,
    ) -> Result<f64, GmlError> {
        value
            .as_real()
            .ok_or_else(|| self.locate(GmlError::type_mismatch(message), offset))
    }

    /// Condition check shared by `if`, `while`, `do`/`until` and `for`.
    pub(super) fn eval_condition(&mut self, expr: &Expr) -> Result<bool, GmlError> {
        match self.eval_expr(expr)? {
            GmlValue::Real(value) => Ok(is_true(value)),
            value => {
                let error = GmlError::type_mismatch(format!(
                    "Expression expected (condition \"{}\" is not a number)",
                    value
                ));
                Err(self.locate(error, expr.offset))
            }
        }
    }
}

fn compare(op: BinaryOp, a: &GmlValue, b: &GmlValue) -> bool {
    let ordering = match (a, b) {
        (GmlValue::Real(a), GmlValue::Real(b)) => a.partial_cmp(b),
        (GmlValue::Str(a), GmlValue::Str(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match op {
        BinaryOp::Equal => a == b,
        BinaryOp::NotEqual => a != b,
        BinaryOp::Less => ordering == Some(Ordering::Less),
        BinaryOp::LessEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Greater => ordering == Some(Ordering::Greater),
        BinaryOp::GreaterEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => false,
    }
}
