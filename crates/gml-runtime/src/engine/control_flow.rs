use gml_core::{repeat_string, to_integer, GmlError, GmlValue};
use gml_parser::{AssignOp, Expr, Stmt, StmtKind, SwitchItem, VarRef};
use tracing::trace;

use super::scope::Targets;
use super::{Flow, Interpreter};
use crate::world::World;

impl<W: World> Interpreter<W> {
    pub(super) fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, GmlError> {
        for stmt in body {
            let flow = self.exec_stmt(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, GmlError> {
        match &stmt.kind {
            StmtKind::Block(body) => self.exec_block(body),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(condition)? {
                    self.exec_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::Repeat { count, body } => self.exec_repeat(count, body),
            StmtKind::While { condition, body } => {
                while self.eval_condition(condition)? {
                    match self.exec_stmt(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::DoUntil { body, condition } => {
                loop {
                    match self.exec_stmt(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                    if self.eval_condition(condition)? {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let flow = self.exec_stmt(init)?;
                if flow != Flow::Normal {
                    return Ok(flow);
                }
                while self.eval_condition(condition)? {
                    match self.exec_stmt(body)? {
                        Flow::Break => break,
                        Flow::Continue => continue,
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                    let flow = self.exec_stmt(step)?;
                    if flow != Flow::Normal {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::Switch { value, body } => self.exec_switch(value, body),
            StmtKind::With { target, body } => self.exec_with(target, body),
            StmtKind::Exit => Ok(Flow::Exit),
            StmtKind::Return(value) => Ok(Flow::Return(self.eval_expr(value)?)),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Call(call) => {
                self.eval_call(call)?;
                Ok(Flow::Normal)
            }
            StmtKind::VarDecl(names) => {
                self.declare_locals(names);
                Ok(Flow::Normal)
            }
            StmtKind::GlobalVarDecl(names) => {
                self.declare_globals(names);
                Ok(Flow::Normal)
            }
            StmtKind::Assign { target, op, value } => {
                self.exec_assign(target, *op, value)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_repeat(&mut self, count: &Expr, body: &Stmt) -> Result<Flow, GmlError> {
        let value = self.eval_expr(count)?;
        let message = format!("Repeat count must be a number (\"{}\")", value);
        let times = to_integer(self.expect_number(&value, &message, count.offset)?);
        let mut done = 0.0;
        while done < times {
            done += 1.0;
            match self.exec_stmt(body)? {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Labels are compared once each until one matches; from there on the
    /// remaining statements run in order and later labels are skipped.
    fn exec_switch(&mut self, value: &Expr, body: &[SwitchItem]) -> Result<Flow, GmlError> {
        let switch_value = self.eval_expr(value)?;
        let mut matched = false;
        for item in body {
            match item {
                SwitchItem::Case(label) => {
                    if matched {
                        continue;
                    }
                    let case_value = self.eval_expr(label)?;
                    matched = switch_value.same_type(&case_value) && switch_value == case_value;
                }
                SwitchItem::Default => matched = true,
                SwitchItem::Stmt(stmt) => {
                    if !matched {
                        continue;
                    }
                    match self.exec_stmt(stmt)? {
                        Flow::Normal => {}
                        Flow::Break | Flow::Continue => break,
                        flow => return Ok(flow),
                    }
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_with(&mut self, target: &Expr, body: &Stmt) -> Result<Flow, GmlError> {
        let value = self.eval_expr(target)?;
        let message = format!("Object id expected (\"{}\" is not a number)", value);
        let object = self.expect_number(&value, &message, target.offset)?;

        let entities = match self.object_targets(object) {
            Targets::Entities(entities) => entities,
            Targets::Global => {
                let error = GmlError::resolution(
                    "GML_BAD_OBJECT_REFERENCE",
                    "Cannot use global in with statement.",
                );
                return Err(self.locate(error, target.offset));
            }
            Targets::Noone | Targets::Invalid => return Ok(Flow::Normal),
        };

        let outer_self = self.current_self();
        for entity in entities {
            trace!(entity, "with target");
            let previous = self.rebind(entity, outer_self);
            let outcome = self.exec_stmt(body);
            self.rebind(previous.0, previous.1);
            match outcome? {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_assign(&mut self, target: &VarRef, op: AssignOp, value: &Expr) -> Result<(), GmlError> {
        let resolved = self.resolve_var(target)?;
        let value = self.eval_expr(value)?;
        if op == AssignOp::Set {
            return self.write_var(&resolved, value);
        }
        let old = self.read_var(&resolved)?;
        let combined = compound(op, old, value).map_err(|error| self.locate(error, resolved.offset))?;
        self.write_var(&resolved, combined)
    }
}

/// Mismatched operands leave the old value in place; only an oversized
/// string repetition fails.
fn compound(op: AssignOp, old: GmlValue, value: GmlValue) -> Result<GmlValue, GmlError> {
    let combined = match (op, old, value) {
        (AssignOp::Add, GmlValue::Real(a), GmlValue::Real(b)) => GmlValue::Real(a + b),
        (AssignOp::Add, GmlValue::Str(mut a), GmlValue::Str(b)) => {
            a.push_str(&b);
            GmlValue::Str(a)
        }
        (AssignOp::Subtract, GmlValue::Real(a), GmlValue::Real(b)) => GmlValue::Real(a - b),
        (AssignOp::Divide, GmlValue::Real(a), GmlValue::Real(b)) => GmlValue::Real(a / b),
        (AssignOp::Multiply, GmlValue::Real(a), GmlValue::Real(b)) => GmlValue::Real(a * b),
        (AssignOp::Multiply, GmlValue::Real(times), GmlValue::Str(text)) => {
            GmlValue::Str(repeat_string(&text, times)?)
        }
        (_, old, _) => old,
    };
    Ok(combined)
}
