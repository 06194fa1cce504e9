use gml_core::{format_real, to_integer, GmlError, GmlValue};
use gml_parser::VarRef;
use tracing::trace;

use super::Interpreter;
use crate::store::{ArrayIndex, StoreMiss, MAX_ARRAY_INDEX};
use crate::world::{ClassId, EntityId, World, CLASS_ID_LIMIT};

/// A variable reference whose qualifier and indexes have been evaluated.
pub(super) struct ResolvedVar<'n> {
    pub(super) name: &'n str,
    pub(super) object: Option<f64>,
    pub(super) index: ArrayIndex,
    pub(super) offset: usize,
}

/// What an object qualifier denotes.
pub(super) enum Targets {
    Entities(Vec<EntityId>),
    Global,
    Noone,
    Invalid,
}

impl<W: World> Interpreter<W> {
    pub(super) fn resolve_var<'n>(&mut self, var: &'n VarRef) -> Result<ResolvedVar<'n>, GmlError> {
        let object = match &var.object {
            Some(expr) => {
                let value = self.eval_expr(expr)?;
                let Some(object) = value.as_real() else {
                    let error = GmlError::resolution(
                        "GML_BAD_OBJECT_REFERENCE",
                        format!(
                            "Wrong type of variable index ({} is not a number to be an object)",
                            value
                        ),
                    );
                    return Err(self.locate(error, expr.offset));
                };
                Some(object)
            }
            None => None,
        };

        let mut indexes = Vec::with_capacity(var.indexes.len());
        for index in &var.indexes {
            let value = self.eval_expr(index)?;
            indexes.push(self.validate_index(&value, index.offset)?);
        }

        Ok(ResolvedVar {
            name: &var.name,
            object,
            index: ArrayIndex::from_indexes(&indexes),
            offset: var.offset,
        })
    }

    fn validate_index(&self, value: &GmlValue, offset: usize) -> Result<usize, GmlError> {
        let Some(index) = value.as_real() else {
            let error = GmlError::resolution("GML_BAD_ARRAY_INDEX", "Wrong type of array index");
            return Err(self.locate(error, offset));
        };
        if !index.is_finite() {
            let error = GmlError::resolution("GML_BAD_ARRAY_INDEX", "Array index is not a finite number");
            return Err(self.locate(error, offset));
        }
        if index < 0.0 {
            let error = GmlError::resolution("GML_BAD_ARRAY_INDEX", "Negative array index");
            return Err(self.locate(error, offset));
        }
        let index = to_integer(index);
        if index >= MAX_ARRAY_INDEX as f64 {
            let error = GmlError::resolution(
                "GML_BAD_ARRAY_INDEX",
                format!("Array index {} is out of range (limit {})", format_real(index), MAX_ARRAY_INDEX),
            );
            return Err(self.locate(error, offset));
        }
        Ok(index as usize)
    }

    pub(super) fn read_var(&self, var: &ResolvedVar<'_>) -> Result<GmlValue, GmlError> {
        match var.object {
            None => self.read_unqualified(var),
            Some(object) => self.read_qualified(object, var),
        }
    }

    fn read_unqualified(&self, var: &ResolvedVar<'_>) -> Result<GmlValue, GmlError> {
        if let Some(value) = self.constants.get(var.name) {
            return Ok(value.clone());
        }
        if let Some(frame) = self.frames.last() {
            if frame.locals.exists(var.name) {
                return self.lookup(frame.locals.get(var.name, var.index), var);
            }
        }
        if self.catalog.contains_key(var.name) {
            return self.lookup(self.read_builtin(var.name, var.index), var);
        }
        if self.globals.exists(var.name) {
            return self.lookup(self.globals.get(var.name, var.index), var);
        }
        if let Some(vars) = self.world.vars(self.current_self()) {
            if vars.exists(var.name) {
                return self.lookup(vars.get(var.name, var.index), var);
            }
        }
        Err(self.unknown_variable(var))
    }

    fn read_qualified(&self, object: f64, var: &ResolvedVar<'_>) -> Result<GmlValue, GmlError> {
        match self.object_targets(object) {
            Targets::Global => {
                if self.globals.exists(var.name) {
                    return self.lookup(self.globals.get(var.name, var.index), var);
                }
                if self.global_object.exists(var.name) {
                    return self.lookup(self.global_object.get(var.name, var.index), var);
                }
            }
            Targets::Entities(ids) => {
                let first = ids.first().and_then(|id| self.world.vars(*id));
                if let Some(vars) = first.filter(|vars| vars.exists(var.name)) {
                    return self.lookup(vars.get(var.name, var.index), var);
                }
            }
            Targets::Noone | Targets::Invalid => {}
        }
        Err(self.unknown_variable(var))
    }

    fn lookup(
        &self,
        result: Result<GmlValue, StoreMiss>,
        var: &ResolvedVar<'_>,
    ) -> Result<GmlValue, GmlError> {
        result.map_err(|miss| match miss {
            StoreMiss::Undefined => self.unknown_variable(var),
            StoreMiss::OutOfBounds => self.out_of_bounds(var),
        })
    }

    pub(super) fn write_var(
        &mut self,
        var: &ResolvedVar<'_>,
        value: GmlValue,
    ) -> Result<(), GmlError> {
        match var.object {
            None => self.write_unqualified(var, value),
            Some(object) => self.write_qualified(object, var, value),
        }
    }

    fn write_unqualified(&mut self, var: &ResolvedVar<'_>, value: GmlValue) -> Result<(), GmlError> {
        if self.constants.contains_key(var.name) {
            let error = GmlError::resolution(
                "GML_CONSTANT_ASSIGNMENT",
                "Variable name expected. (it's a constant)",
            );
            return Err(self.locate(error, var.offset));
        }
        if let Some(frame) = self.frames.last_mut() {
            if frame.locals.exists(var.name) {
                frame.locals.set(var.name, var.index, value);
                return Ok(());
            }
        }
        if self.catalog.contains_key(var.name) {
            return self.write_builtin(var, value);
        }
        if self.globals.exists(var.name) {
            self.globals.set(var.name, var.index, value);
            return Ok(());
        }
        let self_id = self.current_self();
        match self.world.vars_mut(self_id) {
            Some(vars) => {
                vars.set(var.name, var.index, value);
                Ok(())
            }
            None => Err(self.cannot_assign(var)),
        }
    }

    fn write_qualified(
        &mut self,
        object: f64,
        var: &ResolvedVar<'_>,
        value: GmlValue,
    ) -> Result<(), GmlError> {
        match self.object_targets(object) {
            Targets::Global => {
                if self.globals.exists(var.name) {
                    self.globals.set(var.name, var.index, value);
                } else {
                    self.global_object.set(var.name, var.index, value);
                }
                Ok(())
            }
            Targets::Entities(ids) => {
                for id in ids {
                    if let Some(vars) = self.world.vars_mut(id) {
                        vars.set(var.name, var.index, value.clone());
                    }
                }
                Ok(())
            }
            Targets::Noone => {
                trace!(name = var.name, "discarded write through noone");
                Ok(())
            }
            Targets::Invalid => Err(self.cannot_assign(var)),
        }
    }

    pub(super) fn declare_locals(&mut self, names: &[String]) {
        if let Some(frame) = self.frames.last_mut() {
            for name in names {
                if !frame.locals.exists(name) {
                    frame.locals.declare(name);
                }
            }
        }
    }

    /// Declared globals adopt a same-named `global.` value, else start at 0.
    pub(super) fn declare_globals(&mut self, names: &[String]) {
        for name in names {
            if self.globals.adopt(name, &self.global_object) {
                continue;
            }
            if !self.globals.exists(name) {
                self.globals.set_scalar(name, GmlValue::ZERO);
            }
        }
    }

    pub(super) fn object_targets(&self, object: f64) -> Targets {
        if (0.0..=CLASS_ID_LIMIT).contains(&object) {
            let is_whole = object.fract() == 0.0;
            let ids = self
                .world
                .entities()
                .into_iter()
                .filter(|id| {
                    self.world.class_of(*id).is_some_and(|class| {
                        f64::from(class) == object
                            || (is_whole && self.world.is_ancestor(object as ClassId, class))
                    })
                })
                .collect();
            return Targets::Entities(ids);
        }
        if object > CLASS_ID_LIMIT {
            let ids = self
                .world
                .entities()
                .into_iter()
                .filter(|id| *id as f64 == object)
                .take(1)
                .collect();
            return Targets::Entities(ids);
        }

        let live = |id: EntityId| {
            if self.world.exists(id) {
                vec![id]
            } else {
                Vec::new()
            }
        };
        if object == -1.0 || object == -7.0 {
            Targets::Entities(live(self.current_self()))
        } else if object == -2.0 {
            Targets::Entities(live(self.current_other()))
        } else if object == -3.0 {
            Targets::Entities(self.world.entities())
        } else if object == -4.0 {
            Targets::Noone
        } else if object == -5.0 {
            Targets::Global
        } else {
            Targets::Invalid
        }
    }

    fn unknown_variable(&self, var: &ResolvedVar<'_>) -> GmlError {
        let error = GmlError::resolution(
            "GML_UNKNOWN_VARIABLE",
            format!("Unknown variable {}", var.name),
        );
        self.locate(error, var.offset)
    }

    pub(super) fn out_of_bounds(&self, var: &ResolvedVar<'_>) -> GmlError {
        let error = GmlError::resolution(
            "GML_INDEX_OUT_OF_BOUNDS",
            format!("Unknown variable {} or array index out of bounds", var.name),
        );
        self.locate(error, var.offset)
    }

    pub(super) fn cannot_assign(&self, var: &ResolvedVar<'_>) -> GmlError {
        let error = GmlError::resolution(
            "GML_CANNOT_ASSIGN",
            format!("Cannot assign to the variable {}", var.name),
        );
        self.locate(error, var.offset)
    }
}
