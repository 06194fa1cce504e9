use std::mem;

use gml_core::{GmlError, GmlValue};
use tracing::debug;

use super::scope::ResolvedVar;
use super::Interpreter;
use crate::catalog::{BuiltinView, PostWrite, Storage};
use crate::store::{ArrayIndex, StoreMiss};
use crate::world::{World, WorldEvent};

impl<W: World> Interpreter<W> {
    pub(super) fn read_builtin(&self, name: &str, index: ArrayIndex) -> Result<GmlValue, StoreMiss> {
        let builtin = self.catalog.get(name).ok_or(StoreMiss::Undefined)?;
        let entities = self.world.entities();
        let slot = builtin
            .slot(index, entities.len())
            .ok_or(StoreMiss::OutOfBounds)?;
        match &builtin.storage {
            Storage::Stored { .. } => self
                .builtin_cells
                .get(name)
                .and_then(|cells| cells.get(slot))
                .cloned()
                .ok_or(StoreMiss::OutOfBounds),
            Storage::Computed { get, .. } => {
                let view = BuiltinView {
                    arguments: self.current_args(),
                    relative: self.current_relative(),
                    entities: &entities,
                };
                Ok(get(&view, slot))
            }
        }
    }

    pub(super) fn write_builtin(
        &mut self,
        var: &ResolvedVar<'_>,
        value: GmlValue,
    ) -> Result<(), GmlError> {
        let Some(builtin) = self.catalog.get(var.name).cloned() else {
            return Err(self.cannot_assign(var));
        };
        let setter = match &builtin.storage {
            Storage::Computed { set, .. } => set.clone(),
            Storage::Stored { .. } => None,
        };
        let writable = !builtin.read_only
            && (matches!(builtin.storage, Storage::Stored { .. }) || setter.is_some());
        if !writable {
            let error = GmlError::resolution(
                "GML_READ_ONLY",
                format!("Cannot assign to the variable ({} is read only)", var.name),
            );
            return Err(self.locate(error, var.offset));
        }

        let value = builtin.kind.coerce(&value);
        let entity_count = self.world.entities().len();
        let Some(slot) = builtin.slot(var.index, entity_count) else {
            return Err(self.out_of_bounds(var));
        };

        if let Some(set) = setter {
            let mut scratch = Vec::new();
            let arguments = match self.frames.last_mut() {
                Some(frame) => &mut frame.args,
                None => &mut scratch,
            };
            set(arguments, slot, value);
            return Ok(());
        }

        let cells = self
            .builtin_cells
            .entry(var.name.to_string())
            .or_insert_with(|| builtin.initial_cells());
        let Some(cell) = cells.get_mut(slot) else {
            return Err(self.out_of_bounds(var));
        };
        let previous = mem::replace(cell, value.clone());

        match builtin.post_write {
            Some(PostWrite::ClampMin(min)) if value.force_real() < min => {
                *cell = GmlValue::Real(min);
                Ok(())
            }
            Some(PostWrite::BroadcastOnDepletion(event))
                if previous.force_real() > 0.0 && value.force_real() <= 0.0 =>
            {
                self.broadcast(event)
                    .map_err(|error| self.locate(error, var.offset))
            }
            _ => Ok(()),
        }
    }

    /// Runs the event's code on every live entity, each as its own self and other.
    pub(super) fn broadcast(&mut self, event: WorldEvent) -> Result<(), GmlError> {
        let entities = self.world.entities();
        debug!(?event, targets = entities.len(), "broadcasting event");
        for id in entities {
            if !self.world.exists(id) {
                continue;
            }
            let Some(source) = self.world.event_source(id, event) else {
                continue;
            };
            let tree = self.compile_cached(&source)?;
            self.execute(&tree, id, id, Vec::new(), false)?;
        }
        Ok(())
    }

    /// Current value of a builtin variable's first cell, for hosts and tests.
    pub fn builtin_value(&self, name: &str) -> Option<GmlValue> {
        self.read_builtin(name, ArrayIndex::default()).ok()
    }
}
