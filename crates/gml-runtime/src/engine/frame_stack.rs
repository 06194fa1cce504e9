use gml_core::{GmlError, GmlValue};

use super::{Frame, Interpreter};
use crate::world::{EntityId, World};

impl<W: World> Interpreter<W> {
    pub(super) fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(super) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub(super) fn current_self(&self) -> EntityId {
        self.frames.last().map_or(0, |frame| frame.self_id)
    }

    pub(super) fn current_other(&self) -> EntityId {
        self.frames.last().map_or(0, |frame| frame.other_id)
    }

    pub(super) fn current_args(&self) -> &[GmlValue] {
        self.frames.last().map_or(&[][..], |frame| frame.args.as_slice())
    }

    pub(super) fn current_relative(&self) -> bool {
        self.frames.last().is_some_and(|frame| frame.relative)
    }

    /// Swaps the running frame's self/other, returning the previous pair.
    pub(super) fn rebind(&mut self, self_id: EntityId, other_id: EntityId) -> (EntityId, EntityId) {
        match self.frames.last_mut() {
            Some(frame) => {
                let previous = (frame.self_id, frame.other_id);
                frame.self_id = self_id;
                frame.other_id = other_id;
                previous
            }
            None => (0, 0),
        }
    }

    /// Anchors an error at `offset` in the running frame's source.
    pub(super) fn locate(&self, error: GmlError, offset: usize) -> GmlError {
        match self.frames.last() {
            Some(frame) => error.located(&frame.source, offset),
            None => error,
        }
    }
}
