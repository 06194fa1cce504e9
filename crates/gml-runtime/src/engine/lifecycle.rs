use std::sync::Arc;

use gml_core::{GmlError, GmlValue};
use gml_parser::{compile, Root, SyntaxTree};
use tracing::{debug, warn};

use super::{Flow, Frame, Interpreter, ScriptEntry};
use crate::store::VarStore;
use crate::world::{EntityId, World};

impl<W: World> Interpreter<W> {
    /// Compiles and registers a script. Re-registering a name replaces its body and keeps its id.
    pub fn register_script(&mut self, name: &str, source: &str) -> Result<usize, GmlError> {
        let tree = Arc::new(compile(source)?);
        if let Some(id) = self.script_ids.get(name).copied() {
            self.scripts[id].tree = tree;
            return Ok(id);
        }
        let id = self.scripts.len();
        self.scripts.push(ScriptEntry {
            name: name.to_string(),
            tree,
        });
        self.script_ids.insert(name.to_string(), id);
        debug!(script = name, id, "registered script");
        Ok(id)
    }

    pub fn script_id(&self, name: &str) -> Option<usize> {
        self.script_ids.get(name).copied()
    }

    pub fn script_name(&self, id: usize) -> Option<&str> {
        self.scripts.get(id).map(|entry| entry.name.as_str())
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// Runs a tree in a fresh frame. The caller's frame is untouched on every exit path.
    pub fn execute(
        &mut self,
        tree: &SyntaxTree,
        self_id: EntityId,
        other_id: EntityId,
        args: Vec<GmlValue>,
        relative: bool,
    ) -> Result<GmlValue, GmlError> {
        if self.frames.len() >= self.max_call_depth {
            return Err(GmlError::host(
                "GML_CALL_DEPTH",
                format!("Call depth exceeded {} frames.", self.max_call_depth),
            )
            .into_fatal());
        }

        self.push_frame(Frame {
            self_id,
            other_id,
            args,
            relative,
            locals: VarStore::new(),
            source: Arc::clone(&tree.source),
        });
        debug!(depth = self.frames.len(), self_id, other_id, "entering frame");

        let outcome = match &tree.root {
            Root::Code(body) => match self.exec_block(body) {
                Ok(flow) => Ok(self.finish_frame(flow)),
                Err(error) => Err(error),
            },
            Root::Expression(expr) => self.eval_expr(expr),
        };

        self.pop_frame();
        debug!(depth = self.frames.len(), ok = outcome.is_ok(), "left frame");
        outcome
    }

    pub fn execute_string(
        &mut self,
        source: &str,
        self_id: EntityId,
        other_id: EntityId,
        args: Vec<GmlValue>,
    ) -> Result<GmlValue, GmlError> {
        let tree = compile(source)?;
        self.execute(&tree, self_id, other_id, args, false)
    }

    /// Runs a registered script by id in a fresh frame.
    pub fn run_script(
        &mut self,
        id: usize,
        self_id: EntityId,
        other_id: EntityId,
        args: Vec<GmlValue>,
    ) -> Result<GmlValue, GmlError> {
        let Some(entry) = self.scripts.get(id).cloned() else {
            return Err(GmlError::resolution(
                "GML_UNKNOWN_SCRIPT",
                format!("Unknown script id {}.", id),
            ));
        };
        debug!(script = %entry.name, id, "calling script");
        self.execute(&entry.tree, self_id, other_id, args, false)
    }

    /// Compiles host-provided code once per distinct source text.
    pub(super) fn compile_cached(&mut self, source: &str) -> Result<Arc<SyntaxTree>, GmlError> {
        if let Some(tree) = self.compiled.get(source) {
            return Ok(Arc::clone(tree));
        }
        let tree = Arc::new(compile(source)?);
        self.compiled.insert(source.to_string(), Arc::clone(&tree));
        Ok(tree)
    }

    fn finish_frame(&self, flow: Flow) -> GmlValue {
        match flow {
            Flow::Normal | Flow::Exit => GmlValue::ZERO,
            Flow::Return(value) => value,
            Flow::Break | Flow::Continue => {
                warn!(signal = ?flow, "loop control reached the frame boundary");
                GmlValue::ZERO
            }
        }
    }
}
