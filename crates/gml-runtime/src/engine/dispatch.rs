use gml_core::{GmlError, GmlValue};
use gml_parser::Call;
use tracing::debug;

use super::Interpreter;
use crate::native::{coerce_args, Completion, NativeCall};
use crate::world::{EntityId, HostRequest, World};

impl<W: World> Interpreter<W> {
    pub(super) fn eval_call(&mut self, call: &Call) -> Result<GmlValue, GmlError> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }
        self.call_function(&call.name, args)
            .map_err(|error| self.locate(error, call.offset))
    }

    /// User scripts shadow natives of the same name.
    pub fn call_function(&mut self, name: &str, args: Vec<GmlValue>) -> Result<GmlValue, GmlError> {
        let self_id = self.current_self();
        let other_id = self.current_other();
        if let Some(id) = self.script_id(name) {
            return self.run_script(id, self_id, other_id, args);
        }
        self.dispatch_builtin(name, self_id, other_id, args, false)
    }

    pub fn dispatch_builtin(
        &mut self,
        name: &str,
        self_id: EntityId,
        other_id: EntityId,
        args: Vec<GmlValue>,
        relative: bool,
    ) -> Result<GmlValue, GmlError> {
        let Some(descriptor) = self.functions.get(name).cloned() else {
            return Err(GmlError::host(
                "GML_UNKNOWN_FUNCTION",
                format!("Unknown function or script: {}", name),
            ));
        };

        let args = coerce_args(descriptor.args.as_deref(), args)?;
        debug!(function = name, argc = args.len(), "dispatching builtin");

        let completion = {
            let mut call = NativeCall {
                self_id,
                other_id,
                relative,
                world: &mut self.world,
            };
            (descriptor.func)(&mut call, args)?
        };

        match completion {
            Completion::Ready(value) => Ok(value),
            Completion::Pending(request) => self.serve_request(request, self_id, other_id),
        }
    }

    /// Nested execution is served here; everything else goes to the world.
    fn serve_request(
        &mut self,
        request: HostRequest,
        self_id: EntityId,
        other_id: EntityId,
    ) -> Result<GmlValue, GmlError> {
        debug!(request = request.name(), "serving pending request");
        match request {
            HostRequest::ExecuteScript { id, args } => self.run_script(id, self_id, other_id, args),
            HostRequest::ExecuteString { source, args } => {
                self.execute_string(&source, self_id, other_id, args)
            }
            other => self.world.resolve_request(other),
        }
    }
}
