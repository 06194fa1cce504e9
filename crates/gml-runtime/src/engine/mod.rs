use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gml_core::{GmlError, GmlValue};
use gml_parser::SyntaxTree;

use crate::catalog::{default_catalog, default_constants, BuiltinVar};
use crate::native::FunctionRegistry;
use crate::store::VarStore;
use crate::world::{EntityId, World};

mod builtin_vars;
mod control_flow;
mod dispatch;
mod eval;
mod frame_stack;
mod lifecycle;
mod scope;


pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Construction input for [`Interpreter`]. Extras are layered over the stock catalog.
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    pub functions: FunctionRegistry,
    pub constants: BTreeMap<String, GmlValue>,
    pub builtins: Vec<BuiltinVar>,
    /// `(name, source)` pairs; ids are assigned in order starting at 0.
    pub scripts: Vec<(String, String)>,
    pub max_call_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            functions: FunctionRegistry::new(),
            constants: BTreeMap::new(),
            builtins: Vec::new(),
            scripts: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Non-error exits threaded through statement execution.
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Exit,
    Return(GmlValue),
}

#[derive(Debug)]
struct Frame {
    self_id: EntityId,
    other_id: EntityId,
    args: Vec<GmlValue>,
    relative: bool,
    locals: VarStore,
    source: Arc<str>,
}

#[derive(Debug, Clone)]
struct ScriptEntry {
    name: String,
    tree: Arc<SyntaxTree>,
}

pub struct Interpreter<W: World> {
    world: W,
    functions: FunctionRegistry,
    constants: BTreeMap<String, GmlValue>,
    catalog: BTreeMap<String, BuiltinVar>,
    builtin_cells: BTreeMap<String, Vec<GmlValue>>,
    globals: VarStore,
    global_object: VarStore,
    scripts: Vec<ScriptEntry>,
    script_ids: BTreeMap<String, usize>,
    frames: Vec<Frame>,
    compiled: HashMap<String, Arc<SyntaxTree>>,
    max_call_depth: usize,
}

impl<W: World> Interpreter<W> {
    pub fn new(world: W, options: InterpreterOptions) -> Result<Self, GmlError> {
        let mut constants = default_constants();
        constants.extend(options.constants);

        let mut catalog = BTreeMap::new();
        for builtin in default_catalog().into_iter().chain(options.builtins) {
            catalog.insert(builtin.name.clone(), builtin);
        }
        let builtin_cells = catalog
            .values()
            .map(|builtin| (builtin.name.clone(), builtin.initial_cells()))
            .collect();

        let mut interpreter = Self {
            world,
            functions: options.functions,
            constants,
            catalog,
            builtin_cells,
            globals: VarStore::new(),
            global_object: VarStore::new(),
            scripts: Vec::new(),
            script_ids: BTreeMap::new(),
            frames: Vec::new(),
            compiled: HashMap::new(),
            max_call_depth: options.max_call_depth.max(1),
        };
        for (name, source) in &options.scripts {
            interpreter.register_script(name, source)?;
        }
        Ok(interpreter)
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    pub fn globals(&self) -> &VarStore {
        &self.globals
    }

    pub fn global_object(&self) -> &VarStore {
        &self.global_object
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn add_constant(&mut self, name: &str, value: GmlValue) {
        self.constants.insert(name.to_string(), value);
    }
}
