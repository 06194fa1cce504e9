//! Tree-walking interpreter for GML scripts.
//!
//! An [`Interpreter`] owns the global scopes, the builtin variable catalog, the
//! function registry and the registered scripts. Entities and host interaction
//! live behind the [`World`] trait.

pub mod catalog;
mod engine;
pub mod native;
pub mod store;
pub mod world;

pub use catalog::{
    default_catalog, default_constants, BuiltinVar, BuiltinView, Length, PostWrite, Storage,
    MAX_ARGUMENTS,
};
pub use engine::{Interpreter, InterpreterOptions, DEFAULT_MAX_CALL_DEPTH};
pub use native::{
    coerce_args, Completion, FunctionDescriptor, FunctionRegistry, NativeCall, NativeFn,
};
pub use store::{ArrayIndex, StoreMiss, VarStore, MAX_ARRAY_INDEX};
pub use world::{
    ClassFixture, ClassId, EntityFixture, EntityId, HostRequest, SimpleWorld, World,
    WorldEvent, WorldFixture, CLASS_ID_LIMIT, FIRST_ENTITY_ID,
};
