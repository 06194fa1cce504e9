use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use gml_core::{ArgSpec, GmlError, GmlValue};

use crate::world::{EntityId, HostRequest, World};

/// Outcome of a native function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Ready(GmlValue),
    /// The interpreter resumes the call with the value the request produces.
    Pending(HostRequest),
}

impl From<GmlValue> for Completion {
    fn from(value: GmlValue) -> Self {
        Self::Ready(value)
    }
}

pub struct NativeCall<'a> {
    pub self_id: EntityId,
    pub other_id: EntityId,
    pub relative: bool,
    pub world: &'a mut dyn World,
}

pub type NativeFn =
    Arc<dyn Fn(&mut NativeCall<'_>, Vec<GmlValue>) -> Result<Completion, GmlError> + Send + Sync>;

#[derive(Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    /// `None` passes the raw argument list through.
    pub args: Option<Vec<ArgSpec>>,
    pub func: NativeFn,
}

impl FunctionDescriptor {
    pub fn new(
        name: &str,
        args: Option<Vec<ArgSpec>>,
        func: impl Fn(&mut NativeCall<'_>, Vec<GmlValue>) -> Result<Completion, GmlError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            args,
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

/// Name to descriptor table consulted by the dispatch contract.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, FunctionDescriptor>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: FunctionDescriptor) {
        self.functions.insert(descriptor.name.clone(), descriptor);
    }

    pub fn extend(&mut self, other: FunctionRegistry) {
        self.functions.extend(other.functions);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Applies argument specs left to right; a variadic spec takes every remaining argument.
pub fn coerce_args(
    specs: Option<&[ArgSpec]>,
    args: Vec<GmlValue>,
) -> Result<Vec<GmlValue>, GmlError> {
    let Some(specs) = specs else {
        return Ok(args);
    };

    let mut coerced = Vec::with_capacity(args.len());
    let mut remaining = args.iter();
    for spec in specs {
        loop {
            let Some(arg) = remaining.next() else {
                if spec.variadic {
                    break;
                }
                return Err(GmlError::arity(
                    "Wrong number of arguments to function or script. (too few arguments)",
                ));
            };
            coerced.push(spec.kind.coerce(arg));
            if !spec.variadic {
                break;
            }
        }
    }

    if remaining.next().is_some() {
        return Err(GmlError::arity(
            "Wrong number of arguments to function or script. (too many arguments)",
        ));
    }
    Ok(coerced)
}

#[cfg(test)]
mod native_tests {
    use super::*;
    use gml_core::{ArgKind, ErrorKind};

    #[test]
    fn raw_specs_pass_arguments_through() {
        let args = vec![GmlValue::from("1"), GmlValue::from(2)];
        assert_eq!(coerce_args(None, args.clone()).expect("raw"), args);
    }

    #[test]
    fn specs_coerce_each_argument() {
        let specs = [
            ArgSpec::of(ArgKind::Real),
            ArgSpec::of(ArgKind::Integer),
            ArgSpec::of(ArgKind::AsString),
            ArgSpec::of(ArgKind::Boolean),
        ];
        let coerced = coerce_args(
            Some(&specs[..]),
            vec![
                GmlValue::from("x"),
                GmlValue::Real(-2.7),
                GmlValue::Real(2.5),
                GmlValue::Real(0.5),
            ],
        )
        .expect("coerce should pass");
        assert_eq!(
            coerced,
            vec![
                GmlValue::ZERO,
                GmlValue::Real(-2.0),
                GmlValue::from("2.50"),
                GmlValue::Real(1.0),
            ]
        );
    }

    #[test]
    fn variadic_spec_takes_the_rest() {
        let specs = [ArgSpec::of(ArgKind::String), ArgSpec::rest(ArgKind::Real)];
        let coerced = coerce_args(
            Some(&specs[..]),
            vec![GmlValue::from("a"), GmlValue::from(1), GmlValue::from("b")],
        )
        .expect("variadic should pass");
        assert_eq!(coerced.len(), 3);
        assert_eq!(coerced[2], GmlValue::ZERO);

        let only_required =
            coerce_args(Some(&specs[..]), vec![GmlValue::from("a")]).expect("rest may be empty");
        assert_eq!(only_required, vec![GmlValue::from("a")]);
    }

    #[test]
    fn too_few_and_too_many_arguments_are_fatal() {
        let specs = [ArgSpec::of(ArgKind::Any), ArgSpec::of(ArgKind::Any)];
        let error = coerce_args(Some(&specs[..]), vec![GmlValue::ZERO]).expect_err("too few");
        assert_eq!(error.kind, ErrorKind::Arity);
        assert!(error.fatal);
        assert!(error.message.contains("too few"));

        let error = coerce_args(Some(&specs[..]), vec![GmlValue::ZERO; 3]).expect_err("too many");
        assert!(error.fatal);
        assert!(error.message.contains("too many"));

        let error = coerce_args(Some(&[][..]), vec![GmlValue::ZERO]).expect_err("empty spec");
        assert_eq!(error.code, "GML_WRONG_ARGUMENT_COUNT");
    }
}
