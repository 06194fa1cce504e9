//! Native functions every host gets unless it overrides them by name.

use std::sync::OnceLock;

use gml_core::{repeat_string, ArgKind, ArgSpec, GmlError, GmlValue};
use gml_runtime::{Completion, FunctionDescriptor, FunctionRegistry, HostRequest};
use regex::Regex;
use tracing::info;

use crate::rng::RandomStream;

pub const DEFAULT_RANDOM_SEED: u32 = 1;

/// Builds the prelude registry. `choose` draws from a stream seeded with `seed`.
pub fn prelude(seed: u32) -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    let any = ArgSpec::of(ArgKind::Any);
    let real = ArgSpec::of(ArgKind::Real);

    functions.register(FunctionDescriptor::new("string", Some(vec![any]), |_, args| {
        Ok(GmlValue::Str(args[0].to_display_string()).into())
    }));
    functions.register(FunctionDescriptor::new("real", Some(vec![any]), |_, args| {
        let value = match &args[0] {
            GmlValue::Real(value) => *value,
            GmlValue::Str(text) => parse_leading_real(text),
        };
        Ok(GmlValue::Real(value).into())
    }));
    functions.register(FunctionDescriptor::new("abs", Some(vec![real]), |_, args| {
        Ok(GmlValue::Real(args[0].force_real().abs()).into())
    }));
    functions.register(FunctionDescriptor::new("floor", Some(vec![real]), |_, args| {
        Ok(GmlValue::Real(args[0].force_real().floor()).into())
    }));
    functions.register(FunctionDescriptor::new(
        "string_length",
        Some(vec![ArgSpec::of(ArgKind::String)]),
        |_, args| Ok(GmlValue::Real(args[0].force_string().chars().count() as f64).into()),
    ));
    functions.register(FunctionDescriptor::new(
        "string_repeat",
        Some(vec![ArgSpec::of(ArgKind::String), ArgSpec::of(ArgKind::Integer)]),
        |_, args| {
            let text = repeat_string(&args[0].force_string(), args[1].force_real())?;
            Ok(GmlValue::Str(text).into())
        },
    ));

    let stream = RandomStream::new(seed);
    functions.register(FunctionDescriptor::new(
        "choose",
        Some(vec![ArgSpec::rest(ArgKind::Any)]),
        move |_, mut args| {
            if args.is_empty() {
                return Ok(GmlValue::ZERO.into());
            }
            let bound = u32::try_from(args.len()).unwrap_or(u32::MAX);
            let pick = stream.next_bounded(bound) as usize;
            Ok(args.swap_remove(pick).into())
        },
    ));

    functions.register(FunctionDescriptor::new(
        "show_debug_message",
        Some(vec![any]),
        |_, args| {
            info!(target: "gml", "{}", args[0]);
            Ok(GmlValue::ZERO.into())
        },
    ));
    functions.register(FunctionDescriptor::new(
        "script_execute",
        Some(vec![ArgSpec::of(ArgKind::Integer), ArgSpec::rest(ArgKind::Any)]),
        |_, mut args| {
            let id = args.remove(0).force_real();
            if id < 0.0 {
                return Err(GmlError::resolution(
                    "GML_UNKNOWN_SCRIPT",
                    format!("Unknown script id {}.", id),
                ));
            }
            Ok(Completion::Pending(HostRequest::ExecuteScript {
                id: id as usize,
                args,
            }))
        },
    ));
    functions.register(FunctionDescriptor::new(
        "execute_string",
        Some(vec![ArgSpec::of(ArgKind::String), ArgSpec::rest(ArgKind::Any)]),
        |_, mut args| {
            let source = args.remove(0).force_string();
            Ok(Completion::Pending(HostRequest::ExecuteString { source, args }))
        },
    ));
    functions.register(FunctionDescriptor::new(
        "show_message",
        Some(vec![ArgSpec::of(ArgKind::AsString)]),
        |_, args| {
            Ok(Completion::Pending(HostRequest::ShowMessage(
                args[0].force_string(),
            )))
        },
    ));
    functions.register(FunctionDescriptor::new("sleep", Some(vec![real]), |_, args| {
        Ok(Completion::Pending(HostRequest::Sleep {
            millis: args[0].force_real(),
        }))
    }));
    functions
}

/// Reads the longest numeric prefix, ignoring leading whitespace; no prefix gives 0.
fn parse_leading_real(text: &str) -> f64 {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let regex = NUMBER.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
            .expect("number regex must compile")
    });
    regex
        .find(text.trim_start())
        .and_then(|found| found.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod prelude_tests {
    use super::*;

    #[test]
    fn parse_leading_real_reads_numeric_prefixes() {
        assert_eq!(parse_leading_real("12"), 12.0);
        assert_eq!(parse_leading_real("  -3.5abc"), -3.5);
        assert_eq!(parse_leading_real(".25"), 0.25);
        assert_eq!(parse_leading_real("1e3x"), 1000.0);
        assert_eq!(parse_leading_real("abc"), 0.0);
        assert_eq!(parse_leading_real(""), 0.0);
    }

    #[test]
    fn prelude_registers_every_native() {
        let functions = prelude(DEFAULT_RANDOM_SEED);
        for name in [
            "string",
            "real",
            "abs",
            "floor",
            "string_length",
            "string_repeat",
            "choose",
            "show_debug_message",
            "script_execute",
            "execute_string",
            "show_message",
            "sleep",
        ] {
            assert!(functions.contains(name), "missing native {}", name);
        }
        assert_eq!(functions.len(), 12);
    }
}
