//! Engine-defined variables and language constants.
//!
//! Builtin variables are plain data: a descriptor says whether the value is
//! stored by the interpreter or computed from frame/world state, how many index
//! dimensions it has, how writes are coerced and what happens after a write.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use gml_core::{ArgKind, GmlValue};

use crate::store::ArrayIndex;
use crate::world::{EntityId, WorldEvent};

pub const MAX_ARGUMENTS: usize = 16;

/// Frame and world state visible to computed getters.
pub struct BuiltinView<'a> {
    pub arguments: &'a [GmlValue],
    pub relative: bool,
    pub entities: &'a [EntityId],
}

pub type Getter = Arc<dyn Fn(&BuiltinView<'_>, usize) -> GmlValue + Send + Sync>;
pub type Setter = Arc<dyn Fn(&mut Vec<GmlValue>, usize, GmlValue) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Fixed(usize),
    EntityCount,
}

#[derive(Clone)]
pub enum Storage {
    Stored {
        default: GmlValue,
        rows: usize,
        length: usize,
    },
    Computed {
        get: Getter,
        set: Option<Setter>,
        length: Length,
    },
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored {
                default,
                rows,
                length,
            } => f
                .debug_struct("Stored")
                .field("default", default)
                .field("rows", rows)
                .field("length", length)
                .finish(),
            Self::Computed { set, length, .. } => f
                .debug_struct("Computed")
                .field("writable", &set.is_some())
                .field("length", length)
                .finish(),
        }
    }
}

/// Side effect applied after a successful write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostWrite {
    ClampMin(f64),
    /// Raised when the value drops from above zero to zero or below.
    BroadcastOnDepletion(WorldEvent),
}

#[derive(Debug, Clone)]
pub struct BuiltinVar {
    pub name: String,
    pub read_only: bool,
    pub dimensions: u8,
    pub kind: ArgKind,
    pub storage: Storage,
    pub post_write: Option<PostWrite>,
}

impl BuiltinVar {
    pub fn stored(name: &str, kind: ArgKind, default: impl Into<GmlValue>) -> Self {
        Self {
            name: name.to_string(),
            read_only: false,
            dimensions: 0,
            kind,
            storage: Storage::Stored {
                default: default.into(),
                rows: 1,
                length: 1,
            },
            post_write: None,
        }
    }

    pub fn computed(
        name: &str,
        get: impl Fn(&BuiltinView<'_>, usize) -> GmlValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            read_only: true,
            dimensions: 0,
            kind: ArgKind::Any,
            storage: Storage::Computed {
                get: Arc::new(get),
                set: None,
                length: Length::Fixed(1),
            },
            post_write: None,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_setter(
        mut self,
        set: impl Fn(&mut Vec<GmlValue>, usize, GmlValue) + Send + Sync + 'static,
    ) -> Self {
        if let Storage::Computed { set: slot, .. } = &mut self.storage {
            *slot = Some(Arc::new(set));
            self.read_only = false;
        }
        self
    }

    /// Makes the variable a 1-D array of `length` cells.
    pub fn array(mut self, length: Length) -> Self {
        self.dimensions = 1;
        match &mut self.storage {
            Storage::Stored { length: slot, .. } => {
                if let Length::Fixed(count) = length {
                    *slot = count;
                }
            }
            Storage::Computed { length: slot, .. } => *slot = length,
        }
        self
    }

    /// Makes a stored variable a `rows` x `length` grid.
    pub fn grid(mut self, rows: usize, length: usize) -> Self {
        if let Storage::Stored {
            rows: row_slot,
            length: length_slot,
            ..
        } = &mut self.storage
        {
            self.dimensions = 2;
            *row_slot = rows;
            *length_slot = length;
        }
        self
    }

    pub fn after_write(mut self, hook: PostWrite) -> Self {
        self.post_write = Some(hook);
        self
    }

    /// Flat cell number for `index`, or `None` when it is out of bounds.
    pub fn slot(&self, index: ArrayIndex, entity_count: usize) -> Option<usize> {
        let (rows, length) = match &self.storage {
            Storage::Stored { rows, length, .. } => (*rows, *length),
            Storage::Computed { length, .. } => match length {
                Length::Fixed(count) => (1, *count),
                Length::EntityCount => (1, entity_count),
            },
        };
        (index.row < rows && index.col < length).then_some(index.row * length + index.col)
    }

    pub fn initial_cells(&self) -> Vec<GmlValue> {
        match &self.storage {
            Storage::Stored {
                default,
                rows,
                length,
            } => vec![default.clone(); rows * length],
            Storage::Computed { .. } => Vec::new(),
        }
    }
}

fn argument_at(arguments: &[GmlValue], index: usize) -> GmlValue {
    arguments.get(index).cloned().unwrap_or_default()
}

fn write_argument(arguments: &mut Vec<GmlValue>, index: usize, value: GmlValue) {
    if arguments.len() <= index {
        arguments.resize(index + 1, GmlValue::ZERO);
    }
    arguments[index] = value;
}

pub fn default_catalog() -> Vec<BuiltinVar> {
    let mut catalog = vec![
        BuiltinVar::computed("argument", |view, index| argument_at(view.arguments, index))
            .with_setter(write_argument)
            .array(Length::Fixed(MAX_ARGUMENTS)),
        BuiltinVar::computed("argument_relative", |view, _| {
            GmlValue::from_bool(view.relative)
        }),
        BuiltinVar::computed("argument_count", |view, _| {
            GmlValue::Real(view.arguments.len() as f64)
        }),
        BuiltinVar::computed("instance_count", |view, _| {
            GmlValue::Real(view.entities.len() as f64)
        }),
        BuiltinVar::computed("instance_id", |view, index| {
            view.entities
                .get(index)
                .map_or(GmlValue::ZERO, |id| GmlValue::Real(*id as f64))
        })
        .array(Length::EntityCount),
        BuiltinVar::stored("score", ArgKind::Integer, 0),
        BuiltinVar::stored("lives", ArgKind::Integer, -1)
            .after_write(PostWrite::BroadcastOnDepletion(WorldEvent::NoMoreLives)),
        BuiltinVar::stored("health", ArgKind::Real, 100)
            .after_write(PostWrite::BroadcastOnDepletion(WorldEvent::NoMoreHealth)),
        BuiltinVar::stored("show_score", ArgKind::Boolean, 1),
        BuiltinVar::stored("show_lives", ArgKind::Boolean, 0),
        BuiltinVar::stored("show_health", ArgKind::Boolean, 0),
        BuiltinVar::stored("caption_score", ArgKind::String, "Score: "),
        BuiltinVar::stored("caption_lives", ArgKind::String, "Lives: "),
        BuiltinVar::stored("caption_health", ArgKind::String, "Health: "),
        BuiltinVar::stored("transition_kind", ArgKind::Integer, 0),
        BuiltinVar::stored("transition_steps", ArgKind::Integer, 80)
            .after_write(PostWrite::ClampMin(1.0)),
        BuiltinVar::stored("error_occurred", ArgKind::Boolean, 0),
        BuiltinVar::stored("error_last", ArgKind::String, ""),
        BuiltinVar::stored("debug_mode", ArgKind::Any, 0).read_only(),
        BuiltinVar::stored("gamemaker_version", ArgKind::Any, 800).read_only(),
    ];
    for index in 0..MAX_ARGUMENTS {
        catalog.push(
            BuiltinVar::computed(&format!("argument{}", index), move |view, _| {
                argument_at(view.arguments, index)
            })
            .with_setter(move |arguments, _, value| write_argument(arguments, index, value)),
        );
    }
    catalog
}

pub fn default_constants() -> BTreeMap<String, GmlValue> {
    [
        ("true", 1.0),
        ("false", 0.0),
        ("pi", PI),
        ("self", -1.0),
        ("other", -2.0),
        ("all", -3.0),
        ("noone", -4.0),
        ("global", -5.0),
        ("local", -7.0),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), GmlValue::Real(value)))
    .collect()
}

#[cfg(test)]
mod catalog_tests {
    use super::*;

    fn find(name: &str) -> BuiltinVar {
        default_catalog()
            .into_iter()
            .find(|var| var.name == name)
            .expect("builtin should exist")
    }

    #[test]
    fn argument_array_is_bounded_and_writable() {
        let argument = find("argument");
        assert!(!argument.read_only);
        assert_eq!(argument.dimensions, 1);
        assert_eq!(argument.slot(ArrayIndex::from_indexes(&[15]), 0), Some(15));
        assert_eq!(argument.slot(ArrayIndex::from_indexes(&[16]), 0), None);
        assert_eq!(argument.slot(ArrayIndex::from_indexes(&[1, 0]), 0), None);
    }

    #[test]
    fn numbered_arguments_read_their_own_slot() {
        let argument3 = find("argument3");
        let Storage::Computed { get, set, .. } = &argument3.storage else {
            panic!("argument3 should be computed");
        };
        let arguments = vec![GmlValue::from(1), GmlValue::from(2)];
        let view = BuiltinView {
            arguments: &arguments,
            relative: false,
            entities: &[],
        };
        assert_eq!(get(&view, 0), GmlValue::ZERO);
        let mut arguments = arguments;
        set.as_ref().expect("argument3 should be writable")(&mut arguments, 0, GmlValue::from("x"));
        assert_eq!(arguments.len(), 4);
        assert_eq!(arguments[3], GmlValue::from("x"));
    }

    #[test]
    fn instance_id_length_follows_entity_count() {
        let instance_id = find("instance_id");
        assert!(instance_id.read_only);
        assert_eq!(instance_id.slot(ArrayIndex::from_indexes(&[1]), 2), Some(1));
        assert_eq!(instance_id.slot(ArrayIndex::from_indexes(&[2]), 2), None);
    }

    #[test]
    fn grids_flatten_row_major() {
        let grid = BuiltinVar::stored("cells", ArgKind::Real, 0).grid(2, 3);
        assert_eq!(grid.dimensions, 2);
        assert_eq!(grid.slot(ArrayIndex::from_indexes(&[1, 2]), 0), Some(5));
        assert_eq!(grid.slot(ArrayIndex::from_indexes(&[2, 0]), 0), None);
        assert_eq!(grid.initial_cells().len(), 6);
    }

    #[test]
    fn constants_cover_object_keywords() {
        let constants = default_constants();
        assert_eq!(constants.get("noone"), Some(&GmlValue::Real(-4.0)));
        assert_eq!(constants.get("global"), Some(&GmlValue::Real(-5.0)));
        assert_eq!(constants.get("true"), Some(&GmlValue::Real(1.0)));
    }
}
