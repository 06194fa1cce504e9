use std::collections::{BTreeMap, VecDeque};

use gml_core::{GmlError, GmlValue};
use serde::Deserialize;

use crate::store::VarStore;

pub type EntityId = u64;
pub type ClassId = u32;

/// Ids at or below this value name classes; ids above it name single entities.
pub const CLASS_ID_LIMIT: f64 = 100_000.0;
pub const FIRST_ENTITY_ID: EntityId = 100_001;

/// Events the interpreter raises on every live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldEvent {
    NoMoreLives,
    NoMoreHealth,
}

/// Work a native function cannot finish on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    ExecuteScript { id: usize, args: Vec<GmlValue> },
    ExecuteString { source: String, args: Vec<GmlValue> },
    ShowMessage(String),
    Sleep { millis: f64 },
    GetString { prompt: String, default: String },
    Custom { name: String, args: Vec<GmlValue> },
}

impl HostRequest {
    pub fn name(&self) -> &str {
        match self {
            Self::ExecuteScript { .. } => "execute_script",
            Self::ExecuteString { .. } => "execute_string",
            Self::ShowMessage(_) => "show_message",
            Self::Sleep { .. } => "sleep",
            Self::GetString { .. } => "get_string",
            Self::Custom { name, .. } => name.as_str(),
        }
    }
}

/// The simulation the interpreter runs inside of.
pub trait World {
    /// Live entities in existence order.
    fn entities(&self) -> Vec<EntityId>;
    fn exists(&self, id: EntityId) -> bool;
    fn class_of(&self, id: EntityId) -> Option<ClassId>;
    /// True when `ancestor` is a strict ancestor of `class`.
    fn is_ancestor(&self, ancestor: ClassId, class: ClassId) -> bool;
    fn vars(&self, id: EntityId) -> Option<&VarStore>;
    fn vars_mut(&mut self, id: EntityId) -> Option<&mut VarStore>;

    fn event_source(&self, _id: EntityId, _event: WorldEvent) -> Option<String> {
        None
    }

    fn resolve_request(&mut self, request: HostRequest) -> Result<GmlValue, GmlError> {
        Err(unsupported_request(&request))
    }
}

pub fn unsupported_request(request: &HostRequest) -> GmlError {
    GmlError::host(
        "GML_UNSUPPORTED_REQUEST",
        format!("Host cannot serve request \"{}\".", request.name()),
    )
}

#[derive(Debug, Clone)]
struct ClassDef {
    name: String,
    parent: Option<ClassId>,
    events: BTreeMap<WorldEvent, String>,
}

#[derive(Debug, Clone)]
struct Entity {
    id: EntityId,
    class: ClassId,
    vars: VarStore,
    alive: bool,
}

/// In-memory world used by the CLI, the case runner and tests.
#[derive(Debug, Clone)]
pub struct SimpleWorld {
    classes: BTreeMap<ClassId, ClassDef>,
    entities: Vec<Entity>,
    next_id: EntityId,
    pub messages: Vec<String>,
    pub slept_millis: f64,
    pub answers: VecDeque<String>,
}

impl Default for SimpleWorld {
    fn default() -> Self {
        Self {
            classes: BTreeMap::new(),
            entities: Vec::new(),
            next_id: FIRST_ENTITY_ID,
            messages: Vec::new(),
            slept_millis: 0.0,
            answers: VecDeque::new(),
        }
    }
}

impl SimpleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, id: ClassId, name: &str, parent: Option<ClassId>) {
        self.classes.insert(
            id,
            ClassDef {
                name: name.to_string(),
                parent,
                events: BTreeMap::new(),
            },
        );
    }

    pub fn set_event(&mut self, class: ClassId, event: WorldEvent, source: &str) {
        if let Some(def) = self.classes.get_mut(&class) {
            def.events.insert(event, source.to_string());
        }
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .find(|(_, def)| def.name == name)
            .map(|(id, _)| *id)
    }

    /// Class names as constants, the way object names are visible in code.
    pub fn class_constants(&self) -> BTreeMap<String, GmlValue> {
        self.classes
            .iter()
            .map(|(id, def)| (def.name.clone(), GmlValue::Real(f64::from(*id))))
            .collect()
    }

    pub fn spawn(&mut self, class: ClassId) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            class,
            vars: VarStore::new(),
            alive: true,
        });
        id
    }

    pub fn destroy(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.iter_mut().find(|entity| entity.id == id) {
            entity.alive = false;
        }
    }

    pub fn var(&self, id: EntityId, name: &str) -> Option<GmlValue> {
        self.vars(id).and_then(|vars| vars.get_scalar(name))
    }

    pub fn from_fixture(fixture: &WorldFixture) -> Result<Self, GmlError> {
        let mut world = Self::new();
        for class in &fixture.classes {
            world.add_class(class.id, &class.name, None);
        }
        for class in &fixture.classes {
            let parent = match &class.parent {
                Some(parent) => Some(world.require_class(parent)?),
                None => None,
            };
            if let Some(def) = world.classes.get_mut(&class.id) {
                def.parent = parent;
                def.events = class.events.clone();
            }
        }
        for entity in &fixture.entities {
            let class = world.require_class(&entity.class)?;
            let id = world.spawn(class);
            if let Some(vars) = world.vars_mut(id) {
                for (name, value) in &entity.vars {
                    vars.set_scalar(name, value.clone());
                }
            }
        }
        world.answers = fixture.answers.iter().cloned().collect();
        Ok(world)
    }

    fn require_class(&self, name: &str) -> Result<ClassId, GmlError> {
        self.class_id(name).ok_or_else(|| {
            GmlError::host(
                "GML_WORLD_FIXTURE",
                format!("Class \"{}\" is not declared.", name),
            )
        })
    }

    fn live(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.alive && entity.id == id)
    }
}

impl World for SimpleWorld {
    fn entities(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|entity| entity.alive)
            .map(|entity| entity.id)
            .collect()
    }

    fn exists(&self, id: EntityId) -> bool {
        self.live(id).is_some()
    }

    fn class_of(&self, id: EntityId) -> Option<ClassId> {
        self.live(id).map(|entity| entity.class)
    }

    fn is_ancestor(&self, ancestor: ClassId, class: ClassId) -> bool {
        let mut current = self.classes.get(&class).and_then(|def| def.parent);
        // Bounded walk; fixtures may contain cycles.
        for _ in 0..self.classes.len() {
            match current {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = self.classes.get(&parent).and_then(|def| def.parent),
                None => return false,
            }
        }
        false
    }

    fn vars(&self, id: EntityId) -> Option<&VarStore> {
        self.live(id).map(|entity| &entity.vars)
    }

    fn vars_mut(&mut self, id: EntityId) -> Option<&mut VarStore> {
        self.entities
            .iter_mut()
            .find(|entity| entity.alive && entity.id == id)
            .map(|entity| &mut entity.vars)
    }

    fn event_source(&self, id: EntityId, event: WorldEvent) -> Option<String> {
        let mut class = self.class_of(id);
        for _ in 0..=self.classes.len() {
            let def = self.classes.get(&class?)?;
            if let Some(source) = def.events.get(&event) {
                return Some(source.clone());
            }
            class = def.parent;
        }
        None
    }

    fn resolve_request(&mut self, request: HostRequest) -> Result<GmlValue, GmlError> {
        match request {
            HostRequest::ShowMessage(text) => {
                self.messages.push(text);
                Ok(GmlValue::ZERO)
            }
            HostRequest::Sleep { millis } => {
                self.slept_millis += millis.max(0.0);
                Ok(GmlValue::ZERO)
            }
            HostRequest::GetString { default, .. } => Ok(GmlValue::Str(
                self.answers.pop_front().unwrap_or(default),
            )),
            other => Err(unsupported_request(&other)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldFixture {
    #[serde(default)]
    pub classes: Vec<ClassFixture>,
    #[serde(default)]
    pub entities: Vec<EntityFixture>,
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFixture {
    pub id: ClassId,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub events: BTreeMap<WorldEvent, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityFixture {
    pub class: String,
    #[serde(default)]
    pub vars: BTreeMap<String, GmlValue>,
}

#[cfg(test)]
mod world_tests {
    use super::*;

    fn family() -> SimpleWorld {
        let mut world = SimpleWorld::new();
        world.add_class(0, "base", None);
        world.add_class(1, "enemy", Some(0));
        world.add_class(2, "boss", Some(1));
        world
    }

    #[test]
    fn ancestry_walks_parent_chain() {
        let world = family();
        assert!(world.is_ancestor(0, 2));
        assert!(world.is_ancestor(1, 2));
        assert!(!world.is_ancestor(2, 0));
        assert!(!world.is_ancestor(2, 2));
    }

    #[test]
    fn destroyed_entities_disappear_from_queries() {
        let mut world = family();
        let first = world.spawn(1);
        let second = world.spawn(2);
        assert_eq!(first, FIRST_ENTITY_ID);
        world.destroy(first);
        assert_eq!(world.entities(), vec![second]);
        assert!(!world.exists(first));
        assert!(world.vars(first).is_none());
    }

    #[test]
    fn events_are_inherited_from_parents() {
        let mut world = family();
        world.set_event(0, WorldEvent::NoMoreLives, "dead = 1;");
        let boss = world.spawn(2);
        assert_eq!(
            world.event_source(boss, WorldEvent::NoMoreLives).as_deref(),
            Some("dead = 1;")
        );
        assert!(world.event_source(boss, WorldEvent::NoMoreHealth).is_none());
    }

    #[test]
    fn fixture_builds_classes_entities_and_answers() {
        let fixture: WorldFixture = serde_json::from_str(
            r#"{
                "classes": [
                    {"id": 0, "name": "obj_a"},
                    {"id": 1, "name": "obj_b", "parent": "obj_a",
                     "events": {"no_more_health": "x = 0;"}}
                ],
                "entities": [{"class": "obj_b", "vars": {"hp": 3, "tag": "boss"}}],
                "answers": ["yes"]
            }"#,
        )
        .expect("fixture should parse");
        let mut world = SimpleWorld::from_fixture(&fixture).expect("fixture should build");
        let id = world.entities()[0];
        assert_eq!(world.var(id, "hp"), Some(GmlValue::from(3)));
        assert_eq!(world.var(id, "tag"), Some(GmlValue::from("boss")));
        assert!(world.is_ancestor(0, 1));
        let answer = world
            .resolve_request(HostRequest::GetString {
                prompt: "?".to_string(),
                default: "no".to_string(),
            })
            .expect("request should resolve");
        assert_eq!(answer, GmlValue::from("yes"));
    }

    #[test]
    fn fixture_rejects_unknown_classes() {
        let fixture = WorldFixture {
            entities: vec![EntityFixture {
                class: "ghost".to_string(),
                vars: BTreeMap::new(),
            }],
            ..WorldFixture::default()
        };
        let error = SimpleWorld::from_fixture(&fixture).expect_err("unknown class should fail");
        assert_eq!(error.code, "GML_WORLD_FIXTURE");
    }

    #[test]
    fn custom_requests_are_unsupported() {
        let mut world = SimpleWorld::new();
        let error = world
            .resolve_request(HostRequest::Custom {
                name: "clipboard_get_text".to_string(),
                args: vec![],
            })
            .expect_err("custom request should fail");
        assert!(error.message.contains("clipboard_get_text"));
    }
}
