//! Report template elements.

use crate::geometry::Geometry;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Minimum element width in logical units.
pub const MIN_ELEMENT_WIDTH: f64 = 20.0;
/// Minimum element height in logical units.
pub const MIN_ELEMENT_HEIGHT: f64 = 20.0;

/// Kind of element placed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    #[default]
    TextBox,
    Label,
    Table,
    Image,
    Line,
    Rectangle,
    Ellipse,
    Barcode,
    CheckBox,
    DropDown,
}

impl ElementKind {
    /// Human readable name, used as the default display name.
    pub fn label(self) -> &'static str {
        match self {
            ElementKind::TextBox => "Text Box",
            ElementKind::Label => "Label",
            ElementKind::Table => "Table",
            ElementKind::Image => "Image",
            ElementKind::Line => "Line",
            ElementKind::Rectangle => "Rectangle",
            ElementKind::Ellipse => "Ellipse",
            ElementKind::Barcode => "Barcode",
            ElementKind::CheckBox => "Check Box",
            ElementKind::DropDown => "Drop Down",
        }
    }

    /// Size used when an element of this kind is dropped onto the page.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            ElementKind::TextBox | ElementKind::DropDown => (100.0, 30.0),
            ElementKind::Label => (80.0, 20.0),
            ElementKind::Table => (180.0, 80.0),
            ElementKind::Image => (60.0, 60.0),
            ElementKind::Line => (100.0, MIN_ELEMENT_HEIGHT),
            ElementKind::Rectangle | ElementKind::Ellipse => (80.0, 50.0),
            ElementKind::Barcode => (90.0, 30.0),
            ElementKind::CheckBox => (MIN_ELEMENT_WIDTH, MIN_ELEMENT_HEIGHT),
        }
    }
}

/// Whether an element may be moved or resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditState {
    /// Cannot be moved or resized.
    ReadOnly,
    #[default]
    Editable,
    /// Can be moved but not resized.
    Locked,
}

impl EditState {
    pub fn can_move(self) -> bool {
        self != EditState::ReadOnly
    }

    pub fn can_resize(self) -> bool {
        self == EditState::Editable
    }
}

/// A positioned, sized, typed unit on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    pub kind: ElementKind,
    /// Display name shown in the layer list.
    pub name: String,
    geometry: Geometry,
    /// Stacking order; higher is drawn on top. Not required to be unique.
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub edit_state: EditState,
    /// Kind-specific configuration (font, dropdown options, ...).
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    /// Live data preview value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Element {
    /// Create a new element with a fresh id.
    pub fn new(kind: ElementKind, geometry: Geometry) -> Self {
        Self::with_id(Uuid::new_v4(), kind, geometry)
    }

    /// Create an element with its kind's default size at `position`.
    pub fn at(kind: ElementKind, position: Point) -> Self {
        let (width, height) = kind.default_size();
        Self::new(kind, Geometry::new(position.x, position.y, width, height))
    }

    /// Create an element with a known id (for persistence layers).
    pub fn with_id(id: ElementId, kind: ElementKind, geometry: Geometry) -> Self {
        Self {
            id,
            kind,
            name: kind.label().to_string(),
            geometry: clamp_geometry(geometry),
            z_index: 0,
            edit_state: EditState::default(),
            properties: BTreeMap::new(),
            value: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_edit_state(mut self, edit_state: EditState) -> Self {
        self.edit_state = edit_state;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Replace the geometry, enforcing the minimum size.
    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = clamp_geometry(geometry);
    }

    pub fn set_position(&mut self, position: Point) {
        self.geometry.x = position.x;
        self.geometry.y = position.y;
    }

    pub fn can_move(&self) -> bool {
        self.edit_state.can_move()
    }

    pub fn can_resize(&self) -> bool {
        self.edit_state.can_resize()
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Set a property, returning the previous value.
    pub fn set_property(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(key.into(), value)
    }

    /// Copy this element under a new id, shifted by `offset`.
    pub fn duplicate(&self, offset: Vec2) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.geometry = self.geometry.translated(offset);
        copy
    }

    /// Re-apply invariants after deserialization.
    pub(crate) fn normalize(&mut self) {
        self.geometry = clamp_geometry(self.geometry);
    }
}

fn clamp_geometry(geometry: Geometry) -> Geometry {
    crate::geometry::clamp_min_size(geometry, MIN_ELEMENT_WIDTH, MIN_ELEMENT_HEIGHT)
}
