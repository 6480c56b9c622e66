//! Report template document handed to and from the persistence layer.

use crate::element::Element;
use crate::geometry::{self, Geometry};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Paper dimensions in millimetres, always stored portrait (width <= height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const A3: PageSize = PageSize::new(297.0, 420.0);
    pub const A4: PageSize = PageSize::new(210.0, 297.0);
    pub const A5: PageSize = PageSize::new(148.0, 210.0);
    pub const LETTER: PageSize = PageSize::new(215.9, 279.4);
    pub const LEGAL: PageSize = PageSize::new(215.9, 355.6);

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Normalise arbitrary dimensions to the stored portrait form.
    pub fn portrait(width: f64, height: f64) -> Self {
        Self::new(width.min(height), width.max(height))
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// A report template layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    pub page: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
    /// Elements supplied by the template that the editor never mutates.
    #[serde(default)]
    pub fixed_elements: Vec<Element>,
    /// Editable elements, in store order.
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty A4 portrait document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            page: PageSize::default(),
            orientation: Orientation::Portrait,
            fixed_elements: Vec::new(),
            elements: Vec::new(),
        }
    }

    pub fn with_page(mut self, page: PageSize, orientation: Orientation) -> Self {
        self.page = PageSize::portrait(page.width, page.height);
        self.orientation = orientation;
        self
    }

    /// Displayed page size: stored dimensions swapped in landscape.
    pub fn display_size(&self) -> Size {
        match self.orientation {
            Orientation::Portrait => Size::new(self.page.width, self.page.height),
            Orientation::Landscape => Size::new(self.page.height, self.page.width),
        }
    }

    /// Bounding box of every element, fixed and editable.
    pub fn bounds(&self) -> Option<Geometry> {
        let all: Vec<Geometry> = self
            .fixed_elements
            .iter()
            .chain(self.elements.iter())
            .map(Element::geometry)
            .collect();
        geometry::union_bounds(&all)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.fixed_elements.is_empty()
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON, re-applying element invariants.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Self = serde_json::from_str(json)?;
        doc.page = PageSize::portrait(doc.page.width, doc.page.height);
        for element in doc.fixed_elements.iter_mut().chain(doc.elements.iter_mut()) {
            element.normalize();
        }
        Ok(doc)
    }
}
