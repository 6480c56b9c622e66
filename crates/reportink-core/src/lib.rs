//! ReportInk Core Library
//!
//! Platform-agnostic layout editing engine for ReportInk report templates:
//! element storage, undo/redo, box selection, drag/resize with snapping
//! and viewport virtualization. Rendering is left to the host, which
//! drains [`EditorEvent`]s to keep its visuals in sync.

pub mod camera;
pub mod config;
pub mod document;
pub mod editor;
pub mod element;
pub mod error;
pub mod events;
pub mod geometry;
pub mod handles;
pub mod history;
pub mod input;
pub mod manipulation;
pub mod selection;
pub mod snap;
pub mod store;
pub mod throttle;
pub mod virtualizer;

pub use camera::Camera;
pub use config::EditorConfig;
pub use document::{Document, Orientation, PageSize};
pub use editor::Editor;
pub use element::{EditState, Element, ElementId, ElementKind};
pub use error::{ConfigError, EditorError, EditorResult, HistoryError};
pub use events::{EditorEvent, EventQueue};
pub use geometry::{Alignment, Distribution, Geometry, SizeMatch};
pub use handles::{Handle, HandleKind};
pub use history::{Command, CommandKind, ElementSnapshot, History, DEFAULT_HISTORY_CAPACITY};
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use manipulation::{Constraints, DragController, ResizeController};
pub use selection::{SelectionManager, SelectionState};
pub use snap::{SnapEngine, SnapGuide, SnapMode, SnapResult, DEFAULT_GRID_SIZE};
pub use store::ElementStore;
pub use throttle::{FrameThrottle, Instant};
pub use virtualizer::{RealizationDelta, Virtualizer};
