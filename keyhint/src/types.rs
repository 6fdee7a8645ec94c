//! Common types shared by discovery, search and execution

use crate::element::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Finite, with strictly positive width and height.
    pub fn is_usable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Area shared with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.max_x().min(other.max_x()) - self.x.max(other.x);
        let h = self.max_y().min(other.max_y()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection_area(other) > 0.0
    }
}

/// Operating-system process identifier of the application being crawled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub i32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ProcessId {
    fn from(pid: i32) -> Self {
        Self(pid)
    }
}

/// Heuristic family a target was discovered (and will be executed) with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Native-style UI: declared roles are trusted.
    Stable,
    /// Content rendered by an embedded layout engine: identities and
    /// geometry churn, so frames and click fallbacks matter.
    Volatile,
}

/// How a target's cached frame should be interpreted by the input synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordinateSystem {
    TopLeftOrigin,
    ScreenLocal,
}

/// Opaque unique identifier of a discovered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(Uuid);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A discovered, actionable UI element plus what is needed to label,
/// revalidate and act on it later. Immutable once built.
#[derive(Debug, Clone)]
pub struct Target<H> {
    pub id: TargetId,
    pub title: String,
    pub role: String,
    pub subrole: Option<String>,
    /// Descendant levels searched when the title was resolved. Validation
    /// searches as deep.
    pub title_depth: usize,
    /// Titles of the named containers the crawler descended through.
    pub path: Vec<String>,
    pub element: ElementRef<H>,
    pub is_enabled: bool,
    /// Mandatory for volatile-profile targets.
    pub cached_frame: Option<Rect>,
    pub profile: Profile,
    pub coordinate_system: CoordinateSystem,
}

impl<H> Target<H> {
    /// Identity that survives rediscovery: container path, role and title.
    ///
    /// Two same-titled items in different containers get different keys.
    pub fn identity_key(&self) -> String {
        let mut key = self.path.join(" > ");
        if !key.is_empty() {
            key.push_str(" > ");
        }
        key.push_str(&self.title);
        key.push('#');
        key.push_str(&self.role);
        key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Menu,
    Sidebar,
    Button,
    Window,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Menu => "menu",
            CommandKind::Sidebar => "sidebar",
            CommandKind::Button => "button",
            CommandKind::Window => "window",
        };
        f.write_str(name)
    }
}

/// Deterministic command identity: kind, path and an ordinal among earlier
/// items sharing that kind and path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(String);

impl CommandId {
    pub fn new(kind: CommandKind, path: &[String], ordinal: usize) -> Self {
        let mut id = format!("{kind}:{}", path.join(" > "));
        if ordinal > 0 {
            id.push_str(&format!("#{ordinal}"));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entry of the searchable command list (menus, sidebar rows, ...).
#[derive(Debug, Clone)]
pub struct CommandItem<H> {
    pub id: CommandId,
    pub title: String,
    /// Full hierarchical path, ending with `title`.
    pub path: Vec<String>,
    pub shortcut_hint: Option<String>,
    pub element: ElementRef<H>,
    pub is_enabled: bool,
    pub kind: CommandKind,
}
