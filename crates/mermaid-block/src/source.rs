//! The diagram source record edited by the author and persisted by the host as block attributes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 24;
pub const DEFAULT_FONT_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Forest,
    Dark,
    Neutral,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Default, Theme::Forest, Theme::Dark, Theme::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Forest => "forest",
            Theme::Dark => "dark",
            Theme::Neutral => "neutral",
        }
    }

    /// Lenient parse for attribute values: anything unrecognized is the default theme.
    pub fn from_attr(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "forest" => Ok(Self::Forest),
            "dark" => Ok(Self::Dark),
            "neutral" => Ok(Self::Neutral),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TB => "TB",
            Direction::BT => "BT",
            Direction::LR => "LR",
            Direction::RL => "RL",
        }
    }

    pub fn from_attr(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TB" => Ok(Self::TB),
            "BT" => Ok(Self::BT),
            "LR" => Ok(Self::LR),
            "RL" => Ok(Self::RL),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font size in pixels, always inside `[MIN_FONT_SIZE, MAX_FONT_SIZE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FontSize(u32);

impl FontSize {
    /// Out-of-range values fall back to the default size instead of being clamped.
    pub fn new(px: i64) -> Self {
        if (MIN_FONT_SIZE as i64..=MAX_FONT_SIZE as i64).contains(&px) {
            Self(px as u32)
        } else {
            Self::default()
        }
    }

    pub fn from_attr(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<i64>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self(DEFAULT_FONT_SIZE)
    }
}

impl<'de> Deserialize<'de> for FontSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(font_size_from_value(&value))
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn font_size_from_value(value: &Value) -> FontSize {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .map(FontSize::new)
            .unwrap_or_default(),
        Value::String(s) => FontSize::from_attr(Some(s)),
        _ => FontSize::default(),
    }
}

/// Display options that travel with every render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub font_size: FontSize,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagramSource {
    pub text: String,
    pub theme: Theme,
    pub font_size: FontSize,
    pub direction: Direction,
    pub draggable: bool,
}

impl DiagramSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_font_size(mut self, px: i64) -> Self {
        self.font_size = FontSize::new(px);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    /// The text a renderer would see.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Empty (post-trim) text means "no diagram", not an error.
    pub fn is_empty(&self) -> bool {
        self.trimmed_text().is_empty()
    }

    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            theme: self.theme,
            font_size: self.font_size,
            direction: self.direction,
        }
    }

    /// Reads the host's block attribute object.
    ///
    /// `content` wins over the legacy `diagramCode` attribute when both are non-empty. Unknown or
    /// out-of-range option values fall back to their defaults.
    pub fn from_attributes(attrs: &Value) -> Self {
        let str_attr = |key: &str| attrs.get(key).and_then(Value::as_str);
        let text = [str_attr("content"), str_attr("diagramCode")]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();

        Self {
            text,
            theme: Theme::from_attr(str_attr("theme")),
            font_size: attrs
                .get("fontSize")
                .map(font_size_from_value)
                .unwrap_or_default(),
            direction: Direction::from_attr(str_attr("diagramDirection")),
            draggable: attrs
                .get("isDraggable")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Attribute object in the host's naming; both `content` and `diagramCode` carry the text.
    pub fn to_attributes(&self) -> Value {
        let mut map = Map::new();
        map.insert("content".to_string(), Value::String(self.text.clone()));
        map.insert("diagramCode".to_string(), Value::String(self.text.clone()));
        map.insert("theme".to_string(), Value::String(self.theme.to_string()));
        map.insert("fontSize".to_string(), Value::from(self.font_size.get()));
        map.insert(
            "diagramDirection".to_string(),
            Value::String(self.direction.to_string()),
        );
        map.insert("isDraggable".to_string(), Value::Bool(self.draggable));
        Value::Object(map)
    }
}
