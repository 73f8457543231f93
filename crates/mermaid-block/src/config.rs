use crate::source::RenderOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Mermaid `initialize` options for a single render call.
///
/// Mermaid keeps this configuration process-global; here it is built fresh for every request and
/// handed to the renderer together with the diagram text.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig(Value);

impl Default for RendererConfig {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl RendererConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Site defaults overlaid with the display options of one request.
    pub fn for_request(settings: &RendererSettings, options: &RenderOptions) -> Self {
        let mut cfg = Self::empty_object();
        if let Some(site) = &settings.site_config {
            cfg.deep_merge(site);
        }
        cfg.set_value("startOnLoad", Value::Bool(false));
        cfg.set_value(
            "securityLevel",
            Value::String(settings.security_level.clone()),
        );
        cfg.set_value("htmlLabels", Value::Bool(settings.html_labels));
        cfg.set_value("theme", Value::String(options.theme.to_string()));
        cfg.set_value("fontSize", Value::from(options.font_size.get()));
        cfg.set_value(
            "flowchart.direction",
            Value::String(options.direction.to_string()),
        );
        cfg
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_u64(&self, dotted_path: &str) -> Option<u64> {
        self.get(dotted_path)?.as_u64()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        // Configs are objects; coerce anything else so this never panics on user input.
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

/// Top-level configuration file (JSON). Every field has a default, so `{}` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub renderer: RendererSettings,
    pub preview: PreviewSettings,
    pub activation: ActivationSettings,
    pub assist: GenerationOptions,
}

impl BlockConfig {
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Mermaid CLI executable.
    pub command: String,
    /// Extra arguments placed before the generated ones.
    pub args: Vec<String>,
    pub puppeteer_config: Option<PathBuf>,
    /// Extra Mermaid config merged under the per-request options.
    pub site_config: Option<Value>,
    pub security_level: String,
    pub html_labels: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            command: "mmdc".to_string(),
            args: Vec::new(),
            puppeteer_config: None,
            site_config: None,
            security_level: "loose".to_string(),
            html_labels: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Quiet period after an edit before the preview re-renders. `0` renders on every change.
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationSettings {
    /// Placeholders rendered at the same time on one page.
    pub max_concurrent_renders: usize,
}

impl Default for ActivationSettings {
    fn default() -> Self {
        Self {
            max_concurrent_renders: crate::activate::DEFAULT_CONCURRENT_RENDERS,
        }
    }
}

/// Options forwarded to the AI text-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Feature tag the host uses to attribute usage.
    pub feature: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 2048,
            feature: "mermaid-chart-block".to_string(),
        }
    }
}
