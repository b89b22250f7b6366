//! ZMK keymap parsing and the persisted layout config
//!
//! A `.keymap` file is only mined for layer binding names; the position to
//! coordinate mapping itself comes from the built-in keyboard geometry.

use super::layout::KeyboardLayout;
use crate::error::{HeatmapError, Result};
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Keyboard identifier written into generated configs
pub const KEYBOARD_ID: &str = "eyelash_sofle";

/// `<name> { bindings = < ... > }`, possibly spread over many lines
static LAYER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\s*\{\s*bindings\s*=\s*<([^>]+)>").expect("layer pattern is valid")
});

static LINE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$").expect("line comment pattern is valid"));

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid"));

/// A named set of key bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    /// Binding behaviour names (`&kp`, `&mo`, ...) in source order
    pub bindings: Vec<String>,
}

/// Provenance of a generated layout config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    /// Keymap the config was generated from
    #[serde(default)]
    pub source_file: Option<PathBuf>,
    pub keyboard: String,
    pub total_keys: usize,
}

/// Layout config file: geometry plus the layers found in the keymap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub layout: KeyboardLayout,
    #[serde(default, with = "layer_map")]
    pub layers: Vec<Layer>,
    pub metadata: LayoutMetadata,
}

impl LayoutConfig {
    /// Config for the built-in geometry without any layers
    pub fn from_layout(layout: KeyboardLayout) -> Self {
        let total_keys = layout.positions.len();
        Self {
            layout,
            layers: Vec::new(),
            metadata: LayoutMetadata {
                source_file: None,
                keyboard: KEYBOARD_ID.to_string(),
                total_keys,
            },
        }
    }

    /// Find a layer by name
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Layers whose binding count differs from the physical key count,
    /// as `(name, binding_count)`.
    pub fn layer_mismatches(&self) -> Vec<(&str, usize)> {
        let expected = self.layout.positions.len();
        self.layers
            .iter()
            .filter(|l| l.bindings.len() != expected)
            .map(|l| (l.name.as_str(), l.bindings.len()))
            .collect()
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a config written by [`LayoutConfig::save`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HeatmapError::missing("layout config", path));
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Parser for ZMK `.keymap` files
#[derive(Debug, Clone)]
pub struct KeymapParser {
    keymap_path: PathBuf,
}

impl KeymapParser {
    pub fn new(keymap_path: impl Into<PathBuf>) -> Self {
        Self {
            keymap_path: keymap_path.into(),
        }
    }

    /// Read the keymap and build a layout config for the Sofle geometry.
    pub fn parse(&self) -> Result<LayoutConfig> {
        if !self.keymap_path.exists() {
            return Err(HeatmapError::missing("keymap file", &self.keymap_path));
        }
        let content = fs::read_to_string(&self.keymap_path)?;

        let mut config = LayoutConfig::from_layout(KeyboardLayout::sofle());
        config.layers = extract_layers(&content);
        config.metadata.source_file = Some(self.keymap_path.clone());

        for (name, count) in config.layer_mismatches() {
            warn!(
                "Layer '{}' has {} bindings, layout has {} keys",
                name, count, config.layout.total_keys
            );
        }
        info!(
            "Parsed {} layers from {}",
            config.layers.len(),
            self.keymap_path.display()
        );

        Ok(config)
    }
}

/// Remove `/* */` and `//` comments.
fn strip_comments(content: &str) -> String {
    let cleaned = BLOCK_COMMENT_RE.replace_all(content, " ");
    LINE_COMMENT_RE.replace_all(&cleaned, "").into_owned()
}

/// Extract every layer definition from keymap source text.
pub fn extract_layers(content: &str) -> Vec<Layer> {
    let cleaned = strip_comments(content);
    LAYER_RE
        .captures_iter(&cleaned)
        .map(|caps| Layer {
            name: caps[1].to_string(),
            bindings: parse_bindings(&caps[2]),
        })
        .collect()
}

/// Parse the body of a `bindings = < ... >` block into binding names.
///
/// Each binding is introduced by `&`; only its first token is kept, so
/// `&kp A` becomes `&kp`. Comments are stripped first and empty segments
/// are dropped.
pub fn parse_bindings(content: &str) -> Vec<String> {
    let cleaned = strip_comments(content);

    // Text before the first `&` is not a binding.
    cleaned
        .split('&')
        .skip(1)
        .filter_map(|segment| segment.split_whitespace().next())
        .map(|name| format!("&{name}"))
        .collect()
}

/// Serializes layers as a JSON object `{name: [bindings]}` while keeping
/// source order.
mod layer_map {
    use super::Layer;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(layers: &[Layer], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(layers.len()))?;
        for layer in layers {
            map.serialize_entry(&layer.name, &layer.bindings)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Layer>, D::Error> {
        struct LayerVisitor;

        impl<'de> Visitor<'de> for LayerVisitor {
            type Value = Vec<Layer>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of layer names to binding lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut layers = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, bindings)) = access.next_entry::<String, Vec<String>>()? {
                    layers.push(Layer { name, bindings });
                }
                Ok(layers)
            }
        }

        deserializer.deserialize_map(LayerVisitor)
    }
}
