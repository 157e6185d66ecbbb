//! Ordered edit recipes.
//!
//! A recipe holds at most one edit per slot. Slots keep the position they were
//! first set at, so re-setting an edit changes its payload but never its place
//! in the serialized object; the JSON (and therefore the URL) depends only on
//! the sequence of builder calls.

use crate::color::Color;
use crate::error::{Result, TransformerError};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How the source maps into the target box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Crop to fill the box, preserving aspect ratio
    #[default]
    Cover,
    /// Letterbox inside the box, preserving aspect ratio
    Contain,
    /// Stretch to the box, ignoring aspect ratio
    Fill,
    /// Shrink to fit inside the box, never enlarge
    Inside,
    /// Grow to cover the box, never shrink
    Outside,
}

impl Fit {
    /// Every fit mode, in declaration order
    pub const ALL: [Fit; 5] = [Fit::Cover, Fit::Contain, Fit::Fill, Fit::Inside, Fit::Outside];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Fit::Cover => "cover",
            Fit::Contain => "contain",
            Fit::Fill => "fill",
            Fit::Inside => "inside",
            Fit::Outside => "outside",
        }
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fit {
    type Err = TransformerError;

    fn from_str(s: &str) -> Result<Self> {
        Fit::ALL
            .into_iter()
            .find(|fit| fit.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                TransformerError::argument(format!(
                    "unsupported resizer mode {s:?}, expected one of: cover, contain, fill, inside, outside"
                ))
            })
    }
}

/// Output encodings the service can convert to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG
    Jpeg,
    /// PNG
    Png,
    /// WebP
    Webp,
}

impl OutputFormat {
    /// Wire name, used both as the edit key and the `toFormat` value
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    /// Quality applied when the caller gives none
    #[must_use]
    pub fn default_quality(&self) -> Option<u8> {
        match self {
            OutputFormat::Jpeg => Some(90),
            OutputFormat::Png | OutputFormat::Webp => None,
        }
    }
}

/// `resize` payload. Zero in one dimension means "infer from the origin".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResizeOp {
    /// Target width, 0 to infer
    pub width: u32,
    /// Target height, 0 to infer
    pub height: u32,
    /// Fit mode
    pub fit: Fit,
    /// Fill for letterboxed areas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

impl ResizeOp {
    /// Exactly one side is zero, so the other can be derived
    #[must_use]
    pub fn needs_inference(&self) -> bool {
        (self.width == 0) != (self.height == 0)
    }
}

/// `flatten` payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlattenOp {
    /// Colour composited under transparent pixels
    pub background: Color,
}

/// `jpeg` / `png` / `webp` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FormatOp {
    /// Encoder quality, 1-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

/// One named edit
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// `resize`
    Resize(ResizeOp),
    /// `flatten`
    Flatten(FlattenOp),
    /// `jpeg`, `png` or `webp`; one format family per recipe
    Format(OutputFormat, FormatOp),
    /// `toFormat`
    ToFormat(OutputFormat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Resize,
    Flatten,
    Format,
    ToFormat,
}

impl Edit {
    fn slot(&self) -> Slot {
        match self {
            Edit::Resize(_) => Slot::Resize,
            Edit::Flatten(_) => Slot::Flatten,
            Edit::Format(..) => Slot::Format,
            Edit::ToFormat(_) => Slot::ToFormat,
        }
    }

    /// Key this edit serializes under
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Edit::Resize(_) => "resize",
            Edit::Flatten(_) => "flatten",
            Edit::Format(format, _) => format.as_str(),
            Edit::ToFormat(_) => "toFormat",
        }
    }
}

/// Ordered mapping of edit name to payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditRecipe {
    edits: Vec<Edit>,
}

impl EditRecipe {
    /// Empty recipe
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `edit`, replacing any edit in the same slot without moving it
    pub fn set(&mut self, edit: Edit) {
        match self.edits.iter_mut().find(|existing| existing.slot() == edit.slot()) {
            Some(existing) => *existing = edit,
            None => self.edits.push(edit),
        }
    }

    /// Attach `background` to the existing resize edit
    pub fn merge_resize_background(&mut self, background: Color) -> Result<()> {
        let resize = self
            .resize_mut()
            .ok_or_else(|| TransformerError::state("a background needs a resize to attach to; call resize first"))?;
        resize.background = Some(background);
        Ok(())
    }

    /// The resize edit, if any
    #[must_use]
    pub fn resize(&self) -> Option<&ResizeOp> {
        self.edits.iter().find_map(|edit| match edit {
            Edit::Resize(op) => Some(op),
            _ => None,
        })
    }

    pub(crate) fn resize_mut(&mut self) -> Option<&mut ResizeOp> {
        self.edits.iter_mut().find_map(|edit| match edit {
            Edit::Resize(op) => Some(op),
            _ => None,
        })
    }

    /// Look up an edit by its serialized name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Edit> {
        self.edits.iter().find(|edit| edit.name() == name)
    }

    /// Edit names in serialization order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.edits.iter().map(Edit::name)
    }

    /// Edits in serialization order
    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    /// Number of edits
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether no edit has been set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

impl Serialize for EditRecipe {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.edits.len()))?;
        for edit in &self.edits {
            match edit {
                Edit::Resize(op) => map.serialize_entry(edit.name(), op)?,
                Edit::Flatten(op) => map.serialize_entry(edit.name(), op)?,
                Edit::Format(_, op) => map.serialize_entry(edit.name(), op)?,
                Edit::ToFormat(format) => map.serialize_entry(edit.name(), format.as_str())?,
            }
        }
        map.end()
    }
}

/// The document the service decodes: `{bucket, key, edits}`, in that order
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecipePayload<'a> {
    /// Storage bucket
    pub bucket: &'a str,
    /// Object key
    pub key: &'a str,
    /// Edits to apply
    pub edits: &'a EditRecipe,
}

impl EditRecipe {
    /// Pair this recipe with the object it applies to
    #[must_use]
    pub fn to_payload<'a>(&'a self, bucket: &'a str, key: &'a str) -> RecipePayload<'a> {
        RecipePayload { bucket, key, edits: self }
    }
}
