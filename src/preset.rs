// src/preset.rs
//
// Output presets: the immutable per-artifact specification (size, crop,
// format, shape, filename rule) plus the owning PresetLibrary collection.
//
// Design principle: all range clamping and defaulting happens exactly once,
// in PresetSettings::build(). A constructed Preset is always valid.

use crate::error::PixelbatchError;
use crate::util::{clamp, generate_id};
use serde::{Deserialize, Serialize};

/// Crop policies controlling how the source aspect ratio maps to the output box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Full source scaled to fit inside the box; slack axis is padded.
    Fit,
    /// Source trimmed to the output aspect ratio; no letterboxing.
    Fill,
    /// Full source mapped to full box; aspect may distort.
    Stretch,
}

impl CropMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fit => "Fit",
            Self::Fill => "Fill",
            Self::Stretch => "Stretch",
        }
    }
}

/// Output encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    Ico,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Webp => "WebP",
            Self::Ico => "ICO",
        }
    }

    pub fn ext(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Ico => "ico",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Ico => "image/vnd.microsoft.icon",
        }
    }

    pub fn supports_transparency(&self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

/// Resample effort level. Higher is sharper and slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleQuality {
    Fastest,
    Low,
    Medium,
    High,
}

impl ResampleQuality {
    /// Clamping conversion from the 0..3 wire value.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Fastest,
            1 => Self::Low,
            2 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Self::Fastest => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fastest => "Fastest",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Output shape mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Rectangle,
    Circle,
    Rounded,
}

impl Shape {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Rounded => "Rounded",
        }
    }
}

/// Opaque RGB background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Color = Color {
    r: 255,
    g: 255,
    b: 255,
};

impl Color {
    /// Parse `#rrggbb` (leading `#` optional, case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::from_hex(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {raw}")))
    }
}

fn quality_as_level<S: serde::Serializer>(
    quality: &ResampleQuality,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(quality.level())
}

pub const DEFAULT_DIMENSION: u32 = 400;
pub const DEFAULT_FILENAME_PATTERN: &str = "{original_name}_{width}x{height}.{format_ext}";

/// A named output specification. Immutable after construction; edits go
/// through `PresetLibrary::update` with a full replacement carrying the
/// same id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    /// Target width in pixels; 0 means "use the source width".
    pub width: u32,
    /// Target height in pixels; 0 means "use the source height".
    pub height: u32,
    pub crop_mode: CropMode,
    /// Crop/placement anchor, 0..=100 percent of the available slack.
    pub horizontal_offset: u8,
    pub vertical_offset: u8,
    /// Serialized as the 0..3 level so exported configs stay compatible
    /// with the loose settings form.
    #[serde(serialize_with = "quality_as_level")]
    pub quality: ResampleQuality,
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    pub webp_quality: u8,
    /// Retained for preset round-tripping; the PNG encoder ignores it.
    pub png_compression_level: u8,
    /// Retained for preset round-tripping; no GIF encoder exists.
    pub gif_colors: u16,
    pub shape: Shape,
    pub corner_radius: u32,
    pub background_color: Color,
    pub transparent_background: bool,
    pub maintain_aspect_ratio: bool,
    pub filename_pattern: String,
}

impl Preset {
    pub fn builder() -> PresetSettings {
        PresetSettings::default()
    }

    /// Fresh copy with a new id, for library duplication.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = generate_id();
        copy.name = format!("{} (Copy)", self.name);
        copy
    }

    pub fn supports_transparency(&self) -> bool {
        self.format.supports_transparency()
    }

    /// The 9-point anchor name for the offset pair, or "Custom".
    pub fn centering_label(&self) -> &'static str {
        match (self.horizontal_offset, self.vertical_offset) {
            (0, 0) => "Top-Left",
            (50, 0) => "Top-Center",
            (100, 0) => "Top-Right",
            (0, 50) => "Center-Left",
            (50, 50) => "Center",
            (100, 50) => "Center-Right",
            (0, 100) => "Bottom-Left",
            (50, 100) => "Bottom-Center",
            (100, 100) => "Bottom-Right",
            _ => "Custom",
        }
    }

    /// Format-specific quality text: "90%" for JPEG/WebP, "C6" for PNG,
    /// empty for ICO.
    pub fn format_quality_text(&self) -> String {
        match self.format {
            OutputFormat::Jpeg => format!("{}%", self.jpeg_quality),
            OutputFormat::Webp => format!("{}%", self.webp_quality),
            OutputFormat::Png => format!("C{}", self.png_compression_level),
            OutputFormat::Ico => String::new(),
        }
    }

    /// "Transparent" when transparency is requested and supported,
    /// otherwise the uppercase hex color without the leading '#'.
    pub fn background_text(&self) -> String {
        if self.transparent_background && self.supports_transparency() {
            "Transparent".to_string()
        } else {
            self.background_color
                .to_hex()
                .trim_start_matches('#')
                .to_uppercase()
        }
    }

    pub fn maintain_aspect_text(&self) -> &'static str {
        if self.maintain_aspect_ratio {
            "Maintain"
        } else {
            "Ignore"
        }
    }
}

impl<'de> Deserialize<'de> for Preset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Loose documents go through the same normalization as the builder,
        // so a hand-edited config cannot produce an out-of-range preset.
        Ok(PresetSettings::deserialize(deserializer)?.build())
    }
}

/// Loosely-typed preset settings: every field optional, clamped and
/// defaulted exactly once in `build()`. Doubles as the builder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresetSettings {
    pub id: Option<String>,
    pub name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop_mode: Option<CropMode>,
    pub horizontal_offset: Option<i64>,
    pub vertical_offset: Option<i64>,
    pub quality: Option<u8>,
    pub format: Option<OutputFormat>,
    pub jpeg_quality: Option<i64>,
    pub webp_quality: Option<i64>,
    pub png_compression_level: Option<u8>,
    pub gif_colors: Option<u16>,
    pub shape: Option<Shape>,
    pub corner_radius: Option<u32>,
    pub background_color: Option<String>,
    pub transparent_background: Option<bool>,
    pub maintain_aspect_ratio: Option<bool>,
    pub filename_pattern: Option<String>,
}

impl PresetSettings {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn crop_mode(mut self, mode: CropMode) -> Self {
        self.crop_mode = Some(mode);
        self
    }

    pub fn offsets(mut self, horizontal: i64, vertical: i64) -> Self {
        self.horizontal_offset = Some(horizontal);
        self.vertical_offset = Some(vertical);
        self
    }

    pub fn quality(mut self, quality: ResampleQuality) -> Self {
        self.quality = Some(quality.level());
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn jpeg_quality(mut self, quality: i64) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    pub fn webp_quality(mut self, quality: i64) -> Self {
        self.webp_quality = Some(quality);
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn corner_radius(mut self, radius: u32) -> Self {
        self.corner_radius = Some(radius);
        self
    }

    pub fn background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color.to_hex());
        self
    }

    pub fn transparent_background(mut self, transparent: bool) -> Self {
        self.transparent_background = Some(transparent);
        self
    }

    pub fn maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.maintain_aspect_ratio = Some(maintain);
        self
    }

    pub fn filename_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.filename_pattern = Some(pattern.into());
        self
    }

    /// Normalize into a valid Preset: apply defaults, clamp ranges, and
    /// enforce the "width and height cannot both be zero" invariant.
    pub fn build(self) -> Preset {
        let mut width = self.width.unwrap_or(DEFAULT_DIMENSION);
        let mut height = self.height.unwrap_or(DEFAULT_DIMENSION);
        if width == 0 && height == 0 {
            width = DEFAULT_DIMENSION;
            height = DEFAULT_DIMENSION;
        }

        Preset {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(generate_id),
            name: self.name.unwrap_or_else(|| "Resize".to_string()),
            width,
            height,
            crop_mode: self.crop_mode.unwrap_or(CropMode::Fit),
            horizontal_offset: clamp(self.horizontal_offset.unwrap_or(50), 0, 100) as u8,
            vertical_offset: clamp(self.vertical_offset.unwrap_or(50), 0, 100) as u8,
            quality: ResampleQuality::from_level(self.quality.unwrap_or(3)),
            format: self.format.unwrap_or(OutputFormat::Png),
            jpeg_quality: clamp(self.jpeg_quality.unwrap_or(90), 1, 100) as u8,
            webp_quality: clamp(self.webp_quality.unwrap_or(90), 1, 100) as u8,
            png_compression_level: clamp(self.png_compression_level.unwrap_or(6), 0, 9),
            gif_colors: self.gif_colors.unwrap_or(256),
            shape: self.shape.unwrap_or(Shape::Rectangle),
            corner_radius: self.corner_radius.unwrap_or(10),
            background_color: self
                .background_color
                .as_deref()
                .and_then(Color::from_hex)
                .unwrap_or(WHITE),
            transparent_background: self.transparent_background.unwrap_or(false),
            maintain_aspect_ratio: self.maintain_aspect_ratio.unwrap_or(true),
            filename_pattern: self
                .filename_pattern
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_FILENAME_PATTERN.to_string()),
        }
    }
}

/// Versioned preset configuration document for export/import. Unknown
/// fields (the export timestamp among them) are ignored; a missing
/// version is treated as legacy and accepted.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    version: Option<String>,
    #[serde(alias = "sizes")]
    presets: Vec<PresetSettings>,
}

const CONFIG_VERSION: &str = "1.0";

/// The ordered, owning preset collection.
///
/// Invariant: the library is never empty - removals that would empty it
/// fail with `LastPreset`, and imports of an empty list reseed the defaults.
#[derive(Debug, Clone)]
pub struct PresetLibrary {
    presets: Vec<Preset>,
}

impl PresetLibrary {
    /// Seed with the standard square presets.
    pub fn with_defaults() -> Self {
        let presets = [("Tiny", 100), ("Small", 200), ("Medium", 400), ("Large", 800)]
            .into_iter()
            .map(|(name, side)| Preset::builder().name(name).size(side, side).build())
            .collect();
        Self { presets }
    }

    /// Build from an existing list, falling back to defaults when empty.
    pub fn new(presets: Vec<Preset>) -> Self {
        if presets.is_empty() {
            Self::with_defaults()
        } else {
            Self { presets }
        }
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        // Held false by the library invariant; present for API completeness.
        self.presets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn can_remove(&self) -> bool {
        self.presets.len() > 1
    }

    pub fn add(&mut self, preset: Preset) {
        self.presets.push(preset);
    }

    /// Replace the preset carrying the same id.
    pub fn update(&mut self, preset: Preset) -> Result<(), PixelbatchError> {
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(slot) => {
                *slot = preset;
                Ok(())
            }
            None => Err(PixelbatchError::unknown_preset(preset.id)),
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<(), PixelbatchError> {
        if !self.can_remove() {
            return Err(PixelbatchError::LastPreset);
        }
        let index = self
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PixelbatchError::unknown_preset(id.to_string()))?;
        self.presets.remove(index);
        Ok(())
    }

    /// Clone a preset under a fresh id, appended at the end. Returns the
    /// new preset's id.
    pub fn duplicate(&mut self, id: &str) -> Result<String, PixelbatchError> {
        let copy = self
            .get(id)
            .ok_or_else(|| PixelbatchError::unknown_preset(id.to_string()))?
            .duplicate();
        let new_id = copy.id.clone();
        self.presets.push(copy);
        Ok(new_id)
    }

    /// Move `dragged_id` to the position currently held by `target_id`.
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> Result<(), PixelbatchError> {
        let from = self
            .presets
            .iter()
            .position(|p| p.id == dragged_id)
            .ok_or_else(|| PixelbatchError::unknown_preset(dragged_id.to_string()))?;
        let to = self
            .presets
            .iter()
            .position(|p| p.id == target_id)
            .ok_or_else(|| PixelbatchError::unknown_preset(target_id.to_string()))?;
        let preset = self.presets.remove(from);
        self.presets.insert(to, preset);
        Ok(())
    }

    /// Serialize the library as a versioned JSON config document.
    pub fn export_config(&self) -> Result<String, PixelbatchError> {
        #[derive(Serialize)]
        struct ExportDocument<'a> {
            version: &'a str,
            timestamp: i64,
            presets: &'a [Preset],
        }
        let doc = ExportDocument {
            version: CONFIG_VERSION,
            timestamp: chrono::Utc::now().timestamp_millis(),
            presets: &self.presets,
        };
        serde_json::to_string_pretty(&doc)
            .map_err(|e| PixelbatchError::invalid_config(e.to_string()))
    }

    /// Replace the whole set from an exported (or legacy) config document.
    /// Documents from a different major version are rejected; an empty
    /// preset list reseeds the defaults.
    pub fn import_config(&mut self, json: &str) -> Result<(), PixelbatchError> {
        let doc: ConfigDocument = serde_json::from_str(json)
            .map_err(|e| PixelbatchError::invalid_config(e.to_string()))?;
        if let Some(version) = &doc.version {
            if version.split('.').next() != CONFIG_VERSION.split('.').next() {
                return Err(PixelbatchError::invalid_config(format!(
                    "unsupported config version {version}"
                )));
            }
        }
        let presets: Vec<Preset> = doc.presets.into_iter().map(PresetSettings::build).collect();
        self.presets = if presets.is_empty() {
            Self::with_defaults().presets
        } else {
            presets
        };
        Ok(())
    }
}

impl Default for PresetLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}
