// src/filename.rs
//
// Filename templating: `{token}` and `{token:format}` placeholders
// resolved against a per-task context. Numeric tokens zero-pad when the
// format is a number, string tokens accept upper/lower, and the
// date/time/timestamp tokens accept a chrono strftime format. Unknown
// tokens pass through unchanged.

use crate::engine::SourceImage;
use crate::preset::Preset;
use chrono::{DateTime, Local};
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([^}:]+)(?::([^}]+))?\}").unwrap_or_else(|e| {
            unreachable!("placeholder regex is a constant pattern: {e}")
        })
    })
}

enum TokenValue<'a> {
    Text(&'a str),
    Number(i64),
}

/// All values a filename pattern can reference for one task.
#[derive(Debug, Clone)]
pub struct FilenameContext {
    pub original_name: String,
    pub original_ext: String,
    pub original_format: String,
    pub original_width: u32,
    pub original_height: u32,
    pub preset_name: String,
    pub width: u32,
    pub height: u32,
    pub crop_mode: String,
    pub resize_quality: String,
    pub format: String,
    pub format_ext: String,
    pub format_quality: String,
    pub shape: String,
    pub centering: String,
    pub background: String,
    pub maintain_aspect_ratio: String,
    pub moment: DateTime<Local>,
}

impl FilenameContext {
    /// Assemble the context for one (source, preset) pair and its actual
    /// output dimensions.
    pub fn new(
        source: &SourceImage,
        preset: &Preset,
        output_width: u32,
        output_height: u32,
    ) -> Self {
        let (original_name, original_ext) = split_name_and_ext(&source.name);
        Self {
            original_name: original_name.to_string(),
            original_ext,
            original_format: source
                .format
                .map(|f| f.name().to_string())
                .unwrap_or_else(|| "Unsupported".to_string()),
            original_width: source.width(),
            original_height: source.height(),
            preset_name: preset.name.clone(),
            width: output_width,
            height: output_height,
            crop_mode: preset.crop_mode.label().to_string(),
            resize_quality: preset.quality.label().to_string(),
            format: preset.format.name().to_string(),
            format_ext: preset.format.ext().to_string(),
            format_quality: preset.format_quality_text(),
            shape: preset.shape.label().to_string(),
            centering: preset.centering_label().to_string(),
            background: preset.background_text(),
            maintain_aspect_ratio: preset.maintain_aspect_text().to_string(),
            moment: Local::now(),
        }
    }

    fn lookup(&self, token: &str) -> Option<TokenValue<'_>> {
        let value = match token {
            "original_name" => TokenValue::Text(&self.original_name),
            "original_ext" => TokenValue::Text(&self.original_ext),
            "original_format" => TokenValue::Text(&self.original_format),
            "original_width" => TokenValue::Number(self.original_width as i64),
            "original_height" => TokenValue::Number(self.original_height as i64),
            "name" => TokenValue::Text(&self.preset_name),
            "width" => TokenValue::Number(self.width as i64),
            "height" => TokenValue::Number(self.height as i64),
            "crop_mode" => TokenValue::Text(&self.crop_mode),
            "resize_quality" => TokenValue::Text(&self.resize_quality),
            "format" => TokenValue::Text(&self.format),
            "format_ext" => TokenValue::Text(&self.format_ext),
            "format_quality" => TokenValue::Text(&self.format_quality),
            "shape" => TokenValue::Text(&self.shape),
            "centering" => TokenValue::Text(&self.centering),
            "background" => TokenValue::Text(&self.background),
            "maintain_aspect_ratio" => TokenValue::Text(&self.maintain_aspect_ratio),
            _ => return None,
        };
        Some(value)
    }
}

/// Resolve a filename pattern against a context.
pub fn format_filename(pattern: &str, context: &FilenameContext) -> String {
    placeholder_regex()
        .replace_all(pattern, |caps: &Captures<'_>| {
            let token = &caps[1];
            let fmt = caps.get(2).map(|m| strip_quotes(m.as_str()));

            match token {
                "date" => match fmt {
                    Some(f) => context.moment.format(f).to_string(),
                    None => context.moment.format("%Y-%m-%d").to_string(),
                },
                "time" => match fmt {
                    Some(f) => context.moment.format(f).to_string(),
                    None => context.moment.format("%H%M%S").to_string(),
                },
                "timestamp" => match fmt {
                    Some(f) => context.moment.format(f).to_string(),
                    None => context.moment.timestamp().to_string(),
                },
                _ => match context.lookup(token) {
                    Some(TokenValue::Number(n)) => match fmt.and_then(|f| f.parse::<usize>().ok())
                    {
                        Some(pad) => format!("{n:0>pad$}"),
                        None => n.to_string(),
                    },
                    Some(TokenValue::Text(s)) => match fmt {
                        Some("upper") => s.to_uppercase(),
                        Some("lower") => s.to_lowercase(),
                        _ => s.to_string(),
                    },
                    // Unknown token: leave the raw placeholder in place
                    None => caps[0].to_string(),
                },
            }
        })
        .into_owned()
}

/// Split "photo.JPG" into ("photo", "jpg"). A leading dot or no dot means
/// no extension.
pub fn split_name_and_ext(filename: &str) -> (&str, String) {
    match filename.rfind('.') {
        Some(index) if index > 0 => (
            &filename[..index],
            filename[index + 1..].to_lowercase(),
        ),
        _ => (filename, String::new()),
    }
}

fn strip_quotes(fmt: &str) -> &str {
    let bytes = fmt.as_bytes();
    if fmt.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &fmt[1..fmt.len() - 1]
    } else {
        fmt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context() -> FilenameContext {
        FilenameContext {
            original_name: "cat".to_string(),
            original_ext: "jpg".to_string(),
            original_format: "JPEG".to_string(),
            original_width: 640,
            original_height: 480,
            preset_name: "Avatar".to_string(),
            width: 90,
            height: 16,
            crop_mode: "Fill".to_string(),
            resize_quality: "High".to_string(),
            format: "PNG".to_string(),
            format_ext: "png".to_string(),
            format_quality: "C6".to_string(),
            shape: "Circle".to_string(),
            centering: "Center".to_string(),
            background: "Transparent".to_string(),
            maintain_aspect_ratio: "Maintain".to_string(),
            moment: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        }
    }

    #[test]
    fn zero_pads_numeric_tokens() {
        let name = format_filename("{original_name}_{width:4}x{height:4}.{format_ext}", &context());
        assert_eq!(name, "cat_0090x0016.png");
    }

    #[test]
    fn plain_tokens_resolve_without_format() {
        let name = format_filename("{name}-{crop_mode}-{width}x{height}", &context());
        assert_eq!(name, "Avatar-Fill-90x16");
    }

    #[test]
    fn string_tokens_support_case_formats() {
        assert_eq!(format_filename("{format:lower}", &context()), "png");
        assert_eq!(format_filename("{original_name:upper}", &context()), "CAT");
        // Unrecognized string format passes the value through unchanged
        assert_eq!(format_filename("{format:weird}", &context()), "PNG");
    }

    #[test]
    fn unknown_tokens_pass_through_literally() {
        let name = format_filename("{bogus}_{width}.{format_ext}", &context());
        assert_eq!(name, "{bogus}_90.png");
    }

    #[test]
    fn date_and_time_tokens_use_defaults() {
        let ctx = context();
        assert_eq!(format_filename("{date}", &ctx), "2024-03-09");
        assert_eq!(format_filename("{time}", &ctx), "140507");
        let stamp: i64 = format_filename("{timestamp}", &ctx).parse().unwrap();
        assert_eq!(stamp, ctx.moment.timestamp());
    }

    #[test]
    fn date_tokens_accept_explicit_formats() {
        let ctx = context();
        assert_eq!(format_filename("{date:%Y%m%d}", &ctx), "20240309");
        assert_eq!(format_filename("{time:'%H-%M'}", &ctx), "14-05");
    }

    #[test]
    fn splits_names_and_extensions() {
        assert_eq!(split_name_and_ext("photo.JPG"), ("photo", "jpg".to_string()));
        assert_eq!(split_name_and_ext("archive.tar.gz"), ("archive.tar", "gz".to_string()));
        assert_eq!(split_name_and_ext("noext"), ("noext", String::new()));
        assert_eq!(split_name_and_ext(".hidden"), (".hidden", String::new()));
    }
}
