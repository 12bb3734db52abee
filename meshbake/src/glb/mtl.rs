//! Wavefront MTL material parsing.
//!
//! Only the statements that map onto a glTF metallic-roughness material
//! are read: `newmtl`, `Kd`, `d`, `Tr` and `map_Kd`. Unparsable values
//! are logged and skipped; a broken material never aborts a conversion.

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct MtlMaterial {
    pub name: String,
    pub diffuse: [f32; 3],
    /// Opacity, 1.0 = opaque.
    pub alpha: f32,
    /// Diffuse texture reference as written in the file.
    pub diffuse_map: Option<String>,
}

impl MtlMaterial {
    fn new(name: String) -> Self {
        Self {
            name,
            diffuse: [1.0, 1.0, 1.0],
            alpha: 1.0,
            diffuse_map: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: Vec<MtlMaterial>,
}

impl MaterialLibrary {
    pub fn get(&self, name: &str) -> Option<&MtlMaterial> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

pub fn parse_mtl(text: &str) -> MaterialLibrary {
    let mut materials: Vec<MtlMaterial> = Vec::new();
    // `d` wins over `Tr` when a material has both.
    let mut saw_dissolve = false;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (keyword, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(k, r)| (k, r.trim()));

        if keyword == "newmtl" {
            materials.push(MtlMaterial::new(rest.to_string()));
            saw_dissolve = false;
            continue;
        }

        let Some(current) = materials.last_mut() else {
            continue;
        };

        match keyword {
            "Kd" => match parse_color(rest) {
                Some(color) => current.diffuse = color,
                None => warn!(line = idx + 1, value = rest, "Ignoring invalid Kd"),
            },
            "d" => match rest.parse::<f32>() {
                Ok(v) if v.is_finite() => {
                    current.alpha = v.clamp(0.0, 1.0);
                    saw_dissolve = true;
                }
                _ => warn!(line = idx + 1, value = rest, "Ignoring invalid d"),
            },
            "Tr" if !saw_dissolve => match rest.parse::<f32>() {
                Ok(v) if v.is_finite() => current.alpha = 1.0 - v.clamp(0.0, 1.0),
                _ => warn!(line = idx + 1, value = rest, "Ignoring invalid Tr"),
            },
            "map_Kd" => current.diffuse_map = texture_file_name(rest),
            _ => {}
        }
    }

    MaterialLibrary { materials }
}

/// Strips the options that precede a texture file name (`-bm 1`,
/// `-s 1 1 1`, `-clamp on`) and returns the rest of the statement, which
/// may contain spaces.
fn texture_file_name(rest: &str) -> Option<String> {
    let mut remaining = rest.trim_start();
    while remaining.starts_with('-') {
        let (option, after) = next_token(remaining);
        let (min_args, max_args) = match option {
            "-blendu" | "-blendv" | "-cc" | "-clamp" | "-bm" | "-boost" | "-texres"
            | "-imfchan" | "-type" => (1, 1),
            "-mm" => (2, 2),
            "-o" | "-s" | "-t" => (1, 3),
            // Unknown option: the file name itself starts with a dash.
            _ => break,
        };
        remaining = after;
        for n in 0..max_args {
            let (arg, after) = next_token(remaining);
            if arg.is_empty() || (n >= min_args && arg.parse::<f32>().is_err()) {
                break;
            }
            remaining = after;
        }
    }

    let name = remaining.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn next_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

fn parse_color(value: &str) -> Option<[f32; 3]> {
    let components = value
        .split_whitespace()
        .map(|t| t.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()?;
    match components.as_slice() {
        [r, g, b, ..] => Some([*r, *g, *b]),
        [gray] => Some([*gray; 3]),
        _ => None,
    }
}
