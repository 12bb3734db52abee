//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names map to struct fields.

use super::defaults::MAX_TEXTURE_SIZE;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::glb::UpAxis;
use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

/// Parses an `Ini` into a `ConfigFile`, starting from defaults and
/// overlaying every value present.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("remote")) {
        let s = Section::new("remote", section);
        if let Some(v) = s.text("url") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(s.invalid("url", v, "must start with http:// or https://"));
            }
            config.remote.url = v.to_string();
        }
        if let Some(v) = s.text("archive_name") {
            config.remote.archive_name = v.to_string();
        }
        if let Some(v) = s.positive("request_timeout", "must be a positive integer (seconds)")? {
            config.remote.request_timeout = v;
        }
        if let Some(v) = s.positive("connect_timeout", "must be a positive integer (seconds)")? {
            config.remote.connect_timeout = v;
        }
        if let Some(v) = s.text("max_archive_size") {
            config.remote.max_archive_size = parse_size(v)
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    s.invalid("max_archive_size", v, "expected a size like '4GB' or '500MB'")
                })?;
        }
        config.remote.token = s.text("token").map(str::to_string);
        config.remote.service_token = s.text("service_token").map(str::to_string);
    }

    if let Some(section) = ini.section(Some("watcher")) {
        let s = Section::new("watcher", section);
        if let Some(v) = s.positive("poll_interval", "must be a positive integer (seconds)")? {
            config.watcher.poll_interval = v;
        }
        if let Some(v) = s.positive("status_timeout", "must be a positive integer (seconds)")? {
            config.watcher.status_timeout = v;
        }
        if let Some(v) = s.parse("max_retries", "must be a non-negative integer")? {
            config.watcher.max_retries = v;
        }
    }

    if let Some(section) = ini.section(Some("texture")) {
        let s = Section::new("texture", section);
        if let Some(v) = s.parse::<u32>("max_size", "must be an integer between 1 and 16384")? {
            if v == 0 || v > MAX_TEXTURE_SIZE {
                return Err(s.invalid("max_size", &v.to_string(), "must be between 1 and 16384"));
            }
            config.texture.max_size = v;
        }
        if let Some(v) = s.parse::<u8>("quality", "must be an integer between 1 and 100")? {
            if !(1..=100).contains(&v) {
                return Err(s.invalid("quality", &v.to_string(), "must be between 1 and 100"));
            }
            config.texture.quality = v;
        }
        if let Some(v) = s.parse::<u8>("compression_level", "must be an integer between 0 and 9")? {
            if v > 9 {
                return Err(s.invalid("compression_level", &v.to_string(), "must be between 0 and 9"));
            }
            config.texture.compression_level = v;
        }
        if let Some(v) = s.positive("workers", "must be a positive integer")? {
            config.texture.workers = v as usize;
        }
    }

    if let Some(section) = ini.section(Some("archive")) {
        let s = Section::new("archive", section);
        if let Some(v) = s.text("mesh_extension") {
            config.archive.mesh_extension = normalize_suffix(v);
        }
        if let Some(v) = s.text("material_suffix") {
            config.archive.material_suffix = normalize_suffix(v);
        }
    }

    if let Some(section) = ini.section(Some("cache")) {
        let s = Section::new("cache", section);
        if let Some(v) = s.text("directory") {
            config.cache.directory = expand_tilde(v);
        }
    }

    if let Some(section) = ini.section(Some("pipeline")) {
        let s = Section::new("pipeline", section);
        if let Some(v) = s.text("up_axis") {
            config.pipeline.up_axis =
                UpAxis::from_str(v).map_err(|_| s.invalid("up_axis", v, "must be 'y' or 'z'"))?;
        }
        if let Some(v) = s.flag("double_sided")? {
            config.pipeline.double_sided = v;
        }
        if let Some(v) = s.flag("retain_artifacts")? {
            config.pipeline.retain_artifacts = v;
        }
        config.pipeline.work_dir = s.text("work_dir").map(expand_tilde);
        if let Some(v) = s.positive("fetch_timeout", "must be a positive integer (seconds)")? {
            config.pipeline.fetch_timeout = v;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        let s = Section::new("logging", section);
        if let Some(v) = s.text("file") {
            config.logging.file = expand_tilde(v);
        }
        if let Some(v) = s.flag("debug")? {
            config.logging.debug = v;
        }
    }

    Ok(config)
}

/// One INI section plus its name, for error reporting.
struct Section<'a> {
    name: &'static str,
    props: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, props: &'a Properties) -> Self {
        Self { name, props }
    }

    /// Trimmed value; empty values count as absent.
    fn text(&self, key: &str) -> Option<&'a str> {
        self.props
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str, reason: &str) -> Result<Option<T>, ConfigFileError> {
        match self.text(key) {
            Some(v) => v.parse().map(Some).map_err(|_| self.invalid(key, v, reason)),
            None => Ok(None),
        }
    }

    fn positive(&self, key: &str, reason: &str) -> Result<Option<u64>, ConfigFileError> {
        match self.parse::<u64>(key, reason)? {
            Some(0) => Err(self.invalid(key, "0", reason)),
            other => Ok(other),
        }
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, ConfigFileError> {
        match self.text(key) {
            Some(v) => parse_bool(v)
                .map(Some)
                .ok_or_else(|| self.invalid(key, v, "must be true or false")),
            None => Ok(None),
        }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Lowercases a filename suffix. A bare extension gains a leading dot
/// (`OBJ` becomes `.obj`); anything containing `.` or `_` is kept as
/// written (`_geo.mtl`).
fn normalize_suffix(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if lower.contains(['.', '_']) {
        lower
    } else {
        format!(".{lower}")
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, content).unwrap();
        ConfigFile::load_from(&path)
    }

    fn invalid_key(result: Result<ConfigFile, ConfigFileError>) -> (String, String) {
        match result {
            Err(ConfigFileError::InvalidValue { section, key, .. }) => (section, key),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = load(
            r#"
[texture]
max_size = 2048
"#,
        )
        .unwrap();

        let defaults = ConfigFile::default();
        assert_eq!(config.texture.max_size, 2048);
        assert_eq!(config.texture.quality, defaults.texture.quality);
        assert_eq!(config.remote, defaults.remote);
        assert_eq!(config.watcher, defaults.watcher);
    }

    #[test]
    fn test_full_config() {
        let config = load(
            r#"
[remote]
url = https://odm.example.com/
request_timeout = 60
max_archive_size = 2GB
token = secret
service_token =

[watcher]
poll_interval = 2
max_retries = 0

[archive]
mesh_extension = OBJ

[pipeline]
up_axis = Y
double_sided = no
retain_artifacts = yes

[logging]
debug = true
"#,
        )
        .unwrap();

        assert_eq!(config.remote.url, "https://odm.example.com/");
        assert_eq!(config.remote.request_timeout, 60);
        assert_eq!(config.remote.max_archive_size, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.remote.token.as_deref(), Some("secret"));
        assert_eq!(config.remote.service_token, None);
        assert_eq!(config.watcher.poll_interval, 2);
        assert_eq!(config.watcher.max_retries, 0);
        assert_eq!(config.archive.mesh_extension, ".obj");
        assert_eq!(config.pipeline.up_axis, UpAxis::Y);
        assert!(!config.pipeline.double_sided);
        assert!(config.pipeline.retain_artifacts);
        assert!(config.logging.debug);

        let remote = config.remote_config();
        assert_eq!(remote.base(), "https://odm.example.com");
    }

    #[test]
    fn test_invalid_values_name_section_and_key() {
        let cases = [
            ("[remote]\nurl = ftp://node\n", "remote", "url"),
            ("[remote]\nmax_archive_size = 2TB\n", "remote", "max_archive_size"),
            ("[watcher]\npoll_interval = 0\n", "watcher", "poll_interval"),
            ("[watcher]\nmax_retries = many\n", "watcher", "max_retries"),
            ("[texture]\nquality = 0\n", "texture", "quality"),
            ("[texture]\nquality = 101\n", "texture", "quality"),
            ("[texture]\ncompression_level = 10\n", "texture", "compression_level"),
            ("[texture]\nmax_size = 0\n", "texture", "max_size"),
            ("[pipeline]\nup_axis = x\n", "pipeline", "up_axis"),
            ("[pipeline]\ndouble_sided = maybe\n", "pipeline", "double_sided"),
        ];

        for (content, section, key) in cases {
            assert_eq!(
                invalid_key(load(content)),
                (section.to_string(), key.to_string()),
                "config: {content}"
            );
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/cache/meshbake");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("cache/meshbake"));
        }
        assert_eq!(expand_tilde("/srv/cache"), PathBuf::from("/srv/cache"));
    }

    #[test]
    fn test_normalize_suffix() {
        assert_eq!(normalize_suffix("OBJ"), ".obj");
        assert_eq!(normalize_suffix(".Mtl"), ".mtl");
        assert_eq!(normalize_suffix("mtl"), ".mtl");
        assert_eq!(normalize_suffix("_geo.mtl"), "_geo.mtl");
        assert_eq!(normalize_suffix("_GEO.MTL"), "_geo.mtl");
    }

    #[test]
    fn test_material_suffix_selects_matching_material() {
        use crate::archive::ingest;
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let config = load("[archive]\nmaterial_suffix = _geo.mtl\n").unwrap();
        assert_eq!(config.archive.material_suffix, "_geo.mtl");

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in [
            ("model_geo.obj", "mtllib model_geo.mtl\nv 0 0 0\n"),
            ("model.mtl", "newmtl plain\n"),
            ("model_geo.mtl", "newmtl geo\n"),
        ] {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        let archive = writer.finish().unwrap().into_inner();

        let rules = config.pipeline_config().ingest;
        let source = ingest(&archive, &rules).unwrap();
        let material = source.material.expect("material selected");
        assert_eq!(material.path, "model_geo.mtl");
    }
}
