//! INI serialization: `ConfigFile` → commented `config.ini` text.

use super::settings::ConfigFile;
use super::size::format_size;
use std::path::Path;

pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let token = config.remote.token.as_deref().unwrap_or("");
    let service_token = config.remote.service_token.as_deref().unwrap_or("");
    let work_dir = config
        .pipeline
        .work_dir
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[remote]
; Base URL of the processing node
url = {url}
; Archive downloaded from finished jobs
archive_name = {archive_name}
; HTTP request timeout in seconds (default: 300)
request_timeout = {request_timeout}
; HTTP connect timeout in seconds (default: 10)
connect_timeout = {connect_timeout}
; Largest archive accepted (default: 4GB). Supports KB, MB, GB suffixes
max_archive_size = {max_archive_size}
; Bearer token sent in the Authorization header (optional)
token = {token}
; Service token sent as the 'token' query parameter (optional)
service_token = {service_token}

[watcher]
; Seconds between job status polls (default: 5)
poll_interval = {poll_interval}
; Timeout for a single status request in seconds (default: 30)
status_timeout = {status_timeout}
; Consecutive transient failures tolerated before giving up (default: 5)
max_retries = {max_retries}

[texture]
; Largest texture width or height in pixels; larger textures are downscaled (default: 1024)
max_size = {max_size}
; JPEG quality, 1-100 (default: 80)
quality = {quality}
; PNG compression level, 0-9 (default: 9)
compression_level = {compression_level}
; Worker threads used to transcode one job's textures (default: 4)
workers = {workers}

[archive]
; Entry suffix identifying the mesh (default: .obj)
mesh_extension = {mesh_extension}
; Entry suffix identifying the material library (default: .mtl)
material_suffix = {material_suffix}

[cache]
; Directory for converted assets, stored as <directory>/<project>/<job>.glb
directory = {cache_dir}

[pipeline]
; Up axis of the source geometry: z (photogrammetry default) or y
up_axis = {up_axis}
; Render materials from both sides (default: true)
double_sided = {double_sided}
; Keep each conversion's work directory and stage outputs for debugging (default: false)
retain_artifacts = {retain_artifacts}
; Parent directory for work directories (default: system temp directory)
work_dir = {work_dir}
; Archive download timeout in seconds (default: 300)
fetch_timeout = {fetch_timeout}

[logging]
; Log file path (default: ~/.meshbake/meshbake.log)
file = {log_file}
; Log at debug level (default: false)
debug = {debug}
"#,
        url = config.remote.url,
        archive_name = config.remote.archive_name,
        request_timeout = config.remote.request_timeout,
        connect_timeout = config.remote.connect_timeout,
        max_archive_size = format_size(config.remote.max_archive_size),
        poll_interval = config.watcher.poll_interval,
        status_timeout = config.watcher.status_timeout,
        max_retries = config.watcher.max_retries,
        max_size = config.texture.max_size,
        quality = config.texture.quality,
        compression_level = config.texture.compression_level,
        workers = config.texture.workers,
        mesh_extension = config.archive.mesh_extension,
        material_suffix = config.archive.material_suffix,
        cache_dir = path_to_string(&config.cache.directory),
        up_axis = config.pipeline.up_axis,
        double_sided = config.pipeline.double_sided,
        retain_artifacts = config.pipeline.retain_artifacts,
        fetch_timeout = config.pipeline.fetch_timeout,
        log_file = path_to_string(&config.logging.file),
        debug = config.logging.debug,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
