/// Fallback tenant segment when a recording carries no mosque id
pub const UNASSIGNED_TENANT: &str = "unassigned";

/// Object key of an uploaded chunk
/// Format: recordings/{visibility}/{mosqueId}/{recordingId}/{filename}
pub fn recording_object_path(
    visibility: &str,
    mosque_id: Option<&str>,
    recording_id: &str,
    filename: &str,
) -> String {
    let tenant = match mosque_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => UNASSIGNED_TENANT,
    };
    format!("recordings/{visibility}/{tenant}/{recording_id}/{filename}")
}

/// Public address of an object: `{base}/{path}`
pub fn public_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Validate storage path format
pub fn validate_path(path: &str) -> bool {
    !path.is_empty() && !path.contains("..") && !path.starts_with('/')
}

/// A single path component safe to embed in object keys and local paths
pub fn is_safe_component(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
