use crate::request::{PublicRecordingsQuery, RecordingsQuery};

// Recorder service
pub const HEALTH: &str = "/health";
pub const START: &str = "/start";
pub const STATUS: &str = "/status";

pub fn stop(recording_id: &str) -> String {
    format!("/stop/{recording_id}")
}

pub fn status(recording_id: &str) -> String {
    format!("/status/{recording_id}")
}

// Control plane
pub const RECORDINGS: &str = "/api/v1/recordings";
pub const RECORDINGS_CALLBACK: &str = "/api/v1/recordings/callback";
pub const RECORDINGS_PUBLIC: &str = "/api/v1/recordings/public";

pub fn recording(id: &str) -> String {
    format!("/api/v1/recordings/{id}")
}

pub fn recording_playback(id: &str) -> String {
    format!("/api/v1/recordings/{id}/playback")
}

pub fn recording_by_show(show_id: &str) -> String {
    format!("/api/v1/recordings/show/{show_id}")
}

pub fn recordings(qry: &RecordingsQuery) -> String {
    match serde_html_form::to_string(qry) {
        Ok(query) if !query.is_empty() => format!("{RECORDINGS}?{query}"),
        _ => RECORDINGS.to_string(),
    }
}

pub fn public_recordings(qry: &PublicRecordingsQuery) -> String {
    match serde_html_form::to_string(qry) {
        Ok(query) if !query.is_empty() => format!("{RECORDINGS_PUBLIC}?{query}"),
        _ => RECORDINGS_PUBLIC.to_string(),
    }
}

pub fn show_start(id: &str) -> String {
    format!("/api/v1/shows/{id}/start")
}

pub fn show_end(id: &str) -> String {
    format!("/api/v1/shows/{id}/end")
}

// Relay hooks
pub const ICECAST_SOURCE_AUTH: &str = "/api/v1/icecast/source-auth";
pub const ICECAST_LISTENER_AUTH: &str = "/api/v1/icecast/listener-auth";
pub const ICECAST_MOUNT_ADD: &str = "/api/v1/icecast/mount-add";
pub const ICECAST_MOUNT_REMOVE: &str = "/api/v1/icecast/mount-remove";
pub const ICECAST_LISTENER_ADD: &str = "/api/v1/icecast/listener-add";
pub const ICECAST_LISTENER_REMOVE: &str = "/api/v1/icecast/listener-remove";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingStatus;

    #[test]
    fn test_recordings_query_path() {
        assert_eq!(recordings(&RecordingsQuery::default()), RECORDINGS);
        let qry = RecordingsQuery {
            mosque_id: Some("m1".to_string()),
            status: Some(RecordingStatus::Ready),
            limit: None,
        };
        assert_eq!(
            recordings(&qry),
            "/api/v1/recordings?mosqueId=m1&status=ready"
        );
    }
}
