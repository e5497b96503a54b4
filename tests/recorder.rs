use std::path::{Path, PathBuf};
use std::time::Duration;

use recorder::config::Config;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use storage::StorageConfig;
use tempfile::TempDir;

mod common;
use common::{API_KEY, Collector, local_listener, shutdown_signal, write_script};

struct Recorder {
    base: String,
    client: Client,
    storage_root: PathBuf,
    work_dir: PathBuf,
    _dir: TempDir,
}

impl Recorder {
    async fn start(ffmpeg: &str, stop_timeout_secs: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let ffmpeg = write_script(dir.path(), "ffmpeg", ffmpeg);
        let ffprobe = write_script(dir.path(), "ffprobe", common::FFPROBE);
        Self::with_binaries(dir, &ffmpeg, &ffprobe, stop_timeout_secs).await
    }

    async fn with_binaries(
        dir: TempDir,
        ffmpeg: &Path,
        ffprobe: &Path,
        stop_timeout_secs: u64,
    ) -> Self {
        let storage_root = dir.path().join("storage");
        let work_dir = dir.path().join("work");
        std::fs::create_dir_all(&storage_root).unwrap();

        let mut cfg = Config::default();
        cfg.auth.api_keys = vec![API_KEY.to_string()];
        cfg.capture.ffmpeg = ffmpeg.to_string_lossy().into_owned();
        cfg.capture.ffprobe = ffprobe.to_string_lossy().into_owned();
        cfg.capture.work_dir = work_dir.clone();
        cfg.capture.stop_timeout_secs = stop_timeout_secs;
        cfg.storage = StorageConfig::Fs {
            root: storage_root.to_string_lossy().into_owned(),
        };
        cfg.publish.public_url = "https://cdn.example.com".to_string();
        cfg.callback.api_key = API_KEY.to_string();

        let (listener, addr) = local_listener().await;
        tokio::spawn(recorder::serve(cfg, listener, shutdown_signal()));

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
            storage_root,
            work_dir,
            _dir: dir,
        }
    }

    async fn start_recording(&self, recording_id: &str, callback_url: &str) -> reqwest::Response {
        self.start_recording_for("mosque-1", recording_id, callback_url)
            .await
    }

    async fn start_recording_for(
        &self,
        mosque_id: &str,
        recording_id: &str,
        callback_url: &str,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base, api::path::START))
            .header("x-api-key", API_KEY)
            .json(&json!({
                "recordingId": recording_id,
                "streamUrl": "http://localhost:8000/masjid",
                "codec": "mp3",
                "mosqueId": mosque_id,
                "showTitle": "Tafsir",
                "callbackUrl": callback_url,
            }))
            .send()
            .await
            .unwrap()
    }

    async fn stop_recording(&self, recording_id: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base, api::path::stop(recording_id)))
            .header("x-api-key", API_KEY)
            .send()
            .await
            .unwrap()
    }
}

fn chunk_indexes(bodies: &[Value]) -> Vec<u64> {
    let mut indexes: Vec<u64> = bodies
        .iter()
        .filter_map(|b| b["chunk"]["index"].as_u64())
        .collect();
    indexes.sort();
    indexes
}

#[tokio::test]
async fn test_health_is_open() {
    let recorder = Recorder::start(common::FFMPEG_THREE_SEGMENTS, 5).await;

    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::HEALTH))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok", "service": "minaret-recorder" }));
}

#[tokio::test]
async fn test_api_key_required() {
    let recorder = Recorder::start(common::FFMPEG_THREE_SEGMENTS, 5).await;

    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::STATUS))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::STATUS))
        .header("x-api-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let recorder = Recorder::start(common::FFMPEG_THREE_SEGMENTS, 5).await;

    let res = recorder
        .client
        .post(format!("{}{}", recorder.base, api::path::START))
        .header("x-api-key", API_KEY)
        .json(&json!({ "recordingId": "r1", "streamUrl": "http://relay/m" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_three_segments_then_exit() {
    let recorder = Recorder::start(common::FFMPEG_THREE_SEGMENTS, 5).await;
    let mut callbacks = Collector::start("/api/v1/recordings/callback").await;

    let res = recorder.start_recording("rec-three", &callbacks.url).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["recordingId"], "rec-three");
    assert_eq!(body["status"], "ok");

    let bodies = callbacks.until_status("ready").await;
    assert_eq!(chunk_indexes(&bodies), vec![0, 1, 2]);
    assert_eq!(bodies.iter().filter(|b| b["status"] == "ready").count(), 1);

    let chunk = bodies.iter().find(|b| b["chunk"]["index"] == 1).unwrap();
    assert_eq!(chunk["status"], "recording");
    assert_eq!(chunk["chunk"]["codec"], "mp3");
    assert_eq!(chunk["chunk"]["filename"], "chunk_0001.mp3");
    assert_eq!(chunk["chunk"]["durationSecs"], 12.5);
    assert_eq!(
        chunk["chunk"]["storagePath"],
        "recordings/public/mosque-1/rec-three/chunk_0001.mp3"
    );
    assert_eq!(
        chunk["chunk"]["publicUrl"],
        "https://cdn.example.com/recordings/public/mosque-1/rec-three/chunk_0001.mp3"
    );

    let ready = bodies.last().unwrap();
    assert!(ready["endedAt"].is_string());
    assert!(ready["totalDurationSecs"].is_u64());

    for i in 0..3 {
        let uploaded = recorder
            .storage_root
            .join(format!("recordings/public/mosque-1/rec-three/chunk_000{i}.mp3"));
        assert!(uploaded.exists(), "{} missing", uploaded.display());
    }

    // session leaves the registry once finalized
    tokio::time::sleep(Duration::from_millis(200)).await;
    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::status("rec-three")))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stop_unknown_recording() {
    let recorder = Recorder::start(common::FFMPEG_THREE_SEGMENTS, 5).await;

    let res = recorder.stop_recording("does-not-exist").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Recording not found or already stopped");
}

#[tokio::test]
async fn test_stop_running_capture() {
    let recorder = Recorder::start(common::FFMPEG_UNTIL_TERM, 5).await;
    let mut callbacks = Collector::start("/callback").await;

    let res = recorder.start_recording("rec-stop", &callbacks.url).await;
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::status("rec-stop")))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let status: Value = res.json().await.unwrap();
    assert_eq!(status["isRunning"], true);
    assert_eq!(status["streamUrl"], "http://localhost:8000/masjid");

    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::STATUS))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    let list: Value = res.json().await.unwrap();
    assert_eq!(list["sessions"].as_array().unwrap().len(), 1);

    let res = recorder.stop_recording("rec-stop").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Recording stop initiated");

    // the never rotated final segment is still published
    let bodies = callbacks.until_status("ready").await;
    assert_eq!(chunk_indexes(&bodies), vec![0]);
}

#[tokio::test]
async fn test_duplicate_start_rejected() {
    let recorder = Recorder::start(common::FFMPEG_UNTIL_TERM, 5).await;
    let mut callbacks = Collector::start("/callback").await;

    let res = recorder.start_recording("rec-dup", &callbacks.url).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = recorder.start_recording("rec-dup", &callbacks.url).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    recorder.stop_recording("rec-dup").await;
    let bodies = callbacks.until_status("ready").await;
    assert_eq!(bodies.iter().filter(|b| b["status"] == "ready").count(), 1);
}

#[tokio::test]
async fn test_capture_ignoring_sigterm_is_killed() {
    let recorder = Recorder::start(common::FFMPEG_IGNORE_TERM, 1).await;
    let mut callbacks = Collector::start("/callback").await;

    let res = recorder.start_recording("rec-kill", &callbacks.url).await;
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(recorder.stop_recording("rec-kill").await.status(), StatusCode::OK);

    let bodies = callbacks.until_status("ready").await;
    assert!(chunk_indexes(&bodies).is_empty());
}

#[tokio::test]
async fn test_spawn_failure_reports_failed() {
    let dir = TempDir::new().unwrap();
    let ffprobe = write_script(dir.path(), "ffprobe", common::FFPROBE);
    let missing = dir.path().join("no-such-ffmpeg");
    let recorder = Recorder::with_binaries(dir, &missing, &ffprobe, 5).await;
    let mut callbacks = Collector::start("/callback").await;

    let res = recorder.start_recording("rec-spawn", &callbacks.url).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = callbacks.next().await;
    assert_eq!(body["recordingId"], "rec-spawn");
    assert_eq!(body["status"], "failed");
    assert!(body["error"].is_string());

    // the id is free again
    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::status("rec-spawn")))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsafe_recording_id_rejected() {
    let recorder = Recorder::start(common::FFMPEG_THREE_SEGMENTS, 5).await;

    let res = recorder.start_recording("../escape", "http://localhost/cb").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsafe_mosque_id_rejected() {
    let recorder = Recorder::start(common::FFMPEG_THREE_SEGMENTS, 5).await;
    let mut callbacks = Collector::start("/callback").await;

    let res = recorder
        .start_recording_for("../evil", "rec-tenant", &callbacks.url)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid mosque id: ../evil");

    // nothing was registered, the id is still free
    let res = recorder
        .client
        .get(format!("{}{}", recorder.base, api::path::status("rec-tenant")))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(!recorder.work_dir.join("rec-tenant").exists());

    let res = recorder
        .start_recording_for("mosque-1", "rec-tenant", &callbacks.url)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let bodies = callbacks.until_status("ready").await;
    assert_eq!(chunk_indexes(&bodies), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_failed_remux_drops_only_that_segment() {
    let recorder = Recorder::start(common::FFMPEG_BROKEN_SECOND_SEGMENT, 5).await;
    let mut callbacks = Collector::start("/callback").await;

    let res = recorder.start_recording("rec-broken", &callbacks.url).await;
    assert_eq!(res.status(), StatusCode::OK);

    let bodies = callbacks.until_status("ready").await;
    assert_eq!(chunk_indexes(&bodies), vec![0, 2]);
    assert_eq!(bodies.iter().filter(|b| b["status"] == "ready").count(), 1);
    assert!(bodies.iter().all(|b| b["status"] != "failed"));

    let prefix = recorder
        .storage_root
        .join("recordings/public/mosque-1/rec-broken");
    assert!(prefix.join("chunk_0000.mp3").exists());
    assert!(!prefix.join("chunk_0001.mp3").exists());
    assert!(prefix.join("chunk_0002.mp3").exists());

    // scratch directory is gone once the session finalized
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!recorder.work_dir.join("rec-broken").exists());
}
