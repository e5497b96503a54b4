#![allow(dead_code)]

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const API_KEY: &str = "test-secret";

pub async fn shutdown_signal() {
    let _str = signal::wait_for_stop_signal().await;
}

pub async fn local_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Writes the three segments 0, 1 and 2, announcing each like the segment
/// muxer does, then exits. Any other invocation is a remux: copy `-i` to the
/// last argument.
pub const FFMPEG_THREE_SEGMENTS: &str = r#"
for last; do :; done
case "$*" in
  *"-f segment"*)
    dir=$(dirname "$last")
    for i in 0000 0001 0002; do
      echo "segment $i" > "$dir/chunk_$i.ts"
      echo "[segment @ 0x5581] Opening '$dir/chunk_$i.ts' for writing" >&2
    done
    exit 0 ;;
esac
prev=""
for a; do
  if [ "$prev" = "-i" ]; then input="$a"; fi
  prev="$a"
done
cp "$input" "$last"
"#;

/// Same capture as `FFMPEG_THREE_SEGMENTS`, but remuxing segment 1 fails.
pub const FFMPEG_BROKEN_SECOND_SEGMENT: &str = r#"
for last; do :; done
case "$*" in
  *"-f segment"*)
    dir=$(dirname "$last")
    for i in 0000 0001 0002; do
      echo "segment $i" > "$dir/chunk_$i.ts"
      echo "[segment @ 0x5581] Opening '$dir/chunk_$i.ts' for writing" >&2
    done
    exit 0 ;;
esac
prev=""
for a; do
  if [ "$prev" = "-i" ]; then input="$a"; fi
  prev="$a"
done
case "$input" in
  *chunk_0001.ts)
    echo "$input: Invalid data found when processing input" >&2
    exit 1 ;;
esac
cp "$input" "$last"
"#;

/// One segment, then runs until SIGTERM.
pub const FFMPEG_UNTIL_TERM: &str = r#"
for last; do :; done
case "$*" in
  *"-f segment"*)
    trap 'exit 0' TERM
    dir=$(dirname "$last")
    echo "segment 0000" > "$dir/chunk_0000.ts"
    echo "[segment @ 0x5581] Opening '$dir/chunk_0000.ts' for writing" >&2
    while true; do sleep 0.1; done ;;
esac
prev=""
for a; do
  if [ "$prev" = "-i" ]; then input="$a"; fi
  prev="$a"
done
cp "$input" "$last"
"#;

/// Ignores SIGTERM, only a kill ends it.
pub const FFMPEG_IGNORE_TERM: &str = r#"
for last; do :; done
case "$*" in
  *"-f segment"*)
    trap '' TERM
    while true; do sleep 0.1; done ;;
esac
exit 1
"#;

pub const FFPROBE: &str = r#"
case "$*" in
  *codec_name*) echo mp3 ;;
  *format=duration*) echo 12.5 ;;
esac
"#;

/// Records every JSON body posted to it
pub struct Collector {
    pub url: String,
    pub rx: mpsc::UnboundedReceiver<Value>,
}

impl Collector {
    pub async fn start(path: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (listener, addr) = local_listener().await;
        let app = Router::new()
            .route(path, post(collect))
            .with_state(tx);
        tokio::spawn(async move { axum::serve(listener, app).await });
        Self {
            url: format!("http://{addr}{path}"),
            rx,
        }
    }

    pub async fn next(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(10), self.rx.recv())
            .await
            .expect("timed out waiting for a callback")
            .expect("collector closed")
    }

    /// Bodies until one has `status` equal to `status`, inclusive
    pub async fn until_status(&mut self, status: &str) -> Vec<Value> {
        let mut seen = Vec::new();
        loop {
            let body = self.next().await;
            let done = body["status"] == status;
            seen.push(body);
            if done {
                return seen;
            }
        }
    }
}

async fn collect(
    State(tx): State<mpsc::UnboundedSender<Value>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let _ = tx.send(body);
    Json(serde_json::json!({ "status": "ok", "message": "Callback received" }))
}
