//! Helpers shared by the integration tests: temp directories, a shell
//! script standing in for `whisper-cli`, and a minimal HTTP model host.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub fn create_test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "whisper_batch_{name}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"fake audio").unwrap();
}

/// Engine stand-in that appends its arguments, one line per run, to
/// `engine-runs.log` next to the transcribed file
///
/// Exits 7 for files named `fail.*`. If `--model` names a file that does not
/// exist it logs `MISSING-MODEL <path>` and exits 9.
///
/// Written once: executing a script another thread is still writing fails
/// with ETXTBSY.
pub fn recording_engine() -> &'static Path {
    static ENGINE: OnceLock<PathBuf> = OnceLock::new();
    ENGINE.get_or_init(|| {
        let dir = create_test_dir("engine");
        let script = dir.join("fake-whisper-cli.sh");
        fs::write(
            &script,
            r#"#!/bin/sh
log="$(dirname "$2")/engine-runs.log"
prev=""
for arg in "$@"; do
  if [ "$prev" = "--model" ] && [ ! -f "$arg" ]; then
    echo "MISSING-MODEL $arg" >> "$log"
    exit 9
  fi
  prev="$arg"
done
echo "$@" >> "$log"
case "$2" in *fail.*) exit 7;; esac
exit 0
"#,
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    })
}

pub fn logged_runs(audio_dir: &Path) -> Vec<String> {
    fs::read_to_string(audio_dir.join("engine-runs.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

/// Minimal HTTP/1.1 server answering each request from a route function
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start<R>(route: R) -> Self
    where
        R: Fn(&str) -> Vec<u8> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = Vec::new();
                let mut chunk = [0_u8; 1024];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&buf).into_owned();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_owned();
                seen.lock().unwrap().push(path.clone());

                let _ = socket.write_all(&route(&path)).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));
    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}
