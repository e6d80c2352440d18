use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client, Response, StatusCode, Url};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use super::progress::DownloadSession;
use super::ModelDescriptor;
use crate::config::ModelConfig;

/// Host serving the whisper.cpp GGML models
pub const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Redirects followed before giving up
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Failure of a single download attempt
#[derive(Debug, Error)]
pub enum DownloadError {
    /// URL could not be parsed
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// Connection or transfer failure
    #[error("request to {url} failed")]
    Request {
        /// URL being fetched
        url: String,
        /// Underlying error
        source: reqwest::Error,
    },

    /// Final response was neither 200 nor a redirect
    #[error("failed to download: HTTP {status} from {url}")]
    Status {
        /// URL that answered
        url: String,
        /// Response status
        status: StatusCode,
    },

    /// 301/302 without a `Location` header
    #[error("redirect without location from {url}")]
    MissingLocation {
        /// URL that redirected
        url: String,
    },

    /// `Location` header that is not a usable URL
    #[error("invalid redirect location {location:?} from {url}")]
    InvalidLocation {
        /// URL that redirected
        url: String,
        /// Raw header value
        location: String,
    },

    /// Redirect chain longer than allowed
    #[error("more than {max} redirects starting at {url}")]
    TooManyRedirects {
        /// First URL of the chain
        url: String,
        /// Configured bound
        max: u32,
    },

    /// Local filesystem failure
    #[error("failed to write {}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Model could not be made available
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// HTTP client construction failed
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Download failed; `url` and `path` let the user fetch it by hand
    #[error("failed to download model from {url} to {}", .path.display())]
    Download {
        /// Computed model URL
        url: String,
        /// Destination path
        path: PathBuf,
        /// What went wrong
        source: DownloadError,
    },
}

/// Outcome of [`ModelProvisioner::ensure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// File existed, nothing fetched
    AlreadyPresent,
    /// File was fetched
    Downloaded {
        /// Size written to disk
        bytes: u64,
    },
}

/// Makes sure the model file exists, fetching it from the model host if not
#[derive(Debug, Clone)]
pub struct ModelProvisioner {
    client: Client,
    base_url: String,
    max_redirects: u32,
    show_progress: bool,
}

impl ModelProvisioner {
    /// Create a provisioner for models hosted under `base_url`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, max_redirects: u32) -> Result<Self, ProvisionError> {
        // Redirects are followed by hand so the chain can be bounded and logged
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProvisionError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            max_redirects,
            show_progress: true,
        })
    }

    /// Create a provisioner from the `[model]` config section
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &ModelConfig) -> Result<Self, ProvisionError> {
        Self::new(config.base_url.clone(), config.max_redirects)
    }

    /// Enable or disable the console progress line
    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// URL of a model file on the host
    pub fn model_url(&self, remote_name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), remote_name)
    }

    /// Ensure the model exists at its local path, downloading it if missing
    ///
    /// # Errors
    /// Returns [`ProvisionError::Download`] on network, HTTP or filesystem failure
    pub async fn ensure(&self, model: &ModelDescriptor) -> Result<Provisioned, ProvisionError> {
        if model.local_path.exists() {
            tracing::info!(
                path = %model.local_path.display(),
                "model already exists, skipping download"
            );
            return Ok(Provisioned::AlreadyPresent);
        }

        let url = self.model_url(&model.remote_name);

        tracing::info!(
            model = %model.remote_name,
            path = %model.local_path.display(),
            "model not found, starting download"
        );
        println!("Model not found at: {}", model.local_path.display());
        println!("Downloading {}...", model.remote_name);
        println!("This may take a few minutes depending on your connection.\n");

        match self.download(&url, &model.local_path).await {
            Ok(bytes) => {
                println!("Model saved to: {}\n", model.local_path.display());
                Ok(Provisioned::Downloaded { bytes })
            }
            Err(source) => Err(ProvisionError::Download {
                url,
                path: model.local_path.clone(),
                source,
            }),
        }
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let (response, redirect_depth) = self.follow_redirects(url).await?;

        // Write next to the destination, then rename into place
        let temp_path = destination.with_extension("tmp");
        let bytes = match self.write_body(response, redirect_depth, &temp_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&temp_path, destination)
            .await
            .map_err(|source| DownloadError::Io {
                path: destination.to_path_buf(),
                source,
            })?;

        tracing::info!(
            path = %destination.display(),
            size = bytes,
            redirects = redirect_depth,
            "model downloaded successfully"
        );

        Ok(bytes)
    }

    async fn follow_redirects(&self, url: &str) -> Result<(Response, u32), DownloadError> {
        let mut current = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        let mut depth = 0;

        loop {
            println!("Downloading from {current}...");

            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|source| DownloadError::Request {
                    url: current.to_string(),
                    source,
                })?;

            let status = response.status();
            if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .ok_or_else(|| DownloadError::MissingLocation {
                        url: current.to_string(),
                    })?;
                let invalid = || DownloadError::InvalidLocation {
                    url: current.to_string(),
                    location: String::from_utf8_lossy(location.as_bytes()).into_owned(),
                };
                let next = location
                    .to_str()
                    .ok()
                    .and_then(|loc| current.join(loc).ok())
                    .ok_or_else(invalid)?;

                depth += 1;
                if depth > self.max_redirects {
                    return Err(DownloadError::TooManyRedirects {
                        url: url.to_owned(),
                        max: self.max_redirects,
                    });
                }

                tracing::debug!(from = %current, to = %next, depth, "following redirect");
                current = next;
                continue;
            }

            if status != StatusCode::OK {
                return Err(DownloadError::Status {
                    url: current.to_string(),
                    status,
                });
            }

            return Ok((response, depth));
        }
    }

    async fn write_body(
        &self,
        response: Response,
        redirect_depth: u32,
        temp_path: &Path,
    ) -> Result<u64, DownloadError> {
        let url = response.url().to_string();
        let io_error = |source: std::io::Error| DownloadError::Io {
            path: temp_path.to_path_buf(),
            source,
        };

        let mut session = DownloadSession::new(response.content_length(), redirect_depth);
        let bar = session.progress_bar(self.show_progress);
        let mut file = tokio::fs::File::create(temp_path).await.map_err(io_error)?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| DownloadError::Request {
                url: url.clone(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(io_error)?;
            session.advance(chunk.len());
            bar.set_position(session.bytes_received);
        }

        file.flush().await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);

        bar.finish_with_message("Download completed!");

        Ok(session.bytes_received)
    }
}
