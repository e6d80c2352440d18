use indicatif::{ProgressBar, ProgressState, ProgressStyle};

const MIB: f64 = 1024.0 * 1024.0;

/// Transient state of one model download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSession {
    /// Bytes written so far
    pub bytes_received: u64,
    /// Size announced by `content-length`, if any
    pub total_bytes: Option<u64>,
    /// Redirects followed before the final response
    pub redirect_depth: u32,
}

impl DownloadSession {
    /// Start a session after `redirect_depth` redirects
    pub const fn new(total_bytes: Option<u64>, redirect_depth: u32) -> Self {
        // A zero length header carries no progress information
        let total_bytes = match total_bytes {
            Some(0) => None,
            other => other,
        };
        Self {
            bytes_received: 0,
            total_bytes,
            redirect_depth,
        }
    }

    /// Record a received chunk
    pub fn advance(&mut self, len: usize) {
        self.bytes_received = self.bytes_received.saturating_add(len as u64);
    }

    /// Percentage complete, only known when the total size is
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        self.total_bytes
            .map(|total| self.bytes_received as f64 / total as f64 * 100.0)
    }

    /// Progress bar for this session
    ///
    /// Hidden when `visible` is false or the size is unknown, so downloads
    /// without `content-length` proceed silently.
    pub fn progress_bar(&self, visible: bool) -> ProgressBar {
        match self.total_bytes {
            Some(total) if visible => {
                let bar = ProgressBar::new(total);
                bar.set_style(progress_style());
                bar
            }
            _ => ProgressBar::hidden(),
        }
    }
}

/// `Progress: 50.0% (1.0MB / 2.0MB)`
#[allow(clippy::cast_precision_loss)]
pub fn format_progress(received: u64, total: u64) -> String {
    let percent = if total == 0 {
        100.0
    } else {
        received as f64 / total as f64 * 100.0
    };
    format!(
        "Progress: {percent:.1}% ({:.1}MB / {:.1}MB)",
        received as f64 / MIB,
        total as f64 / MIB
    )
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{progress} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("progress", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let total = state.len().unwrap_or(0);
            let _ = w.write_str(&format_progress(state.pos(), total));
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let mut session = DownloadSession::new(Some(2 * 1024 * 1024), 0);
        session.advance(1024 * 1024);

        assert_eq!(session.percent(), Some(50.0));
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(
            format_progress(1024 * 1024, 2 * 1024 * 1024),
            "Progress: 50.0% (1.0MB / 2.0MB)"
        );
        assert_eq!(format_progress(0, 0), "Progress: 100.0% (0.0MB / 0.0MB)");
    }

    #[test]
    fn test_unknown_length_has_no_percent() {
        let mut session = DownloadSession::new(None, 1);
        session.advance(4096);

        assert_eq!(session.bytes_received, 4096);
        assert!(session.percent().is_none());
        assert!(session.progress_bar(true).is_hidden());
    }

    #[test]
    fn test_zero_length_treated_as_unknown() {
        let session = DownloadSession::new(Some(0), 0);
        assert!(session.total_bytes.is_none());
    }

    #[test]
    fn test_progress_bar_sized_from_total() {
        let session = DownloadSession::new(Some(10_000), 0);
        let bar = session.progress_bar(true);

        assert_eq!(bar.length(), Some(10_000));
        bar.inc(2_500);
        assert_eq!(bar.position(), 2_500);
        bar.finish_and_clear();
    }

    #[test]
    fn test_progress_bar_hidden_when_disabled() {
        let session = DownloadSession::new(Some(10_000), 0);
        assert!(session.progress_bar(false).is_hidden());
    }
}
