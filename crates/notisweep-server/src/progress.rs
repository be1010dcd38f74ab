use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{bar:40} {percent}% {pos}";

/// Terminal progress bar for a sweep, or plain log lines when disabled.
pub struct SweepProgress {
    bar: Option<ProgressBar>,
}

impl SweepProgress {
    /// A bar is drawn only when enabled, there is at least one item and
    /// stderr is a terminal.
    pub fn new(enabled: bool, total: usize) -> Self {
        if !enabled || total == 0 {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(total as u64);
        match ProgressStyle::with_template(TEMPLATE) {
            Ok(style) => bar.set_style(style),
            Err(e) => tracing::debug!(error = %e, "Falling back to default progress style"),
        }
        Self::from_bar(bar)
    }

    /// indicatif drops `println` output on a hidden bar, so a hidden bar is
    /// replaced by plain log lines.
    fn from_bar(bar: ProgressBar) -> Self {
        Self {
            bar: (!bar.is_hidden()).then_some(bar),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Print a line above the bar, or log it when there is no bar.
    pub fn message(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => tracing::info!("{line}"),
        }
    }

    pub fn tick(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }

    /// Leave the bar where it stopped.
    pub fn abandon(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }
}
