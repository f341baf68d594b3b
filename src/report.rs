/// Write-only sink for integer progress milestones.
pub type ProgressSink = Box<dyn FnMut(u32) + Send>;

/// Write-only sink for free-text status lines.
pub type LogSink = Box<dyn FnMut(&str) + Send>;

/// Fixed progress milestones, emitted in this order by the pipeline.
pub mod milestone {
    pub const START: u32 = 10;
    pub const AUDIO_DECODED: u32 = 20;
    pub const AUDIO_ANALYZED: u32 = 30;
    pub const BACKGROUND: u32 = 40;
    pub const VISUALIZATION: u32 = 60;
    pub const HEADING: u32 = 70;
    pub const COMPOSED: u32 = 80;
    pub const DONE: u32 = 100;

    pub const SEQUENCE: [u32; 8] = [
        START,
        AUDIO_DECODED,
        AUDIO_ANALYZED,
        BACKGROUND,
        VISUALIZATION,
        HEADING,
        COMPOSED,
        DONE,
    ];
}

/// Progress and log reporting threaded through every pipeline stage.
///
/// Both sinks are optional. Without a log sink, status lines go to the
/// `log` crate instead. Milestones are forwarded monotonically: a value
/// below the last reported one is dropped.
pub struct Reporter {
    progress: Option<ProgressSink>,
    log: Option<LogSink>,
    last_progress: u32,
}

impl Reporter {
    pub fn new(progress: Option<ProgressSink>, log: Option<LogSink>) -> Self {
        Self {
            progress,
            log,
            last_progress: 0,
        }
    }

    /// Reporter with no sinks: milestones are dropped, lines go to the console.
    pub fn console() -> Self {
        Self::new(None, None)
    }

    pub fn progress(&mut self, pct: u32) {
        if pct < self.last_progress {
            return;
        }
        self.last_progress = pct;
        if let Some(sink) = self.progress.as_mut() {
            sink(pct);
        }
    }

    pub fn log(&mut self, line: &str) {
        match self.log.as_mut() {
            Some(sink) => sink(line),
            None => log::info!("{}", line),
        }
    }
}
