//! Utilities to track the progression of a sync

use std::fmt::{Display, Error, Formatter};

use super::RunState;

/// An event that happens during a sync
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// Sync has not started
    NotStarted,
    /// The run entered a new state
    StateChanged(RunState),
    /// The source asks for a second authentication factor, that must be sent through the second factor channel
    AwaitingSecondFactor,
    /// Sync is in progress.
    InProgress{ step: String, items_done_already: usize, total: usize, details: String },
    /// Sync is finished
    Finished{ success: bool },
}

impl Display for SyncEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            SyncEvent::NotStarted => write!(f, "Not started"),
            SyncEvent::StateChanged(state) => write!(f, "{}...", state),
            SyncEvent::AwaitingSecondFactor => write!(f, "Waiting for the second authentication factor"),
            SyncEvent::InProgress{step, items_done_already, total, details} =>
                write!(f, "[{}] {}/{} {}", step, items_done_already, total, details),
            SyncEvent::Finished{success} => match success {
                true => write!(f, "Sync successfully finished"),
                false => write!(f, "Sync finished with errors"),
            }
        }
    }
}

impl Default for SyncEvent {
    fn default() -> Self {
        Self::NotStarted
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<SyncEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<SyncEvent>;

/// Create a feeback channel, that can be used to retrieve the current progress of a sync operation
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(SyncEvent::default())
}




/// The log sink of a sync run.
///
/// Every message goes to the `log` facade. Events are also sent to the feedback channel, if any.
pub struct SyncProgress {
    n_errors: u32,
    n_warnings: u32,
    feedback_channel: Option<FeedbackSender>
}
impl SyncProgress {
    pub fn new() -> Self {
        Self { n_errors: 0, n_warnings: 0, feedback_channel: None }
    }
    pub fn new_with_feedback_channel(channel: FeedbackSender) -> Self {
        Self { n_errors: 0, n_warnings: 0, feedback_channel: Some(channel) }
    }


    pub fn is_success(&self) -> bool {
        self.n_errors == 0
    }
    pub fn n_errors(&self) -> u32 { self.n_errors }
    pub fn n_warnings(&self) -> u32 { self.n_warnings }

    /// Log an error
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
        self.n_errors += 1;
    }
    /// Log a warning
    pub fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.n_warnings += 1;
    }
    /// Log an info
    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }
    /// Log a debug message
    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }
    /// Log a trace message
    pub fn trace(&mut self, text: &str) {
        log::trace!("{}", text);
    }
    /// Send an event as a feedback to the listener (if any).
    pub fn feedback(&mut self, event: SyncEvent) {
        if let Some(sender) = &self.feedback_channel {
            // Nobody listening is not an error
            let _ = sender.send(event);
        }
    }
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters() {
        let mut progress = SyncProgress::new();
        progress.info("starting");
        progress.warn("contact skipped");
        assert!(progress.is_success());
        progress.error("PUT failed");
        assert!(progress.is_success() == false);
        assert_eq!(progress.n_errors(), 1);
        assert_eq!(progress.n_warnings(), 1);
    }

    #[test]
    fn feedback_reaches_the_listener() {
        let (sender, receiver) = feedback_channel();
        let mut progress = SyncProgress::new_with_feedback_channel(sender);
        assert_eq!(*receiver.borrow(), SyncEvent::NotStarted);

        progress.feedback(SyncEvent::AwaitingSecondFactor);
        assert_eq!(*receiver.borrow(), SyncEvent::AwaitingSecondFactor);

        drop(receiver);
        progress.feedback(SyncEvent::Finished{ success: true });
    }

    #[test]
    fn event_display() {
        let event = SyncEvent::InProgress{ step: "uploading".into(), items_done_already: 3, total: 10, details: "Ada".into() };
        assert_eq!(event.to_string(), "[uploading] 3/10 Ada");
    }
}
