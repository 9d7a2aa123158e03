//! Poll session timer.
//!
//! A [`PollSession`] owns the timer task for the active conversation. It is
//! an explicit object with `start` / `stop`, owned by the client; there is no
//! process-wide timer. Dropping the session stops the task.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use chat_core::PollPolicy;
use chat_types::ConversationId;

/// What one tick accomplished, reported back to the timer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A fetch completed and was reconciled.
    Fetched,
    /// The fetch failed; the view kept its last good state.
    Failed,
    /// A fetch was already outstanding; nothing was issued.
    Skipped,
    /// The session is no longer current; the loop should end.
    Closed,
}

/// Timer task bound to one conversation.
#[derive(Debug, Default)]
pub struct PollSession {
    conversation: Option<ConversationId>,
    handle: Option<JoinHandle<()>>,
}

impl PollSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start polling `conversation`, stopping any previous timer first.
    ///
    /// The first tick fires immediately; later ticks follow `policy`. Ticks
    /// run one after another inside the task, so a slow tick delays the
    /// next one instead of overlapping it. Missed ticks are skipped, not
    /// bursted.
    pub fn start<F, Fut>(&mut self, conversation: ConversationId, policy: PollPolicy, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        self.stop();

        tracing::info!(
            "Poll session started for conversation {} (interval: {}ms)",
            conversation,
            policy.period().as_millis()
        );

        let handle = tokio::spawn(async move {
            let mut ticker = interval(policy.period());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut failures: u32 = 0;

            loop {
                ticker.tick().await;

                match tick().await {
                    TickOutcome::Closed => {
                        tracing::debug!("Poll session for conversation {} closed", conversation);
                        return;
                    }
                    TickOutcome::Failed => failures = failures.saturating_add(1),
                    TickOutcome::Fetched => failures = 0,
                    TickOutcome::Skipped => {}
                }

                let extra = policy.extra_delay(failures);
                if !extra.is_zero() {
                    tracing::debug!(
                        "Backing off {}ms after {} failed tick(s)",
                        extra.as_millis(),
                        failures
                    );
                    tokio::time::sleep(extra).await;
                    ticker.reset();
                }
            }
        });

        self.conversation = Some(conversation);
        self.handle = Some(handle);
    }

    /// Stop the timer. Any fetch the task was awaiting is cancelled.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            if let Some(conversation) = self.conversation.take() {
                tracing::info!("Poll session stopped for conversation {}", conversation);
            }
        }
        self.conversation = None;
    }

    /// Whether a timer task is running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// The conversation being polled.
    pub fn conversation(&self) -> Option<ConversationId> {
        self.conversation
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const CHAT: ConversationId = ConversationId::new(1);

    fn counting(
        counter: &Arc<AtomicUsize>,
        outcome: TickOutcome,
    ) -> impl FnMut() -> std::future::Ready<TickOutcome> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(outcome)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_immediate() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut session = PollSession::new();

        session.start(CHAT, PollPolicy::default(), counting(&ticks, TickOutcome::Fetched));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert!(session.is_running());
        assert_eq!(session.conversation(), Some(CHAT));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_fixed_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut session = PollSession::new();

        session.start(CHAT, PollPolicy::default(), counting(&ticks, TickOutcome::Fetched));
        // t=0, 3s, 6s, 9s
        tokio::time::sleep(Duration::from_millis(9_500)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_fixed_schedule() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut session = PollSession::new();

        session.start(CHAT, PollPolicy::default(), counting(&ticks, TickOutcome::Failed));
        tokio::time::sleep(Duration::from_millis(9_500)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        assert!(session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_spaces_out_failed_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut session = PollSession::new();
        let policy =
            PollPolicy::fixed(Duration::from_secs(3)).with_backoff(Duration::from_secs(60));

        session.start(CHAT, policy, counting(&ticks, TickOutcome::Failed));
        // t=0 fail, next at 6s fail, next at 6+12=18s
        tokio::time::sleep(Duration::from_millis(17_000)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut session = PollSession::new();

        session.start(CHAT, PollPolicy::default(), counting(&ticks, TickOutcome::Fetched));
        tokio::time::sleep(Duration::from_millis(1)).await;
        session.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert!(!session.is_running());
        assert_eq!(session.conversation(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_timer() {
        let old = Arc::new(AtomicUsize::new(0));
        let new = Arc::new(AtomicUsize::new(0));
        let mut session = PollSession::new();

        session.start(CHAT, PollPolicy::default(), counting(&old, TickOutcome::Fetched));
        tokio::time::sleep(Duration::from_millis(1)).await;
        session.start(
            ConversationId::new(2),
            PollPolicy::default(),
            counting(&new, TickOutcome::Fetched),
        );
        tokio::time::sleep(Duration::from_millis(6_500)).await;

        assert_eq!(old.load(Ordering::SeqCst), 1);
        assert_eq!(new.load(Ordering::SeqCst), 3);
        assert_eq!(session.conversation(), Some(ConversationId::new(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_outcome_ends_the_task() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut session = PollSession::new();

        session.start(CHAT, PollPolicy::default(), counting(&ticks, TickOutcome::Closed));
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert!(!session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_timer() {
        let ticks = Arc::new(AtomicUsize::new(0));
        {
            let mut session = PollSession::new();
            session.start(CHAT, PollPolicy::default(), counting(&ticks, TickOutcome::Fetched));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }
}
