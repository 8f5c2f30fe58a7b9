use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// One turn in the conversation log.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
}

/// Notification raised by [`Conversation::poll`] when a deferred effect lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatUpdate {
    ReplyDelivered,
    TranscriptReady,
}

/// A reply timer armed by `submit_message`, paired with the text it answers.
struct PendingReply {
    timer: JoinHandle<()>,
    query: String,
}

/// Owns the message log, draft input, and recording state for one chat
/// session. All mutation happens on the event-loop task; the spawned timer
/// tasks only sleep, and their handles live here so teardown or a manual
/// recording stop can cancel them.
pub struct Conversation {
    messages: Vec<Message>,
    draft_input: String,
    pending_replies: VecDeque<PendingReply>,
    recording_timer: Option<JoinHandle<()>>,
    next_id: u64,
    rng: StdRng,
    config: Config,
}

impl Conversation {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Seedable constructor so demos and tests can pin the reply draw.
    ///
    /// The corpus must be non-empty (`Config::validate` enforces this at
    /// startup); a reply can never be drawn from nothing.
    pub fn with_rng(config: Config, rng: StdRng) -> Self {
        debug_assert!(
            !config.response_corpus.is_empty(),
            "response corpus must not be empty"
        );
        Self {
            messages: Vec::new(),
            draft_input: String::new(),
            pending_replies: VecDeque::new(),
            recording_timer: None,
            next_id: 0,
            rng,
            config,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft_input(&self) -> &str {
        &self.draft_input
    }

    /// True from a recording start until the auto-stop fires or a manual
    /// toggle cancels it.
    pub fn is_recording(&self) -> bool {
        self.recording_timer.is_some()
    }

    /// True while at least one simulated reply is still on its way. The UI
    /// disables the send affordance on this; the controller itself keeps
    /// accepting submissions.
    pub fn is_awaiting_response(&self) -> bool {
        !self.pending_replies.is_empty()
    }

    pub fn max_input_length(&self) -> usize {
        self.config.max_input_length
    }

    /// Plain assignment to the draft buffer, clamped to the configured
    /// character budget. Never touches the message log or the flags.
    pub fn set_draft_input(&mut self, text: impl Into<String>) {
        self.draft_input = clamp_chars(text.into(), self.config.max_input_length);
    }

    /// Commits the draft-style input as a user message and arms exactly one
    /// reply timer. Whitespace-only input is a no-op and returns `false`.
    pub fn submit_message(&mut self, raw: &str) -> bool {
        let text = raw.trim();
        if text.is_empty() {
            return false;
        }
        let text = clamp_chars(text.to_string(), self.config.max_input_length);

        debug!(len = text.chars().count(), "user message submitted");
        self.push_message(Sender::User, text.clone());
        self.draft_input.clear();

        let delay = Duration::from_millis(self.config.response_delay_ms);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
        });
        self.pending_replies.push_back(PendingReply { timer, query: text });
        true
    }

    /// Flips between idle and recording. Starting arms the auto-stop timer;
    /// stopping by hand cancels it, so only one of {manual stop, timeout}
    /// ever takes effect.
    pub fn toggle_recording(&mut self) {
        match self.recording_timer.take() {
            Some(timer) => {
                timer.abort();
                debug!("recording stopped manually");
            }
            None => {
                let duration = Duration::from_millis(self.config.recording_duration_ms);
                self.recording_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                }));
                debug!("recording started");
            }
        }
    }

    /// Drains completed timers and applies their effects. Called from the UI
    /// tick; returns what happened so the presentation layer can react
    /// (scroll to bottom, show a transcript notice).
    pub fn poll(&mut self) -> Vec<ChatUpdate> {
        let mut updates = Vec::new();

        let recording_done = self
            .recording_timer
            .as_ref()
            .map(|t| t.is_finished())
            .unwrap_or(false);
        if recording_done {
            self.recording_timer = None;
            self.draft_input = clamp_chars(
                self.config.transcript_placeholder.clone(),
                self.config.max_input_length,
            );
            debug!("recording finished, transcript placed in draft");
            updates.push(ChatUpdate::TranscriptReady);
        }

        // Delays are uniform, so FIFO order is completion order. Each armed
        // timer delivers exactly once.
        loop {
            let front_done = self
                .pending_replies
                .front()
                .map(|p| p.timer.is_finished())
                .unwrap_or(false);
            if !front_done {
                break;
            }
            if let Some(pending) = self.pending_replies.pop_front() {
                self.deliver_response(&pending.query);
                updates.push(ChatUpdate::ReplyDelivered);
            }
        }

        updates
    }

    fn deliver_response(&mut self, query: &str) {
        let template = pick_reply(&self.config.response_corpus, &mut self.rng);
        // The template may carry a {query} slot; the draw itself is never
        // conditioned on the user's text.
        let text = template.replace("{query}", query);
        debug!("assistant reply delivered");
        self.push_message(Sender::Assistant, text);
    }

    fn push_message(&mut self, sender: Sender, text: String) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message { id, text, sender });
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        // A timer must never outlive the session it would mutate.
        if let Some(timer) = self.recording_timer.take() {
            timer.abort();
        }
        for pending in self.pending_replies.drain(..) {
            pending.timer.abort();
        }
    }
}

/// Uniform draw from the response corpus. Pure in the corpus; the RNG is
/// injected so callers can pin the selection.
pub fn pick_reply<'a>(corpus: &'a [String], rng: &mut impl Rng) -> &'a str {
    &corpus[rng.gen_range(0..corpus.len())]
}

fn clamp_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        text
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            response_delay_ms: 2000,
            recording_duration_ms: 3000,
            max_input_length: 500,
            response_corpus: vec![
                "For \"{query}\", I'd start with maize this season.".to_string(),
            ],
            transcript_placeholder: "I have sandy soil and low rainfall".to_string(),
        }
    }

    fn conversation() -> Conversation {
        Conversation::with_rng(test_config(), StdRng::seed_from_u64(7))
    }

    async fn wait_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn submit_appends_user_message_and_clears_draft() {
        let mut chat = conversation();
        chat.set_draft_input("  what grows in clay soil?  ");

        assert!(chat.submit_message("  what grows in clay soil?  "));

        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].sender, Sender::User);
        assert_eq!(chat.messages()[0].text, "what grows in clay soil?");
        assert_eq!(chat.draft_input(), "");
        assert!(chat.is_awaiting_response());
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_submit_is_a_noop() {
        let mut chat = conversation();

        assert!(!chat.submit_message(""));
        assert!(!chat.submit_message("   "));
        assert!(!chat.submit_message("\t\n"));

        assert!(chat.messages().is_empty());
        assert!(!chat.is_awaiting_response());
    }

    #[tokio::test(start_paused = true)]
    async fn reply_arrives_only_after_the_delay() {
        let mut chat = conversation();
        chat.submit_message("loamy soil, full sun");

        wait_ms(1000).await;
        assert!(chat.poll().is_empty());
        assert!(chat.is_awaiting_response());
        assert_eq!(chat.messages().len(), 1);

        wait_ms(1100).await;
        let updates = chat.poll();
        assert_eq!(updates, vec![ChatUpdate::ReplyDelivered]);
        assert!(!chat.is_awaiting_response());

        assert_eq!(chat.messages().len(), 2);
        let reply = &chat.messages()[1];
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(
            reply.text,
            "For \"loamy soil, full sun\", I'd start with maize this season."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resubmission_while_awaiting_is_accepted() {
        let mut chat = conversation();
        chat.submit_message("first");
        chat.submit_message("second");
        assert_eq!(chat.messages().len(), 2);

        wait_ms(2100).await;
        let updates = chat.poll();
        assert_eq!(updates.len(), 2);
        assert!(!chat.is_awaiting_response());

        let texts: Vec<&str> = chat.messages().iter().map(|m| m.text.as_str()).collect();
        assert!(texts[2].contains("first"));
        assert!(texts[3].contains("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_stop_cancels_the_pending_transcript() {
        let mut chat = conversation();
        chat.toggle_recording();
        assert!(chat.is_recording());

        wait_ms(1000).await;
        chat.toggle_recording();
        assert!(!chat.is_recording());

        // Well past the original auto-stop deadline: nothing may fire.
        wait_ms(5000).await;
        assert!(chat.poll().is_empty());
        assert_eq!(chat.draft_input(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn recording_timeout_populates_the_placeholder() {
        let mut chat = conversation();
        chat.toggle_recording();

        wait_ms(3100).await;
        let updates = chat.poll();
        assert_eq!(updates, vec![ChatUpdate::TranscriptReady]);
        assert!(!chat.is_recording());
        assert_eq!(chat.draft_input(), "I have sandy soil and low rainfall");
    }

    #[tokio::test(start_paused = true)]
    async fn ids_strictly_increase_across_turns() {
        let mut chat = conversation();

        chat.submit_message("a");
        wait_ms(2100).await;
        chat.poll();
        chat.submit_message("b");
        wait_ms(2100).await;
        chat.poll();

        let senders: Vec<Sender> = chat.messages().iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![Sender::User, Sender::Assistant, Sender::User, Sender::Assistant]
        );
        assert_eq!(chat.messages()[0].text, "a");
        assert_eq!(chat.messages()[2].text, "b");
        for pair in chat.messages().windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn set_draft_input_is_idempotent_and_clamped() {
        let mut config = test_config();
        config.max_input_length = 5;
        let mut chat = Conversation::with_rng(config, StdRng::seed_from_u64(7));

        chat.set_draft_input("hello world");
        assert_eq!(chat.draft_input(), "hello");

        for _ in 0..3 {
            chat.set_draft_input("hello");
        }
        assert_eq!(chat.draft_input(), "hello");
        assert!(chat.messages().is_empty());
        assert!(!chat.is_recording());
        assert!(!chat.is_awaiting_response());
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "response corpus must not be empty")]
    async fn empty_corpus_is_rejected_at_construction() {
        let mut config = test_config();
        config.response_corpus.clear();
        let _ = Conversation::with_rng(config, StdRng::seed_from_u64(0));
    }

    #[tokio::test(start_paused = true)]
    async fn seeded_sessions_draw_the_same_replies() {
        let corpus: Vec<String> = vec![
            "Maize suits that.".to_string(),
            "Cassava would cope well.".to_string(),
            "Consider sorghum.".to_string(),
        ];
        let mut config = test_config();
        config.response_corpus = corpus;

        let mut a = Conversation::with_rng(config.clone(), StdRng::seed_from_u64(42));
        let mut b = Conversation::with_rng(config, StdRng::seed_from_u64(42));

        for chat in [&mut a, &mut b] {
            chat.submit_message("red earth");
            chat.submit_message("black cotton soil");
        }
        wait_ms(2100).await;
        a.poll();
        b.poll();

        let texts_a: Vec<&str> = a.messages().iter().map(|m| m.text.as_str()).collect();
        let texts_b: Vec<&str> = b.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts_a, texts_b);
    }
}
