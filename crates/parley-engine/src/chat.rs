// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer-facing conversation service.
//!
//! Orchestrates one customer turn end to end: rate limit, intake, sentiment,
//! completion (bounded by a timeout), escalation, persistence, fan-out.
//! Storage failures on this path divert into degraded mode -- the customer
//! always receives some reply, even when nothing can be persisted.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use parley_config::model::{EscalationConfig, ParleyConfig};
use parley_core::{
    now_rfc3339, Assignee, ChatEvent, ChatMessage, CompletionEngine, CompletionOutcome,
    Conversation, ConversationStatus, ConversationStore, EscalationVerdict, LeadContact, Notifier,
    ParleyError, RealtimeChannel, Sender, SessionToken, TranscriptTurn,
};
use parley_session::{token as session_token, RateLimiter};

use crate::escalation::{classify_sentiment, decide, EscalationInput};
use crate::fanout::broadcast;
use crate::pipeline::MessagePipeline;
use crate::state::{transition, StatusEvent};

/// Fixed reply substituted when the completion engine fails or times out,
/// and the floor of degraded mode.
pub const FALLBACK_REPLY: &str = "I'm sorry, I'm having trouble responding right now. \
     A member of our support team will follow up with you shortly. \
     If it's urgent, please email us at support@parley.chat.";

/// Result of starting or resuming a session.
#[derive(Debug)]
pub struct SessionStart {
    pub token: SessionToken,
    pub conversation: Conversation,
    /// True when an existing live conversation was resumed.
    pub resumed: bool,
    /// Full transcript of the resumed conversation; empty for a new one.
    pub history: Vec<ChatMessage>,
}

/// Acknowledgement of one customer message.
#[derive(Debug)]
pub struct CustomerReply {
    /// Durable message id, or a synthetic placeholder in degraded mode.
    pub message_id: String,
    /// The persisted customer record; `None` in degraded mode.
    pub message: Option<ChatMessage>,
    /// The persisted assistant reply, when one was generated and stored.
    pub reply: Option<ChatMessage>,
    /// Reply text, present whenever the assistant responded -- including
    /// degraded mode, where nothing was persisted.
    pub reply_text: Option<String>,
    /// Conversation status after this turn; unknown in degraded mode.
    pub status: Option<ConversationStatus>,
    pub degraded: bool,
}

/// The customer-facing conversation engine.
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionEngine>,
    realtime: Arc<dyn RealtimeChannel>,
    notifier: Arc<dyn Notifier>,
    limiter: Arc<RateLimiter>,
    pipeline: MessagePipeline,
    escalation: EscalationConfig,
    completion_timeout: Duration,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionEngine>,
        realtime: Arc<dyn RealtimeChannel>,
        notifier: Arc<dyn Notifier>,
        limiter: Arc<RateLimiter>,
        config: &ParleyConfig,
    ) -> Self {
        Self {
            pipeline: MessagePipeline::new(Arc::clone(&store)),
            store,
            completion,
            realtime,
            notifier,
            limiter,
            escalation: config.escalation.clone(),
            completion_timeout: Duration::from_secs(config.completion.timeout_secs),
        }
    }

    /// Start a new conversation, or resume the live conversation owning
    /// `token`. An unknown or dead token (including a resolved
    /// conversation's) silently yields a fresh conversation under a fresh
    /// token; resolved conversations are never resumed.
    pub async fn start_session(
        &self,
        token: Option<&str>,
        context: Option<String>,
    ) -> Result<SessionStart, ParleyError> {
        if let Some(existing) = token {
            if let Some(conversation) = self.store.find_by_token(existing).await? {
                let history = self.store.messages_for(&conversation.id, None).await?;
                return Ok(SessionStart {
                    token: SessionToken(existing.to_string()),
                    conversation,
                    resumed: true,
                    history,
                });
            }
        }

        let token = session_token::issue();
        let now = now_rfc3339();
        let conversation = Conversation {
            id: uuid::Uuid::new_v4().to_string(),
            session_token: token.as_str().to_string(),
            status: ConversationStatus::Active,
            assignee: Assignee::Ai,
            requires_human: false,
            sentiment: None,
            context,
            lead: None,
            created_at: now.clone(),
            updated_at: now,
        };
        self.store.create_conversation(&conversation).await?;
        info!(conversation_id = %conversation.id, "conversation started");
        Ok(SessionStart {
            token,
            conversation,
            resumed: false,
            history: Vec::new(),
        })
    }

    /// Transcript of the live conversation owning `token`.
    pub async fn history(
        &self,
        token: &str,
    ) -> Result<(Conversation, Vec<ChatMessage>), ParleyError> {
        let conversation = self
            .store
            .find_by_token(token)
            .await?
            .ok_or_else(|| ParleyError::Validation("unknown or expired session".into()))?;
        let messages = self.store.messages_for(&conversation.id, None).await?;
        Ok((conversation, messages))
    }

    /// Handle one customer message end to end.
    ///
    /// Rate limit violations and validation errors propagate (no state
    /// change); storage failures divert into degraded mode instead of
    /// surfacing.
    pub async fn handle_customer_message(
        &self,
        token: &str,
        body: &str,
    ) -> Result<CustomerReply, ParleyError> {
        self.limiter.check(token)?;

        let conversation = match self.store.find_by_token(token).await {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                return Err(ParleyError::Validation("unknown or expired session".into()))
            }
            Err(e) if e.is_store_failure() => {
                warn!(error = %e, "store unavailable, entering degraded mode");
                return Ok(self.degraded_reply(body).await);
            }
            Err(e) => return Err(e),
        };

        let sentiment = classify_sentiment(body);
        let metadata = serde_json::json!({ "sentiment": sentiment }).to_string();
        let message = match self
            .pipeline
            .submit(&conversation, Sender::Customer, body, Some(metadata))
            .await
        {
            Ok(message) => message,
            Err(e) if e.is_store_failure() => {
                warn!(error = %e, "message persist failed, entering degraded mode");
                return Ok(self.degraded_reply(body).await);
            }
            Err(e) => return Err(e),
        };
        broadcast(
            &self.realtime,
            token,
            &ChatEvent::MessageCreated {
                message: message.clone(),
            },
        )
        .await;

        if let Err(e) = self.store.set_sentiment(&conversation.id, sentiment).await {
            // The message itself is durable; a failed sentiment tag is not
            // worth degrading over.
            warn!(error = %e, conversation_id = %conversation.id, "sentiment update failed");
        }

        let history = match self.store.messages_for(&conversation.id, None).await {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "history fetch failed, completing on current message only");
                vec![message.clone()]
            }
        };

        // A human agent owns the reply; the assistant stays silent.
        if conversation.assignee.is_human()
            || conversation.status == ConversationStatus::HumanHandling
        {
            return Ok(CustomerReply {
                message_id: message.id.clone(),
                message: Some(message),
                reply: None,
                reply_text: None,
                status: Some(conversation.status),
                degraded: false,
            });
        }

        // Explicit human request: escalate immediately and generate no
        // automated reply this turn.
        if sentiment == parley_core::Sentiment::NeedsHuman {
            let verdict = decide(
                &EscalationInput {
                    sentiment,
                    assistant_flagged: false,
                    confidence: 1.0,
                    message_count: history.len(),
                },
                &self.escalation,
            );
            let status = self.escalate(&conversation, &verdict).await;
            return Ok(CustomerReply {
                message_id: message.id.clone(),
                message: Some(message),
                reply: None,
                reply_text: None,
                status: Some(status),
                degraded: false,
            });
        }

        let transcript: Vec<TranscriptTurn> = history
            .iter()
            .map(|m| TranscriptTurn {
                role: m.sender,
                text: m.body.clone(),
            })
            .collect();
        let outcome = self
            .complete_bounded(&transcript, conversation.context.as_deref())
            .await;

        let verdict = decide(
            &EscalationInput {
                sentiment,
                assistant_flagged: outcome.flagged_for_human,
                confidence: outcome.confidence,
                message_count: history.len(),
            },
            &self.escalation,
        );

        let status = if verdict.requires_human {
            self.escalate(&conversation, &verdict).await
        } else {
            self.mark_assistant_replied(&conversation).await
        };

        let reply_metadata = serde_json::json!({
            "confidence": outcome.confidence,
            "flagged_for_human": outcome.flagged_for_human,
        })
        .to_string();
        let reply = match self
            .pipeline
            .submit(&conversation, Sender::Assistant, &outcome.text, Some(reply_metadata))
            .await
        {
            Ok(reply) => {
                broadcast(
                    &self.realtime,
                    token,
                    &ChatEvent::MessageCreated {
                        message: reply.clone(),
                    },
                )
                .await;
                Some(reply)
            }
            Err(e) => {
                // The customer message is durable; deliver the reply text
                // transiently rather than fail the turn.
                warn!(error = %e, "assistant reply persist failed");
                None
            }
        };

        Ok(CustomerReply {
            message_id: message.id.clone(),
            message: Some(message),
            reply,
            reply_text: Some(outcome.text),
            status: Some(status),
            degraded: false,
        })
    }

    /// Capture lead contact details for the live conversation owning
    /// `token`. All three fields are required.
    pub async fn capture_lead(&self, token: &str, lead: &LeadContact) -> Result<(), ParleyError> {
        let name = lead.name.trim();
        let email = lead.email.trim();
        let phone = lead.phone.trim();
        if name.is_empty() || email.is_empty() || phone.is_empty() {
            return Err(ParleyError::Validation(
                "lead capture requires name, email, and phone".into(),
            ));
        }
        if !email.contains('@') {
            return Err(ParleyError::Validation("invalid email address".into()));
        }

        let conversation = self
            .store
            .find_by_token(token)
            .await?
            .ok_or_else(|| ParleyError::Validation("unknown or expired session".into()))?;
        let lead = LeadContact {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        };
        self.store.set_lead(&conversation.id, &lead).await?;

        broadcast(
            &self.realtime,
            token,
            &ChatEvent::LeadCaptured {
                conversation_id: conversation.id.clone(),
            },
        )
        .await;
        self.spawn_notify(
            "New lead captured".to_string(),
            format!(
                "Conversation {}: {} <{}> ({})",
                conversation.id, lead.name, lead.email, lead.phone
            ),
        );
        Ok(())
    }

    /// Bound the completion call; on error or timeout substitute the fixed
    /// fallback with zero confidence so the escalation engine hands off.
    async fn complete_bounded(
        &self,
        transcript: &[TranscriptTurn],
        context: Option<&str>,
    ) -> CompletionOutcome {
        match timeout(
            self.completion_timeout,
            self.completion.complete(transcript, context),
        )
        .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(error = %e, "completion failed, substituting fallback reply");
                Self::fallback_outcome()
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.completion_timeout.as_secs(),
                    "completion timed out, substituting fallback reply"
                );
                Self::fallback_outcome()
            }
        }
    }

    fn fallback_outcome() -> CompletionOutcome {
        CompletionOutcome {
            text: FALLBACK_REPLY.to_string(),
            flagged_for_human: false,
            confidence: 0.0,
        }
    }

    /// Apply an escalation verdict: flip status at most once, but always
    /// report the reasons to administrators.
    async fn escalate(
        &self,
        conversation: &Conversation,
        verdict: &EscalationVerdict,
    ) -> ConversationStatus {
        let status = match transition(conversation.status, &StatusEvent::EscalationRequired) {
            Ok(t) => {
                if t.changed {
                    if let Err(e) = self
                        .store
                        .update_status(&conversation.id, t.next, &Assignee::Ai, true)
                        .await
                    {
                        warn!(error = %e, conversation_id = %conversation.id, "escalation status write failed");
                    }
                }
                t.next
            }
            Err(rejected) => {
                warn!(conversation_id = %conversation.id, %rejected, "escalation rejected");
                conversation.status
            }
        };

        broadcast(
            &self.realtime,
            &conversation.session_token,
            &ChatEvent::ConversationUpdated {
                conversation_id: conversation.id.clone(),
                status,
                requires_human: true,
                reasons: verdict.reasons.clone(),
            },
        )
        .await;

        let reasons: Vec<String> = verdict.reasons.iter().map(|r| r.to_string()).collect();
        info!(
            conversation_id = %conversation.id,
            reasons = %reasons.join(","),
            "conversation escalated"
        );
        self.spawn_notify(
            "Conversation needs attention".to_string(),
            format!(
                "Conversation {} requires a human ({})",
                conversation.id,
                reasons.join(", ")
            ),
        );
        status
    }

    async fn mark_assistant_replied(&self, conversation: &Conversation) -> ConversationStatus {
        match transition(conversation.status, &StatusEvent::AssistantReplied) {
            Ok(t) => {
                if t.changed {
                    if let Err(e) = self
                        .store
                        .update_status(
                            &conversation.id,
                            t.next,
                            &conversation.assignee,
                            conversation.requires_human,
                        )
                        .await
                    {
                        warn!(error = %e, conversation_id = %conversation.id, "status write failed");
                    }
                }
                t.next
            }
            Err(rejected) => {
                warn!(conversation_id = %conversation.id, %rejected, "status event rejected");
                conversation.status
            }
        }
    }

    /// Degraded mode: storage is down, nothing can be persisted, but the
    /// customer still gets an answer. Completion runs on the current
    /// message alone; if it also fails, the fixed fallback goes out.
    async fn degraded_reply(&self, body: &str) -> CustomerReply {
        let transcript = [TranscriptTurn {
            role: Sender::Customer,
            text: body.trim().to_string(),
        }];
        let outcome = self.complete_bounded(&transcript, None).await;
        CustomerReply {
            message_id: format!("degraded-{}", uuid::Uuid::new_v4()),
            message: None,
            reply: None,
            reply_text: Some(outcome.text),
            status: None,
            degraded: true,
        }
    }

    fn spawn_notify(&self, subject: String, body: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&subject, &body).await {
                warn!(error = %e, subject, "notification failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use parley_config::model::StorageConfig;
    use parley_core::Sentiment;
    use parley_realtime::InProcessBroker;
    use parley_session::InMemoryRateLimitStore;
    use parley_storage::SqliteStore;

    use crate::notify::LogNotifier;

    use super::*;

    struct ScriptedCompletion {
        outcomes: Mutex<VecDeque<CompletionOutcome>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedCompletion {
        fn new(outcomes: Vec<CompletionOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                outcomes: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                delay: Some(delay),
            }
        }

        fn confident(text: &str) -> CompletionOutcome {
            CompletionOutcome {
                text: text.to_string(),
                flagged_for_human: false,
                confidence: 0.9,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionEngine for ScriptedCompletion {
        async fn complete(
            &self,
            _history: &[TranscriptTurn],
            _context: Option<&str>,
        ) -> Result<CompletionOutcome, ParleyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.outcomes.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| Self::confident("Happy to help!")))
        }
    }

    /// Store whose every call fails, for degraded-mode coverage.
    struct DownStore;

    fn down() -> ParleyError {
        ParleyError::Store {
            source: Box::new(std::io::Error::other("store offline")),
        }
    }

    #[async_trait]
    impl ConversationStore for DownStore {
        async fn create_conversation(&self, _c: &Conversation) -> Result<(), ParleyError> {
            Err(down())
        }
        async fn get_conversation(&self, _id: &str) -> Result<Option<Conversation>, ParleyError> {
            Err(down())
        }
        async fn find_by_token(&self, _t: &str) -> Result<Option<Conversation>, ParleyError> {
            Err(down())
        }
        async fn list_conversations(
            &self,
            _s: Option<ConversationStatus>,
        ) -> Result<Vec<Conversation>, ParleyError> {
            Err(down())
        }
        async fn update_status(
            &self,
            _id: &str,
            _s: ConversationStatus,
            _a: &Assignee,
            _r: bool,
        ) -> Result<(), ParleyError> {
            Err(down())
        }
        async fn set_sentiment(&self, _id: &str, _s: Sentiment) -> Result<(), ParleyError> {
            Err(down())
        }
        async fn set_lead(&self, _id: &str, _l: &LeadContact) -> Result<(), ParleyError> {
            Err(down())
        }
        async fn append_message(&self, _m: &ChatMessage) -> Result<(), ParleyError> {
            Err(down())
        }
        async fn messages_for(
            &self,
            _id: &str,
            _limit: Option<i64>,
        ) -> Result<Vec<ChatMessage>, ParleyError> {
            Err(down())
        }
        async fn apply_intervention(
            &self,
            _id: &str,
            _s: ConversationStatus,
            _a: &Assignee,
            _r: bool,
            _m: Option<&ChatMessage>,
        ) -> Result<(), ParleyError> {
            Err(down())
        }
        async fn stale_conversations(
            &self,
            _s: &[ConversationStatus],
            _c: &str,
        ) -> Result<Vec<Conversation>, ParleyError> {
            Err(down())
        }
    }

    struct Fixture {
        service: ChatService,
        store: Arc<dyn ConversationStore>,
        completion: Arc<ScriptedCompletion>,
        _dir: TempDir,
    }

    async fn fixture(completion: ScriptedCompletion) -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage_config = StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
        };
        let store = SqliteStore::new(storage_config);
        store.initialize().await.unwrap();
        let store: Arc<dyn ConversationStore> = Arc::new(store);
        let completion = Arc::new(completion);

        let mut config = ParleyConfig::default();
        config.completion.timeout_secs = 1;
        let engine: Arc<dyn CompletionEngine> = completion.clone();
        let service = service_over(Arc::clone(&store), engine, &config);
        Fixture {
            service,
            store,
            completion,
            _dir: dir,
        }
    }

    fn service_over(
        store: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionEngine>,
        config: &ParleyConfig,
    ) -> ChatService {
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new()),
            &config.rate_limit,
        ));
        ChatService::new(
            store,
            completion,
            Arc::new(InProcessBroker::default()),
            Arc::new(LogNotifier),
            limiter,
            config,
        )
    }

    #[tokio::test]
    async fn new_session_creates_active_conversation() {
        let fx = fixture(ScriptedCompletion::new(vec![])).await;
        let start = fx.service.start_session(None, Some(r#"{"page":"/pricing"}"#.into())).await.unwrap();
        assert!(!start.resumed);
        assert_eq!(start.conversation.status, ConversationStatus::Active);
        assert_eq!(start.conversation.assignee, Assignee::Ai);
        assert!(start.history.is_empty());
    }

    #[tokio::test]
    async fn live_token_resumes_with_history() {
        let fx = fixture(ScriptedCompletion::new(vec![])).await;
        let start = fx.service.start_session(None, None).await.unwrap();
        let token = start.token.as_str().to_string();
        fx.service.handle_customer_message(&token, "hello").await.unwrap();

        let resumed = fx.service.start_session(Some(&token), None).await.unwrap();
        assert!(resumed.resumed);
        assert_eq!(resumed.conversation.id, start.conversation.id);
        assert_eq!(resumed.history.len(), 2, "customer message plus reply");
    }

    #[tokio::test]
    async fn unknown_token_yields_fresh_conversation() {
        let fx = fixture(ScriptedCompletion::new(vec![])).await;
        let start = fx.service.start_session(Some("no-such-token"), None).await.unwrap();
        assert!(!start.resumed);
        assert_ne!(start.token.as_str(), "no-such-token");
    }

    #[tokio::test]
    async fn confident_reply_moves_conversation_to_ai_handling() {
        let fx = fixture(ScriptedCompletion::new(vec![ScriptedCompletion::confident(
            "Our plans start at $10/month.",
        )]))
        .await;
        let start = fx.service.start_session(None, None).await.unwrap();
        let ack = fx
            .service
            .handle_customer_message(start.token.as_str(), "What do your plans cost?")
            .await
            .unwrap();

        assert!(!ack.degraded);
        assert_eq!(ack.status, Some(ConversationStatus::AiHandling));
        assert_eq!(ack.reply_text.as_deref(), Some("Our plans start at $10/month."));
        let reply = ack.reply.unwrap();
        assert_eq!(reply.sender, Sender::Assistant);

        let stored = fx.store.get_conversation(&start.conversation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConversationStatus::AiHandling);
        assert!(!stored.requires_human);
    }

    #[tokio::test]
    async fn low_confidence_reply_escalates() {
        let fx = fixture(ScriptedCompletion::new(vec![CompletionOutcome {
            text: "I'm not sure about that.".into(),
            flagged_for_human: false,
            confidence: 0.4,
        }]))
        .await;
        let start = fx.service.start_session(None, None).await.unwrap();
        let ack = fx
            .service
            .handle_customer_message(start.token.as_str(), "Can you do X?")
            .await
            .unwrap();

        assert_eq!(ack.status, Some(ConversationStatus::NeedsAttention));
        // The reply is still delivered alongside the escalation.
        assert!(ack.reply.is_some());

        let stored = fx.store.get_conversation(&start.conversation.id).await.unwrap().unwrap();
        assert!(stored.requires_human);
    }

    #[tokio::test]
    async fn repeated_escalation_is_idempotent() {
        let low = || CompletionOutcome {
            text: "Hmm.".into(),
            flagged_for_human: false,
            confidence: 0.1,
        };
        let fx = fixture(ScriptedCompletion::new(vec![low(), low()])).await;
        let start = fx.service.start_session(None, None).await.unwrap();

        let first = fx.service.handle_customer_message(start.token.as_str(), "one").await.unwrap();
        let second = fx.service.handle_customer_message(start.token.as_str(), "two").await.unwrap();
        assert_eq!(first.status, Some(ConversationStatus::NeedsAttention));
        assert_eq!(second.status, Some(ConversationStatus::NeedsAttention));

        let stored = fx.store.get_conversation(&start.conversation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConversationStatus::NeedsAttention);
    }

    #[tokio::test]
    async fn explicit_human_request_escalates_without_a_reply() {
        let fx = fixture(ScriptedCompletion::new(vec![])).await;
        let start = fx.service.start_session(None, None).await.unwrap();
        let ack = fx
            .service
            .handle_customer_message(start.token.as_str(), "I want to talk to a human")
            .await
            .unwrap();

        assert_eq!(ack.status, Some(ConversationStatus::NeedsAttention));
        assert!(ack.reply.is_none());
        assert!(ack.reply_text.is_none());
        assert_eq!(fx.completion.calls(), 0, "no completion call on explicit request");

        let history = fx.store.messages_for(&start.conversation.id, None).await.unwrap();
        assert_eq!(history.len(), 1, "only the customer message persisted");
    }

    #[tokio::test]
    async fn human_attended_conversation_gets_no_automated_reply() {
        let fx = fixture(ScriptedCompletion::new(vec![])).await;
        let start = fx.service.start_session(None, None).await.unwrap();
        fx.store
            .update_status(
                &start.conversation.id,
                ConversationStatus::HumanHandling,
                &Assignee::Agent("agent-1".into()),
                false,
            )
            .await
            .unwrap();

        let ack = fx
            .service
            .handle_customer_message(start.token.as_str(), "thanks, waiting")
            .await
            .unwrap();
        assert!(ack.reply.is_none());
        assert_eq!(ack.status, Some(ConversationStatus::HumanHandling));
        assert_eq!(fx.completion.calls(), 0);
    }

    #[tokio::test]
    async fn completion_timeout_substitutes_fallback_and_escalates() {
        let fx = fixture(ScriptedCompletion::slow(Duration::from_secs(5))).await;
        let start = fx.service.start_session(None, None).await.unwrap();
        let ack = fx
            .service
            .handle_customer_message(start.token.as_str(), "hello?")
            .await
            .unwrap();

        assert_eq!(ack.reply_text.as_deref(), Some(FALLBACK_REPLY));
        // Zero confidence from the fallback forces the handoff.
        assert_eq!(ack.status, Some(ConversationStatus::NeedsAttention));
    }

    #[tokio::test]
    async fn store_outage_degrades_instead_of_failing() {
        let completion = Arc::new(ScriptedCompletion::new(vec![ScriptedCompletion::confident(
            "We're open 9-5.",
        )]));
        let config = ParleyConfig::default();
        let engine: Arc<dyn CompletionEngine> = completion.clone();
        let service = service_over(Arc::new(DownStore), engine, &config);

        let ack = service
            .handle_customer_message("some-token", "When are you open?")
            .await
            .unwrap();
        assert!(ack.degraded);
        assert!(ack.message_id.starts_with("degraded-"));
        assert!(ack.message.is_none());
        assert_eq!(ack.reply_text.as_deref(), Some("We're open 9-5."));
        assert_eq!(ack.status, None);
    }

    #[tokio::test]
    async fn rate_limit_violation_propagates_with_hint() {
        let mut config = ParleyConfig::default();
        config.rate_limit.max_messages = 1;
        let dir = TempDir::new().unwrap();
        let storage_config = StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
        };
        let store = SqliteStore::new(storage_config);
        store.initialize().await.unwrap();
        let service = service_over(
            Arc::new(store),
            Arc::new(ScriptedCompletion::new(vec![])),
            &config,
        );

        let start = service.start_session(None, None).await.unwrap();
        service.handle_customer_message(start.token.as_str(), "one").await.unwrap();
        let err = service
            .handle_customer_message(start.token.as_str(), "two")
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::RateLimited { retry_after_secs } if retry_after_secs >= 1));
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_consuming_a_write() {
        let fx = fixture(ScriptedCompletion::new(vec![])).await;
        let start = fx.service.start_session(None, None).await.unwrap();
        let err = fx
            .service
            .handle_customer_message(start.token.as_str(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Validation(_)));
        let history = fx.store.messages_for(&start.conversation.id, None).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn partial_lead_is_rejected_and_complete_lead_persists() {
        let fx = fixture(ScriptedCompletion::new(vec![])).await;
        let start = fx.service.start_session(None, None).await.unwrap();
        let token = start.token.as_str();

        let partial = LeadContact {
            name: "Ada".into(),
            email: String::new(),
            phone: "555-0100".into(),
        };
        assert!(matches!(
            fx.service.capture_lead(token, &partial).await,
            Err(ParleyError::Validation(_))
        ));

        let full = LeadContact {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "555-0100".into(),
        };
        fx.service.capture_lead(token, &full).await.unwrap();
        let stored = fx.store.get_conversation(&start.conversation.id).await.unwrap().unwrap();
        assert_eq!(stored.lead, Some(full));
    }
}
