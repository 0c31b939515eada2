//! Intent pipeline — validation, guardrail evaluation, mode routing, and
//! the handoff to queue or dispatcher.
//!
//! The per-device lock is held from evaluation through dispatch and the
//! action-log append, so two racing intents for one device cannot both read
//! the log before either one records. Unrelated devices never wait on each
//! other.

use std::sync::Arc;

use autohome_domain::approval::{ApprovalDecision, ApprovalItem};
use autohome_domain::chat::ChatMessage;
use autohome_domain::command::Command;
use autohome_domain::device::Device;
use autohome_domain::error::{AutoHomeError, GuardrailViolation, ValidationError};
use autohome_domain::event::{Event, EventType};
use autohome_domain::guardrail::DecisionReason;
use autohome_domain::id::{ApprovalId, EntityKey};
use autohome_domain::intent::Intent;
use autohome_domain::mode::{OperationMode, RoutePath};
use autohome_domain::time::Timestamp;
use serde::Serialize;
use serde_json::json;

use crate::ports::{DeviceAdapter, EventPublisher, IntentSource};
use crate::services::approval_service::ApprovalService;
use crate::services::dashboard_service::DashboardService;
use crate::services::dispatch_service::{debounce_field, CommandDispatcher};
use crate::services::guardrail_service::GuardrailService;

/// Where a submitted intent ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Commands went to the backend synchronously.
    Dispatched { commands: Vec<Command> },
    /// The value was applied optimistically; the wire call fires once the
    /// debounce quiet period elapses.
    DebouncePending {
        device: EntityKey,
        field: &'static str,
    },
    /// Parked in the approval queue.
    Queued { item: ApprovalItem },
    /// A guardrail setting was replaced.
    PolicyUpdated { device: EntityKey },
    /// Read-only status answer.
    Status { devices: Vec<Device> },
}

/// The guarded command pipeline, wired once at startup.
pub struct IntentPipeline<A, P> {
    guardrails: Arc<GuardrailService>,
    approvals: Arc<ApprovalService>,
    dashboard: Arc<DashboardService<P>>,
    dispatcher: Arc<CommandDispatcher<A, P>>,
    publisher: P,
}

impl<A, P> IntentPipeline<A, P>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    pub fn new(
        guardrails: Arc<GuardrailService>,
        approvals: Arc<ApprovalService>,
        dashboard: Arc<DashboardService<P>>,
        dispatcher: Arc<CommandDispatcher<A, P>>,
        publisher: P,
    ) -> Self {
        Self {
            guardrails,
            approvals,
            dashboard,
            dispatcher,
            publisher,
        }
    }

    #[must_use]
    pub fn guardrails(&self) -> &Arc<GuardrailService> {
        &self.guardrails
    }

    #[must_use]
    pub fn approvals(&self) -> &Arc<ApprovalService> {
        &self.approvals
    }

    #[must_use]
    pub fn dashboard(&self) -> &Arc<DashboardService<P>> {
        &self.dashboard
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<CommandDispatcher<A, P>> {
        &self.dispatcher
    }

    /// Run one intent through validation, guardrails, and mode routing.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for malformed or unexecutable intents
    /// - [`GuardrailViolation`] when the intent is rejected, either by a hard
    ///   guardrail block or because the pipeline is paused
    /// - [`AutoHomeError::Dispatch`] when the backend call fails
    #[tracing::instrument(skip_all, fields(intent = %intent.summary()))]
    pub async fn submit(
        &self,
        intent: Intent,
        now: Timestamp,
    ) -> Result<RouteOutcome, AutoHomeError> {
        match &intent {
            Intent::SetPolicy { device, setting } => {
                setting.validate()?;
                self.guardrails.set(device.clone(), setting.clone());
                self.emit(Event::new(
                    EventType::PolicyUpdated,
                    Some(device.clone()),
                    json!({ "setting": setting }),
                ))
                .await;
                return Ok(RouteOutcome::PolicyUpdated {
                    device: device.clone(),
                });
            }
            Intent::QueryStatus { .. } => {
                return Ok(RouteOutcome::Status {
                    devices: self.dispatcher.cache().list(),
                });
            }
            Intent::RunOptimization { .. } => {
                return Err(ValidationError::UnsupportedIntent("run_optimization").into());
            }
            Intent::ToggleDevice { .. }
            | Intent::SetLevel { .. }
            | Intent::ScheduleDevice { .. } => {}
        }

        let device = intent
            .device()
            .cloned()
            .ok_or(ValidationError::UnsupportedIntent("device-less intent"))?;
        let cached = self
            .dispatcher
            .cache()
            .get(&device)
            .ok_or_else(|| ValidationError::UnknownDevice(device.to_string()))?;
        if !cached.available {
            return Err(ValidationError::DeviceUnavailable(device.to_string()).into());
        }

        let lock = self.guardrails.device_lock(&device);
        let _guard = lock.lock().await;

        // Paused drops everything before guardrails even run, and nothing on
        // this path touches the action log.
        let mode = self.dashboard.mode();
        if mode == OperationMode::Paused {
            return Err(self
                .reject(&intent, &device, vec![DecisionReason::Paused])
                .await);
        }

        let decision = self.guardrails.evaluate(&intent, &device, now);
        match mode.route(&decision) {
            RoutePath::Reject => Err(self.reject(&intent, &device, decision.reasons).await),
            RoutePath::Queue => {
                let item = self.approvals.create(
                    intent.clone(),
                    &intent.summary(),
                    decision.badges(),
                    None,
                    now,
                );
                self.emit(Event::new(
                    EventType::IntentQueued,
                    Some(device),
                    json!({ "approval_id": item.id, "summary": item.summary }),
                ))
                .await;
                Ok(RouteOutcome::Queued { item })
            }
            RoutePath::Dispatch => {
                if let Some(field) = debounce_field(&intent) {
                    self.dispatcher.dispatch_debounced(intent)?;
                    Ok(RouteOutcome::DebouncePending { device, field })
                } else {
                    let commands = self.dispatcher.dispatch_now(&intent).await?;
                    Ok(RouteOutcome::Dispatched { commands })
                }
            }
        }
    }

    /// Apply a human verdict to a queued item; approval dispatches the
    /// original intent without re-running the guardrail.
    ///
    /// # Errors
    ///
    /// Fails when the item is missing, expired, or already resolved, or when
    /// the resulting dispatch fails.
    #[tracing::instrument(skip(self), fields(item = %id))]
    pub async fn resolve_approval(
        &self,
        id: ApprovalId,
        decision: ApprovalDecision,
        now: Timestamp,
    ) -> Result<Vec<Command>, AutoHomeError> {
        let item = self.approvals.resolve(id, decision, now)?;
        self.emit(Event::new(
            EventType::ApprovalResolved,
            item.intent.device().cloned(),
            json!({ "approval_id": id, "decision": decision }),
        ))
        .await;
        if decision == ApprovalDecision::Rejected {
            return Ok(Vec::new());
        }
        let device = item
            .intent
            .device()
            .cloned()
            .ok_or(ValidationError::UnsupportedIntent("device-less intent"))?;
        let lock = self.guardrails.device_lock(&device);
        let _guard = lock.lock().await;
        self.dispatcher.dispatch_now(&item.intent).await
    }

    /// One chat turn: parse, submit, and record both sides of the exchange.
    ///
    /// The assistant reply lands in the history even when the intent was
    /// rejected, so the dashboard can show why.
    ///
    /// # Errors
    ///
    /// Propagates parse failures and every [`submit`](Self::submit) error.
    pub async fn converse<S: IntentSource>(
        &self,
        source: &S,
        text: &str,
        now: Timestamp,
    ) -> Result<(RouteOutcome, String), AutoHomeError> {
        let intent = source.parse(text).await?;
        self.dashboard
            .push_message(ChatMessage::user(text, intent.clone(), now));
        let result = self.submit(intent.clone(), now).await;
        let reply = match &result {
            Ok(_) => source.generate_response(&intent).await,
            Err(error) => format!("I can't do that: {error}"),
        };
        self.dashboard
            .push_message(ChatMessage::assistant(reply.clone(), now));
        result.map(|outcome| (outcome, reply))
    }

    async fn reject(
        &self,
        intent: &Intent,
        device: &EntityKey,
        reasons: Vec<DecisionReason>,
    ) -> AutoHomeError {
        self.emit(Event::new(
            EventType::IntentRejected,
            Some(device.clone()),
            json!({ "summary": intent.summary(), "reasons": reasons }),
        ))
        .await;
        GuardrailViolation { reasons }.into()
    }

    async fn emit(&self, event: Event) {
        if self.publisher.publish(event).await.is_err() {
            tracing::warn!("event bus publish failed");
        }
    }
}
