//! Update runner
//!
//! Wires the dispatcher to the store, the gateway and the audit log. One call
//! to `process_update` is one full load-mutate-save cycle followed by the
//! outbound effects.

use std::sync::Arc;

use crate::core::error_logger::ErrorLogger;
use crate::core::utils::{format_timestamp, now_secs};
use crate::storage::UserStore;
use crate::telegram::dispatcher::{Dispatcher, Effect};
use crate::telegram::gateway::MessagingGateway;
use crate::telegram::update::InboundEvent;

/// Dependencies required to process updates
#[derive(Clone)]
pub struct HandlerDeps {
    pub store: UserStore,
    pub gateway: Arc<dyn MessagingGateway>,
    pub dispatcher: Arc<Dispatcher>,
    pub error_log: ErrorLogger,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        store: UserStore,
        gateway: Arc<dyn MessagingGateway>,
        dispatcher: Arc<Dispatcher>,
        error_log: ErrorLogger,
    ) -> Self {
        Self {
            store,
            gateway,
            dispatcher,
            error_log,
        }
    }

    /// Processes one decoded event at the current time
    pub async fn process_update(&self, event: &InboundEvent) {
        self.process_update_at(event, now_secs()).await;
    }

    /// Processes one decoded event as if it arrived at `now` (epoch seconds)
    ///
    /// The store lock is held from load until save; effects run afterwards. A
    /// failed save is logged by the store and the replies are still sent.
    pub async fn process_update_at(&self, event: &InboundEvent, now: i64) {
        let effects = {
            let _guard = self.store.lock().await;
            let mut users = self.store.load();
            let effects = self.dispatcher.handle(event, &mut users, now);
            if !self.store.save(&users) {
                log::warn!("Update from {} handled but not persisted", event.chat_id());
            }
            effects
        };

        self.execute_effects(effects).await;
    }

    /// Runs effects in order; failures are logged and never stop later effects
    pub async fn execute_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AnswerCallback { callback_query_id } => {
                    self.gateway.answer_callback(&callback_query_id).await;
                }
                Effect::SendMessage { chat_id, text, keyboard } => {
                    self.gateway.send_message(chat_id, &text, keyboard).await;
                }
                Effect::RecordWithdrawal { chat_id, amount, at } => {
                    self.error_log.log_withdrawal(chat_id, amount, &format_timestamp(at));
                }
            }
        }
    }
}
