//! [`Core`]: the piece of state shared by a transaction and its timers,
//! common to all four transaction kinds. The per-kind wrapper types in
//! [`super::client`] / [`super::server`] are thin: they own a `Core` and
//! translate their public API (`respond`, `ack`, `cancel`, ...) into FSM
//! inputs.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::error::{Error, Result};
use crate::fsm::Fsm;
use crate::message::Message;
use crate::transport::Transport;

use super::key::TransactionKey;
use super::manager::Tables;
use super::{Effect, Input, Role, Timer, TransactionState, TxCtx};

/// State shared by a live transaction and the timer tasks racing against
/// it. Not exposed directly — [`super::client::ClientTx`] and
/// [`super::server::ServerTx`] hold an `Arc<Core>` each.
pub(crate) struct Core {
    pub(crate) key: TransactionKey,
    fsm: Fsm<TxCtx, Input>,
    ctx: Mutex<TxCtx>,
    transport: Arc<dyn Transport>,
    destination: SocketAddr,
    tables: Arc<Tables>,
    responses_tx: Option<mpsc::Sender<Message>>,
    errors_tx: Option<mpsc::Sender<Error>>,
    state_tx: watch::Sender<TransactionState>,
    role: Role,
}

impl Core {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: TransactionKey,
        fsm: Fsm<TxCtx, Input>,
        request: Message,
        transport: Arc<dyn Transport>,
        destination: SocketAddr,
        tables: Arc<Tables>,
        responses_tx: Option<mpsc::Sender<Message>>,
        errors_tx: Option<mpsc::Sender<Error>>,
        role: Role,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(TransactionState::from_name(fsm.state_name()));
        Arc::new(Self {
            key,
            fsm,
            ctx: Mutex::new(TxCtx::new(request)),
            transport,
            destination,
            tables,
            responses_tx,
            errors_tx,
            state_tx,
            role,
        })
    }

    /// The transaction's current state.
    pub(crate) fn state(&self) -> TransactionState {
        TransactionState::from_name(self.fsm.state_name())
    }

    /// A channel that changes every time the transaction's state does.
    pub(crate) fn watch_state(&self) -> watch::Receiver<TransactionState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn key(&self) -> &TransactionKey {
        &self.key
    }

    /// The request that created this transaction.
    pub(crate) fn request(&self) -> Message {
        self.ctx.lock().expect("tx context lock poisoned").request.clone()
    }

    /// The last response sent (server) or received (client), if any.
    pub(crate) fn last_response(&self) -> Option<Message> {
        self.ctx.lock().expect("tx context lock poisoned").last_response.clone()
    }

    /// Sends `message` straight through the transport, bypassing the FSM.
    /// Used for user-driven sends that don't themselves drive a state
    /// transition (a user-built ACK for a 2xx, a CANCEL).
    pub(crate) async fn send_direct(&self, message: &Message) -> Result<()> {
        self.transport.send(self.destination, message).await
    }

    /// Feeds `input` into the FSM, with `incoming` (if any) staged as the
    /// message the actions this spin triggers will act on, then executes
    /// every effect the actions queued.
    ///
    /// A failed `Send` effect is folded back into the same spin as
    /// `Input::TransportError`, via a local retry loop rather than
    /// recursion, so arbitrarily long chains of "send failed, clean up"
    /// never grow the call stack.
    pub(crate) async fn spin(self: &Arc<Self>, input: Input, incoming: Option<Message>) -> Result<()> {
        let mut pending = Some(input);
        while let Some(input) = pending.take() {
            let effects = {
                let mut ctx = self.ctx.lock().expect("tx context lock poisoned");
                ctx.incoming = incoming.clone();
                self.fsm.spin(&mut ctx, input)?;
                ctx.take_effects()
            };
            self.state_tx.send_replace(self.state());

            for effect in effects {
                match effect {
                    Effect::Send(message) => {
                        if let Err(err) = self.transport.send(self.destination, &message).await {
                            tracing::warn!(error = %err, "transport send failed, folding back into fsm");
                            pending = Some(Input::TransportError);
                        }
                    }
                    Effect::NotifyResponse(message) => {
                        if let Some(tx) = &self.responses_tx {
                            let _ = tx.send(message).await;
                        }
                    }
                    Effect::NotifyError(err) => {
                        if let Some(tx) = &self.errors_tx {
                            let _ = tx.send(err).await;
                        }
                    }
                    Effect::ArmTimer(timer, duration) => self.arm_timer(timer, duration),
                    Effect::Terminate => {
                        match self.role {
                            Role::Client => self.tables.remove_client(&self.key),
                            Role::Server => self.tables.remove_server(&self.key),
                        }
                        self.state_tx.send_replace(TransactionState::Terminated);
                    }
                }
            }
        }
        Ok(())
    }

    /// Spawns a task that, after `duration`, re-enters `spin` with the
    /// timer's input — unless the transaction has already terminated, in
    /// which case delivering the input would be a no-op anyway and the task
    /// simply exits. This check narrows but does not eliminate the race
    /// with a concurrent `Effect::Terminate`.
    ///
    /// Public within the crate so the manager can arm a client
    /// transaction's initial Timer A / Timer B right after dispatch,
    /// outside of any FSM action.
    pub(crate) fn arm_timer(self: &Arc<Self>, timer: Timer, duration: Duration) {
        let this = Arc::clone(self);
        let input = match timer {
            Timer::A => Input::TimerA,
            Timer::B => Input::TimerB,
            Timer::D => Input::TimerD,
            Timer::G => Input::TimerG,
            Timer::H => Input::TimerH,
            Timer::I => Input::TimerI,
            Timer::J => Input::TimerJ,
        };
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if this.state() == TransactionState::Terminated {
                return;
            }
            if let Err(err) = this.spin(input, None).await {
                tracing::warn!(error = %err, "timer fired on a transaction with no matching transition");
            }
        });
    }
}
