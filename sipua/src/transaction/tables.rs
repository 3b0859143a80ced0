//! The `Input`/`Context`/`Effect` shapes shared by all four transaction
//! kinds, and the [`crate::fsm::Table`] builders for each.
//!
//! Every table operates over the same [`TxCtx`]: an action only mutates
//! this context (pushing [`Effect`]s, or adjusting the retransmit
//! interval); it never touches the network or a clock directly. The
//! transaction wrapper types in [`super::client`] / [`super::server`] run
//! `Fsm::spin`, then drain and execute the effects.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::fsm::{Fsm, State, Table};
use crate::headers::{CSeq, Header, MaxForwards};
use crate::message::{Message, Method};

use super::{T1, T2, T4, TIMER_B, TIMER_D};

/// An input fed into a transaction's FSM. The same variants are reused by
/// both client and server tables: for a client transaction `Provisional` /
/// `Success` / `Failure` classify a response received from the wire; for a
/// server transaction they classify a response the user is sending via
/// `Respond`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Input {
    /// A 1xx response.
    Provisional,
    /// A 2xx response.
    Success,
    /// A 3xx-6xx response.
    Failure,
    /// Server only: the request was seen again (retransmission).
    RequestRetransmit,
    /// Server INVITE only: the ACK for a non-2xx final response arrived.
    Ack,
    /// Timer A (client retransmit) / Timer E.
    TimerA,
    /// Timer B (client timeout) / Timer F.
    TimerB,
    /// Timer D (client INVITE wait) / Timer K (client non-INVITE wait).
    TimerD,
    /// Timer G (server INVITE retransmit of final response).
    TimerG,
    /// Timer H (server INVITE wait for ACK).
    TimerH,
    /// Timer I (server INVITE confirmed wait).
    TimerI,
    /// Timer J (server non-INVITE wait after final).
    TimerJ,
    /// `Transport::send` failed.
    TransportError,
}

/// One of the eight RFC 3261 §17 transaction timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timer {
    A,
    B,
    D,
    G,
    H,
    I,
    J,
}

/// A side effect an action wants the owning transaction to carry out once
/// `Fsm::spin` returns. The engine itself never sends, logs, or arms a
/// timer — it only ever mutates [`TxCtx`].
pub(crate) enum Effect {
    /// Send a message to the transaction's destination.
    Send(Message),
    /// Push a response onto the client's user-facing `Responses()` stream.
    NotifyResponse(Message),
    /// Push an error onto the user-facing `Errors()` stream.
    NotifyError(Error),
    /// (Re)arm a timer for `duration`, replacing any previous arming.
    ArmTimer(Timer, Duration),
    /// The transaction reached `Terminated`; release its resources and
    /// remove it from the manager's table.
    Terminate,
}

/// The mutable state an FSM action may read or write. Owned by the
/// transaction wrapper, which also holds the fields (transport, last-sent
/// bytes, timer handles) that don't belong in a pure state-machine context.
pub(crate) struct TxCtx {
    /// The request that created this transaction.
    pub request: Message,
    /// The message that triggered the current `spin` call: a response
    /// (client), or the response the user is sending (server).
    pub incoming: Option<Message>,
    /// The last response sent (server) or received (client), kept around
    /// to resend on a retransmitted request or to build/resend the ACK.
    pub last_response: Option<Message>,
    /// The ACK built for the first non-2xx final response, resent verbatim
    /// while `Completed` absorbs retransmitted finals (client INVITE only).
    pub last_ack: Option<Message>,
    /// Current Timer A/E/G retransmit interval, doubled on each firing.
    pub interval: Duration,
    /// Effects queued by the actions run during the current `spin` call.
    pub effects: Vec<Effect>,
}

impl TxCtx {
    pub fn new(request: Message) -> Self {
        Self {
            request,
            incoming: None,
            last_response: None,
            last_ack: None,
            interval: T1,
            effects: Vec::new(),
        }
    }

    /// Takes the queued effects, leaving the context ready for the next
    /// `spin` call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

/// Builds the ACK for a non-2xx final response (RFC 3261 §17.1.1.3):
/// same Request-URI, top `Via`, `From`, and `Call-ID` as the request, `To`
/// from the response (it carries the tag), and `CSeq` with the request's
/// sequence number but method `ACK`.
pub(crate) fn build_ack(request: &Message, response: &Message) -> Message {
    let recipient = match request {
        Message::Request { recipient, .. } => recipient.clone(),
        Message::Response { .. } => unreachable!("ACK is only built for a request's final response"),
    };
    let mut ack = Message::request(Method::Ack, recipient);

    if let Some(via) = request.headers().all_headers().find(|h| matches!(h, Header::Via(_))) {
        ack.headers_mut().add_header(via.clone());
    }
    if let Some(from) = request.headers().all_headers().find(|h| matches!(h, Header::From(_))) {
        ack.headers_mut().add_header(from.clone());
    }
    let to = response
        .headers()
        .all_headers()
        .find(|h| matches!(h, Header::To(_)))
        .or_else(|| request.headers().all_headers().find(|h| matches!(h, Header::To(_))));
    if let Some(to) = to {
        ack.headers_mut().add_header(to.clone());
    }
    if let Some(call_id) = request.headers().all_headers().find(|h| matches!(h, Header::CallId(_))) {
        ack.headers_mut().add_header(call_id.clone());
    }
    let seq = request
        .headers()
        .all_headers()
        .find_map(|h| if let Header::CSeq(c) = h { Some(c.seq()) } else { None })
        .unwrap_or(1);
    ack.headers_mut().add_header(Header::CSeq(CSeq::new(seq, Method::Ack)));
    ack.headers_mut().add_header(Header::MaxForwards(MaxForwards::new(70)));
    ack
}

// --- shared actions -------------------------------------------------

fn notify_and_stay(ctx: &mut TxCtx) -> Option<Input> {
    if let Some(msg) = ctx.incoming.take() {
        ctx.effects.push(Effect::NotifyResponse(msg));
    }
    None
}

fn notify_and_terminate(ctx: &mut TxCtx) -> Option<Input> {
    if let Some(msg) = ctx.incoming.take() {
        ctx.effects.push(Effect::NotifyResponse(msg));
    }
    ctx.effects.push(Effect::Terminate);
    None
}

fn client_invite_failure_completes(ctx: &mut TxCtx) -> Option<Input> {
    let response = ctx.incoming.take().expect("Failure input always carries a response");
    let ack = build_ack(&ctx.request, &response);
    ctx.effects.push(Effect::NotifyResponse(response.clone()));
    ctx.effects.push(Effect::Send(ack.clone()));
    ctx.last_response = Some(response);
    ctx.last_ack = Some(ack);
    ctx.effects.push(Effect::ArmTimer(Timer::D, TIMER_D));
    None
}

fn client_invite_completed_resend_ack(ctx: &mut TxCtx) -> Option<Input> {
    ctx.incoming.take();
    if let Some(ack) = ctx.last_ack.clone() {
        ctx.effects.push(Effect::Send(ack));
    }
    None
}

fn client_invite_retransmit(ctx: &mut TxCtx) -> Option<Input> {
    ctx.effects.push(Effect::Send(ctx.request.clone()));
    ctx.interval *= 2;
    ctx.effects.push(Effect::ArmTimer(Timer::A, ctx.interval));
    None
}

fn client_non_invite_final_completes(ctx: &mut TxCtx) -> Option<Input> {
    let response = ctx.incoming.take().expect("final input always carries a response");
    ctx.effects.push(Effect::NotifyResponse(response.clone()));
    ctx.last_response = Some(response);
    ctx.effects.push(Effect::ArmTimer(Timer::D, TIMER_D));
    None
}

fn client_non_invite_retransmit(ctx: &mut TxCtx) -> Option<Input> {
    ctx.effects.push(Effect::Send(ctx.request.clone()));
    ctx.interval = (ctx.interval * 2).min(T2);
    ctx.effects.push(Effect::ArmTimer(Timer::A, ctx.interval));
    None
}

fn timeout_and_terminate(ctx: &mut TxCtx) -> Option<Input> {
    ctx.effects.push(Effect::NotifyError(Error::TransportError("transaction timed out".into())));
    ctx.effects.push(Effect::Terminate);
    None
}

fn transport_error(ctx: &mut TxCtx) -> Option<Input> {
    ctx.effects.push(Effect::NotifyError(Error::TransportError("transport send failed".into())));
    ctx.effects.push(Effect::Terminate);
    None
}

fn terminate(ctx: &mut TxCtx) -> Option<Input> {
    ctx.effects.push(Effect::Terminate);
    None
}

fn server_respond_stay(ctx: &mut TxCtx) -> Option<Input> {
    let response = ctx.incoming.take().expect("user response input always carries a response");
    ctx.effects.push(Effect::Send(response.clone()));
    ctx.last_response = Some(response);
    None
}

fn server_invite_final_2xx(ctx: &mut TxCtx) -> Option<Input> {
    let response = ctx.incoming.take().expect("Success input always carries a response");
    ctx.effects.push(Effect::Send(response));
    ctx.effects.push(Effect::Terminate);
    None
}

fn server_invite_final_failure(ctx: &mut TxCtx) -> Option<Input> {
    let response = ctx.incoming.take().expect("Failure input always carries a response");
    ctx.effects.push(Effect::Send(response.clone()));
    ctx.last_response = Some(response);
    ctx.interval = T1;
    ctx.effects.push(Effect::ArmTimer(Timer::G, ctx.interval));
    ctx.effects.push(Effect::ArmTimer(Timer::H, TIMER_B));
    None
}

fn server_resend_last(ctx: &mut TxCtx) -> Option<Input> {
    ctx.incoming.take();
    if let Some(resp) = ctx.last_response.clone() {
        ctx.effects.push(Effect::Send(resp));
    }
    None
}

fn server_invite_timer_g_retransmit(ctx: &mut TxCtx) -> Option<Input> {
    if let Some(resp) = ctx.last_response.clone() {
        ctx.effects.push(Effect::Send(resp));
    }
    ctx.interval = (ctx.interval * 2).min(T2);
    ctx.effects.push(Effect::ArmTimer(Timer::G, ctx.interval));
    None
}

fn server_invite_confirm(ctx: &mut TxCtx) -> Option<Input> {
    ctx.incoming.take();
    ctx.effects.push(Effect::ArmTimer(Timer::I, T4));
    None
}

fn server_non_invite_final_completes(ctx: &mut TxCtx) -> Option<Input> {
    let response = ctx.incoming.take().expect("final input always carries a response");
    ctx.effects.push(Effect::Send(response.clone()));
    ctx.last_response = Some(response);
    ctx.effects.push(Effect::ArmTimer(Timer::J, TIMER_B));
    None
}

fn noop(ctx: &mut TxCtx) -> Option<Input> {
    ctx.incoming.take();
    None
}

/// `Calling -> Proceeding -> (Completed|Terminated) -> Terminated`.
pub(crate) fn client_invite_table() -> Result<Arc<Table<TxCtx, Input>>> {
    const CALLING: usize = 0;
    const PROCEEDING: usize = 1;
    const COMPLETED: usize = 2;
    const TERMINATED: usize = 3;
    let states = vec![
        State::new("Calling")
            .on(Input::Provisional, PROCEEDING, notify_and_stay)
            .on(Input::Success, TERMINATED, notify_and_terminate)
            .on(Input::Failure, COMPLETED, client_invite_failure_completes)
            .on(Input::TimerA, CALLING, client_invite_retransmit)
            .on(Input::TimerB, TERMINATED, timeout_and_terminate)
            .on(Input::TransportError, TERMINATED, transport_error),
        State::new("Proceeding")
            .on(Input::Provisional, PROCEEDING, notify_and_stay)
            .on(Input::Success, TERMINATED, notify_and_terminate)
            .on(Input::Failure, COMPLETED, client_invite_failure_completes)
            .on(Input::TransportError, TERMINATED, transport_error),
        State::new("Completed")
            .on(Input::Failure, COMPLETED, client_invite_completed_resend_ack)
            .on(Input::TimerD, TERMINATED, terminate)
            .on(Input::TransportError, TERMINATED, transport_error),
        State::new("Terminated"),
    ];
    Ok(Arc::new(Table::define(states)?))
}

/// `Trying -> Proceeding -> Completed -> Terminated`.
pub(crate) fn client_non_invite_table() -> Result<Arc<Table<TxCtx, Input>>> {
    const TRYING: usize = 0;
    const PROCEEDING: usize = 1;
    const COMPLETED: usize = 2;
    const TERMINATED: usize = 3;
    let states = vec![
        State::new("Trying")
            .on(Input::Provisional, PROCEEDING, notify_and_stay)
            .on(Input::Success, COMPLETED, client_non_invite_final_completes)
            .on(Input::Failure, COMPLETED, client_non_invite_final_completes)
            .on(Input::TimerA, TRYING, client_non_invite_retransmit)
            .on(Input::TimerB, TERMINATED, timeout_and_terminate)
            .on(Input::TransportError, TERMINATED, transport_error),
        State::new("Proceeding")
            .on(Input::Provisional, PROCEEDING, notify_and_stay)
            .on(Input::Success, COMPLETED, client_non_invite_final_completes)
            .on(Input::Failure, COMPLETED, client_non_invite_final_completes)
            .on(Input::TransportError, TERMINATED, transport_error),
        State::new("Completed")
            .on(Input::TimerD, TERMINATED, terminate)
            .on(Input::TransportError, TERMINATED, transport_error),
        State::new("Terminated"),
    ];
    Ok(Arc::new(Table::define(states)?))
}

/// `Proceeding -> Completed -> Confirmed -> Terminated`. Starts in
/// `Proceeding`: the Manager has already sent the automatic `100 Trying`
/// before the FSM is spun for the first time.
pub(crate) fn server_invite_table() -> Result<Arc<Table<TxCtx, Input>>> {
    const PROCEEDING: usize = 0;
    const COMPLETED: usize = 1;
    const CONFIRMED: usize = 2;
    const TERMINATED: usize = 3;
    let states = vec![
        State::new("Proceeding")
            .on(Input::RequestRetransmit, PROCEEDING, server_resend_last)
            .on(Input::Provisional, PROCEEDING, server_respond_stay)
            .on(Input::Success, TERMINATED, server_invite_final_2xx)
            .on(Input::Failure, COMPLETED, server_invite_final_failure),
        State::new("Completed")
            .on(Input::RequestRetransmit, COMPLETED, server_resend_last)
            .on(Input::TimerG, COMPLETED, server_invite_timer_g_retransmit)
            .on(Input::TimerH, TERMINATED, timeout_and_terminate)
            .on(Input::Ack, CONFIRMED, server_invite_confirm),
        State::new("Confirmed").on(Input::TimerI, TERMINATED, terminate),
        State::new("Terminated"),
    ];
    Ok(Arc::new(Table::define(states)?))
}

/// `Trying -> Proceeding -> Completed -> Terminated`. The Manager has
/// already sent the automatic `100 Trying` before the first `spin`.
pub(crate) fn server_non_invite_table() -> Result<Arc<Table<TxCtx, Input>>> {
    const TRYING: usize = 0;
    const PROCEEDING: usize = 1;
    const COMPLETED: usize = 2;
    const TERMINATED: usize = 3;
    let states = vec![
        State::new("Trying")
            .on(Input::RequestRetransmit, TRYING, noop)
            .on(Input::Provisional, PROCEEDING, server_respond_stay)
            .on(Input::Success, COMPLETED, server_non_invite_final_completes)
            .on(Input::Failure, COMPLETED, server_non_invite_final_completes),
        State::new("Proceeding")
            .on(Input::RequestRetransmit, PROCEEDING, server_resend_last)
            .on(Input::Success, COMPLETED, server_non_invite_final_completes)
            .on(Input::Failure, COMPLETED, server_non_invite_final_completes),
        State::new("Completed")
            .on(Input::RequestRetransmit, COMPLETED, server_resend_last)
            .on(Input::TimerJ, TERMINATED, terminate),
        State::new("Terminated"),
    ];
    Ok(Arc::new(Table::define(states)?))
}

pub(crate) fn new_fsm(table: Arc<Table<TxCtx, Input>>, start: usize) -> Fsm<TxCtx, Input> {
    Fsm::new(table, start)
}
