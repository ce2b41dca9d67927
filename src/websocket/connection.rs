//! Connection lifecycle of the live notification client.
//!
//! `transition` only decides; the driver in `client.rs` performs the
//! returned commands. Keeping the two apart lets the reconnect rules be
//! tested without a socket.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Subscribed,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A credential appeared or was replaced by a different one.
    CredentialSet,
    CredentialCleared,
    Opened,
    /// The connect attempt failed, or the open socket closed or errored.
    Lost,
    RetryElapsed { credential_present: bool },
    Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a connect attempt using the current credential.
    Connect,
    SendSubscribe,
    ScheduleRetry,
    /// Cancel the retry timer, abandon any pending connect, close the socket.
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: Phase,
    pub commands: Vec<Command>,
}

impl Transition {
    fn to(next: Phase, commands: &[Command]) -> Self {
        Self {
            next,
            commands: commands.to_vec(),
        }
    }

    fn stay(phase: Phase) -> Self {
        Self::to(phase, &[])
    }
}

pub fn transition(phase: Phase, event: Event) -> Transition {
    use self::Command::*;

    match (phase, event) {
        (_, Event::Teardown) | (_, Event::CredentialCleared) => Transition::to(Phase::Idle, &[Release]),

        (Phase::Idle, Event::CredentialSet) => Transition::to(Phase::Connecting, &[Connect]),
        (_, Event::CredentialSet) => Transition::to(Phase::Connecting, &[Release, Connect]),

        (Phase::Connecting, Event::Opened) => Transition::to(Phase::Subscribed, &[SendSubscribe]),
        (Phase::Connecting, Event::Lost) | (Phase::Subscribed, Event::Lost) => {
            Transition::to(Phase::Disconnected, &[Release, ScheduleRetry])
        }

        (Phase::Disconnected, Event::RetryElapsed { credential_present: true }) => {
            Transition::to(Phase::Connecting, &[Connect])
        }
        (Phase::Disconnected, Event::RetryElapsed { credential_present: false }) => {
            Transition::stay(Phase::Idle)
        }

        // Late events from a connection that no longer exists.
        (phase, _) => Transition::stay(phase),
    }
}
