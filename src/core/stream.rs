//! Per-program status streams.
//!
//! Each supervised program owns exactly one one-way stream carrying
//! [`ProcState`] transitions to the supervision loop. The sending half is
//! held by the program record and cloned into every runner; the shutdown
//! controller uses the same half to push its `FATAL` override. The single
//! receiving half belongs to the loop.

use tokio::sync::mpsc;

use crate::core::state::ProcState;

/// Sending half of a program's status stream.
#[derive(Clone)]
pub struct StatusSender {
    tx: mpsc::UnboundedSender<ProcState>,
}

impl StatusSender {
    /// Emits a status transition.
    ///
    /// Errors are ignored if the receiving loop is gone.
    pub fn emit(&self, state: ProcState) {
        let _ = self.tx.send(state);
    }
}

/// Receiving half, owned by the supervision loop.
pub type StatusReceiver = mpsc::UnboundedReceiver<ProcState>;

/// Creates the stream for one program.
pub fn status_stream() -> (StatusSender, StatusReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StatusSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_transitions_in_order() {
        let (tx, mut rx) = status_stream();
        tx.emit(ProcState::Running);
        tx.emit(ProcState::Exited);
        assert_eq!(rx.recv().await, Some(ProcState::Running));
        assert_eq!(rx.recv().await, Some(ProcState::Exited));
    }

    #[test]
    fn emitting_without_a_receiver_is_harmless() {
        let (tx, rx) = status_stream();
        drop(rx);
        tx.emit(ProcState::Fatal);
    }
}
