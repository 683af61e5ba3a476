// =============================================================================
// The computer's "thinking" delay.
//
// The session does not own a clock. It hands the host a `ScheduledMove`
// ticket; the host waits `delay_ms` and reports the ticket back. Scheduling
// again or cancelling invalidates every earlier ticket, so a callback that
// fires late finds nothing to do.
// =============================================================================

use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Debug)]
pub struct ScheduledMove {
    pub token: u32,
    pub delay_ms: u32,
}

#[derive(Debug, Default)]
pub struct MoveTimer {
    last_token: u32,
    pending: Option<ScheduledMove>,
}

impl MoveTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh ticket, replacing any pending one.
    pub fn schedule(&mut self, delay_ms: u32) -> ScheduledMove {
        self.last_token = self.last_token.wrapping_add(1);
        let ticket = ScheduledMove { token: self.last_token, delay_ms };
        self.pending = Some(ticket);
        ticket
    }

    /// Drop the pending ticket, if any, and return it.
    pub fn cancel(&mut self) -> Option<ScheduledMove> {
        self.pending.take()
    }

    /// Consume the pending ticket if `token` names it. Stale or unknown
    /// tokens leave the timer untouched and return `false`.
    pub fn fire(&mut self, token: u32) -> bool {
        match self.pending {
            Some(ticket) if ticket.token == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<ScheduledMove> {
        self.pending
    }
}
