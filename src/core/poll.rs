//! Poll tokens.
//!
//! Every fetch of server state takes a token before the request goes out.
//! When the answer arrives it is applied only if no newer poll has been
//! applied and no mutation finished since the token was issued; otherwise
//! the mutation's own response (or the newer poll) already reflects a more
//! recent server state.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollToken(u64);

#[derive(Debug, Default)]
pub struct PollTracker {
    issued: u64,
    applied: u64,
    barrier: u64,
}

impl PollTracker {
    pub fn begin(&mut self) -> PollToken {
        self.issued += 1;
        PollToken(self.issued)
    }

    /// True when the result for `token` may replace the current state.
    /// Accepting marks the token as applied.
    pub fn accept(&mut self, token: PollToken) -> bool {
        if token.0 <= self.applied || token.0 <= self.barrier {
            return false;
        }
        self.applied = token.0;
        true
    }

    /// Called after a mutation's response was applied: every poll issued
    /// before this point is stale.
    pub fn supersede(&mut self) {
        self.barrier = self.issued;
    }
}
