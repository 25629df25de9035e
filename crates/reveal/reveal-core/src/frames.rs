//! Frame/timer scheduling capability.
//!
//! The engine never blocks: it asks the host for a callback on the next
//! frame and yields. The host answers by calling `Engine::update(now, ..)`.

use crate::error::Result;
use crate::ids::FrameToken;

/// Host frame scheduler (`requestAnimationFrame`, a game-loop hook, a test clock).
pub trait FrameScheduler {
    /// Ask for one callback on the next frame. On error no request is
    /// outstanding and the engine asks again on its next call.
    fn request_frame(&mut self) -> Result<FrameToken>;

    /// Withdraw a pending request. Must tolerate tokens that already fired.
    fn cancel_frame(&mut self, token: FrameToken);
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for Box<T> {
    fn request_frame(&mut self) -> Result<FrameToken> {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        (**self).cancel_frame(token)
    }
}

/// Scheduler for hosts that already tick every frame (e.g. an ECS system).
/// Requests are counted but otherwise ignored.
#[derive(Debug, Default)]
pub struct ContinuousFrames {
    next: u32,
}

impl ContinuousFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests made so far.
    pub fn requested(&self) -> u32 {
        self.next
    }
}

impl FrameScheduler for ContinuousFrames {
    fn request_frame(&mut self) -> Result<FrameToken> {
        self.next = self.next.wrapping_add(1);
        Ok(FrameToken(self.next))
    }

    fn cancel_frame(&mut self, _token: FrameToken) {}
}
