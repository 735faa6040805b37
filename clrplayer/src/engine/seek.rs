//! Relative seeking and the transient position readout

use super::{EngineMessage, PlaybackEngine};
use crate::model::SeekState;
use tracing::debug;

/// Clamp a seek target to `[0, duration]`, or `[0, ∞)` for indefinite items.
pub fn clamp_seek_target(target: f64, duration: Option<f64>) -> f64 {
    let target = if target.is_finite() { target.max(0.0) } else { 0.0 };
    match duration.filter(|d| d.is_finite() && *d > 0.0) {
        Some(duration) => target.min(duration),
        None => target,
    }
}

impl PlaybackEngine {
    /// Seek `delta` seconds from the current position.
    ///
    /// Ignored without a connection or on a stream that reports no
    /// seekable range. The readout is published only once the backend
    /// confirms the seek.
    pub fn seek_by(&mut self, delta: f64) {
        let Some(connection) = &self.connection else {
            debug!(delta, "Seek ignored: no active stream");
            return;
        };

        match connection.handle.seekable_range() {
            Some(range) if !range.is_empty() => {}
            _ => {
                debug!(stream = %connection.stream, delta, "Seek ignored: stream is not seekable");
                return;
            }
        }

        let position = connection.handle.current_position();
        let position = if position.is_finite() { position } else { 0.0 };
        let target = clamp_seek_target(position + delta, connection.handle.duration());
        let handle = connection.handle.clone();

        self.seek_token += 1;
        let token = self.seek_token;
        let generation = self.generation;
        let inbox = self.inbox_tx.clone();
        debug!(position, delta, target, token, "Seeking");

        tokio::spawn(async move {
            let finished = handle.seek(target, true).await;
            let _ = inbox.send(EngineMessage::SeekCompleted {
                generation,
                token,
                target,
                finished,
            });
        });
    }

    pub fn seek_forward(&mut self) {
        self.seek_by(self.settings.seek_step_seconds);
    }

    pub fn seek_backward(&mut self) {
        self.seek_by(-self.settings.seek_step_seconds);
    }

    pub(super) fn on_seek_completed(
        &mut self,
        generation: u64,
        token: u64,
        target: f64,
        finished: bool,
    ) {
        if !self.is_current(generation) || token != self.seek_token {
            debug!(token, latest = self.seek_token, "Dropping superseded seek");
            return;
        }
        if !finished {
            debug!(target, "Seek did not complete");
            return;
        }

        self.seek.current_position_seconds = Some(target);
        self.readout_token = token;
        self.schedule_readout_expiry(token);
        self.publish();
    }

    fn schedule_readout_expiry(&self, token: u64) {
        let inbox = self.inbox_tx.clone();
        let delay = self.settings.seek_hud;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inbox.send(EngineMessage::SeekHudExpired { token });
        });
    }

    pub(super) fn on_seek_hud_expired(&mut self, token: u64) {
        // The expiry belongs to the readout on screen, not to the latest seek issued
        if token != self.readout_token || self.seek.current_position_seconds.is_none() {
            return;
        }
        self.seek = SeekState::default();
        self.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_within_duration() {
        assert_eq!(clamp_seek_target(115.0, Some(200.0)), 115.0);
        assert_eq!(clamp_seek_target(390.0, Some(200.0)), 200.0);
        assert_eq!(clamp_seek_target(-5.0, Some(200.0)), 0.0);
    }

    #[test]
    fn test_clamp_indefinite() {
        assert_eq!(clamp_seek_target(5000.0, None), 5000.0);
        assert_eq!(clamp_seek_target(-1.0, None), 0.0);
        assert_eq!(clamp_seek_target(30.0, Some(f64::NAN)), 30.0);
        assert_eq!(clamp_seek_target(f64::NAN, Some(200.0)), 0.0);
    }
}
