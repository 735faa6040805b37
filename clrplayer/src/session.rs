//! Audio-session collaborator
//!
//! The platform audio session is process-wide. The engine only asks it to
//! configure and activate, and listens to the events it broadcasts.

use crate::errors::Result;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCategory {
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChangeReason {
    NewDeviceAvailable,
    OldDeviceUnavailable,
    CategoryChange,
    Override,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    InterruptionBegan,
    InterruptionEnded { should_resume: bool },
    RouteChanged(RouteChangeReason),
    EnteredBackground,
    EnteredForeground,
}

pub trait AudioSession: Send + Sync {
    fn configure(&self, category: SessionCategory) -> Result<()>;

    fn activate(&self) -> Result<()>;

    /// New receiver of session events. Dropping it unsubscribes.
    fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent>;
}
