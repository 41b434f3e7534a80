//! Advisory progress timeline for ticket statuses.
//!
//! The timeline is display-only: stores accept any status after any other.

use serde::{Deserialize, Serialize};

use crate::TicketStatus;

/// Progress of a single stage relative to a ticket's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Completed,
    Active,
    Pending,
}

/// One step of a rendered timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub status: TicketStatus,
    pub state: StageState,
}

impl TicketStatus {
    /// Ordered stages used for progress display.
    pub const TIMELINE: [TicketStatus; 4] = [
        Self::Submitted,
        Self::InProgress,
        Self::AwaitingParts,
        Self::Completed,
    ];

    /// Position of this status in [`TicketStatus::TIMELINE`].
    pub fn stage_index(&self) -> usize {
        Self::TIMELINE
            .iter()
            .position(|stage| stage == self)
            .unwrap_or(0)
    }
}

/// Builds the per-stage progress for `status`.
pub fn timeline(status: TicketStatus) -> Vec<TimelineStep> {
    let current = status.stage_index();
    TicketStatus::TIMELINE
        .iter()
        .enumerate()
        .map(|(index, stage)| TimelineStep {
            status: *stage,
            state: match index.cmp(&current) {
                std::cmp::Ordering::Less => StageState::Completed,
                std::cmp::Ordering::Equal => StageState::Active,
                std::cmp::Ordering::Greater => StageState::Pending,
            },
        })
        .collect()
}
