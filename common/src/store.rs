use std::sync::{Arc, PoisonError, RwLock};

use crate::types::{Mode, MotorState, OperatorCommands, SharedStatus};

/// Shared record between the control loop (writer) and the status page
/// (readers). Every update swaps the whole record under the lock, so a
/// snapshot never mixes fields from two ticks.
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    status: RwLock<SharedStatus>,
    commands: RwLock<OperatorCommands>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, status: SharedStatus) {
        *self
            .inner
            .status
            .write()
            .unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn snapshot(&self) -> SharedStatus {
        *self
            .inner
            .status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn commands(&self) -> OperatorCommands {
        *self
            .inner
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the previous mode.
    pub fn set_mode(&self, mode: Mode) -> Mode {
        let mut commands = self
            .inner
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut commands.mode, mode)
    }

    /// Returns the previous manual motor request.
    pub fn set_manual_motor(&self, motor: MotorState) -> MotorState {
        let mut commands = self
            .inner
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut commands.manual_motor, motor)
    }
}
