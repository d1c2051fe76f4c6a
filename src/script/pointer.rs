#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PointerStatus {
    Running,
    Completed,
    Returned,
    Faulted,
}

/// Program counter of a thread plus its terminal state.
///
/// `Completed` is entered when the index passes the last command; `Returned` and
/// `Faulted` are set by command effects. Terminal states are sticky.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPointer {
    index: usize,
    count: usize,
    status: PointerStatus,
}

impl CommandPointer {
    pub fn new(count: usize) -> Self {
        Self {
            index: 0,
            count,
            status: if count == 0 {
                PointerStatus::Completed
            } else {
                PointerStatus::Running
            },
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn status(&self) -> PointerStatus {
        self.status
    }

    pub fn is_stopped(&self) -> bool {
        self.status != PointerStatus::Running
    }

    pub fn advance(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.index += 1;
        if self.index >= self.count {
            self.status = PointerStatus::Completed;
        }
    }

    pub fn mark_returned(&mut self) {
        if !self.is_stopped() {
            self.status = PointerStatus::Returned;
        }
    }

    pub fn fault(&mut self) {
        if !self.is_stopped() {
            self.status = PointerStatus::Faulted;
        }
    }
}
