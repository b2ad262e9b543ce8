use crate::domain::id::TaskName;

/// Hands out task names of the form `<category>_<8-digit id>`.
///
/// Each builder owns its generator, so names are unique per builder and restart at 1 for a new one.
#[derive(Debug, Clone)]
pub struct TaskIdGenerator {
    next_id: u64,
}

impl TaskIdGenerator {
    pub fn new() -> Self {
        TaskIdGenerator { next_id: 1 }
    }

    /// Returns the task name and its numeric id.
    pub fn next_name(&mut self, category: &str) -> (TaskName, String) {
        let id = format!("{:08}", self.next_id);
        self.next_id += 1;
        (TaskName::new(format!("{}_{}", category, id)), id)
    }
}

impl Default for TaskIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
