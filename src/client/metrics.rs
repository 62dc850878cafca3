use std::collections::HashMap;

use super::Operation;

#[derive(Debug, Default)]
pub struct Metrics {
    success_counts: HashMap<Operation, u64>,
    failure_counts: HashMap<Operation, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, operation: Operation) {
        *self.success_counts.entry(operation).or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, operation: Operation) {
        *self.failure_counts.entry(operation).or_insert(0) += 1;
    }

    pub fn get_success_count(&self, operation: Operation) -> u64 {
        *self.success_counts.get(&operation).unwrap_or(&0)
    }

    pub fn get_failure_count(&self, operation: Operation) -> u64 {
        *self.failure_counts.get(&operation).unwrap_or(&0)
    }

    pub fn get_success_rate(&self, operation: Operation) -> f32 {
        let success = self.get_success_count(operation) as f32;
        let total = success + self.get_failure_count(operation) as f32;

        if total == 0.0 {
            0.0
        } else {
            success / total
        }
    }
}
