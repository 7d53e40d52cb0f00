use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One executed query, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub executed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    #[serde(rename_all = "camelCase")]
    Success {
        row_count: u64,
        /// In milliseconds.
        execution_time: f64,
    },
    Error { message: String },
}

impl HistoryItem {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// The most recent executions, oldest first. Once full, every new item pushes out the oldest one.
#[derive(Debug, Clone)]
pub struct History {
    items: VecDeque<HistoryItem>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        // A history that can't hold anything would make select_history_item useless.
        let capacity = capacity.max(1);

        // The limit is user configuration, memory is only taken as items come in.
        History {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Keeps only the newest `capacity` items.
    pub fn from_items(items: Vec<HistoryItem>, capacity: usize) -> Self {
        let mut history = History::new(capacity);

        for item in items {
            history.push(item);
        }

        history
    }

    pub fn push(&mut self, item: HistoryItem) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }

        self.items.push_back(item);
    }

    pub fn get(&self, index: usize) -> Option<&HistoryItem> {
        self.items.get(index)
    }

    pub fn last(&self) -> Option<&HistoryItem> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryItem> {
        self.items.iter().cloned().collect()
    }
}
