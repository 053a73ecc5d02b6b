//! Unit of work for the scheduling primitives

use serde::{Deserialize, Serialize};

/// A schedulable unit of work: an identifier plus opaque bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Caller-assigned identifier
    pub id: i64,
    /// Opaque payload handed back to the executor
    pub data: Vec<u8>,
}

impl Task {
    /// Create a task.
    pub fn new(id: i64, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// Encode as id (8 bytes big-endian) followed by the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.data.len());
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Decode; input shorter than the id field is `None`.
    pub fn from_bytes(b: &[u8]) -> Option<Self> {
        if b.len() < 8 {
            return None;
        }
        let id = i64::from_be_bytes(b[..8].try_into().ok()?);
        Some(Self {
            id,
            data: b[8..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let task = Task::new(-7, vec![1, 2, 3]);
        assert_eq!(Task::from_bytes(&task.to_bytes()), Some(task));
    }

    #[test]
    fn test_empty_payload() {
        let task = Task::new(0, vec![]);
        assert_eq!(Task::from_bytes(&task.to_bytes()), Some(task));
    }

    #[test]
    fn test_short_input() {
        assert_eq!(Task::from_bytes(&[1, 2, 3]), None);
    }
}
