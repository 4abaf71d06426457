use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;
use std::fmt::{Display, Formatter};

use crate::common::current_time_millis;
use crate::ID_GENERATOR;

const NODE_ID_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_SHIFT: u64 = SEQUENCE_BITS + NODE_ID_BITS;
const EPOCH: u64 = 1288834974657;

/// Opaque, lexicographically sortable revision token.
///
/// A `RevisionId` renders a time-derived 64-bit value as a fixed-width,
/// zero-padded lowercase hex string, so lexical order equals generation
/// order. Ids authored on different machines embed a node component;
/// colliding ids are rejected when the history loads, never silently
/// preferred.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    /// Generates a fresh time-derived id.
    pub fn fresh() -> Self {
        RevisionId(format!("{:016x}", ID_GENERATOR.next_token()))
    }

    /// Wraps an existing token.
    pub fn new(token: impl Into<String>) -> Self {
        RevisionId(token.into())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RevisionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(token: &str) -> Self {
        RevisionId(token.to_string())
    }
}

impl From<String> for RevisionId {
    fn from(token: String) -> Self {
        RevisionId(token)
    }
}

/// Thread-safe generator for time-derived revision tokens.
///
/// Produces 64-bit values laid out as
/// `timestamp (42 bits) | node id (10 bits) | sequence (12 bits)`, so values
/// generated by one process are strictly increasing and values from
/// different processes still order by wall-clock millisecond.
pub struct RevisionIdGenerator {
    node_id: u64,
    state: Mutex<GeneratorState>,
}

struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

impl RevisionIdGenerator {
    pub fn new() -> Self {
        let mut node_id = derive_node_id();
        if node_id > MAX_NODE_ID {
            warn!("Node id can't be greater than {}", MAX_NODE_ID);
            node_id = OsRng.gen_range(1..=MAX_NODE_ID);
        }
        info!("Initialized revision id generator with node id: {}", node_id);

        RevisionIdGenerator {
            node_id,
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
        }
    }

    /// Produces the next token, strictly greater than every previous token
    /// from this generator.
    pub fn next_token(&self) -> u64 {
        let mut state = self.state.lock();

        let mut timestamp = current_time_millis() as u64;
        // clock moved backwards: stay on the last observed millisecond
        if timestamp < state.last_timestamp {
            timestamp = state.last_timestamp;
        }

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // sequence exhausted within this millisecond
                timestamp += 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_timestamp = timestamp;

        ((timestamp - EPOCH) << TIMESTAMP_SHIFT)
            | (self.node_id << SEQUENCE_BITS)
            | state.sequence
    }
}

impl Default for RevisionIdGenerator {
    fn default() -> Self {
        RevisionIdGenerator::new()
    }
}

fn derive_node_id() -> u64 {
    let uuid = uuid::Uuid::new_v4();
    let uid = uuid.as_bytes();
    let rnd_byte = OsRng.gen::<u64>() & 0x000000FF;

    ((0x000000FF & uid[uid.len() - 1] as u64) | (0x0000FF00 & (rnd_byte << 8))) >> 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_unique_tokens() {
        let generator = RevisionIdGenerator::new();
        let mut tokens = Vec::new();
        for _ in 0..1000 {
            tokens.push(generator.next_token());
        }

        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(tokens.len(), unique.len());
    }

    #[test]
    fn tokens_are_strictly_increasing() {
        let generator = RevisionIdGenerator::new();
        let mut previous = generator.next_token();
        for _ in 0..1000 {
            let next = generator.next_token();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn fresh_ids_sort_lexicographically_in_generation_order() {
        let mut ids = Vec::new();
        for _ in 0..100 {
            ids.push(RevisionId::fresh());
        }

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn fresh_id_is_fixed_width_hex() {
        let id = RevisionId::fresh();
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn handles_clock_backwards() {
        let generator = RevisionIdGenerator::new();
        {
            let mut state = generator.state.lock();
            state.last_timestamp = current_time_millis() as u64 + 1000;
        }
        let token = generator.next_token();
        assert!(token > 0);
    }

    #[test]
    fn node_id_within_bounds() {
        let generator = RevisionIdGenerator::new();
        assert!(generator.node_id <= MAX_NODE_ID);
    }

    #[test]
    fn handles_multiple_concurrent_token_generation() {
        use std::sync::Arc;
        use std::thread;

        let generator = Arc::new(RevisionIdGenerator::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let generator = Arc::clone(&generator);
            handles.push(thread::spawn(move || {
                let mut tokens = Vec::new();
                for _ in 0..100 {
                    tokens.push(generator.next_token());
                }
                tokens
            }));
        }

        let mut all_tokens = Vec::new();
        for handle in handles {
            all_tokens.extend(handle.join().unwrap());
        }

        let mut unique = all_tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(all_tokens.len(), unique.len());
    }

    #[test]
    fn revision_id_display_and_from() {
        let id = RevisionId::from("00ff");
        assert_eq!(format!("{}", id), "00ff");
        assert_eq!(RevisionId::new("00ff"), id);
    }
}
