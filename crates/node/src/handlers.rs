//! Protocol handlers, one module per message family.

use serde_json::Value;
use synapse_network_primitives::envelope::Payload;

pub mod data;
pub mod health;
pub mod peer;
pub mod reply;

fn payload<const N: usize>(entries: [(&str, Value); N]) -> Payload {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}
