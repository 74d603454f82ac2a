// search - Streaming nearest-ST search over a reference database.

mod engine;

pub use engine::{search, BestHit};
