/*!
 * Secure Random Bytes
 *
 * Same capability negotiation as the address waiter: prefer the modern
 * provider, fall back to the chunk-limited legacy one.
 */

mod chunk;
mod generator;

pub use chunk::{chunk_lengths, ChunkLengths};
pub use generator::{GenRandomFn, ProcessPrngFn, RandomCapabilities, RandomGenerator};
