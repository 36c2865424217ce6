/*!
 * Chunk Splitting
 *
 * Splits a request into pieces no larger than the provider's per-call limit.
 */

use std::iter::FusedIterator;

/// Lengths of successive chunks covering `total` bytes
#[derive(Debug, Clone)]
pub struct ChunkLengths {
    remaining: usize,
    max: usize,
}

/// Chunk lengths for `total` bytes with at most `max_chunk` per chunk
///
/// A `max_chunk` of zero is treated as one.
pub fn chunk_lengths(total: usize, max_chunk: usize) -> ChunkLengths {
    ChunkLengths {
        remaining: total,
        max: max_chunk.max(1),
    }
}

impl Iterator for ChunkLengths {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let chunk = self.remaining.min(self.max);
        self.remaining -= chunk;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(self.max);
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkLengths {}
impl FusedIterator for ChunkLengths {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::LEGACY_MAX_CHUNK;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_just_over_legacy_limit() {
        let chunks: Vec<_> = chunk_lengths(LEGACY_MAX_CHUNK + 100, LEGACY_MAX_CHUNK).collect();
        assert_eq!(chunks, vec![LEGACY_MAX_CHUNK, 100]);
    }

    #[test]
    fn test_edges() {
        assert_eq!(chunk_lengths(0, 16).count(), 0);
        assert_eq!(chunk_lengths(16, 16).collect::<Vec<_>>(), vec![16]);
        assert_eq!(chunk_lengths(3, 0).collect::<Vec<_>>(), vec![1, 1, 1]);
    }

    proptest! {
        #[test]
        fn prop_chunks_cover_total(total in 0usize..100_000, max in 1usize..5_000) {
            let chunks: Vec<_> = chunk_lengths(total, max).collect();
            prop_assert_eq!(chunks.iter().sum::<usize>(), total);
            prop_assert!(chunks.iter().all(|&c| c >= 1 && c <= max));
            prop_assert_eq!(chunks.len(), chunk_lengths(total, max).len());
        }
    }
}
