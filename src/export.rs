//! Chunked export engine — streams a filtered, sorted asset collection to a
//! consumer in bounded batches without holding the whole collection as
//! fully-resolved items. Secondary resolution runs with bounded fan-out;
//! completions are consumed in enumeration order by a single coordinator
//! loop, so a batch is only ever reported after every item queued into it
//! has a resolution outcome.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::item::{self, LibraryItem};
use crate::resolver::{FileResolver, Resolution};
use crate::store::AssetRecord;

/// Default number of secondary resolutions in flight at once. Correctness
/// does not depend on the bound; it only caps I/O fan-out.
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

/// Caller-supplied export tuning. A zero value disables the corresponding
/// limit; the final-item flush is unconditional, so every export terminates
/// with exactly one `is_last` batch regardless of these settings.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Stop enumeration after this many items (0 = unbounded).
    pub max_items: usize,
    /// Flush a chunk once it holds this many items (0 = no count flush).
    pub items_in_chunk: usize,
    /// Flush a chunk once this much time has elapsed since it started
    /// (zero = no time flush).
    pub chunk_time: Duration,
    /// Report original file names instead of the store's plain file names.
    pub use_original_file_names: bool,
    /// Include album membership on every item.
    pub include_album_data: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_items: 0,
            items_in_chunk: 0,
            chunk_time: Duration::ZERO,
            use_original_file_names: false,
            include_album_data: false,
        }
    }
}

/// One delivered chunk. Serializes as the `{library, chunkNum, isLastChunk}`
/// envelope host shells expect.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    #[serde(rename = "library")]
    pub items: Vec<LibraryItem>,
    #[serde(rename = "chunkNum")]
    pub chunk_index: usize,
    #[serde(rename = "isLastChunk")]
    pub is_last: bool,
}

/// Counters for one completed (or cancelled) export.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportStats {
    pub items: usize,
    pub batches: usize,
    pub unresolved: usize,
    pub cancelled: bool,
}

/// Drives chunked exports. Owns the resolver and the fan-out bound; all
/// per-export state lives on the stack of [`Exporter::run`], so independent
/// exports never share anything mutable.
pub struct Exporter {
    resolver: Arc<dyn FileResolver>,
    resolve_concurrency: usize,
}

impl Exporter {
    pub fn new(resolver: Arc<dyn FileResolver>) -> Self {
        Self {
            resolver,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
        }
    }

    /// Override the resolution fan-out bound (clamped to at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.resolve_concurrency = concurrency.max(1);
        self
    }

    /// Export an already-queried, ordered record set as batches.
    ///
    /// `on_batch` is invoked with batches in ascending chunk order; items
    /// inside a batch preserve the record order. Exactly one batch carries
    /// `is_last = true` and it is the last one delivered, including the
    /// degenerate cases (empty record set, truncation by `max_items`).
    ///
    /// An unresolved item is delivered inside its batch with no file path;
    /// it never aborts the export. Cancellation stops delivery between
    /// completions and discards outstanding resolutions.
    pub async fn run<F>(
        &self,
        records: Vec<AssetRecord>,
        options: &ExportOptions,
        cancel: &CancellationToken,
        mut on_batch: F,
    ) -> ExportStats
    where
        F: FnMut(Batch),
    {
        let mut stats = ExportStats::default();

        let total = records.len();
        if total == 0 {
            stats.batches = 1;
            on_batch(Batch {
                items: Vec::new(),
                chunk_index: 0,
                is_last: true,
            });
            return stats;
        }

        // The truncation guard runs before item `i` is projected, so a
        // capped export simply never touches records past the cap.
        let take = if options.max_items > 0 {
            options.max_items.min(total)
        } else {
            total
        };
        if take < total {
            tracing::debug!(total, take, "export truncated by max_items");
        }

        let use_original = options.use_original_file_names;
        let include_albums = options.include_album_data;
        let resolver = &self.resolver;

        // Projection happens synchronously as each record is pulled from the
        // stream; only the file lookup is deferred to the per-item future.
        // `buffered` keeps completions in enumeration order while letting up
        // to `resolve_concurrency` lookups overlap.
        let mut completions = stream::iter(records.into_iter().take(take).enumerate())
            .map(|(index, record)| {
                let item = item::project(&record, use_original, include_albums);
                let resolver = Arc::clone(resolver);
                async move {
                    let outcome = resolver.resolve(&item.id, item.mime_category()).await;
                    (index, item, outcome)
                }
            })
            .buffered(self.resolve_concurrency);

        let mut batch: Vec<LibraryItem> = Vec::new();
        let mut chunk_index = 0usize;
        let mut chunk_started = Instant::now();

        loop {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    stats.cancelled = true;
                    break;
                }
                next = completions.next() => next,
            };
            let Some((index, mut item, outcome)) = next else {
                break;
            };

            match outcome {
                Resolution::Resolved(path) => item.file_path = Some(path),
                Resolution::Unresolved => stats.unresolved += 1,
            }
            batch.push(item);
            stats.items += 1;

            // The natural last item of the full enumeration wins over count
            // and time boundaries: the final flush keeps the chunk index it
            // was assembled under.
            if take == total && index + 1 == take {
                stats.batches += 1;
                on_batch(Batch {
                    items: std::mem::take(&mut batch),
                    chunk_index,
                    is_last: true,
                });
                break;
            }

            let count_hit =
                options.items_in_chunk > 0 && batch.len() == options.items_in_chunk;
            let time_hit = !options.chunk_time.is_zero()
                && chunk_started.elapsed() >= options.chunk_time;
            if count_hit || time_hit {
                stats.batches += 1;
                on_batch(Batch {
                    items: std::mem::take(&mut batch),
                    chunk_index,
                    is_last: false,
                });
                chunk_index += 1;
                chunk_started = Instant::now();
            }

            // Truncation boundary: the item cap was reached short of the
            // full enumeration. Whatever is still buffered goes out as the
            // final batch, which is empty when the cap coincided with a
            // flush above.
            if take < total && index + 1 == take {
                stats.batches += 1;
                on_batch(Batch {
                    items: std::mem::take(&mut batch),
                    chunk_index,
                    is_last: true,
                });
                break;
            }
        }

        stats
    }
}
