//! Buffer interfaces between stages
//!
//! Stages are generic over their reader and writer so an external scheduler can
//! hand them its own buffers. [`host`] provides bounded, vector-backed buffers
//! used by the [`Mocker`](crate::runtime::Mocker), tests and benchmarks.
pub mod host;

use crate::runtime::ItemTag;
use crate::runtime::Tag;

/// Reader side of a stream buffer.
pub trait CpuBufferReader: Default + Send {
    /// Buffer Items
    type Item;
    /// Available items.
    fn slice(&mut self) -> &[Self::Item] {
        self.slice_with_tags().0
    }
    /// Available items and their tags.
    ///
    /// Tag indices are relative to the start of the returned slice and sorted.
    fn slice_with_tags(&mut self) -> (&[Self::Item], &Vec<ItemTag>);
    /// Consume `n` items, dropping their tags.
    fn consume(&mut self, n: usize);
    /// Whether upstream is done and will not produce more items.
    fn finished(&self) -> bool;
}

/// Writer side of a stream buffer.
pub trait CpuBufferWriter: Default + Send {
    /// Buffer Items
    type Item;
    /// Free space for output items.
    fn slice(&mut self) -> &mut [Self::Item] {
        self.slice_with_tags().0
    }
    /// Free space for output items plus a handle to tag them.
    fn slice_with_tags(&mut self) -> (&mut [Self::Item], Tags<'_>);
    /// Commit `n` items written to the front of the free space.
    fn produce(&mut self, n: usize);
}

/// Tag sink for the output slice currently handed out by a writer.
pub struct Tags<'a> {
    tags: &'a mut Vec<ItemTag>,
    offset: usize,
}

impl<'a> Tags<'a> {
    /// Create a tag sink whose indices are shifted by `offset`.
    pub fn new(tags: &'a mut Vec<ItemTag>, offset: usize) -> Self {
        Self { tags, offset }
    }

    /// Tag item `index` of the current output slice.
    pub fn add_tag(&mut self, index: usize, tag: Tag) {
        self.tags.push(ItemTag {
            index: index + self.offset,
            tag,
        });
    }
}
