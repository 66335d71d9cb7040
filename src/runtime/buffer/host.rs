//! Vector-backed host buffers
use std::fmt::Debug;

use crate::runtime::ItemTag;
use crate::runtime::buffer::CpuBufferReader;
use crate::runtime::buffer::CpuBufferWriter;
use crate::runtime::buffer::Tags;

/// Input buffer holding the items a stage has not consumed yet.
#[derive(Debug)]
pub struct Reader<T> {
    data: Vec<T>,
    tags: Vec<ItemTag>,
    finished: bool,
}

impl<T> Default for Reader<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            tags: Vec::new(),
            finished: false,
        }
    }
}

impl<T> Reader<T> {
    /// Replace the buffer content.
    pub fn set(&mut self, data: Vec<T>) {
        self.set_with_tags(data, Vec::new());
    }

    /// Replace the buffer content and tags.
    ///
    /// Tags are sorted by index. The sort is stable, so tags on the same item
    /// keep their order.
    pub fn set_with_tags(&mut self, data: Vec<T>, mut tags: Vec<ItemTag>) {
        tags.sort_by_key(|t| t.index);
        self.data = data;
        self.tags = tags;
    }

    /// Append items.
    pub fn push(&mut self, data: Vec<T>) {
        self.push_with_tags(data, Vec::new());
    }

    /// Append items and tags. Tag indices are relative to `data`.
    pub fn push_with_tags(&mut self, mut data: Vec<T>, tags: Vec<ItemTag>) {
        let offset = self.data.len();
        self.data.append(&mut data);
        self.tags.extend(tags.into_iter().map(|mut t| {
            t.index += offset;
            t
        }));
        self.tags.sort_by_key(|t| t.index);
    }

    /// Mark upstream as finished.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Send> CpuBufferReader for Reader<T> {
    type Item = T;

    fn slice_with_tags(&mut self) -> (&[T], &Vec<ItemTag>) {
        (&self.data, &self.tags)
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.data.len());
        let n = n.min(self.data.len());
        self.data.drain(..n);
        self.tags.retain(|t| t.index >= n);
        for t in self.tags.iter_mut() {
            t.index -= n;
        }
    }

    fn finished(&self) -> bool {
        self.finished
    }
}

/// Bounded output buffer.
///
/// The writer hands out at most `capacity - produced` items of free space.
#[derive(Debug)]
pub struct Writer<T> {
    buf: Vec<T>,
    produced: usize,
    tags: Vec<ItemTag>,
}

impl<T> Default for Writer<T> {
    fn default() -> Self {
        Self {
            buf: Vec::new(),
            produced: 0,
            tags: Vec::new(),
        }
    }
}

impl<T: Clone + Default> Writer<T> {
    /// Make room for `n` more items.
    pub fn reserve(&mut self, n: usize) {
        self.buf.resize(self.produced + n, T::default());
    }

    /// Copy of the produced items and their tags.
    pub fn get(&self) -> (Vec<T>, Vec<ItemTag>) {
        (self.buf[..self.produced].to_vec(), self.tags.clone())
    }

    /// Take the produced items and their tags, freeing the space.
    pub fn take(&mut self) -> (Vec<T>, Vec<ItemTag>) {
        let capacity = self.buf.len();
        let mut items: Vec<T> = self.buf.drain(..self.produced).collect();
        items.shrink_to_fit();
        self.buf.resize(capacity, T::default());
        self.produced = 0;
        (items, std::mem::take(&mut self.tags))
    }

    /// Number of produced items.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Free space in items.
    pub fn space(&self) -> usize {
        self.buf.len() - self.produced
    }
}

impl<T: Clone + Debug + Default + Send> CpuBufferWriter for Writer<T> {
    type Item = T;

    fn slice_with_tags(&mut self) -> (&mut [T], Tags<'_>) {
        let offset = self.produced;
        (&mut self.buf[offset..], Tags::new(&mut self.tags, offset))
    }

    fn produce(&mut self, n: usize) {
        debug_assert!(self.produced + n <= self.buf.len());
        self.produced += n;
    }
}
