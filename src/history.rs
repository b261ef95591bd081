/// Fixed-capacity circular buffer, overwriting the oldest entry when full.
///
/// Backs the motion history shown in snapshots and the sliding windows of the
/// detectors. Storage is inline, so pushing never allocates; `to_vec` is the
/// only allocating call and linearizes oldest-first.
#[derive(Clone, Debug)]
pub struct HistoryRing<T, const N: usize> {
    buf: [T; N],
    head: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> Default for HistoryRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> HistoryRing<T, N> {
    pub fn new() -> Self {
        Self {
            buf: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        self.buf[self.head] = value;
        self.head = (self.head + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = T> + Clone + '_ {
        let start = (self.head + N - self.len) % N;
        (0..self.len).map(move |i| self.buf[(start + i) % N])
    }

    pub fn latest(&self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            Some(self.buf[(self.head + N - 1) % N])
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
