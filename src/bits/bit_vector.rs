/// Packed row-selection set over `[0, len)`.
///
/// Bits at or past `len` are kept at zero, so `not` and `cardinality`
/// only ever see real rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
}

impl BitVector {
    pub fn new(len: usize) -> Self {
        BitVector {
            words: vec![0u64; len.div_ceil(64)],
            len,
        }
    }

    /// Every row selected.
    pub fn full(len: usize) -> Self {
        let mut set = BitVector::new(len);
        set.not();
        set
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        i < self.len && self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    #[inline]
    pub fn set(&mut self, i: usize) {
        assert!(i < self.len, "bit {} out of range for length {}", i, self.len);
        self.words[i / 64] |= 1u64 << (i % 64);
    }

    #[inline]
    pub fn unset(&mut self, i: usize) {
        if i < self.len {
            self.words[i / 64] &= !(1u64 << (i % 64));
        }
    }

    pub fn set_to(&mut self, i: usize, on: bool) {
        if on {
            self.set(i);
        } else {
            self.unset(i);
        }
    }

    /// Lowest set bit at or after `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        if from >= self.len {
            return None;
        }
        let mut x = from / 64;
        let word = self.words[x] >> (from % 64);
        if word != 0 {
            return Some(from + word.trailing_zeros() as usize);
        }
        x += 1;
        while x < self.words.len() {
            if self.words[x] != 0 {
                return Some(x * 64 + self.words[x].trailing_zeros() as usize);
            }
            x += 1;
        }
        None
    }

    /// Keep only rows also set in `other`.
    pub fn and(&mut self, other: &BitVector) {
        for (i, word) in self.words.iter_mut().enumerate() {
            *word &= other.words.get(i).copied().unwrap_or(0);
        }
    }

    pub fn or(&mut self, other: &BitVector) {
        for (word, o) in self.words.iter_mut().zip(other.words.iter()) {
            *word |= *o;
        }
        self.mask_tail();
    }

    /// Complement over `[0, len)`.
    pub fn not(&mut self) {
        for word in self.words.iter_mut() {
            *word = !*word;
        }
        self.mask_tail();
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> SetBits<'_> {
        SetBits { set: self, next: 0 }
    }

    fn mask_tail(&mut self) {
        let tail = self.len % 64;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
    }
}

/// Iterator over set bit positions in ascending order.
pub struct SetBits<'a> {
    set: &'a BitVector,
    next: usize,
}

impl Iterator for SetBits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let found = self.set.next_set_bit(self.next)?;
        self.next = found + 1;
        Some(found)
    }
}

impl<'a> IntoIterator for &'a BitVector {
    type Item = usize;
    type IntoIter = SetBits<'a>;

    fn into_iter(self) -> SetBits<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_unset() {
        let mut set = BitVector::new(130);
        set.set(0);
        set.set(64);
        set.set(129);
        assert!(set.get(64));
        assert!(!set.get(65));
        set.unset(64);
        assert!(!set.get(64));
        assert_eq!(set.cardinality(), 2);
        assert!(!set.get(500));
    }

    #[test]
    fn next_set_bit_walks_words() {
        let mut set = BitVector::new(10_000);
        for i in [5, 34, 782, 2343, 3002] {
            set.set(i);
        }
        assert_eq!(set.next_set_bit(0), Some(5));
        assert_eq!(set.next_set_bit(6), Some(34));
        assert_eq!(set.next_set_bit(3003), None);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![5, 34, 782, 2343, 3002]);
    }

    #[test]
    fn not_stays_inside_length() {
        let mut set = BitVector::new(70);
        set.set(3);
        set.not();
        assert_eq!(set.cardinality(), 69);
        assert!(!set.get(3));
        assert_eq!(set.iter().last(), Some(69));
        assert_eq!(BitVector::full(64).cardinality(), 64);
        assert_eq!(BitVector::full(0).cardinality(), 0);
    }

    #[test]
    fn and_intersects() {
        let mut a = BitVector::new(100);
        let mut b = BitVector::new(100);
        for i in [1, 2, 3, 90] {
            a.set(i);
        }
        for i in [2, 90, 99] {
            b.set(i);
        }
        a.and(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![2, 90]);

        let mut c = a.clone();
        c.or(&b);
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![2, 90, 99]);

        c.clear();
        assert_eq!(c.cardinality(), 0);
    }
}
