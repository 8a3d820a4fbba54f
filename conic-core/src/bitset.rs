use std::fmt;

const WORD_BITS: usize = usize::BITS as usize;

/// Growable bitset over small indices.
///
/// Trailing zero words are always trimmed, so derived equality and hashing are structural.
#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub struct BitSet {
    words: Vec<usize>,
}

impl BitSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves room for indices below `bits` without setting any of them.
    #[inline]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(WORD_BITS)),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.words.clear();
    }

    #[inline]
    fn trim(&mut self) {
        while self.words.last().is_some_and(|w| *w == 0) {
            self.words.pop();
        }
    }

    #[inline(always)]
    pub fn copy_from(&mut self, other: &Self) {
        self.words.clear();
        self.words.extend_from_slice(&other.words);
    }

    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        let word = idx / WORD_BITS;
        let bit = idx % WORD_BITS;
        self.words
            .get(word)
            .is_some_and(|w| (*w & (1usize << bit)) != 0)
    }

    #[inline]
    pub fn insert(&mut self, idx: usize) {
        let word = idx / WORD_BITS;
        let bit = idx % WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1usize << bit;
    }

    #[inline]
    pub fn remove(&mut self, idx: usize) {
        let word = idx / WORD_BITS;
        let bit = idx % WORD_BITS;
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1usize << bit);
            self.trim();
        }
    }

    #[inline]
    pub fn intersection_inplace(&mut self, other: &Self) {
        let min_len = self.words.len().min(other.words.len());
        for i in 0..min_len {
            self.words[i] &= other.words[i];
        }
        self.words.truncate(min_len);
        self.trim();
    }

    #[inline]
    pub fn intersection_inplace_and_count(&mut self, other: &Self) -> usize {
        let min_len = self.words.len().min(other.words.len());
        let mut count = 0usize;
        for i in 0..min_len {
            let word = self.words[i] & other.words[i];
            self.words[i] = word;
            count += word.count_ones() as usize;
        }
        self.words.truncate(min_len);
        self.trim();
        count
    }

    #[inline]
    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn count_intersection(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Number of members strictly below `bound`.
    #[inline]
    pub fn count_below(&self, bound: usize) -> usize {
        let full = bound / WORD_BITS;
        let rest = bound % WORD_BITS;
        let mut count: usize = self
            .words
            .iter()
            .take(full)
            .map(|w| w.count_ones() as usize)
            .sum();
        if rest != 0
            && let Some(w) = self.words.get(full)
        {
            count += (w & ((1usize << rest) - 1)).count_ones() as usize;
        }
        count
    }

    #[inline]
    pub fn subset_of(&self, other: &Self) -> bool {
        if self.words.len() > other.words.len() {
            return false;
        }
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| (a & !b) == 0)
    }

    #[inline]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| (a & b) == 0)
    }

    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter::new(&self.words)
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = BitSet::new();
        for idx in iter {
            set.insert(idx);
        }
        set
    }
}

pub struct BitSetIter<'a> {
    words: &'a [usize],
    next_word_idx: usize,
    current_word_idx: usize,
    current_word: usize,
}

impl<'a> BitSetIter<'a> {
    fn new(words: &'a [usize]) -> Self {
        Self {
            words,
            next_word_idx: 0,
            current_word_idx: 0,
            current_word: 0,
        }
    }
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current_word == 0 {
            let word = self.words.get(self.next_word_idx).copied()?;
            self.current_word_idx = self.next_word_idx;
            self.next_word_idx += 1;
            self.current_word = word;
        }
        let bit = self.current_word.trailing_zeros() as usize;
        self.current_word &= self.current_word - 1;
        Some(self.current_word_idx * WORD_BITS + bit)
    }
}
