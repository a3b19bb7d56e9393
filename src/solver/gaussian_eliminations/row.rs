use scuttlebutt::field::FiniteField as FF;

/// One linear constraint: a GF(2) coefficient vector packed into words, and a field target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Row<F: FF> {
    pub words: Vec<u64>,
    pub target: F,
}

impl<F: FF> Row<F> {
    pub fn zero(width: usize, target: F) -> Self {
        Self {
            words: vec![0; width.div_ceil(64)],
            target,
        }
    }

    #[cfg(test)]
    pub fn from_bits(bits: &[bool], target: F) -> Self {
        let mut row = Self::zero(bits.len(), target);
        for (i, b) in bits.iter().enumerate() {
            if *b {
                row.set(i);
            }
        }
        row
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, i: usize) {
        self.words[i / 64] |= 1 << (i % 64);
    }

    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let mut w = w;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(wi * 64 + bit)
            })
        })
    }
}

/// `matrix[added_row_idx] += matrix[add_row_idx]`, touching coefficient words from `from_word` on.
pub(crate) fn add_rows<F: FF>(
    matrix: &mut [Row<F>],
    added_row_idx: usize,
    add_row_idx: usize,
    from_word: usize,
) {
    debug_assert_ne!(added_row_idx, add_row_idx);

    let (src, dst) = if add_row_idx < added_row_idx {
        let (lo, hi) = matrix.split_at_mut(added_row_idx);
        (&lo[add_row_idx], &mut hi[0])
    } else {
        let (lo, hi) = matrix.split_at_mut(add_row_idx);
        (&hi[0], &mut lo[added_row_idx])
    };

    for (d, s) in dst.words[from_word..]
        .iter_mut()
        .zip(src.words[from_word..].iter())
    {
        *d ^= *s;
    }
    dst.target += src.target;
}
