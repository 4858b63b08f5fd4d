// SPDX-License-Identifier: Apache-2.0

//! Truth tables over `k` variables, stored as a bit-vector of length `2^k`.
//!
//! Bit `i` holds the function value on the input assignment encoded by `i`:
//! variable `v` takes the value `(i >> v) & 1`, so variable 0 toggles fastest.

use bitvec::vec::BitVec;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TruthTable {
    num_vars: usize,
    bits: BitVec,
}

impl TruthTable {
    pub fn const0(num_vars: usize) -> Self {
        Self {
            num_vars,
            bits: BitVec::repeat(false, 1usize << num_vars),
        }
    }

    pub fn const1(num_vars: usize) -> Self {
        Self {
            num_vars,
            bits: BitVec::repeat(true, 1usize << num_vars),
        }
    }

    /// Projection onto variable `index`.
    pub fn var(num_vars: usize, index: usize) -> Self {
        assert!(
            index < num_vars,
            "TruthTable::var index {} out of range (num_vars = {})",
            index,
            num_vars
        );
        Self {
            num_vars,
            bits: (0..1usize << num_vars)
                .map(|i| (i >> index) & 1 == 1)
                .collect(),
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn get_bit(&self, assignment_index: usize) -> bool {
        self.bits[assignment_index]
    }

    pub fn set_bit(&mut self, assignment_index: usize, value: bool) {
        self.bits.set(assignment_index, value);
    }

    #[must_use]
    pub fn not(&self) -> Self {
        Self {
            num_vars: self.num_vars,
            bits: self.bits.iter().map(|b| !*b).collect(),
        }
    }

    /// Complements the table when `negated` is set.
    #[must_use]
    pub fn maybe_not(&self, negated: bool) -> Self {
        if negated { self.not() } else { self.clone() }
    }

    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a & b)
    }

    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a | b)
    }

    #[must_use]
    pub fn xor(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a ^ b)
    }

    #[must_use]
    pub fn maj(a: &Self, b: &Self, c: &Self) -> Self {
        assert_eq!(a.num_vars, b.num_vars);
        assert_eq!(a.num_vars, c.num_vars);
        Self {
            num_vars: a.num_vars,
            bits: (0..a.bits.len())
                .map(|i| {
                    let (x, y, z) = (a.bits[i], b.bits[i], c.bits[i]);
                    (x & y) | (x & z) | (y & z)
                })
                .collect(),
        }
    }

    fn zip_with(&self, other: &Self, f: impl Fn(bool, bool) -> bool) -> Self {
        assert_eq!(
            self.num_vars, other.num_vars,
            "truth tables over different variable counts"
        );
        Self {
            num_vars: self.num_vars,
            bits: (0..self.bits.len())
                .map(|i| f(self.bits[i], other.bits[i]))
                .collect(),
        }
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_const0(&self) -> bool {
        self.bits.not_any()
    }

    pub fn is_const1(&self) -> bool {
        self.bits.all()
    }

    /// Assignment indices on which the function is true, ascending.
    pub fn onset(&self) -> Vec<usize> {
        self.bits.iter_ones().collect()
    }

    /// Binary rendering with the highest assignment index first.
    pub fn to_binary_string(&self) -> String {
        self.bits
            .iter()
            .rev()
            .map(|b| if *b { '1' } else { '0' })
            .collect()
    }
}
