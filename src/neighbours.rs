// src/neighbours.rs
//
// Compressed (CSR) atom adjacency, as handed over by the neighbour-list builder.
// Atom `a` owns the slice `neighbours[start[a]..end[a]]`.

use crate::error::SetupError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighbourList {
    pub neighbours: Vec<usize>,
    pub start: Vec<usize>,
    pub end: Vec<usize>,
}

impl NeighbourList {
    /// Build from per-atom neighbour vectors (packed in atom order).
    pub fn from_adjacency(adjacency: &[Vec<usize>]) -> Self {
        let total: usize = adjacency.iter().map(Vec::len).sum();
        let mut neighbours = Vec::with_capacity(total);
        let mut start = Vec::with_capacity(adjacency.len());
        let mut end = Vec::with_capacity(adjacency.len());
        for nbrs in adjacency {
            start.push(neighbours.len());
            neighbours.extend_from_slice(nbrs);
            end.push(neighbours.len());
        }
        Self {
            neighbours,
            start,
            end,
        }
    }

    /// Number of atoms the list describes.
    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.start.len()
    }

    /// Neighbours of `atom`. Only valid after `validate`.
    #[inline]
    pub fn of(&self, atom: usize) -> &[usize] {
        &self.neighbours[self.start[atom]..self.end[atom]]
    }

    pub fn validate(&self, n_atoms: usize) -> Result<(), SetupError> {
        if self.start.len() != n_atoms {
            return Err(SetupError::LengthMismatch {
                what: "neighbour list start index",
                expected: n_atoms,
                got: self.start.len(),
            });
        }
        if self.end.len() != n_atoms {
            return Err(SetupError::LengthMismatch {
                what: "neighbour list end index",
                expected: n_atoms,
                got: self.end.len(),
            });
        }
        let len = self.neighbours.len();
        for (&s, &e) in self.start.iter().zip(self.end.iter()) {
            if s > e {
                return Err(SetupError::IndexOutOfRange {
                    what: "neighbour list start",
                    index: s,
                    bound: e,
                });
            }
            if e > len {
                return Err(SetupError::IndexOutOfRange {
                    what: "neighbour list end",
                    index: e,
                    bound: len,
                });
            }
        }
        if let Some(&bad) = self.neighbours.iter().find(|&&j| j >= n_atoms) {
            return Err(SetupError::IndexOutOfRange {
                what: "neighbour atom",
                index: bad,
                bound: n_atoms,
            });
        }
        Ok(())
    }
}
