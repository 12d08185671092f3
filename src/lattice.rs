// src/lattice.rs
//
// Simple-cubic test/demo geometry: atoms on an nx × ny × nz lattice, grouped into
// cubic cells of `cell_atoms`^3 atoms (partial cells at the far edges), with a
// six-neighbour list. Flat indices run x fastest, matching Grid-style idx().

use crate::neighbours::NeighbourList;
use crate::system::{AtomisticSystem, Material};

#[derive(Debug, Clone, Copy)]
pub struct SimpleCubicLattice {
    pub n: [usize; 3],
    /// Lattice constant (m).
    pub a: f64,
    /// Atoms per cell edge.
    pub cell_atoms: usize,
    pub periodic: [bool; 3],
}

impl SimpleCubicLattice {
    pub fn new(n: [usize; 3], a: f64, cell_atoms: usize) -> Self {
        Self {
            n,
            a,
            cell_atoms: cell_atoms.max(1),
            periodic: [false; 3],
        }
    }

    pub fn with_periodic(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        self
    }

    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    #[inline]
    pub fn n_cells_along(&self) -> [usize; 3] {
        [
            self.n[0].div_ceil(self.cell_atoms),
            self.n[1].div_ceil(self.cell_atoms),
            self.n[2].div_ceil(self.cell_atoms),
        ]
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        let nc = self.n_cells_along();
        nc[0] * nc[1] * nc[2]
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.n[0] && j < self.n[1] && k < self.n[2]);
        (k * self.n[1] + j) * self.n[0] + i
    }

    #[inline]
    pub fn cell_of(&self, i: usize, j: usize, k: usize) -> usize {
        let nc = self.n_cells_along();
        let c = self.cell_atoms;
        ((k / c) * nc[1] + j / c) * nc[0] + i / c
    }

    /// Neighbour index along `axis`, offset ±1, honouring periodicity.
    ///
    /// Periodic wrapping is only applied to axes longer than two atoms so that no
    /// pair is listed twice.
    fn step(&self, pos: [usize; 3], axis: usize, forward: bool) -> Option<[usize; 3]> {
        let len = self.n[axis];
        let mut p = pos;
        if forward {
            if p[axis] + 1 < len {
                p[axis] += 1;
            } else if self.periodic[axis] && len > 2 {
                p[axis] = 0;
            } else {
                return None;
            }
        } else if p[axis] > 0 {
            p[axis] -= 1;
        } else if self.periodic[axis] && len > 2 {
            p[axis] = len - 1;
        } else {
            return None;
        }
        Some(p)
    }

    /// Build the atomistic inputs. `material_at([i, j, k])` picks each atom's material.
    pub fn build<F>(&self, materials: Vec<Material>, temperature: f64, material_at: F) -> AtomisticSystem
    where
        F: Fn([usize; 3]) -> usize,
    {
        let n_atoms = self.n_atoms();
        let n_cells = self.n_cells();
        let a3 = self.a * self.a * self.a;

        let mut cell_of_atom = vec![0usize; n_atoms];
        let mut material_of_atom = vec![0usize; n_atoms];
        let mut coords = vec![[0.0; 3]; n_atoms];
        let mut adjacency = vec![Vec::with_capacity(6); n_atoms];
        let mut cell_volumes = vec![0.0; n_cells];

        for k in 0..self.n[2] {
            for j in 0..self.n[1] {
                for i in 0..self.n[0] {
                    let atom = self.idx(i, j, k);
                    let cell = self.cell_of(i, j, k);
                    cell_of_atom[atom] = cell;
                    material_of_atom[atom] = material_at([i, j, k]);
                    coords[atom] = [i as f64 * self.a, j as f64 * self.a, k as f64 * self.a];
                    cell_volumes[cell] += a3;

                    for axis in 0..3 {
                        for forward in [false, true] {
                            if let Some([ni, nj, nk]) = self.step([i, j, k], axis, forward) {
                                adjacency[atom].push(self.idx(ni, nj, nk));
                            }
                        }
                    }
                }
            }
        }

        let mut system_dimensions = [0.0; 3];
        for axis in 0..3 {
            if self.periodic[axis] {
                system_dimensions[axis] = self.n[axis] as f64 * self.a;
            }
        }

        AtomisticSystem {
            n_cells,
            cell_of_atom,
            material_of_atom,
            materials,
            neighbours: NeighbourList::from_adjacency(&adjacency),
            coords,
            cell_volumes,
            temperature,
            atoms_per_unit_cell: 1.0,
            system_dimensions,
            local_cells: (0..n_cells).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_material() -> Vec<Material> {
        vec![Material::with_uniform_exchange(2e-23, 0.1, 0.0, 1e-21, 1)]
    }

    #[test]
    fn indexing_is_consistent() {
        let l = SimpleCubicLattice::new([4, 3, 2], 1.0, 2);
        assert_eq!(l.idx(0, 0, 0), 0);
        assert_eq!(l.idx(1, 0, 0), 1);
        assert_eq!(l.idx(0, 1, 0), 4);
        assert_eq!(l.idx(3, 2, 1), 23);
        assert_eq!(l.n_cells_along(), [2, 2, 1]);
        assert_eq!(l.cell_of(3, 2, 1), 3);
    }

    #[test]
    fn open_lattice_has_bulk_and_surface_coordination() {
        let sys = SimpleCubicLattice::new([3, 3, 3], 1.0, 3).build(one_material(), 0.0, |_| 0);
        assert!(sys.validate().is_ok());
        assert_eq!(sys.neighbours.of(13).len(), 6); // centre
        assert_eq!(sys.neighbours.of(0).len(), 3); // corner
    }

    #[test]
    fn periodic_lattice_is_uniformly_six_fold() {
        let sys = SimpleCubicLattice::new([4, 4, 4], 1.0, 2)
            .with_periodic([true; 3])
            .build(one_material(), 0.0, |_| 0);
        assert!((0..sys.n_atoms()).all(|a| sys.neighbours.of(a).len() == 6));
        assert_eq!(sys.system_dimensions, [4.0, 4.0, 4.0]);
        assert_eq!(sys.n_cells, 8);
        assert!(sys.cell_volumes.iter().all(|&v| v == 8.0));
    }
}
