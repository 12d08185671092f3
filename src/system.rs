// src/system.rs
//
// Atomistic inputs consumed at setup: materials, the atom -> cell / material maps,
// the neighbour list and the cell geometry. All counts are implied by the array
// lengths; `AtomisticSystem::validate` checks that they agree before anything is
// reduced.

use crate::error::SetupError;
use crate::neighbours::NeighbourList;

/// Intrinsic constants of one material (consumed, never produced, by the core).
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Atomic moment (J/T).
    pub mu_s: f64,
    /// Gilbert damping.
    pub alpha: f64,
    /// Gyromagnetic ratio relative to the free-electron value.
    pub gamma_rel: f64,
    /// Uniaxial anisotropy energy per atom (J).
    pub ku: f64,
    /// Exchange constant J_ij (J) towards each material, indexed by the neighbour's material.
    pub exchange: Vec<f64>,
    /// Whether atoms of this material may be represented by a continuum macrospin.
    pub micromagnetic_enabled: bool,
}

impl Material {
    /// Material with the same exchange constant towards every material.
    pub fn with_uniform_exchange(
        mu_s: f64,
        alpha: f64,
        ku: f64,
        j_ij: f64,
        n_materials: usize,
    ) -> Self {
        Self {
            mu_s,
            alpha,
            gamma_rel: 1.0,
            ku,
            exchange: vec![j_ij; n_materials],
            micromagnetic_enabled: true,
        }
    }

    /// Exchange towards material `other`.
    #[inline]
    pub fn j_to(&self, other: usize) -> f64 {
        self.exchange[other]
    }
}

/// Everything the reducer and classifier read about the atomistic system.
#[derive(Debug, Clone)]
pub struct AtomisticSystem {
    pub n_cells: usize,
    /// Which cell each atom is in.
    pub cell_of_atom: Vec<usize>,
    /// Which material each atom is made of.
    pub material_of_atom: Vec<usize>,
    pub materials: Vec<Material>,
    pub neighbours: NeighbourList,
    /// Atom positions (m).
    pub coords: Vec<[f64; 3]>,
    /// Cell volumes (m^3).
    pub cell_volumes: Vec<f64>,
    /// Uniform simulation temperature (K).
    pub temperature: f64,
    pub atoms_per_unit_cell: f64,
    /// Periodic box lengths (m); non-positive entries mean an open axis.
    pub system_dimensions: [f64; 3],
    /// Cells owned by this process.
    pub local_cells: Vec<usize>,
}

impl AtomisticSystem {
    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.cell_of_atom.len()
    }

    #[inline]
    pub fn n_materials(&self) -> usize {
        self.materials.len()
    }

    /// Material of `atom`.
    #[inline]
    pub fn material(&self, atom: usize) -> &Material {
        &self.materials[self.material_of_atom[atom]]
    }

    /// Exchange constant between two atoms, taken from the first atom's material row.
    #[inline]
    pub fn j_between(&self, a: usize, b: usize) -> f64 {
        self.material(a).j_to(self.material_of_atom[b])
    }

    /// Reject inconsistent shapes or out-of-range indices.
    pub fn validate(&self) -> Result<(), SetupError> {
        let n_atoms = self.n_atoms();
        let n_mat = self.n_materials();

        check_len("material_of_atom", n_atoms, self.material_of_atom.len())?;
        check_len("atom coordinates", n_atoms, self.coords.len())?;
        check_len("cell volumes", self.n_cells, self.cell_volumes.len())?;

        if let Some(&c) = self.cell_of_atom.iter().find(|&&c| c >= self.n_cells) {
            return Err(SetupError::IndexOutOfRange {
                what: "cell",
                index: c,
                bound: self.n_cells,
            });
        }
        if let Some(&m) = self.material_of_atom.iter().find(|&&m| m >= n_mat) {
            return Err(SetupError::IndexOutOfRange {
                what: "material",
                index: m,
                bound: n_mat,
            });
        }
        for mat in &self.materials {
            check_len("material exchange row", n_mat, mat.exchange.len())?;
            check_non_negative("material moment", mat.mu_s)?;
            check_non_negative("material damping", mat.alpha)?;
            check_finite("material anisotropy", mat.ku)?;
            check_finite("material gyromagnetic ratio", mat.gamma_rel)?;
            for &j in &mat.exchange {
                check_finite("material exchange", j)?;
            }
        }

        self.neighbours.validate(n_atoms)?;

        for &v in &self.cell_volumes {
            check_non_negative("cell volume", v)?;
        }
        for p in &self.coords {
            for &x in p {
                check_finite("atom coordinate", x)?;
            }
        }
        check_non_negative("temperature", self.temperature)?;
        if self.atoms_per_unit_cell <= 0.0 || !self.atoms_per_unit_cell.is_finite() {
            return Err(SetupError::InvalidValue {
                what: "atoms per unit cell",
                value: self.atoms_per_unit_cell,
            });
        }

        let mut seen = vec![false; self.n_cells];
        for &c in &self.local_cells {
            if c >= self.n_cells {
                return Err(SetupError::IndexOutOfRange {
                    what: "local cell",
                    index: c,
                    bound: self.n_cells,
                });
            }
            if seen[c] {
                return Err(SetupError::DuplicateLocalCell(c));
            }
            seen[c] = true;
        }
        Ok(())
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), SetupError> {
    if expected != got {
        return Err(SetupError::LengthMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

fn check_finite(what: &'static str, value: f64) -> Result<(), SetupError> {
    if !value.is_finite() {
        return Err(SetupError::InvalidValue { what, value });
    }
    Ok(())
}

fn check_non_negative(what: &'static str, value: f64) -> Result<(), SetupError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SetupError::InvalidValue { what, value });
    }
    Ok(())
}

/// Cell -> atoms map (CSR), atoms in ascending id order within each cell.
#[derive(Debug, Clone)]
pub struct CellMembership {
    offsets: Vec<usize>,
    atoms: Vec<usize>,
}

impl CellMembership {
    pub fn build(n_cells: usize, cell_of_atom: &[usize]) -> Self {
        let mut counts = vec![0usize; n_cells + 1];
        for &c in cell_of_atom {
            counts[c + 1] += 1;
        }
        for c in 0..n_cells {
            counts[c + 1] += counts[c];
        }
        let offsets = counts;
        let mut cursor = offsets.clone();
        let mut atoms = vec![0usize; cell_of_atom.len()];
        for (atom, &c) in cell_of_atom.iter().enumerate() {
            atoms[cursor[c]] = atom;
            cursor[c] += 1;
        }
        Self { offsets, atoms }
    }

    #[inline]
    pub fn atoms_in(&self, cell: usize) -> &[usize] {
        &self.atoms[self.offsets[cell]..self.offsets[cell + 1]]
    }

    #[inline]
    pub fn count(&self, cell: usize) -> usize {
        self.offsets[cell + 1] - self.offsets[cell]
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Mean atom position per cell; empty cells sit at the origin.
    pub fn centres(&self, coords: &[[f64; 3]]) -> Vec<[f64; 3]> {
        (0..self.n_cells())
            .map(|cell| {
                let atoms = self.atoms_in(cell);
                if atoms.is_empty() {
                    return [0.0; 3];
                }
                let mut s = [0.0; 3];
                for &a in atoms {
                    s[0] += coords[a][0];
                    s[1] += coords[a][1];
                    s[2] += coords[a][2];
                }
                let inv = 1.0 / atoms.len() as f64;
                [s[0] * inv, s[1] * inv, s[2] * inv]
            })
            .collect()
    }
}
