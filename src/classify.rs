// src/classify.rs
//
// Decide per cell whether it is simulated atomistically or as a continuum
// macrospin, then build the index structures the mixed-resolution loops iterate:
//  - the atom partition (atomistic / continuum-resident),
//  - half-open runs of consecutive atomistic atom ids,
//  - the list of local continuum cells with a usable moment.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DiscretisationMode;
use crate::params::MS_THRESHOLD;
use crate::reduce::PerCellParameters;
use crate::system::AtomisticSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// One macrospin for the whole cell.
    Continuum,
    /// Every atom in the cell keeps its own spin.
    Atomistic,
}

/// Disjoint, exhaustive split of the atom population, both sides ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomPartition {
    pub atomistic: Vec<usize>,
    pub continuum: Vec<usize>,
}

impl AtomPartition {
    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.atomistic.len() + self.continuum.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub resolution: Vec<Resolution>,
    pub partition: AtomPartition,
    /// `[begin, end)` runs covering `partition.atomistic`.
    pub ranges: Vec<Range<usize>>,
    /// Local continuum cells handed to the continuum solver.
    pub cell_list: Vec<usize>,
}

impl Classification {
    /// Atomistic atom ids, walked range by range.
    pub fn atomistic_atoms(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    pub fn n_continuum_cells(&self) -> usize {
        self.resolution
            .iter()
            .filter(|&&r| r == Resolution::Continuum)
            .count()
    }
}

/// Classify every cell and derive the partition, ranges and continuum cell list.
///
/// Pure: identical inputs give identical outputs.
pub fn classify(
    sys: &AtomisticSystem,
    params: &PerCellParameters,
    mode: DiscretisationMode,
) -> Classification {
    let resolution = match mode {
        DiscretisationMode::Multiscale => resolve_cells(sys, &params.tc),
        DiscretisationMode::Micromagnetic => vec![Resolution::Continuum; sys.n_cells],
    };
    let partition = partition_atoms(&sys.cell_of_atom, &resolution);
    let ranges = contiguous_ranges(&partition.atomistic);
    let cell_list = continuum_cells(&sys.local_cells, &resolution, &params.ms);

    info!(
        mode = ?mode,
        continuum_cells = cell_list.len(),
        atomistic_atoms = partition.atomistic.len(),
        continuum_atoms = partition.continuum.len(),
        ranges = ranges.len(),
        "resolution classification complete"
    );

    Classification {
        resolution,
        partition,
        ranges,
        cell_list,
    }
}

/// A cell is continuum only if all of its atoms are micromagnetic-eligible and
/// its Curie temperature is non-negative.
pub fn resolve_cells(sys: &AtomisticSystem, tc: &[f64]) -> Vec<Resolution> {
    let mut eligible = vec![true; sys.n_cells];
    for (atom, &cell) in sys.cell_of_atom.iter().enumerate() {
        if !sys.material(atom).micromagnetic_enabled {
            eligible[cell] = false;
        }
    }
    eligible
        .iter()
        .zip(tc.iter())
        .map(|(&ok, &t)| {
            if ok && t >= 0.0 {
                Resolution::Continuum
            } else {
                Resolution::Atomistic
            }
        })
        .collect()
}

/// Single ascending pass: an atom is atomistic iff its cell is.
pub fn partition_atoms(cell_of_atom: &[usize], resolution: &[Resolution]) -> AtomPartition {
    let mut partition = AtomPartition::default();
    for (atom, &cell) in cell_of_atom.iter().enumerate() {
        match resolution[cell] {
            Resolution::Atomistic => partition.atomistic.push(atom),
            Resolution::Continuum => partition.continuum.push(atom),
        }
    }
    partition
}

/// Run-length compress an ascending id sequence into maximal half-open ranges.
pub fn contiguous_ranges(ids: &[usize]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let Some((&first, rest)) = ids.split_first() else {
        return ranges;
    };
    let mut begin = first;
    let mut last = first;
    for &id in rest {
        if id != last + 1 {
            ranges.push(begin..last + 1);
            begin = id;
        }
        last = id;
    }
    ranges.push(begin..last + 1);
    ranges
}

/// Local continuum cells whose moment exceeds `MS_THRESHOLD`, in local-list order.
pub fn continuum_cells(local_cells: &[usize], resolution: &[Resolution], ms: &[f64]) -> Vec<usize> {
    local_cells
        .iter()
        .copied()
        .filter(|&c| resolution[c] == Resolution::Continuum && ms[c] > MS_THRESHOLD)
        .collect()
}
