// SPDX-License-Identifier: Apache-2.0

//! Karnaugh-style rasters of truth tables.
//!
//! For a function of `k` inputs the lower `k - k/2` variables address rows and
//! the upper `k/2` variables address columns. Within each group the variable
//! with the lowest index is the most significant bit of the Gray code, and a
//! cell's coordinate is the Gray-decoded group value, so adjacent cells differ
//! in one variable. Row `r`, column `c` is stored at `r + c * width`.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::network::{Network, NodeId};
use crate::partition::cone::ConeAnalyzer;
use crate::partition::{PartitionId, PartitionLedger};
use crate::truth_table::TruthTable;

pub const OFFSET_CELL: u8 = 0;
pub const PADDING_CELL: u8 = 1;
pub const ONSET_CELL: u8 = 2;

/// Side of the square image handed to a classifier.
pub const IMAGE_SIDE: usize = 256;

/// Cones with fewer inputs than this get no image.
pub const MIN_IMAGE_INPUTS: usize = 2;

pub fn binary_to_gray(value: usize) -> usize {
    value ^ (value >> 1)
}

pub fn gray_to_binary(gray: usize) -> usize {
    let mut value = gray;
    let mut shift = gray >> 1;
    while shift != 0 {
        value ^= shift;
        shift >>= 1;
    }
    value
}

/// (row bits, column bits) for `num_vars` variables.
pub fn split_bits(num_vars: usize) -> (usize, usize) {
    (num_vars - num_vars / 2, num_vars / 2)
}

/// Cell (row, column) holding minterm `minterm`.
pub fn minterm_to_cell(minterm: usize, num_vars: usize) -> (usize, usize) {
    let (row_bits, _) = split_bits(num_vars);
    let bit = |j: usize| (minterm >> j) & 1;
    let mut row_gray = 0;
    for j in 0..row_bits {
        row_gray |= bit(j) << (row_bits - 1 - j);
    }
    let mut col_gray = 0;
    for j in row_bits..num_vars {
        col_gray |= bit(j) << (num_vars - 1 - j);
    }
    (gray_to_binary(row_gray), gray_to_binary(col_gray))
}

/// Inverse of `minterm_to_cell`.
pub fn cell_to_minterm(row: usize, col: usize, num_vars: usize) -> usize {
    let (row_bits, _) = split_bits(num_vars);
    let row_gray = binary_to_gray(row);
    let col_gray = binary_to_gray(col);
    let mut minterm = 0;
    for j in 0..row_bits {
        minterm |= ((row_gray >> (row_bits - 1 - j)) & 1) << j;
    }
    for j in row_bits..num_vars {
        minterm |= ((col_gray >> (num_vars - 1 - j)) & 1) << j;
    }
    minterm
}

/// Unpadded grid: every cell is `ONSET_CELL` or `OFFSET_CELL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KarnaughGrid {
    num_vars: usize,
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl KarnaughGrid {
    pub fn from_truth_table(tt: &TruthTable) -> Self {
        let num_vars = tt.num_vars();
        let (row_bits, col_bits) = split_bits(num_vars);
        let width = 1usize << row_bits;
        let height = 1usize << col_bits;
        let mut cells = vec![OFFSET_CELL; width * height];
        for minterm in tt.onset() {
            let (row, col) = minterm_to_cell(minterm, num_vars);
            cells[row + col * width] = ONSET_CELL;
        }
        Self {
            num_vars,
            width,
            height,
            cells,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells[row + col * self.width]
    }

    /// Decodes the marked cells back into minterms, ascending.
    pub fn onset(&self) -> Vec<usize> {
        let mut minterms: Vec<usize> = (0..self.cells.len())
            .filter(|i| self.cells[*i] == ONSET_CELL)
            .map(|i| cell_to_minterm(i % self.width, i / self.width, self.num_vars))
            .collect();
        minterms.sort_unstable();
        minterms
    }

    pub fn to_truth_table(&self) -> TruthTable {
        let mut tt = TruthTable::const0(self.num_vars);
        for minterm in self.onset() {
            tt.set_bit(minterm, true);
        }
        tt
    }
}

/// A grid centered on an `IMAGE_SIDE` x `IMAGE_SIDE` canvas of
/// `PADDING_CELL`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KarnaughImage {
    pixels: Vec<u8>,
}

impl KarnaughImage {
    pub fn from_grid(grid: &KarnaughGrid) -> Self {
        assert!(
            grid.width <= IMAGE_SIDE && grid.height <= IMAGE_SIDE,
            "Karnaugh grid {}x{} does not fit a {}x{} image",
            grid.width,
            grid.height,
            IMAGE_SIDE,
            IMAGE_SIDE
        );
        let (x0, y0) = Self::origin(grid.width, grid.height);
        let mut pixels = vec![PADDING_CELL; IMAGE_SIDE * IMAGE_SIDE];
        for y in 0..grid.height {
            for x in 0..grid.width {
                pixels[(x + x0) + (y + y0) * IMAGE_SIDE] = grid.cell(x, y);
            }
        }
        Self { pixels }
    }

    pub fn from_truth_table(tt: &TruthTable) -> Self {
        Self::from_grid(&KarnaughGrid::from_truth_table(tt))
    }

    /// Odd padding puts the extra cell before the grid.
    fn origin(width: usize, height: usize) -> (usize, usize) {
        (
            (IMAGE_SIDE - width).div_ceil(2),
            (IMAGE_SIDE - height).div_ceil(2),
        )
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[x + y * IMAGE_SIDE]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Crops the centered window of a `num_vars`-input grid back out.
    pub fn to_grid(&self, num_vars: usize) -> KarnaughGrid {
        let (row_bits, col_bits) = split_bits(num_vars);
        let width = 1usize << row_bits;
        let height = 1usize << col_bits;
        let (x0, y0) = Self::origin(width, height);
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(self.pixel(x + x0, y + y0));
            }
        }
        KarnaughGrid {
            num_vars,
            width,
            height,
            cells,
        }
    }

    pub fn write_raw(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.pixels)?;
        Ok(())
    }
}

pub fn raster_file_name(
    partition: PartitionId,
    output: NodeId,
    num_inputs: usize,
    depth: usize,
) -> String {
    format!(
        "kar_part_{}_out_{}_in_{}_lev_{}.raw",
        partition, output.id, num_inputs, depth
    )
}

impl PartitionLedger {
    /// Writes one raster per output of partition `p` whose cone is small
    /// enough to tabulate. Returns the files written.
    pub fn write_karnaugh_maps(
        &self,
        net: &Network,
        p: PartitionId,
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let analyzer = ConeAnalyzer::for_partition(net, self, p);
        let mut written = Vec::new();
        for output in self.outputs(p) {
            let features = analyzer.features(*output);
            let Some(tt) = &features.truth_table else {
                log::debug!(
                    "partition {}: output {} has {} inputs; no raster",
                    p,
                    output,
                    features.inputs.len()
                );
                continue;
            };
            let path = dir.join(raster_file_name(
                p,
                *output,
                features.inputs.len(),
                features.depth,
            ));
            KarnaughImage::from_truth_table(tt).write_raw(&path)?;
            written.push(path);
        }
        log::info!(
            "partition {}: wrote {} Karnaugh rasters to {}",
            p,
            written.len(),
            dir.display()
        );
        Ok(written)
    }
}
