// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generate structured-light code planes for a display size and report on
//! them. Useful for checking a rig's display geometry before capturing.

use std::{borrow::Cow, path::PathBuf};

use clap::Parser;
use log::info;
use ndarray::prelude::*;

use super::{
    common::{InfoPrinter, Warn},
    PlightError,
};
use crate::{
    coding::{binary_codes, checkerboard, decode, hadamard_codes, CaptureStack, CodeAxis, Pattern},
    io::save,
};

/// Generate binary (or Hadamard) code planes and print a summary of them.
#[derive(Parser, Debug, Clone, Default)]
pub struct GenerateCodesArgs {
    /// The display height [pixels].
    #[clap(long)]
    height: usize,

    /// The display width [pixels].
    #[clap(long)]
    width: usize,

    /// Code rows instead of columns.
    #[clap(long)]
    rows: bool,

    /// Generate Hadamard codes instead of binary codes.
    #[clap(long)]
    hadamard: bool,

    /// With Hadamard codes, start from the all-ones row of the basis.
    #[clap(long, requires = "hadamard")]
    include_dc: bool,

    /// Generate a checkerboard with squares of this many pixels instead of
    /// codes. Useful for aligning the camera with the SLM.
    #[clap(long, conflicts_with_all = &["rows", "hadamard"])]
    checkerboard: Option<usize>,

    /// Write the code planes, shape (height, width, planes), to this file
    /// (json or yaml). A checkerboard is written as a (height, width) image.
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

impl GenerateCodesArgs {
    pub fn run(&self) -> Result<(), PlightError> {
        if let Some(size) = self.checkerboard {
            let board = checkerboard(self.height, self.width, size)?;
            let lit = board.iter().filter(|&&b| b > 0).count();
            info!(
                "Checkerboard of {size}-pixel squares for a {}x{} display ({lit} pixels lit)",
                self.height, self.width
            );
            if let Some(output) = &self.output {
                save(&board, output)?;
                info!("Wrote the checkerboard to '{}'", output.display());
            }
            return Ok(());
        }

        let axis = if self.rows {
            CodeAxis::Rows
        } else {
            CodeAxis::Columns
        };
        let pattern = if self.hadamard {
            let codes = hadamard_codes(self.height, self.width, axis, self.include_dc)?;
            info!(
                "Using rows {:?} of the order-{} Hadamard basis",
                codes.rows,
                codes.basis.nrows()
            );
            codes.pattern
        } else {
            binary_codes(self.height, self.width, axis)?
        };

        summarise_pattern(&pattern);
        if !self.hadamard {
            let noun = match axis {
                CodeAxis::Columns => "column",
                CodeAxis::Rows => "row",
            };
            let num_wrong = num_misdecoded(&pattern)?;
            if num_wrong == 0 {
                info!("Every pixel decodes back to its own {noun}");
            } else {
                format!("{num_wrong} pixel(s) didn't decode back to their own {noun}").warn();
            }
        }

        if let Some(output) = &self.output {
            save(&pattern.planes().to_owned(), output)?;
            info!("Wrote code planes to '{}'", output.display());
        }
        Ok(())
    }
}

fn summarise_pattern(pattern: &Pattern) {
    let (height, width) = pattern.shape();
    let mut printer = InfoPrinter::new(
        format!(
            "{} {} codes for a {height}x{width} display",
            pattern.num_planes(),
            pattern.kind()
        )
        .into(),
    );
    let block: Vec<Cow<'static, str>> = (0..pattern.num_planes())
        .map(|k| {
            let plane = pattern.plane(k);
            let lit = plane.iter().filter(|&&b| b == 1).count();
            format!(
                "Plane {k:2}: {:5.1}% lit",
                100.0 * lit as f64 / plane.len() as f64
            )
            .into()
        })
        .collect();
    printer.push_block(block);
    printer.display();
}

/// Treat the pattern as if it were captured perfectly by a display-sized
/// camera, and count how many pixels don't decode to their own column (or
/// row).
fn num_misdecoded(pattern: &Pattern) -> Result<usize, PlightError> {
    let planes = pattern.planes().mapv(|b| if b == 1 { 1.0 } else { -1.0 });
    let (height, width) = pattern.shape();
    let stack = CaptureStack::new(planes, Array2::ones((height, width)))?;
    let map = decode(&stack);
    let axis = pattern.axis();
    Ok(Array2::from_shape_fn((height, width), |(r, c)| {
        let expected = match axis {
            CodeAxis::Columns => c,
            CodeAxis::Rows => r,
        };
        map.get(r, c) != Some(expected as u32)
    })
    .iter()
    .filter(|&&wrong| wrong)
    .count())
}
