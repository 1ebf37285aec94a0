// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::math::hadamard;

/// Simulate a camera looking straight at the display: lit pixels read 0.9
/// above a 0.05 ambient floor.
fn fake_exposures(pattern: &Pattern) -> CaptureStack {
    let planes = pattern.planes().mapv(f64::from);
    let positive = planes.mapv(|b| 0.05 + 0.9 * b);
    let negative = planes.mapv(|b| 0.05 + 0.9 * (1.0 - b));
    let (h, w) = pattern.shape();
    let ones = Array2::from_elem((h, w), 0.95);
    let zeros = Array2::from_elem((h, w), 0.05);
    CaptureStack::from_pairs(positive.view(), negative.view(), ones.view(), zeros.view()).unwrap()
}

#[test]
fn test_binary_codes_full_hd() {
    let pattern = binary_codes(1080, 1920, CodeAxis::Columns).unwrap();
    assert_eq!(pattern.num_planes(), 11);
    assert_eq!(pattern.shape(), (1080, 1920));
    assert_eq!(pattern.kind(), CodeKind::Binary);

    // 1000 = 0b01111101000
    let expected = [0, 1, 1, 1, 1, 1, 0, 1, 0, 0, 0];
    assert_eq!(pattern.code(1000).unwrap().to_vec(), expected);
    // Every row in a column carries the same code.
    for k in 0..11 {
        assert_eq!(pattern.planes()[(0, 1000, k)], expected[k]);
        assert_eq!(pattern.planes()[(1079, 1000, k)], expected[k]);
    }

    // Decode all 1080 rows of the columns around 1000. Each column's code is
    // independent of its neighbours, so the full-width stack isn't needed.
    let window = pattern.planes().slice(s![.., 992..1008, ..]).mapv(f64::from);
    let positive = window.mapv(|b| 0.05 + 0.9 * b);
    let negative = window.mapv(|b| 0.05 + 0.9 * (1.0 - b));
    let ones = Array2::from_elem((1080, 16), 0.95);
    let zeros = Array2::from_elem((1080, 16), 0.05);
    let stack =
        CaptureStack::from_pairs(positive.view(), negative.view(), ones.view(), zeros.view())
            .unwrap();
    let map = decode(&stack);
    assert_eq!(map.num_bits(), 11);
    assert_eq!(map.num_valid(), 1080 * 16);
    for row in 0..1080 {
        assert_eq!(map.get(row, 8), Some(1000), "row {row}");
        for col in 0..16 {
            assert_eq!(map.get(row, col), Some(992 + col as u32));
        }
    }
}

#[test]
fn test_binary_codes_msb_blocks() {
    let pattern = binary_codes(1, 8, CodeAxis::Columns).unwrap();
    assert_eq!(pattern.num_planes(), 3);
    assert_eq!(pattern.plane(0), array![[0, 0, 0, 0, 1, 1, 1, 1]]);
    assert_eq!(pattern.plane(1), array![[0, 0, 1, 1, 0, 0, 1, 1]]);
    assert_eq!(pattern.plane(2), array![[0, 1, 0, 1, 0, 1, 0, 1]]);
}

#[test]
fn test_binary_codes_are_cropped() {
    // W2 = 8, but only the first 6 columns are kept.
    let pattern = binary_codes(2, 6, CodeAxis::Columns).unwrap();
    assert_eq!(pattern.num_planes(), 3);
    assert_eq!(pattern.plane(0), array![[0, 0, 0, 0, 1, 1], [0, 0, 0, 0, 1, 1]]);
    assert!(pattern.code(6).is_none());
}

#[test]
fn test_binary_round_trip_every_column() {
    let width = 300;
    let pattern = binary_codes(3, width, CodeAxis::Columns).unwrap();
    let map = decode(&fake_exposures(&pattern));
    assert_eq!(map.num_valid(), 3 * width);
    for row in 0..3 {
        for col in 0..width {
            assert_eq!(map.get(row, col), Some(col as u32));
        }
    }
}

#[test]
fn test_binary_round_trip_rows() {
    let height = 70;
    let pattern = binary_codes(height, 5, CodeAxis::Rows).unwrap();
    assert_eq!(pattern.num_planes(), 7);
    assert_eq!(pattern.code(69).unwrap().to_vec(), [1, 0, 0, 0, 1, 0, 1]);
    let map = decode(&fake_exposures(&pattern));
    for row in 0..height {
        for col in 0..5 {
            assert_eq!(map.get(row, col), Some(row as u32));
        }
    }
}

#[test]
fn test_rows_axis_is_transposed_columns() {
    let cols = binary_codes(4, 16, CodeAxis::Columns).unwrap();
    let rows = binary_codes(16, 4, CodeAxis::Rows).unwrap();
    assert_eq!(rows.num_planes(), cols.num_planes());
    for k in 0..cols.num_planes() {
        assert_eq!(rows.plane(k), cols.plane(k).t());
    }
}

#[test]
fn test_single_column_has_no_planes() {
    let pattern = binary_codes(4, 1, CodeAxis::Columns).unwrap();
    assert_eq!(pattern.num_planes(), 0);
    let map = decode(&fake_exposures(&pattern));
    assert_eq!(map.get(0, 0), Some(0));
}

#[test]
fn test_zero_dimensions_are_rejected() {
    assert!(matches!(
        binary_codes(0, 10, CodeAxis::Columns),
        Err(CodingError::ZeroDimension { height: 0, width: 10 })
    ));
    assert!(matches!(
        binary_codes(10, 0, CodeAxis::Rows),
        Err(CodingError::ZeroDimension { .. })
    ));
    assert!(matches!(
        hadamard_codes(10, 0, CodeAxis::Columns, true),
        Err(CodingError::ZeroDimension { .. })
    ));
    assert!(matches!(
        checkerboard(0, 0, 4),
        Err(CodingError::ZeroDimension { .. })
    ));
}

#[test]
fn test_hadamard_codes_with_dc() {
    let codes = hadamard_codes(2, 8, CodeAxis::Columns, true).unwrap();
    assert_eq!(codes.rows, vec![0, 1, 2]);
    assert_eq!(codes.basis, hadamard(8));
    assert_eq!(codes.pattern.kind(), CodeKind::Hadamard);
    // Row 0 is all ones.
    assert_eq!(codes.pattern.plane(0), Array2::<u8>::ones((2, 8)));
    for (k, &row) in codes.rows.iter().enumerate() {
        let expected = codes.basis.row(row).mapv(|v| u8::from(v == 1));
        assert_eq!(codes.pattern.plane(k).row(1), expected);
    }
}

#[test]
fn test_hadamard_codes_without_dc() {
    let codes = hadamard_codes(3, 12, CodeAxis::Columns, false).unwrap();
    assert_eq!(codes.pattern.num_planes(), 4);
    assert_eq!(codes.rows, vec![1, 2, 3, 4]);
    assert_eq!(codes.basis.dim(), (16, 16));
    for (k, &row) in codes.rows.iter().enumerate() {
        let expected = codes
            .basis
            .slice(s![row, ..12])
            .mapv(|v| u8::from(v == 1));
        assert_eq!(codes.pattern.plane(k).row(2), expected);
    }
    // No plane is constant.
    for k in 0..4 {
        let plane = codes.pattern.plane(k);
        assert!(plane.iter().any(|&b| b == 0));
        assert!(plane.iter().any(|&b| b == 1));
    }
}

#[test]
fn test_display_rendering() {
    let pattern = binary_codes(1, 4, CodeAxis::Columns).unwrap();
    assert_eq!(pattern.to_display(0), array![[0, 0, 255, 255]]);
    assert_eq!(pattern.to_display_inverted(0), array![[255, 255, 0, 0]]);
    assert_eq!(pattern.to_display(1), array![[0, 255, 0, 255]]);
}

#[test]
fn test_checkerboard() {
    let board = checkerboard(5, 6, 2).unwrap();
    assert_eq!(
        board,
        array![
            [255, 255, 0, 0, 255, 255],
            [255, 255, 0, 0, 255, 255],
            [0, 0, 255, 255, 0, 0],
            [0, 0, 255, 255, 0, 0],
            [255, 255, 0, 0, 255, 255],
        ]
    );
    assert!(matches!(
        checkerboard(4, 4, 0),
        Err(CodingError::ZeroCheckerSize)
    ));
}

#[test]
fn test_decode_masks_dark_pixels() {
    // Two pixels: one lit, decoding to 0; one without light.
    let planes = array![[[-1.0, -1.0], [0.5, 0.5]]];
    let reference = array![[1.0, 0.0]];
    let stack = CaptureStack::new(planes, reference).unwrap();
    let map = decode(&stack);

    assert_eq!(map.get(0, 0), Some(0));
    assert_eq!(map.get(0, 1), None);
    assert_eq!(map.get(5, 5), None);
    assert_eq!(map.num_valid(), 1);
    assert_eq!(map.to_dense(), array![[0, 0]]);
    assert_eq!(map.valid(), array![[true, false]]);

    let bits = threshold(&stack);
    assert_eq!(bits, array![[[0, 0], [0, 0]]]);
}

#[test]
fn test_decode_masks_negative_and_nan_references() {
    // A reference of ones - zeros that isn't positive means no usable light.
    let planes = array![[[1.0], [1.0], [1.0], [1.0]]];
    let reference = array![[1e-6, 0.0, -0.2, f64::NAN]];
    let stack = CaptureStack::new(planes, reference).unwrap();
    let map = decode(&stack);
    assert_eq!(map.valid(), array![[true, false, false, false]]);
    assert_eq!(map.get(0, 0), Some(1));
    assert_eq!(threshold(&stack), array![[[1], [0], [0], [0]]]);
}

#[test]
fn test_decode_msb_first() {
    let planes = array![[[1.0, -1.0, -1.0, 2.0]]];
    let stack = CaptureStack::new(planes, array![[3.0]]).unwrap();
    assert_eq!(decode(&stack).get(0, 0), Some(0b1001));
    assert_eq!(threshold(&stack), array![[[1, 0, 0, 1]]]);
}

#[test]
fn test_capture_stack_shape_checks() {
    let planes = Array3::<f64>::zeros((2, 3, 4));
    assert!(matches!(
        CaptureStack::new(planes.clone(), Array2::zeros((3, 2))),
        Err(CodingError::BadShape { .. })
    ));
    assert!(matches!(
        CaptureStack::new(Array3::zeros((1, 1, 33)), Array2::ones((1, 1))),
        Err(CodingError::TooManyPlanes { num: 33 })
    ));
    assert!(CaptureStack::new(Array3::zeros((1, 1, 32)), Array2::ones((1, 1))).is_ok());

    let negative = Array3::<f64>::zeros((2, 3, 3));
    let ones = Array2::<f64>::ones((2, 3));
    assert!(matches!(
        CaptureStack::from_pairs(planes.view(), negative.view(), ones.view(), ones.view()),
        Err(CodingError::BadShape { .. })
    ));
}

#[test]
fn test_from_spectra() {
    // Three samples, two planes. Sample 0 is dark.
    let positive = array![[0.1, 5.0, 1.0], [0.1, 1.0, 5.0]];
    let negative = array![[0.1, 1.0, 5.0], [0.1, 5.0, 1.0]];
    let ones = array![0.1, 6.0, 6.0];
    let zeros = array![0.1, 0.0, 0.0];
    let stack =
        CaptureStack::from_spectra(positive.view(), negative.view(), ones.view(), zeros.view())
            .unwrap();
    assert_eq!(stack.planes().dim(), (3, 1, 2));
    assert_eq!(stack.num_planes(), 2);
    assert_abs_diff_eq!(stack.planes()[(1, 0, 0)], 4.0);
    assert_abs_diff_eq!(stack.planes()[(2, 0, 0)], -4.0);
    assert_abs_diff_eq!(stack.reference(), array![[0.0], [6.0], [6.0]]);

    let map = decode(&stack);
    assert_eq!(map.get(0, 0), None);
    assert_eq!(map.get(1, 0), Some(0b10));
    assert_eq!(map.get(2, 0), Some(0b01));
}
