// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::*;
use ndarray::prelude::*;

use programmable_light::{binary_codes, decode, hadamard_codes, CaptureStack, CodeAxis};

fn pattern_generation(c: &mut Criterion) {
    c.bench_function("binary codes 1080x1920", |b| {
        b.iter(|| binary_codes(black_box(1080), black_box(1920), CodeAxis::Columns))
    });
    c.bench_function("hadamard codes 1080x1920", |b| {
        b.iter(|| hadamard_codes(black_box(1080), black_box(1920), CodeAxis::Columns, false))
    });
}

fn decoding(c: &mut Criterion) {
    // A perfect camera capture of every binary column code.
    let (height, width) = (512, 1024);
    let pattern = binary_codes(height, width, CodeAxis::Columns).unwrap();
    let planes = pattern.planes().mapv(|b| if b == 1 { 10.0 } else { -10.0 });
    let stack = CaptureStack::new(planes, Array2::from_elem((height, width), 20.0)).unwrap();

    c.bench_function("decode 512x1024", |b| b.iter(|| decode(black_box(&stack))));
}

criterion_group!(benches, pattern_generation, decoding);
criterion_main!(benches);
