use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use vtk_xml::{Encoding, Field, Location, VtkUnstructured};

/// an encoded file with `cells` cells carrying a 6 component field
fn encoded(cells: usize, encoding: Encoding) -> Vec<u8> {
    let values: Array2<f64> = ndarray::Array::random((cells, 6), Uniform::new(-1., 1.));

    let mut vtk = VtkUnstructured::new("bench", "stress");
    vtk.set_codex(encoding);
    vtk.set_dimensions(cells as u64, 0, 0);
    vtk.add_data_buffer("stress", Location::Cell, Field::new(values));

    vtk.encode(&())
}

fn decode(input: &[u8]) -> usize {
    let mut vtk = VtkUnstructured::new("bench", "stress");
    vtk.add_data_buffer("stress", Location::Cell, Field::<f64>::default());
    vtk.decode(input, &mut ());

    vtk.field_buffer::<Field<f64>>("stress")
        .map(|field| field.len())
        .unwrap_or(0)
}

fn read_appended_bench(c: &mut Criterion) {
    for cells in [10_000, 100_000] {
        let input = encoded(cells, Encoding::Appended);
        c.bench_function(&format!("decode appended {cells}"), |b| {
            b.iter(|| decode(black_box(&input)))
        });
    }

    let input = encoded(10_000, Encoding::Ascii);
    c.bench_function("decode ascii 10000", |b| b.iter(|| decode(black_box(&input))));
}

criterion_group!(benches, read_appended_bench);
criterion_main!(benches);
