use anyhow::Result;
use nview::{ArrayViewMut, MultiArray, NdArray, NormKind};

fn main() -> Result<()> {
    // Shift a buffer left by two through overlapping views.
    let mut data: Vec<i32> = (0..10).collect();
    let whole = ArrayViewMut::new(&mut data, [10])?;
    whole.subarray([0], [8]).assign(&whole.subarray([2], [10]));
    println!("shifted: {:?}", data);

    // Transpose in place: the right-hand side is buffered first.
    let mut square = MultiArray::from_fn([3, 3], |[i, j]| (i + 3 * j) as f64);
    println!("{}", square);

    let view = square.view_mut();
    view.assign(&view.transpose());
    println!("{}", square);

    // Add each column to its right neighbour, reading the old values.
    let view = square.view_mut();
    let mut columns = view.subarray([0, 1], [3, 3]);
    columns += &view.subarray([0, 0], [3, 2]);
    println!("{}", square);

    for kind in [NormKind::Maximum, NormKind::Manhattan, NormKind::Euclidean] {
        println!(
            "{:?}: {} (rescaled {})",
            kind,
            square.norm(kind, true),
            square.norm(kind, false)
        );
    }

    Ok(())
}
