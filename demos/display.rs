use anyhow::Result;
use nview::{MultiArray, NdArray};

fn main() -> Result<()> {
    let now = std::time::Instant::now();

    let line = MultiArray::from_fn([3], |[i]| i as u16);
    println!("{}", line);

    let plane = MultiArray::from_slice([3, 3], &[0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])?;
    println!("{}", plane);
    println!("{}", plane.view().transpose());

    let volume = MultiArray::from_fn([3, 3, 3], |[i, j, k]| (i + 3 * j + 9 * k) as i32);
    println!("{}", volume);
    println!("{}", volume.view().bind::<2, 2>(1));

    let block = MultiArray::from_fn([3; 4], |c| c.iter().rev().fold(0u32, |acc, &x| 3 * acc + x as u32));
    println!("{}", block.view().subarray([0, 0, 1, 1], [3, 3, 3, 2]));
    println!("{} elements", block.len());

    let end = now.elapsed();
    println!("{:?}", end);

    Ok(())
}
