use prettytable::{
    format::consts::FORMAT_BOX_CHARS,
    {Cell, Row, Table},
};
use std::{
    any::type_name,
    fmt::{Debug, Display, Formatter, Result},
};

use crate::core::{
    alloc::Allocator,
    array::MultiArray,
    shape::default_stride,
    view::{ArrayView, ArrayViewMut, NdArray},
};

impl<T, const N: usize, A: Allocator> Debug for MultiArray<T, N, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("MultiArray")
            .field("dtype", &type_name::<T>())
            .field("dims", &N)
            .field("elems", &self.len())
            .field("shape", self.shape())
            .finish()
    }
}

/// Nested box-drawn tables, outermost dimension first. A row of the
/// innermost table runs along dimension 0.
fn render<T, S, const N: usize>(array: &S, f: &mut Formatter<'_>) -> Result
where
    T: Copy + Display,
    S: NdArray<T, N> + Debug,
{
    if (1..=8).contains(&N) {
        let elements: Vec<T> = array.elements().collect();
        let stride = default_stride(array.shape());
        let grid = Grid {
            elements: &elements,
            shape: array.shape(),
            stride: &stride,
        };

        let table = if N % 2 == 1 {
            let row = grid.odd_dimensions(N, 0);
            set_style(Table::init(vec![row]))
        } else {
            grid.even_dimensions(N, 0)
        };

        write!(f, "{}", table)?;
    }

    writeln!(f, "{:?}", array)
}

struct Grid<'g, T> {
    elements: &'g [T],
    shape: &'g [usize],
    stride: &'g [isize],
}

impl<T: Copy + Display> Grid<'_, T> {
    fn odd_dimensions(&self, n: usize, offset: usize) -> Row {
        let dimension = n - 1;
        let stride = self.stride[dimension] as usize;

        if n == 1 {
            Row::from((0..self.shape[dimension]).map(|index| {
                let element = self.elements[offset + index * stride];
                Cell::from(&element)
            }))
        } else {
            Row::from(
                (0..self.shape[dimension]).map(|index| self.even_dimensions(n - 1, offset + index * stride)),
            )
        }
    }

    fn even_dimensions(&self, n: usize, offset: usize) -> Table {
        let dimension = n - 1;
        let stride = self.stride[dimension] as usize;

        let rows = (0..self.shape[dimension])
            .map(|index| self.odd_dimensions(n - 1, offset + index * stride))
            .collect();

        set_style(Table::init(rows))
    }
}

fn set_style(mut table: Table) -> Table {
    table.set_format(*FORMAT_BOX_CHARS);
    table
}

impl<T: Copy + Display, const N: usize, A: Allocator> Display for MultiArray<T, N, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        render(self, f)
    }
}

impl<T: Copy + Display, const N: usize> Display for ArrayView<'_, T, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        render(self, f)
    }
}

impl<T: Copy + Display, const N: usize> Display for ArrayViewMut<'_, T, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        render(self, f)
    }
}
