use crate::core::shape::Layout;

// -- Strider ( memory offsets in scan order )

/// Walks the offsets of a layout in scan order, one add per step in the
/// common case instead of a dot product per element.
pub(crate) struct Strider<const N: usize> {
    shape: [usize; N],
    stride: [isize; N],
    indices: [usize; N],
    offset: isize,
    current: usize,
    maximum: usize,
}

impl<const N: usize> Strider<N> {
    pub(crate) fn new(layout: &Layout<N>) -> Self {
        Strider {
            shape: layout.shape,
            stride: layout.stride,
            indices: [0; N],
            offset: 0,
            current: 0,
            maximum: layout.len(),
        }
    }
}

impl<const N: usize> Iterator for Strider<N> {
    type Item = isize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.maximum {
            return None;
        };

        let next = self.offset;

        for i in 0..N {
            self.indices[i] += 1;
            self.offset += self.stride[i];

            if self.indices[i] != self.shape[i] {
                break;
            }

            self.indices[i] = 0;
            self.offset -= self.shape[i] as isize * self.stride[i];
        }

        self.current += 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.maximum - self.current;
        (remaining, Some(remaining))
    }
}

impl<const N: usize> ExactSizeIterator for Strider<N> {}

#[cfg(test)]
mod tests {
    use super::Strider;
    use crate::core::shape::Layout;

    #[test]
    fn gapless_layout_walks_consecutive_offsets() {
        let offsets: Vec<isize> = Strider::new(&Layout::new([2, 3, 2])).collect();

        assert_eq!(offsets, (0..12).collect::<Vec<isize>>());
    }

    #[test]
    fn transposed_layout_walks_columns() {
        let layout = Layout::new([3, 2]).transpose();
        let offsets: Vec<isize> = Strider::new(&layout).collect();

        assert_eq!(offsets, vec![0, 3, 1, 4, 2, 5]);
    }
}
