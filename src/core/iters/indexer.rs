// -- Indexer ( coordinates in scan order, dimension 0 fastest )

pub(crate) struct Indexer<const N: usize> {
    shape: [usize; N],
    indices: [usize; N],
    current: usize,
    maximum: usize,
}

impl<const N: usize> Indexer<N> {
    pub(crate) fn new(shape: &[usize; N]) -> Self {
        Indexer {
            shape: *shape,
            indices: [0; N],
            current: 0,
            maximum: shape.iter().product(),
        }
    }
}

impl<const N: usize> Iterator for Indexer<N> {
    type Item = [usize; N];

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.maximum {
            return None;
        };

        let next = self.indices;

        for i in 0..N {
            self.indices[i] += 1;

            if self.indices[i] != self.shape[i] {
                break;
            }

            self.indices[i] = 0;
        }

        self.current += 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.maximum - self.current;
        (remaining, Some(remaining))
    }
}

impl<const N: usize> ExactSizeIterator for Indexer<N> {}
