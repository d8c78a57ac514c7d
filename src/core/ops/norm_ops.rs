use num_traits::{Float, Zero};

use crate::core::{errors::*, view::NdArray};

/// Magnitude of a single element.
pub trait ElementNorm: Copy {
    /// Real type the magnitude is measured in.
    type Norm: Float;

    fn norm(self) -> Self::Norm;

    fn squared_norm(self) -> Self::Norm;
}

macro_rules! float_norm {
    ($type:ident) => {
        impl ElementNorm for $type {
            type Norm = $type;

            fn norm(self) -> $type {
                self.abs()
            }

            fn squared_norm(self) -> $type {
                self * self
            }
        }
    };
}

macro_rules! integer_norm {
    ($type:ident) => {
        impl ElementNorm for $type {
            type Norm = f64;

            fn norm(self) -> f64 {
                (self as f64).abs()
            }

            fn squared_norm(self) -> f64 {
                let value = self as f64;
                value * value
            }
        }
    };
}

float_norm!(f32);
float_norm!(f64);

integer_norm!(u8);
integer_norm!(u16);
integer_norm!(u32);
integer_norm!(u64);
integer_norm!(usize);

integer_norm!(i8);
integer_norm!(i16);
integer_norm!(i32);
integer_norm!(i64);
integer_norm!(isize);

#[cfg(feature = "complex")]
macro_rules! complex_norm {
    ($type:ident) => {
        impl ElementNorm for num_complex::Complex<$type> {
            type Norm = $type;

            fn norm(self) -> $type {
                num_complex::Complex::norm(self)
            }

            fn squared_norm(self) -> $type {
                self.norm_sqr()
            }
        }
    };
}

#[cfg(feature = "complex")]
complex_norm!(f32);
#[cfg(feature = "complex")]
complex_norm!(f64);

// --- Norm kinds ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NormKind {
    /// Largest element magnitude.
    Maximum = 0,
    /// Sum of element magnitudes.
    Manhattan = 1,
    #[default]
    Euclidean = 2,
}

impl NormKind {
    /// Kind from its numeric code. Unknown codes are a precondition violation.
    #[track_caller]
    pub fn of(code: u32) -> NormKind {
        NormKind::try_from(code).unwrap_or_else(|error| violated(error))
    }
}

impl TryFrom<u32> for NormKind {
    type Error = NormKindError;

    fn try_from(code: u32) -> Result<NormKind, NormKindError> {
        match code {
            0 => Ok(NormKind::Maximum),
            1 => Ok(NormKind::Manhattan),
            2 => Ok(NormKind::Euclidean),
            _ => Err(NormKindError(code)),
        }
    }
}

// --- Reductions ---

/// Sum of squared element magnitudes of any array or view.
pub fn squared_norm<T, S, const N: usize>(array: &S) -> T::Norm
where
    T: ElementNorm,
    S: NdArray<T, N>,
{
    array
        .elements()
        .fold(T::Norm::zero(), |acc, element| acc + element.squared_norm())
}

/// Euclidean norm of any array or view, computed without rescaling.
pub fn norm<T, S, const N: usize>(array: &S) -> T::Norm
where
    T: ElementNorm,
    S: NdArray<T, N>,
{
    norm_of(array, NormKind::Euclidean, true)
}

pub(crate) fn norm_of<T, S, const N: usize>(array: &S, kind: NormKind, use_fast_sqrt: bool) -> T::Norm
where
    T: ElementNorm,
    S: NdArray<T, N>,
{
    let zero = T::Norm::zero();

    match kind {
        NormKind::Maximum => array
            .elements()
            .fold(zero, |acc, element| acc.max(element.norm())),

        NormKind::Manhattan => array
            .elements()
            .fold(zero, |acc, element| acc + element.norm()),

        NormKind::Euclidean if use_fast_sqrt => squared_norm(array).sqrt(),

        NormKind::Euclidean => {
            let largest = norm_of(array, NormKind::Maximum, false);
            if largest == zero {
                return zero;
            }

            let scaled = array.elements().fold(zero, |acc, element| {
                let ratio = element.norm() / largest;
                acc + ratio * ratio
            });

            scaled.sqrt() * largest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{array::MultiArray, view::ArrayView};
    use approx::assert_relative_eq;

    fn square() -> MultiArray<f64, 2> {
        MultiArray::from_slice([2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap()
    }

    #[test]
    fn norms_of_small_square() {
        let a = square();

        assert_relative_eq!(a.squared_norm(), 30.0);
        assert_relative_eq!(a.norm(NormKind::Maximum, true), 4.0);
        assert_relative_eq!(a.norm(NormKind::Manhattan, true), 10.0);
        assert_relative_eq!(a.norm(NormKind::Euclidean, true), 30f64.sqrt());
        assert_relative_eq!(a.norm(NormKind::Euclidean, false), 30f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn free_functions_match_methods() {
        let a = square();

        assert_relative_eq!(squared_norm(&a.view()), a.squared_norm());
        assert_relative_eq!(norm(&a), a.norm(NormKind::default(), true));
    }

    #[test]
    fn integer_elements_measure_in_f64() {
        let data = [-3i32, 4];
        let view = ArrayView::new(&data, [2]).unwrap();

        assert_relative_eq!(view.norm(NormKind::Euclidean, true), 5.0);
        assert_relative_eq!(view.norm(NormKind::Maximum, true), 4.0);
        assert_relative_eq!(view.norm(NormKind::Manhattan, false), 7.0);
    }

    #[test]
    fn norms_follow_strides() {
        let a = MultiArray::from_fn([3, 3], |[i, j]| if i == j { -2.0f32 } else { 1.0 });

        assert_relative_eq!(a.view().transpose().norm(NormKind::Manhattan, true), 12.0);
        assert_relative_eq!(a.view().transpose().squared_norm(), a.squared_norm());

        let corner = a.view().stridearray([2, 2]);
        assert_eq!(corner.shape(), &[1, 1]);
        assert_relative_eq!(corner.norm(NormKind::Maximum, true), 2.0);
    }

    #[test]
    fn rescaled_euclidean_avoids_overflow() {
        let a = MultiArray::from_elem([2, 2], 1e200f64);

        assert!(a.norm(NormKind::Euclidean, true).is_infinite());
        assert_relative_eq!(a.norm(NormKind::Euclidean, false), 2e200, max_relative = 1e-12);
    }

    #[test]
    fn rescaled_euclidean_of_zeros_is_zero() {
        let a = MultiArray::<f64, 3>::zeros([2, 2, 2]);
        assert_eq!(a.norm(NormKind::Euclidean, false), 0.0);
    }

    #[test]
    fn norm_kind_codes() {
        assert_eq!(NormKind::of(0), NormKind::Maximum);
        assert_eq!(NormKind::try_from(2u32), Ok(NormKind::Euclidean));
        assert_eq!(NormKind::try_from(7u32), Err(NormKindError(7)));
    }

    #[test]
    #[should_panic(expected = "Unknown norm type 3")]
    fn unknown_norm_kind_panics() {
        NormKind::of(3);
    }

    #[cfg(feature = "complex")]
    #[test]
    fn complex_elements_use_modulus() {
        use num_complex::Complex;

        let data = [Complex::new(3.0f64, 4.0), Complex::new(0.0, -2.0)];
        let view = ArrayView::new(&data, [2]).unwrap();

        assert_relative_eq!(view.squared_norm(), 29.0);
        assert_relative_eq!(view.norm(NormKind::Maximum, true), 5.0);
        assert_relative_eq!(view.norm(NormKind::Manhattan, true), 7.0);
    }
}
