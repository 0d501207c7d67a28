/// Action and observation spaces.

pub mod space;
pub mod interop;

use rand::distributions::{Distribution, Standard, Uniform};
use rand::Rng;

pub use space::Space;

/// A discrete space of integers in [0, n).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrete {
    n: u32,
}

impl Discrete {
    pub fn new(n: u32) -> Self {
        assert!(n > 0, "Discrete space requires n > 0");
        Self { n }
    }

    pub fn n(&self) -> u32 { self.n }
}

impl Space for Discrete {
    type Element = u32;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        if self.n == 1 { return 0; }
        Uniform::from(0..self.n).sample(rng)
    }

    fn contains(&self, elem: &Self::Element) -> bool { *elem < self.n }
}

/// Element types a [`BoxSpace`] can sample.
pub trait BoxElement: Copy + PartialOrd {
    /// Draw a value in `[low, high]`.
    fn sample_between<R: Rng + ?Sized>(low: Self, high: Self, rng: &mut R) -> Self;
}

macro_rules! int_box_element {
    ($($t:ty),*) => {$(
        impl BoxElement for $t {
            fn sample_between<R: Rng + ?Sized>(low: Self, high: Self, rng: &mut R) -> Self {
                Uniform::new_inclusive(low, high).sample(rng)
            }
        }
    )*};
}

int_box_element!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

// Infinite bounds are sampled like Gymnasium's Box: an exponential offset from the
// finite bound when one side is open, a difference of two exponentials when both are.
macro_rules! float_box_element {
    ($($t:ty),*) => {$(
        impl BoxElement for $t {
            fn sample_between<R: Rng + ?Sized>(low: Self, high: Self, rng: &mut R) -> Self {
                if low == high {
                    return low;
                }
                fn exp<R: Rng + ?Sized>(rng: &mut R) -> $t {
                    let u: $t = Standard.sample(rng);
                    -(1.0 - u).ln()
                }
                match (low.is_finite(), high.is_finite()) {
                    (true, true) => Uniform::new_inclusive(low, high).sample(rng),
                    (true, false) => low + exp(rng),
                    (false, true) => high - exp(rng),
                    (false, false) => exp(rng) - exp(rng),
                }
            }
        }
    )*};
}

float_box_element!(f32, f64);

/// A Box-like space with element type `T` and fixed compile-time length `N`.
/// Bounds are inclusive per dimension and may be infinite for float elements.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpace<T: Copy + PartialOrd, const N: usize> {
    low: [T; N],
    high: [T; N],
}

impl<T: Copy + PartialOrd, const N: usize> BoxSpace<T, N> {
    pub fn new(low: [T; N], high: [T; N]) -> Self {
        for i in 0..N {
            assert!(low[i] <= high[i], "low[{i}] > high[{i}]");
        }
        Self { low, high }
    }

    pub fn low(&self) -> &[T; N] { &self.low }
    pub fn high(&self) -> &[T; N] { &self.high }
}

impl<T: BoxElement, const N: usize> Space for BoxSpace<T, N> {
    type Element = [T; N];

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        let mut arr = self.low;
        for i in 0..N {
            arr[i] = T::sample_between(self.low[i], self.high[i], rng);
        }
        arr
    }

    fn contains(&self, elem: &Self::Element) -> bool {
        (0..N).all(|i| self.low[i] <= elem[i] && elem[i] <= self.high[i])
    }
}
