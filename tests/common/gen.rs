use std::fmt;
use std::iter;

use rand::distributions::Alphanumeric;
use rand::prelude::Rng;

pub fn gen_shape<R: Rng + ?Sized>(rng: &mut R, ndim: usize) -> Vec<usize> {
    iter::repeat(()).map(|_| rng.gen_range(0..11)).take(ndim).collect()
}

pub fn gen_ascii<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    iter::repeat(()).map(|_| rng.sample(Alphanumeric)).map(char::from).take(len).collect()
}

/// A strided selection inside a shape: per-axis start, count and stride.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slab {
    pub start: Vec<usize>,
    pub count: Vec<usize>,
    pub stride: Vec<isize>,
}

impl Slab {
    pub fn len(&self) -> usize {
        self.count.iter().product()
    }

    /// Row-major positions of the selected elements within `shape`.
    pub fn positions(&self, shape: &[usize]) -> Vec<usize> {
        let mut out = vec![];
        if self.count.iter().any(|&c| c == 0) {
            return out;
        }
        let mut idx = vec![0; shape.len()];
        loop {
            let mut pos = 0;
            for d in 0..shape.len() {
                pos = pos * shape[d] + self.start[d] + idx[d] * self.stride[d] as usize;
            }
            out.push(pos);
            let mut d = shape.len();
            loop {
                if d == 0 {
                    return out;
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < self.count[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
    }
}

/// Generate a random hyperslab lying inside `shape`.
pub fn gen_slab<R: Rng + ?Sized>(rng: &mut R, shape: &[usize]) -> Slab {
    let mut slab = Slab { start: vec![], count: vec![], stride: vec![] };
    for &len in shape {
        let (start, count, stride) = if len == 0 {
            (0, 0, 1)
        } else {
            let start = rng.gen_range(0..len);
            let stride = if rng.gen_bool(0.7) { 1 } else { rng.gen_range(1..len + 1) };
            let room = (len - start + stride - 1) / stride;
            (start, rng.gen_range(0..room + 1), stride)
        };
        slab.start.push(start);
        slab.count.push(count);
        slab.stride.push(stride as isize);
    }
    slab
}

pub trait Gen: Sized + fmt::Debug {
    fn gen<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

macro_rules! impl_gen_primitive {
    ($ty:ty) => {
        impl Gen for $ty {
            fn gen<R: Rng + ?Sized>(rng: &mut R) -> Self {
                rng.gen()
            }
        }
    };
    ($ty:ty, $($tys:ty),+) => {
        impl_gen_primitive!($ty);
        impl_gen_primitive!($($tys),*);
    };
}

impl_gen_primitive!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

pub fn gen_vec<R: Rng + ?Sized, T: Gen>(rng: &mut R, size: usize) -> Vec<T> {
    iter::repeat(()).map(|_| T::gen(rng)).take(size).collect()
}
