use crate::error::{LResult, LinalgError, ObjectKind};
use crate::storage::{Handle, Init, LinalgObj, Storage};
use std::fmt;

/// A dense `f64` vector, either owning its buffer or viewing part of another.
#[derive(Debug)]
#[must_use = "vectors must be released with `free`"]
pub struct Vector {
    h: Handle,
}

impl LinalgObj for Vector {
    fn handle(&self) -> &Handle {
        &self.h
    }
}

fn check_len(op: &'static str, expected: usize, got: usize) -> LResult<()> {
    if expected != got {
        return Err(LinalgError::DimensionMismatch { op, expected, got });
    }
    Ok(())
}

impl Vector {
    pub(crate) fn from_handle(h: Handle) -> Self {
        Self { h }
    }

    pub fn new(storage: &mut Storage, length: usize) -> LResult<Self> {
        if length == 0 {
            return Err(LinalgError::InvalidShape { n_row: 0, n_col: 1 });
        }
        Ok(Self::from_handle(storage.allocate_owned(length, Init::Uninit)))
    }

    pub fn zeros(storage: &mut Storage, length: usize) -> LResult<Self> {
        if length == 0 {
            return Err(LinalgError::InvalidShape { n_row: 0, n_col: 1 });
        }
        Ok(Self::from_handle(storage.allocate_owned(length, Init::Zeroed)))
    }

    pub fn from_slice(storage: &mut Storage, data: &[f64]) -> LResult<Self> {
        if data.is_empty() {
            return Err(LinalgError::InvalidShape { n_row: 0, n_col: 1 });
        }
        Ok(Self::from_handle(storage.allocate_from(data.to_vec())))
    }

    /// Aliases `length` elements of `owner` starting at flat `offset`.
    pub fn new_view<O: LinalgObj>(
        storage: &mut Storage,
        owner: &O,
        offset: usize,
        length: usize,
    ) -> LResult<Self> {
        if length == 0 {
            return Err(LinalgError::InvalidShape { n_row: 0, n_col: 1 });
        }
        let h = storage.create_view(owner.handle(), offset, length)?;
        Ok(Self::from_handle(h))
    }

    pub fn free(self, storage: &mut Storage) -> LResult<()> {
        storage.release(self.h)
    }

    pub fn len(&self) -> usize {
        self.h.len()
    }

    pub fn is_empty(&self) -> bool {
        self.h.len() == 0
    }

    pub fn as_slice<'a>(&self, storage: &'a Storage) -> LResult<&'a [f64]> {
        storage.slice(&self.h)
    }

    pub fn to_vec(&self, storage: &Storage) -> LResult<Vec<f64>> {
        Ok(self.as_slice(storage)?.to_vec())
    }

    pub fn get(&self, storage: &Storage, i: usize) -> LResult<f64> {
        self.check_index(i, "get")?;
        Ok(self.as_slice(storage)?[i])
    }

    pub fn set(&self, storage: &mut Storage, i: usize, x: f64) -> LResult<()> {
        self.check_index(i, "set")?;
        storage.slice_mut(&self.h)?[i] = x;
        Ok(())
    }

    fn check_index(&self, i: usize, op: &'static str) -> LResult<()> {
        if i >= self.len() {
            return Err(LinalgError::OutOfBounds {
                kind: ObjectKind::Vector,
                op,
                index: i,
                len: self.len(),
            });
        }
        Ok(())
    }

    pub fn dot_product(&self, storage: &Storage, other: &Vector) -> LResult<f64> {
        check_len("dot_product", self.len(), other.len())?;
        let a = self.as_slice(storage)?;
        let b = other.as_slice(storage)?;
        Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
    }

    pub fn norm(&self, storage: &Storage) -> LResult<f64> {
        Ok(self.dot_product(storage, self)?.sqrt())
    }

    pub fn scalar_multiply_into(&self, storage: &mut Storage, s: f64) -> LResult<()> {
        storage.slice_mut(&self.h)?.iter_mut().for_each(|x| *x *= s);
        Ok(())
    }

    pub fn subtract_into(&self, storage: &mut Storage, other: &Vector) -> LResult<()> {
        check_len("subtract_into", self.len(), other.len())?;
        storage.zip_mut(&self.h, &other.h, |x, y| *x -= y)
    }

    /// Scales to unit length. A norm at or below `Config::zero_norm` is
    /// reported as degenerate and the vector is left untouched.
    pub fn normalize_into(&self, storage: &mut Storage) -> LResult<()> {
        let norm = self.norm(storage)?;
        if norm <= storage.config().zero_norm || !norm.is_finite() {
            log::warn!("normalize_into on vector with norm {}", norm);
            return Err(LinalgError::Degenerate { column: None, norm });
        }
        storage
            .slice_mut(&self.h)?
            .iter_mut()
            .for_each(|x| *x /= norm);
        Ok(())
    }

    /// Lengths match and every pair differs by at most `tol`.
    pub fn equal(&self, storage: &Storage, other: &Vector, tol: f64) -> LResult<bool> {
        if self.len() != other.len() {
            return Ok(false);
        }
        let a = self.as_slice(storage)?;
        let b = other.as_slice(storage)?;
        Ok(a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tol))
    }

    pub fn display<'a>(&'a self, storage: &'a Storage) -> VectorDisplay<'a> {
        VectorDisplay { v: self, storage }
    }

    pub fn print(&self, storage: &Storage) -> LResult<()> {
        let line = format_elems(storage, self.as_slice(storage)?);
        println!("{}", line);
        Ok(())
    }
}

pub(crate) fn format_elems(storage: &Storage, v: &[f64]) -> String {
    let cfg = storage.config();
    let mut s = String::from("[");
    for (i, &x) in v.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        s.push_str(&cfg.fmt_elem(x));
    }
    s.push(']');
    s
}

pub struct VectorDisplay<'a> {
    v: &'a Vector,
    storage: &'a Storage,
}

impl fmt::Display for VectorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.v.as_slice(self.storage) {
            Ok(data) => f.write_str(&format_elems(self.storage, data)),
            Err(_) => f.write_str("[<released>]"),
        }
    }
}
