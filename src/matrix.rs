use crate::error::{LResult, LinalgError};
use crate::shape::{Axis, Dim};
use crate::storage::{Handle, Init, LinalgObj, Storage};
use crate::vector::{format_elems, Vector};
use rayon::prelude::*;
use std::fmt;

/// A dense row-major `f64` matrix owning its buffer in a [`Storage`].
#[derive(Debug)]
#[must_use = "matrices must be released with `free`"]
pub struct Matrix {
    h: Handle,
    dim: Dim,
}

impl LinalgObj for Matrix {
    fn handle(&self) -> &Handle {
        &self.h
    }
}

impl Matrix {
    fn alloc(storage: &mut Storage, dim: Dim, init: Init) -> Self {
        Self {
            h: storage.allocate_owned(dim.elem_count(), init),
            dim,
        }
    }

    fn adopt(storage: &mut Storage, data: Vec<f64>, dim: Dim) -> Self {
        debug_assert_eq!(data.len(), dim.elem_count());
        Self {
            h: storage.allocate_from(data),
            dim,
        }
    }

    pub fn new(storage: &mut Storage, n_row: usize, n_col: usize) -> LResult<Self> {
        let dim = Dim::new(n_row, n_col)?;
        Ok(Self::alloc(storage, dim, Init::Uninit))
    }

    pub fn zeros(storage: &mut Storage, n_row: usize, n_col: usize) -> LResult<Self> {
        let dim = Dim::new(n_row, n_col)?;
        Ok(Self::alloc(storage, dim, Init::Zeroed))
    }

    pub fn identity(storage: &mut Storage, size: usize) -> LResult<Self> {
        let dim = Dim::new(size, size)?;
        let m = Self::alloc(storage, dim, Init::Zeroed);
        let data = storage.slice_mut(&m.h)?;
        for (flat, x) in data.iter_mut().enumerate() {
            if dim.row_of(flat) == dim.col_of(flat) {
                *x = 1.0;
            }
        }
        Ok(m)
    }

    /// Copies row-major `data` into a new matrix.
    pub fn from_array(
        storage: &mut Storage,
        data: &[f64],
        n_row: usize,
        n_col: usize,
    ) -> LResult<Self> {
        let dim = Dim::new(n_row, n_col)?;
        if data.len() != dim.elem_count() {
            return Err(LinalgError::DimensionMismatch {
                op: "from_array",
                expected: dim.elem_count(),
                got: data.len(),
            });
        }
        Ok(Self::adopt(storage, data.to_vec(), dim))
    }

    pub fn from_rows(storage: &mut Storage, rows: &[&[f64]]) -> LResult<Self> {
        let n_col = rows.first().map_or(0, |r| r.len());
        let dim = Dim::new(rows.len(), n_col)?;
        let mut data = Vec::with_capacity(dim.elem_count());
        for row in rows {
            if row.len() != n_col {
                return Err(LinalgError::DimensionMismatch {
                    op: "from_rows",
                    expected: n_col,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self::adopt(storage, data, dim))
    }

    pub fn free(self, storage: &mut Storage) -> LResult<()> {
        storage.release(self.h)
    }

    pub fn n_row(&self) -> usize {
        self.dim.n_row()
    }

    pub fn n_col(&self) -> usize {
        self.dim.n_col()
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn as_slice<'a>(&self, storage: &'a Storage) -> LResult<&'a [f64]> {
        storage.slice(&self.h)
    }

    pub fn to_vec(&self, storage: &Storage) -> LResult<Vec<f64>> {
        Ok(self.as_slice(storage)?.to_vec())
    }

    pub fn get(&self, storage: &Storage, i: usize, j: usize) -> LResult<f64> {
        self.dim.check_axis(Axis::Row, i, "get")?;
        self.dim.check_axis(Axis::Col, j, "get")?;
        Ok(self.as_slice(storage)?[self.dim.index(i, j)])
    }

    pub fn set(&self, storage: &mut Storage, i: usize, j: usize, x: f64) -> LResult<()> {
        self.dim.check_axis(Axis::Row, i, "set")?;
        self.dim.check_axis(Axis::Col, j, "set")?;
        storage.slice_mut(&self.h)?[self.dim.index(i, j)] = x;
        Ok(())
    }

    /// Zero-copy view of one row. The matrix cannot be freed until the view is.
    pub fn row_view(&self, storage: &mut Storage, row: usize) -> LResult<Vector> {
        self.dim.check_axis(Axis::Row, row, "row_view")?;
        Vector::new_view(storage, self, self.dim.index(row, 0), self.n_col())
    }

    pub fn row_copy(&self, storage: &mut Storage, row: usize) -> LResult<Vector> {
        self.dim.check_axis(Axis::Row, row, "row_copy")?;
        let start = self.dim.index(row, 0);
        let data = self.as_slice(storage)?[start..start + self.n_col()].to_vec();
        Ok(Vector::from_handle(storage.allocate_from(data)))
    }

    pub fn column_copy(&self, storage: &mut Storage, col: usize) -> LResult<Vector> {
        self.dim.check_axis(Axis::Col, col, "column_copy")?;
        let src = self.as_slice(storage)?;
        let data: Vec<f64> = (0..self.n_row())
            .map(|i| src[self.dim.index(i, col)])
            .collect();
        Ok(Vector::from_handle(storage.allocate_from(data)))
    }

    pub fn copy_vector_into_row(
        &self,
        storage: &mut Storage,
        v: &Vector,
        row: usize,
    ) -> LResult<()> {
        self.dim.check_axis(Axis::Row, row, "copy_vector_into_row")?;
        if v.len() != self.n_col() {
            return Err(LinalgError::DimensionMismatch {
                op: "copy_vector_into_row",
                expected: self.n_col(),
                got: v.len(),
            });
        }
        storage.scatter(&self.h, self.dim.index(row, 0), 1, v.handle())
    }

    pub fn copy_vector_into_column(
        &self,
        storage: &mut Storage,
        v: &Vector,
        col: usize,
    ) -> LResult<()> {
        self.dim.check_axis(Axis::Col, col, "copy_vector_into_column")?;
        if v.len() != self.n_row() {
            return Err(LinalgError::DimensionMismatch {
                op: "copy_vector_into_column",
                expected: self.n_row(),
                got: v.len(),
            });
        }
        let (row_stride, _) = self.dim.stride_2d();
        storage.scatter(&self.h, self.dim.index(0, col), row_stride, v.handle())
    }

    pub fn transpose(&self, storage: &mut Storage) -> LResult<Matrix> {
        let td = self.dim.transpose();
        let src = self.as_slice(storage)?;
        let data: Vec<f64> = (0..td.elem_count())
            .map(|flat| src[self.dim.index(td.col_of(flat), td.row_of(flat))])
            .collect();
        Ok(Self::adopt(storage, data, td))
    }

    pub fn multiply(&self, storage: &mut Storage, right: &Matrix) -> LResult<Matrix> {
        if self.n_col() != right.n_row() {
            return Err(LinalgError::DimensionMismatch {
                op: "multiply",
                expected: self.n_col(),
                got: right.n_row(),
            });
        }
        let pd = Dim::new(self.n_row(), right.n_col())?;
        let k = self.n_col();
        let lhs = self.as_slice(storage)?;
        let rhs = right.as_slice(storage)?;
        let mut data = vec![0.0; pd.elem_count()];

        let work = pd.elem_count().saturating_mul(k);
        if work >= storage.config().parallel_threshold {
            log::debug!(
                "multiply {:?} x {:?} on rayon pool",
                self.dim.dim2(),
                right.dim.dim2()
            );
            data.par_chunks_mut(pd.n_col())
                .enumerate()
                .for_each(|(i, out)| mul_row(&lhs[i * k..(i + 1) * k], rhs, right.dim, out));
        } else {
            data.chunks_mut(pd.n_col())
                .enumerate()
                .for_each(|(i, out)| mul_row(&lhs[i * k..(i + 1) * k], rhs, right.dim, out));
        }
        Ok(Self::adopt(storage, data, pd))
    }

    /// `M * v`, a vector with `n_row` elements.
    pub fn vector_multiply(&self, storage: &mut Storage, v: &Vector) -> LResult<Vector> {
        if v.len() != self.n_col() {
            return Err(LinalgError::DimensionMismatch {
                op: "vector_multiply",
                expected: self.n_col(),
                got: v.len(),
            });
        }
        let m = self.as_slice(storage)?;
        let x = v.as_slice(storage)?;
        let data: Vec<f64> = m
            .chunks(self.n_col())
            .map(|row| row.iter().zip(x.iter()).map(|(a, b)| a * b).sum::<f64>())
            .collect();
        Ok(Vector::from_handle(storage.allocate_from(data)))
    }

    /// Same shape and every element pair within `tol`.
    pub fn equal(&self, storage: &Storage, other: &Matrix, tol: f64) -> LResult<bool> {
        if self.dim != other.dim {
            return Ok(false);
        }
        let a = self.as_slice(storage)?;
        let b = other.as_slice(storage)?;
        Ok(a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tol))
    }

    /// Whether every entry below the diagonal is exactly zero.
    pub fn is_upper_triangular(&self, storage: &Storage) -> LResult<bool> {
        let data = self.as_slice(storage)?;
        Ok(data
            .iter()
            .enumerate()
            .all(|(flat, &x)| self.dim.row_of(flat) <= self.dim.col_of(flat) || x == 0.0))
    }

    pub fn display<'a>(&'a self, storage: &'a Storage) -> MatrixDisplay<'a> {
        MatrixDisplay { m: self, storage }
    }

    /// Prints one row per line, reading each row through a temporary view.
    pub fn print(&self, storage: &mut Storage) -> LResult<()> {
        println!("[");
        for i in 0..self.n_row() {
            let row = self.row_view(storage, i)?;
            let line = format_elems(storage, row.as_slice(storage)?);
            row.free(storage)?;
            println!("  {}", line);
        }
        println!("]");
        Ok(())
    }
}

fn mul_row(l: &[f64], rhs: &[f64], rd: Dim, out: &mut [f64]) {
    for (j, o) in out.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (kk, &a) in l.iter().enumerate() {
            sum += a * rhs[rd.index(kk, j)];
        }
        *o = sum;
    }
}

pub struct MatrixDisplay<'a> {
    m: &'a Matrix,
    storage: &'a Storage,
}

impl fmt::Display for MatrixDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = match self.m.as_slice(self.storage) {
            Ok(d) => d,
            Err(_) => return f.write_str("[<released>]"),
        };
        f.write_str("[\n")?;
        for row in data.chunks(self.m.n_col()) {
            writeln!(f, "  {}", format_elems(self.storage, row))?;
        }
        f.write_str("]")
    }
}
