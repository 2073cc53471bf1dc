use super::error::{LResult, LinalgError, ObjectKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

#[inline(always)]
pub fn compute_stride_offset(n: usize, stride: usize) -> usize {
    n * stride
}

/// Row-major shape of a matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dim {
    n_row: usize,
    n_col: usize,
}

impl Dim {
    pub fn new(n_row: usize, n_col: usize) -> LResult<Self> {
        // elem_count relies on the product fitting in usize
        if n_row == 0 || n_col == 0 || n_row.checked_mul(n_col).is_none() {
            return Err(LinalgError::InvalidShape { n_row, n_col });
        }
        Ok(Self { n_row, n_col })
    }

    pub fn dim2(&self) -> (usize, usize) {
        (self.n_row, self.n_col)
    }

    // [r, c] => strides [c, 1]
    pub fn stride_2d(&self) -> (usize, usize) {
        (self.n_col, 1)
    }

    pub fn n_row(&self) -> usize {
        self.n_row
    }

    pub fn n_col(&self) -> usize {
        self.n_col
    }

    pub fn elem_count(&self) -> usize {
        self.n_row * self.n_col
    }

    pub fn is_square(&self) -> bool {
        self.n_row == self.n_col
    }

    pub fn transpose(&self) -> Dim {
        Dim {
            n_row: self.n_col,
            n_col: self.n_row,
        }
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        let (rs, cs) = self.stride_2d();
        compute_stride_offset(i, rs) + compute_stride_offset(j, cs)
    }

    /// Row of a flat offset.
    #[inline]
    pub fn row_of(&self, flat: usize) -> usize {
        flat / self.n_col
    }

    /// Column of a flat offset.
    #[inline]
    pub fn col_of(&self, flat: usize) -> usize {
        flat % self.n_col
    }

    pub fn axis_len(&self, a: Axis) -> usize {
        match a {
            Axis::Row => self.n_row,
            Axis::Col => self.n_col,
        }
    }

    pub(crate) fn check_axis(&self, a: Axis, index: usize, op: &'static str) -> LResult<()> {
        let len = self.axis_len(a);
        if index >= len {
            return Err(LinalgError::OutOfBounds {
                kind: ObjectKind::Matrix,
                op,
                index,
                len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let d = Dim::new(3, 2).unwrap();
        assert_eq!(d.stride_2d(), (2, 1));
        assert_eq!(d.index(2, 1), 5);
        assert_eq!(d.row_of(5), 2);
        assert_eq!(d.col_of(5), 1);
        assert_eq!(d.transpose().dim2(), (2, 3));
    }

    #[test]
    fn test_zero_dims() {
        assert_eq!(
            Dim::new(0, 3),
            Err(LinalgError::InvalidShape { n_row: 0, n_col: 3 })
        );
    }

    #[test]
    fn test_elem_count_overflow() {
        let big = 1usize << (usize::BITS / 2);
        assert_eq!(
            Dim::new(big, big),
            Err(LinalgError::InvalidShape {
                n_row: big,
                n_col: big
            })
        );
        assert_eq!(Dim::new(big, big - 1).unwrap().elem_count(), big * (big - 1));
    }

    #[test]
    fn test_check_axis() {
        let d = Dim::new(2, 4).unwrap();
        assert!(d.check_axis(Axis::Col, 3, "column_copy").is_ok());
        assert!(d.check_axis(Axis::Row, 2, "row_view").is_err());
    }
}
