/// Tunables carried by a [`Storage`](crate::Storage).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Relative threshold below which a Gram-Schmidt residual counts as
    /// linearly dependent on the previous columns.
    pub rank_tolerance: f64,
    /// Norms at or below this value are rejected by `normalize_into`.
    pub zero_norm: f64,
    /// Number of multiply-adds above which matrix products run on the rayon pool.
    pub parallel_threshold: usize,
    /// Fixed number of decimals for printing, `None` prints with `{:?}`.
    pub print_precision: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-12,
            zero_norm: 0.0,
            parallel_threshold: 1 << 16,
            print_precision: None,
        }
    }
}

impl Config {
    pub fn with_rank_tolerance(mut self, tol: f64) -> Self {
        self.rank_tolerance = tol;
        self
    }

    pub fn with_zero_norm(mut self, zero_norm: f64) -> Self {
        self.zero_norm = zero_norm;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_print_precision(mut self, precision: usize) -> Self {
        self.print_precision = Some(precision);
        self
    }

    pub(crate) fn fmt_elem(&self, x: f64) -> String {
        match self.print_precision {
            Some(p) => format!("{:.*}", p, x),
            None => format!("{:?}", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let c = Config::default()
            .with_rank_tolerance(1e-8)
            .with_parallel_threshold(0)
            .with_print_precision(2);
        assert_eq!(c.rank_tolerance, 1e-8);
        assert_eq!(c.parallel_threshold, 0);
        assert_eq!(c.zero_norm, 0.0);
        assert_eq!(c.fmt_elem(1.0 / 3.0), "0.33");
    }

    #[test]
    fn test_default_format() {
        let c = Config::default();
        assert_eq!(c.fmt_elem(1.0), "1.0");
        assert_eq!(c.fmt_elem(-0.5), "-0.5");
    }
}
