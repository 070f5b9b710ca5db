//! Escape-time evaluation for maps of the form z -> z^exp + c.
//!
//! Iterating from a fixed starting value with `c` taken from the pixel
//! gives the Mandelbrot family; iterating from the pixel with a fixed
//! `c` gives a Julia set.

use num::Complex;

/// The map f(z) = z^exp + c, and when to give up on it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JuliaSetFn {
    /// The exponent; 0 behaves as 1.
    pub exp: u32,
    /// Iteration cap; points that survive this long count as inside.
    pub max_iters: usize,
    /// Iterates further than this from the origin have escaped.
    pub escape_radius: f64,
    /// The first iterate.
    pub init_iterate: Complex<f64>,
}

impl Default for JuliaSetFn {
    fn default() -> Self {
        JuliaSetFn {
            exp: 2,
            max_iters: 1000,
            escape_radius: 2.0,
            init_iterate: Complex::new(0.0, 0.0),
        }
    }
}

impl JuliaSetFn {
    /// The iteration at which the iterates starting from
    /// `init_iterate` escape, or `max_iters` if they never do.
    #[inline]
    pub fn escape_iter(&self, c: Complex<f64>) -> usize {
        self.escape_iter_from(self.init_iterate, c)
    }

    /// As `escape_iter`, starting from `z` instead.
    pub fn escape_iter_from(&self, mut z: Complex<f64>, c: Complex<f64>) -> usize {
        let escape = self.escape_radius * self.escape_radius;
        for n in 0..self.max_iters {
            z = power(z, self.exp) + c;
            if z.norm_sqr() > escape {
                return n;
            }
        }
        self.max_iters
    }
}

#[inline]
fn power(z: Complex<f64>, exp: u32) -> Complex<f64> {
    match exp {
        0 | 1 => z,
        2 => z * z,
        _ => {
            let mut acc = z;
            for _ in 1..exp {
                acc = acc * z;
            }
            acc
        }
    }
}
