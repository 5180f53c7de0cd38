//! Summed-area tables for constant-time window sums

/// Summed-area table over one scalar plane
#[derive(Debug, Clone)]
pub struct IntegralImage {
    width: u32,
    height: u32,
    // (width + 1) x (height + 1), first row and column are zero
    table: Vec<f64>,
}

impl IntegralImage {
    /// Build from a per-pixel value function
    pub fn from_fn<F>(width: u32, height: u32, mut value: F) -> Self
    where
        F: FnMut(u32, u32) -> f64,
    {
        let stride = width as usize + 1;
        let mut table = vec![0.0; stride * (height as usize + 1)];

        for y in 0..height {
            let mut row_sum = 0.0;
            let row = (y as usize + 1) * stride;
            let above = y as usize * stride;
            for x in 0..width {
                row_sum += value(x, y);
                table[row + x as usize + 1] = table[above + x as usize + 1] + row_sum;
            }
        }

        Self {
            width,
            height,
            table,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sum over the window with top-left `(x, y)` and size `w x h`.
    /// The window must lie inside the plane.
    pub fn window_sum(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        debug_assert!(x + w <= self.width && y + h <= self.height);
        let stride = self.width as usize + 1;
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);

        self.table[y1 * stride + x1] - self.table[y0 * stride + x1] - self.table[y1 * stride + x0]
            + self.table[y0 * stride + x0]
    }
}
