//! Connected-region labelling over a binary mask.

use courtside_core::Mask;

/// Moment accumulator for one 8-connected region.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Region {
    pub area: u32,
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
}

impl Region {
    fn start(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            ..Self::default()
        }
    }

    #[inline]
    fn add(&mut self, x: usize, y: usize) {
        let (xf, yf) = (x as f64, y as f64);
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.sum_x += xf;
        self.sum_y += yf;
        self.sum_xx += xf * xf;
        self.sum_yy += yf * yf;
        self.sum_xy += xf * yf;
    }

    /// Mean pixel coordinate.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.area.max(1) as f64;
        (self.sum_x / n, self.sum_y / n)
    }

    /// Normalized central second moments `(mu20, mu02, mu11)`.
    pub fn central_moments(&self) -> (f64, f64, f64) {
        let n = self.area.max(1) as f64;
        let (cx, cy) = self.centroid();
        (
            self.sum_xx / n - cx * cx,
            self.sum_yy / n - cy * cy,
            self.sum_xy / n - cx * cy,
        )
    }

    /// Principal-axis angle in radians, or `None` for isotropic regions.
    pub fn orientation(&self) -> Option<f64> {
        if self.area < 2 {
            return None;
        }
        let (mu20, mu02, mu11) = self.central_moments();
        let spread = mu20 + mu02;
        if spread <= 0.0 {
            return None;
        }
        let anisotropy = ((mu20 - mu02).powi(2) + 4.0 * mu11 * mu11).sqrt();
        if anisotropy < 1e-3 * spread {
            return None;
        }
        Some(0.5 * (2.0 * mu11).atan2(mu20 - mu02))
    }
}

/// Label 8-connected regions of set pixels, in raster order of their first pixel.
pub fn find_regions(mask: &Mask) -> Vec<Region> {
    let (w, h) = (mask.width, mask.height);
    let mut visited = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();
    let mut out = Vec::new();

    for start in 0..w * h {
        if visited[start] || mask.data[start] == 0 {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let mut region = Region::start(start % w, start / w);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            region.add(x, y);

            let x0 = x.saturating_sub(1);
            let y0 = y.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            let y1 = (y + 1).min(h - 1);
            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    let n = ny * w + nx;
                    if !visited[n] && mask.data[n] != 0 {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
        out.push(region);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn mask_from(rows: &[&str]) -> Mask {
        let h = rows.len();
        let w = rows[0].len();
        let mut m = Mask::new(w, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.bytes().enumerate() {
                if c == b'#' {
                    m.data[y * w + x] = Mask::ON;
                }
            }
        }
        m
    }

    #[test]
    fn diagonal_neighbours_join_one_region() {
        let m = mask_from(&["#...", ".#..", "..#.", "...."]);
        let regions = find_regions(&m);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 3);
        let (cx, cy) = regions[0].centroid();
        assert_abs_diff_eq!(cx, 1.0);
        assert_abs_diff_eq!(cy, 1.0);
    }

    #[test]
    fn separated_blobs_are_distinct() {
        let m = mask_from(&["##..#", "##..#", ".....", "..###"]);
        let mut areas: Vec<u32> = find_regions(&m).iter().map(|r| r.area).collect();
        areas.sort_unstable();
        assert_eq!(areas, vec![2, 3, 4]);
    }

    #[test]
    fn empty_mask_has_no_regions() {
        assert!(find_regions(&Mask::new(5, 5)).is_empty());
        assert!(find_regions(&Mask::new(0, 0)).is_empty());
    }

    #[test]
    fn elongated_region_reports_its_axis() {
        let horizontal = mask_from(&["......", "######", "......"]);
        let r = find_regions(&horizontal)[0];
        assert_abs_diff_eq!(r.orientation().expect("axis"), 0.0, epsilon = 1e-9);

        let vertical = mask_from(&[".#.", ".#.", ".#.", ".#."]);
        let r = find_regions(&vertical)[0];
        assert_abs_diff_eq!(
            r.orientation().expect("axis").abs(),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-9
        );

        let square = mask_from(&["##", "##"]);
        assert_eq!(find_regions(&square)[0].orientation(), None);
    }
}
