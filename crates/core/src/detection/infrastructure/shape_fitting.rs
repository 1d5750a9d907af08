//! Fits an ellipse or a minimum-area rectangle to a contour.

use nalgebra::{Matrix6, SymmetricEigen, Vector6};

use crate::shared::geometry::{Ellipse, Polygon, RotatedRect};

/// Smallest-area rectangle enclosing the polygon, by rotating calipers over
/// the convex hull edges. `None` for an empty polygon.
pub fn min_area_rect(polygon: &Polygon) -> Option<RotatedRect> {
    let hull = polygon.convex_hull();
    let pts: Vec<(f64, f64)> = hull.points.iter().map(|p| (p.x as f64, p.y as f64)).collect();

    match pts.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: pts[0],
                width: 0.0,
                height: 0.0,
                angle: 0.0,
            })
        }
        2 => {
            let (dx, dy) = (pts[1].0 - pts[0].0, pts[1].1 - pts[0].1);
            return Some(RotatedRect {
                center: ((pts[0].0 + pts[1].0) / 2.0, (pts[0].1 + pts[1].1) / 2.0),
                width: (dx * dx + dy * dy).sqrt(),
                height: 0.0,
                angle: dy.atan2(dx).to_degrees(),
            });
        }
        _ => {}
    }

    let n = pts.len();
    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..n {
        let (ax, ay) = pts[i];
        let (bx, by) = pts[(i + 1) % n];
        let len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
        if len == 0.0 {
            continue;
        }
        // Edge direction and its normal
        let (ex, ey) = ((bx - ax) / len, (by - ay) / len);
        let (nx, ny) = (-ey, ex);

        let (mut umin, mut umax) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut vmin, mut vmax) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(px, py) in &pts {
            let u = px * ex + py * ey;
            let v = px * nx + py * ny;
            umin = umin.min(u);
            umax = umax.max(u);
            vmin = vmin.min(v);
            vmax = vmax.max(v);
        }

        let (width, height) = (umax - umin, vmax - vmin);
        let area = width * height;
        if best.as_ref().map_or(true, |(a, _)| area < *a) {
            let (um, vm) = ((umin + umax) / 2.0, (vmin + vmax) / 2.0);
            best = Some((
                area,
                RotatedRect {
                    center: (um * ex + vm * nx, um * ey + vm * ny),
                    width,
                    height,
                    angle: ey.atan2(ex).to_degrees(),
                },
            ));
        }
    }
    best.map(|(_, rect)| rect)
}

/// Least-squares ellipse through the polygon's points.
///
/// Fits the general conic `ax² + bxy + cy² + dx + ey + f = 0` under a unit
/// norm constraint on normalized coordinates. When fewer than five points
/// are given or the best conic is not an ellipse, falls back to the circle
/// through the mean vertex with the mean vertex distance as radius.
/// `None` for an empty polygon.
pub fn fit_ellipse(polygon: &Polygon) -> Option<Ellipse> {
    let (mx, my) = polygon.centroid()?;
    let pts: Vec<(f64, f64)> = polygon
        .points
        .iter()
        .map(|p| (p.x as f64 - mx, p.y as f64 - my))
        .collect();

    let rms = (pts.iter().map(|(x, y)| x * x + y * y).sum::<f64>() / pts.len() as f64).sqrt();
    if pts.len() < 5 || rms == 0.0 {
        return Some(fallback_circle((mx, my), &pts));
    }
    let scale = rms / std::f64::consts::SQRT_2;

    let mut scatter = Matrix6::<f64>::zeros();
    for &(x, y) in &pts {
        let (x, y) = (x / scale, y / scale);
        let d = Vector6::new(x * x, x * y, y * y, x, y, 1.0);
        scatter += d * d.transpose();
    }

    let eig = SymmetricEigen::new(scatter);
    let (idx, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let coeffs = eig.eigenvectors.column(idx);

    match conic_to_ellipse(
        coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4], coeffs[5],
    ) {
        Some(e) => Some(Ellipse {
            center: (e.center.0 * scale + mx, e.center.1 * scale + my),
            axes: (e.axes.0 * scale, e.axes.1 * scale),
            angle: e.angle,
        }),
        None => Some(fallback_circle((mx, my), &pts)),
    }
}

/// Geometric parameters of a conic, or `None` if it is not a real ellipse.
fn conic_to_ellipse(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Option<Ellipse> {
    let den = 4.0 * a * c - b * b;
    if den <= 0.0 {
        return None;
    }
    let x0 = (b * e - 2.0 * c * d) / den;
    let y0 = (b * d - 2.0 * a * e) / den;
    let f0 = a * x0 * x0 + b * x0 * y0 + c * y0 * y0 + d * x0 + e * y0 + f;

    let theta = 0.5 * b.atan2(a - c);
    let (sin, cos) = theta.sin_cos();
    let l1 = a * cos * cos + b * sin * cos + c * sin * sin;
    let l2 = a * sin * sin - b * sin * cos + c * cos * cos;

    let s1 = -f0 / l1;
    let s2 = -f0 / l2;
    if !(s1 > 0.0 && s2 > 0.0) {
        return None;
    }
    Some(Ellipse {
        center: (x0, y0),
        axes: (2.0 * s1.sqrt(), 2.0 * s2.sqrt()),
        angle: theta.to_degrees(),
    })
}

fn fallback_circle(center: (f64, f64), centered_pts: &[(f64, f64)]) -> Ellipse {
    let r = if centered_pts.is_empty() {
        0.0
    } else {
        centered_pts
            .iter()
            .map(|(x, y)| (x * x + y * y).sqrt())
            .sum::<f64>()
            / centered_pts.len() as f64
    };
    Ellipse {
        center,
        axes: (2.0 * r, 2.0 * r),
        angle: 0.0,
    }
}
