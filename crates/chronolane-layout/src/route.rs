//! Metro-track routing: grid-aligned polylines through an ordered point sequence, optionally
//! smoothed into line/arc paths.

use crate::model::LayoutPoint;
use chronolane_core::config::RouteConfig;
use chronolane_core::geom::{Point, Vector, point, snap, vector};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PathCommand {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    /// Circular arc to `(x, y)`; `sweep` follows the SVG sweep-flag convention (y axis down).
    ArcTo {
        radius: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
}

impl PathCommand {
    pub fn end(&self) -> LayoutPoint {
        match *self {
            Self::MoveTo { x, y } | Self::LineTo { x, y } | Self::ArcTo { x, y, .. } => {
                LayoutPoint::new(x, y)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub commands: Vec<PathCommand>,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// First and last coordinates of the path.
    pub fn endpoints(&self) -> Option<(LayoutPoint, LayoutPoint)> {
        let first = self.commands.first()?.end();
        let last = self.commands.last()?.end();
        Some((first, last))
    }

    /// End coordinate of every command, in order.
    pub fn vertices(&self) -> Vec<LayoutPoint> {
        self.commands.iter().map(PathCommand::end).collect()
    }

    /// SVG path data with numbers rounded to 3 fractional digits, trailing zeros trimmed.
    pub fn to_svg_d(&self) -> String {
        let mut out = String::new();
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo { x, y } => {
                    out.push('M');
                    fmt_pair_into(&mut out, x, y);
                }
                PathCommand::LineTo { x, y } => {
                    out.push('L');
                    fmt_pair_into(&mut out, x, y);
                }
                PathCommand::ArcTo {
                    radius,
                    large_arc,
                    sweep,
                    x,
                    y,
                } => {
                    out.push('A');
                    fmt_pair_into(&mut out, radius, radius);
                    let _ = write!(out, ",0,{},{},", u8::from(large_arc), u8::from(sweep));
                    fmt_pair_into(&mut out, x, y);
                }
            }
        }
        out
    }
}

fn fmt_pair_into(out: &mut String, a: f64, b: f64) {
    fmt_coord_into(out, a);
    out.push(',');
    fmt_coord_into(out, b);
}

fn fmt_coord_into(out: &mut String, v: f64) {
    // Half-up rounding at 3 digits, negatives included.
    if !v.is_finite() || v.abs() < 0.0005 {
        out.push('0');
        return;
    }
    let k = (v * 1000.0 + 0.5).floor() as i64;
    if k == 0 {
        out.push('0');
        return;
    }
    if k < 0 {
        out.push('-');
    }
    let abs = k.unsigned_abs();
    let _ = write!(out, "{}", abs / 1000);
    let frac = abs % 1000;
    if frac == 0 {
        return;
    }
    let digits = format!("{frac:03}");
    out.push('.');
    out.push_str(digits.trim_end_matches('0'));
}

/// Routes an ordered point sequence into a path.
///
/// The first and last points are reproduced exactly. Interior points snap `x` to the grid, and
/// `y` as well unless `y_from_scale` says `y` is already a scale position. Fewer than two points
/// yields an empty path.
pub fn route(points: &[LayoutPoint], cfg: &RouteConfig, y_from_scale: bool) -> Path {
    if points.len() < 2 {
        return Path::default();
    }
    let router = Router { cfg, y_from_scale };

    let last = points.len() - 1;
    let anchors: Vec<Point> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let p = point(p.x, p.y);
            if i == 0 || i == last {
                p
            } else {
                router.snap_point(p)
            }
        })
        .collect();

    let mut vertices: Vec<Point> = vec![anchors[0]];
    for pair in anchors.windows(2) {
        if let Some(corner) = router.corner_between(pair[0], pair[1]) {
            vertices.push(corner);
        }
        vertices.push(pair[1]);
    }
    vertices.dedup_by(|b, a| (*b - *a).square_length() < EPS * EPS);
    // Dedup may have merged the last anchor into its predecessor; the endpoint must stay exact.
    match vertices.len() {
        0 | 1 => vertices.push(anchors[last]),
        n => vertices[n - 1] = anchors[last],
    }

    if cfg.smoothing {
        smooth(&vertices, cfg)
    } else {
        polyline(&vertices)
    }
}

struct Router<'a> {
    cfg: &'a RouteConfig,
    y_from_scale: bool,
}

impl Router<'_> {
    fn snap_point(&self, p: Point) -> Point {
        let grid = self.cfg.grid_size;
        let y = if self.y_from_scale { p.y } else { snap(p.y, grid) };
        point(snap(p.x, grid), y)
    }

    /// Corner to insert between `a` and `b`, or `None` when the segment is drawn straight.
    fn corner_between(&self, a: Point, b: Point) -> Option<Point> {
        let d = b - a;
        let len = d.length();
        if len < self.cfg.min_segment_length.max(EPS) {
            return None;
        }
        let angle = undirected_degrees(d);
        let (preferred, diff) = self.nearest_preferred(angle)?;
        if diff <= self.cfg.angle_tolerance {
            return None;
        }

        let mut u = unit_at(preferred);
        if u.dot(d) < 0.0 {
            u = -u;
        }
        let t = [(d.x, u.x), (d.y, u.y)]
            .into_iter()
            .filter(|(_, c)| c.abs() > EPS)
            .map(|(delta, c)| delta / c)
            .filter(|t| *t > EPS)
            .min_by(f64::total_cmp)?;

        // Leave along the preferred direction then follow an axis, or the reverse.
        let candidates = [a + u * t, b - u * t].map(|c| self.snap_point(c));
        let mut best: Option<(Point, f64)> = None;
        for c in candidates {
            if (c - a).length() < EPS || (b - c).length() < EPS {
                continue;
            }
            let total = (c - a).length() + (b - c).length();
            if best.is_none_or(|(_, best_total)| total < best_total) {
                best = Some((c, total));
            }
        }
        best.map(|(c, _)| c)
    }

    fn nearest_preferred(&self, angle: f64) -> Option<(f64, f64)> {
        self.cfg
            .preferred_angles
            .iter()
            .map(|&p| {
                let raw = (angle - p.rem_euclid(180.0)).abs();
                (p, raw.min(180.0 - raw))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Direction of `d` in degrees, folded into `[0, 180)`.
fn undirected_degrees(d: Vector) -> f64 {
    d.y.atan2(d.x).to_degrees().rem_euclid(180.0)
}

fn unit_at(degrees: f64) -> Vector {
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    vector(clean(cos), clean(sin))
}

fn clean(v: f64) -> f64 {
    if v.abs() < EPS { 0.0 } else { v }
}

fn polyline(vertices: &[Point]) -> Path {
    let mut commands = Vec::with_capacity(vertices.len());
    for (i, v) in vertices.iter().enumerate() {
        commands.push(if i == 0 {
            PathCommand::MoveTo { x: v.x, y: v.y }
        } else {
            PathCommand::LineTo { x: v.x, y: v.y }
        });
    }
    Path { commands }
}

fn smooth(vertices: &[Point], cfg: &RouteConfig) -> Path {
    let Some((&first, rest)) = vertices.split_first() else {
        return Path::default();
    };
    let Some((&end, _)) = rest.split_last() else {
        return polyline(vertices);
    };

    let mut commands = vec![PathCommand::MoveTo {
        x: first.x,
        y: first.y,
    }];
    for w in vertices.windows(3) {
        let (prev, v, next) = (w[0], w[1], w[2]);
        let (in_vec, out_vec) = (v - prev, next - v);
        let (in_len, out_len) = (in_vec.length(), out_vec.length());
        let u1 = in_vec / in_len;
        let u2 = out_vec / out_len;
        let cross = u1.cross(u2);
        if cross.abs() < EPS {
            if u1.dot(u2) > 0.0 {
                // Collinear corner: the line simply continues.
                continue;
            }
            commands.push(PathCommand::LineTo { x: v.x, y: v.y });
            continue;
        }

        let cap = cfg.corner_fraction * in_len.min(out_len);
        let half_tan = ((-u1).dot(u2).clamp(-1.0, 1.0).acos() / 2.0).tan();
        let mut radius = cfg.corner_radius.min(cap);
        if radius <= EPS || half_tan <= EPS {
            commands.push(PathCommand::LineTo { x: v.x, y: v.y });
            continue;
        }
        // Sharp turns need a long cut for a given radius; the cut may not exceed the cap.
        let mut tangent = radius / half_tan;
        if tangent > cap {
            tangent = cap;
            radius = tangent * half_tan;
        }
        let t1 = v - u1 * tangent;
        let t2 = v + u2 * tangent;
        commands.push(PathCommand::LineTo { x: t1.x, y: t1.y });
        commands.push(PathCommand::ArcTo {
            radius,
            large_arc: false,
            sweep: cross > 0.0,
            x: t2.x,
            y: t2.y,
        });
    }
    commands.push(PathCommand::LineTo { x: end.x, y: end.y });
    Path { commands }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<LayoutPoint> {
        raw.iter().map(|&(x, y)| LayoutPoint::new(x, y)).collect()
    }

    fn plain() -> RouteConfig {
        RouteConfig {
            smoothing: false,
            ..RouteConfig::default()
        }
    }

    #[test]
    fn short_input_gives_empty_path() {
        assert!(route(&[], &RouteConfig::default(), false).is_empty());
        assert!(route(&pts(&[(1.0, 2.0)]), &RouteConfig::default(), false).is_empty());
    }

    #[test]
    fn axis_aligned_segment_is_straight() {
        let path = route(&pts(&[(0.0, 0.0), (0.0, 100.0)]), &plain(), false);
        assert_eq!(path.vertices().len(), 2);
        assert_eq!(path.to_svg_d(), "M0,0L0,100");
    }

    #[test]
    fn off_angle_segment_gets_one_corner() {
        let path = route(&pts(&[(0.0, 0.0), (30.0, 100.0)]), &plain(), false);
        let v = path.vertices();
        assert_eq!(v.len(), 3);
        let corner = v[1];
        let legs = [(corner.x - 0.0, corner.y - 0.0), (30.0 - corner.x, 100.0 - corner.y)];
        for (dx, dy) in legs {
            let deg = dy.atan2(dx).to_degrees().rem_euclid(180.0);
            let off = [0.0, 45.0, 90.0, 135.0, 180.0]
                .iter()
                .map(|p: &f64| (deg - p).abs())
                .fold(f64::INFINITY, f64::min);
            assert!(off < 1e-6, "leg at {deg} degrees");
        }
    }

    #[test]
    fn interior_points_snap_but_endpoints_do_not() {
        let path = route(
            &pts(&[(1.3, 2.7), (47.0, 52.0), (101.9, 103.1)]),
            &RouteConfig {
                smoothing: false,
                min_segment_length: 1e6,
                ..RouteConfig::default()
            },
            false,
        );
        assert_eq!(
            path.vertices(),
            pts(&[(1.3, 2.7), (50.0, 50.0), (101.9, 103.1)])
        );
    }

    #[test]
    fn pinned_y_is_not_snapped() {
        let path = route(
            &pts(&[(0.0, 0.0), (47.0, 52.0), (0.0, 103.0)]),
            &RouteConfig {
                smoothing: false,
                min_segment_length: 1e6,
                ..RouteConfig::default()
            },
            true,
        );
        assert_eq!(path.vertices()[1], LayoutPoint::new(50.0, 52.0));
    }

    #[test]
    fn corners_become_arcs_when_smoothing() {
        let path = route(
            &pts(&[(0.0, 0.0), (0.0, 100.0), (100.0, 100.0)]),
            &RouteConfig::default(),
            false,
        );
        let arcs: Vec<_> = path
            .commands
            .iter()
            .filter(|c| matches!(c, PathCommand::ArcTo { .. }))
            .collect();
        assert_eq!(arcs.len(), 1);
        let PathCommand::ArcTo { radius, x, y, .. } = *arcs[0] else {
            unreachable!()
        };
        // Right angle: tangent length equals the arc radius.
        assert!((radius - 8.0).abs() < 1e-9);
        assert_eq!((x, y), (8.0, 100.0));
        assert_eq!(
            path.endpoints(),
            Some((LayoutPoint::new(0.0, 0.0), LayoutPoint::new(100.0, 100.0)))
        );
    }

    fn only_arc(path: &Path) -> (f64, LayoutPoint) {
        let arcs: Vec<_> = path
            .commands
            .iter()
            .filter_map(|c| match *c {
                PathCommand::ArcTo { radius, x, y, .. } => Some((radius, LayoutPoint::new(x, y))),
                _ => None,
            })
            .collect();
        assert_eq!(arcs.len(), 1, "{:?}", path.commands);
        arcs[0]
    }

    #[test]
    fn gentle_turn_keeps_the_configured_radius() {
        let cfg = RouteConfig {
            min_segment_length: 1.0,
            ..RouteConfig::default()
        };
        let path = route(&pts(&[(0.0, 0.0), (0.0, 20.0), (20.0, 40.0)]), &cfg, false);
        let (radius, end) = only_arc(&path);
        assert!((radius - 8.0).abs() < 1e-9, "radius {radius}");

        // A 45 degree heading change leaves a 135 degree interior angle.
        let tangent = 8.0 / (135.0_f64.to_radians() / 2.0).tan();
        let h = tangent / 2.0_f64.sqrt();
        assert!((end.x - h).abs() < 1e-9 && (end.y - (20.0 + h)).abs() < 1e-9);
    }

    #[test]
    fn sharp_turn_shrinks_the_radius_to_fit_the_cut() {
        let vertices = [point(0.0, 0.0), point(0.0, 100.0), point(20.0, 80.0)];
        let cfg = RouteConfig::default();
        let path = smooth(&vertices, &cfg);
        let (radius, end) = only_arc(&path);

        let cap = cfg.corner_fraction * 800.0_f64.sqrt();
        let expected = cap * (45.0_f64.to_radians() / 2.0).tan();
        assert!(radius < cfg.corner_radius);
        assert!((radius - expected).abs() < 1e-9, "radius {radius}");
        let cut = ((end.x - 0.0).powi(2) + (end.y - 100.0).powi(2)).sqrt();
        assert!((cut - cap).abs() < 1e-9, "cut {cut}");
    }

    #[test]
    fn collinear_corner_is_dropped() {
        let path = route(
            &pts(&[(0.0, 0.0), (0.0, 50.0), (0.0, 100.0)]),
            &RouteConfig::default(),
            false,
        );
        assert_eq!(path.to_svg_d(), "M0,0L0,100");
    }

    #[test]
    fn svg_numbers_round_to_three_digits() {
        let mut out = String::new();
        fmt_coord_into(&mut out, 1.23456);
        out.push(' ');
        fmt_coord_into(&mut out, -0.0004);
        out.push(' ');
        fmt_coord_into(&mut out, 2.5);
        out.push(' ');
        fmt_coord_into(&mut out, -1.2341);
        assert_eq!(out, "1.235 0 2.5 -1.234");
    }
}
