//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Available plots:
//! - throughput vs pipeline depth: measured `o`, model curve `-`, knee `K`
//! - linearized `p/T` vs `p`: measured `o`, fitted line `t0 + t1 p` as `-`
//! - pipeline closure: `T·p50` against `C·p` with the `y = x` boundary as `.`;
//!   points above the boundary are drawn as `X`
//! - syscall budget: syscalls/op against `1/(C·p)`, the `2/(C·p)` line as `-`

use crate::domain::{BoundCheck, Observation, PointEstimate, SyscallPoint};
use crate::fit::{knee_depth, throughput_at};
use crate::models::{US_PER_S, batch_time, linearize, predict_throughput};

const MOPS: f64 = 1e6;

/// Throughput (Mops/s) against pipeline depth, with the fitted model overlaid.
pub fn render_throughput_plot(
    observations: &[Observation],
    fit: Option<&PointEstimate>,
    width: usize,
    height: usize,
) -> String {
    let points: Vec<(f64, f64)> = observations
        .iter()
        .map(|o| (o.pipeline_depth as f64, o.throughput / MOPS))
        .collect();

    let (p_min, p_max) = x_range(&points).unwrap_or((1.0, 64.0));
    // Extend the model a little past the last measurement.
    let p_max = p_max * 1.2;
    let curve = fit.map(|f| sample_model(f, 1.0_f64.min(p_min), p_max, width.max(2)));

    let mut marks: Vec<(f64, f64, char)> = points.iter().map(|&(x, y)| (x, y, 'o')).collect();
    if let Some(f) = fit {
        if let (Some(k), Some(t)) = knee_at(f) {
            if k <= p_max {
                marks.push((k, t / MOPS, 'K'));
            }
        }
    }

    let x_lo = 1.0_f64.min(p_min);
    let curve = curve.as_deref();
    let grid = render_grid(&marks, curve, '-', x_lo, p_max, width, height, Some(0.0));
    format!(
        "Plot: p=[{x_lo:.0}, {p_max:.0}] | T=[{:.2}, {:.2}] Mops/s\n{}",
        grid.y_min, grid.y_max, grid.body
    )
}

/// The regression view: batch time `p/T` (µs) against depth with the fitted line.
pub fn render_linearized_plot(
    observations: &[Observation],
    fit: Option<&PointEstimate>,
    width: usize,
    height: usize,
) -> String {
    if observations.is_empty() {
        return "Plot: no observations\n".to_string();
    }

    let marks: Vec<(f64, f64, char)> = observations
        .iter()
        .map(|o| {
            let (x, y) = linearize(o);
            (x, y * US_PER_S, 'o')
        })
        .collect();
    let p_max = marks.iter().map(|m| m.0).fold(1.0_f64, f64::max);
    let line = fit.map(|f| {
        [
            (0.0, f.t0 * US_PER_S),
            (p_max, batch_time(p_max, f.t0, f.t1) * US_PER_S),
        ]
    });

    let line = line.as_ref().map(|l| &l[..]);
    let grid = render_grid(&marks, line, '-', 0.0, p_max, width, height, None);
    format!(
        "Plot: p=[0, {p_max:.0}] | p/T=[{:.2}, {:.2}] us | line = t0 + t1 p\n{}",
        grid.y_min, grid.y_max, grid.body
    )
}

/// Expected syscalls per operation against `1/(C·p)`; the budget is the line `y = 2x`.
pub fn render_syscall_plot(
    points: &[SyscallPoint],
    concurrency: u32,
    width: usize,
    height: usize,
) -> String {
    let c = concurrency as f64;
    let marks: Vec<(f64, f64, char)> = points
        .iter()
        .map(|s| (1.0 / (c * s.pipeline_depth as f64), s.syscalls_per_op, 'o'))
        .filter(|&(x, y, _)| x.is_finite() && y.is_finite())
        .collect();
    if marks.is_empty() {
        return "Plot: no pipeline depths\n".to_string();
    }

    let x_max = marks.iter().map(|m| m.0).fold(0.0_f64, f64::max);
    let budget = [(0.0, 0.0), (x_max, 2.0 * x_max)];

    let grid = render_grid(&marks, Some(&budget), '-', 0.0, x_max, width, height, Some(0.0));
    format!(
        "Plot: x = 1/(C·p) [0, {x_max:.4}] | syscalls/op [{:.4}, {:.4}] | C={concurrency}\n{}",
        grid.y_min, grid.y_max, grid.body
    )
}

/// Closure scatter: `C·p` on x, `T·p50` on y, boundary `y = x`.
pub fn render_closure_plot(points: &[BoundCheck], width: usize, height: usize) -> String {
    if points.is_empty() {
        return "Plot: no latency-bearing observations\n".to_string();
    }

    let max_val = points
        .iter()
        .map(|p| p.lhs.max(p.rhs))
        .fold(0.0_f64, f64::max)
        * 1.1;
    let boundary = [(0.0, 0.0), (max_val, max_val)];

    let marks: Vec<(f64, f64, char)> = points
        .iter()
        .map(|p| (p.rhs, p.lhs, if p.holds() { 'o' } else { 'X' }))
        .collect();

    let grid = render_grid(
        &marks,
        Some(&boundary),
        '.',
        0.0,
        max_val,
        width,
        height,
        Some(0.0),
    );
    format!(
        "Plot: x = C·p [0, {max_val:.0}] | y = T·p50 [{:.0}, {:.0}] | boundary y = x\n{}",
        grid.y_min, grid.y_max, grid.body
    )
}

fn knee_at(fit: &PointEstimate) -> (Option<f64>, Option<f64>) {
    let k = knee_depth(fit.t0, fit.t1).value();
    (k, k.and_then(|k| throughput_at(fit, k).value()))
}

struct Grid {
    body: String,
    y_min: f64,
    y_max: f64,
}

#[allow(clippy::too_many_arguments)]
fn render_grid(
    marks: &[(f64, f64, char)],
    curve: Option<&[(f64, f64)]>,
    curve_ch: char,
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
    y_floor: Option<f64>,
) -> Grid {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(marks, curve, x_max).unwrap_or((0.0, 1.0));
    let (mut y_min, y_max) = pad_range(y_min, y_max, 0.05);
    if let Some(floor) = y_floor {
        y_min = y_min.max(floor);
    }

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    if let Some(curve) = curve {
        draw_curve(&mut grid, curve, curve_ch, x_min, x_max, y_min, y_max);
    }

    for &(x, y, ch) in marks {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = ch;
    }

    let mut body = String::new();
    for row in grid {
        body.push_str(row.into_iter().collect::<String>().trim_end());
        body.push('\n');
    }

    Grid { body, y_min, y_max }
}

fn x_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn sample_model(fit: &PointEstimate, p_min: f64, p_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let p = p_min + u * (p_max - p_min);
        let t = predict_throughput(p, fit.t0, fit.t1);
        if t.is_finite() {
            out.push((p, t / MOPS));
        }
    }
    out
}

fn y_range(
    marks: &[(f64, f64, char)],
    curve: Option<&[(f64, f64)]>,
    x_max: f64,
) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(_, y, _) in marks {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if let Some(curve) = curve {
        for &(x, y) in curve {
            if y.is_finite() && x <= x_max {
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    ch: char,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
