use std::f64::consts::PI;

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The sort is stable, i.e. equal values
/// keep their relative order, and NaN values are ordered by `f64::total_cmp`.
pub fn argsort(x: &[f64], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => indices.sort_by(|&a, &b| x[a].total_cmp(&x[b])),
        SortOrder::Descending => indices.sort_by(|&a, &b| x[b].total_cmp(&x[a])),
    }
    indices
}

/// floor_index splits a continuous position `x` (in units of elements) on a closed loop of `n`
/// elements into the index of the element it lies in and the fraction inside that element.
///
/// The index is determined by flooring (not truncation), such that negative positions resolve to
/// the preceding element, e.g. `x = -0.25` with `n = 4` returns `(3, 0.75)`. The fraction is
/// always in `[0.0, 1.0)`.
pub fn floor_index(x: f64, n: usize) -> (usize, f64) {
    let x_floor = x.floor();
    let frac = x - x_floor;
    let idx = (x_floor as i64).rem_euclid(n as i64) as usize;

    // guard against rounding of x - floor(x) up to 1.0 for tiny negative x
    if frac >= 1.0 {
        ((idx + 1) % n, 0.0)
    } else {
        (idx, frac)
    }
}

/// wrap_angle normalizes an angle (rad) into the half-open interval `(-pi, pi]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let mut wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped += 2.0 * PI;
    }
    wrapped
}

/// lap_frac reduces a progress value to its fraction of the current lap in `[0.0, 1.0)`.
pub fn lap_frac(progress: f64) -> f64 {
    let frac = progress.rem_euclid(1.0);
    if frac >= 1.0 {
        0.0
    } else {
        frac
    }
}
