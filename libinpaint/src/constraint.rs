//! Structural constraints (spec.md 9 "Constraint objects"), promoted to a
//! full module. Grounded directly on the original engine's
//! `Constraint`/`LineConstraint`/`FiniteLineConstraint` hierarchy: modeled
//! here as a tagged sum rather than a virtual base class, exactly as the
//! Design Notes suggest.

/// `(x, y)` in frame coordinates.
pub type Vec2 = (f32, f32);

fn sub(a: Vec2, b: Vec2) -> Vec2 {
    (a.0 - b.0, a.1 - b.1)
}

fn dot(a: Vec2, b: Vec2) -> f32 {
    a.0 * b.0 + a.1 * b.1
}

fn length(a: Vec2) -> f32 {
    dot(a, a).sqrt()
}

fn perpendicular(a: Vec2) -> Vec2 {
    (-a.1, a.0)
}

#[derive(Debug, Clone, Copy)]
struct LineParameters {
    normal: Vec2,
    distance: f32,
}

impl LineParameters {
    fn new(point0: Vec2, point1: Vec2) -> LineParameters {
        let direction = sub(point1, point0);
        let len = length(direction);
        let normal = if len > f32::EPSILON {
            let perp = perpendicular(direction);
            (perp.0 / len, perp.1 / len)
        } else {
            (0.0, 0.0)
        };
        let distance = dot(normal, point0);
        LineParameters { normal, distance }
    }

    /// Signed distance of `point` from the infinite line.
    fn infinite_distance(&self, point: Vec2) -> f32 {
        self.normal.0 * point.0 + self.normal.1 * point.1 - self.distance
    }
}

/// One structural constraint: a geometric feature (currently, straight
/// lines) with an impact weight and an influence radius. Extensible: a new
/// kind is a new enum variant, not a new trait implementor.
#[derive(Debug, Clone)]
pub enum Constraint {
    InfiniteLine {
        point0: Vec2,
        point1: Vec2,
        impact: f32,
        radius: f32,
    },
    FiniteLine {
        point0: Vec2,
        point1: Vec2,
        impact: f32,
        radius: f32,
        penalty: f32,
        finite0: bool,
        finite1: bool,
    },
}

impl Constraint {
    fn impact(&self) -> f32 {
        match self {
            Constraint::InfiniteLine { impact, .. } => *impact,
            Constraint::FiniteLine { impact, .. } => *impact,
        }
    }

    fn radius(&self) -> f32 {
        match self {
            Constraint::InfiniteLine { radius, .. } => *radius,
            Constraint::FiniteLine { radius, .. } => *radius,
        }
    }

    fn params(&self) -> LineParameters {
        match self {
            Constraint::InfiniteLine { point0, point1, .. } => LineParameters::new(*point0, *point1),
            Constraint::FiniteLine { point0, point1, .. } => LineParameters::new(*point0, *point1),
        }
    }

    /// Distance used to compute weight/cost: the plain infinite-line
    /// distance for an `InfiniteLine`, or — for a `FiniteLine` whose
    /// endpoints are finite — `penalty` whenever the point's projection
    /// onto the segment falls outside `[0, |offset|^2]`. Copied from
    /// `FiniteLineConstraint::finiteLineDistance`.
    fn distance(&self, point: Vec2) -> f32 {
        match self {
            Constraint::InfiniteLine { .. } => self.params().infinite_distance(point),
            Constraint::FiniteLine { point0, point1, penalty, finite0, finite1, .. } => {
                if !finite0 && !finite1 {
                    return self.params().infinite_distance(point);
                }
                let offset = sub(*point1, *point0);
                let offset_sqr = dot(offset, offset);
                let projection = dot(offset, sub(point, *point0));
                let outside = (*finite0 && projection < 0.0) || (*finite1 && projection > offset_sqr);
                if outside {
                    *penalty
                } else {
                    self.params().infinite_distance(point)
                }
            }
        }
    }

    /// `impact * exp(-0.5 * (distance / (radius/4))^2)`, zero beyond
    /// `radius` — copied from `LineConstraint::weight(Scalar)`.
    fn weight_from_distance(&self, distance: f32) -> f32 {
        let radius = self.radius();
        if distance.abs() > radius {
            return 0.0;
        }
        let radius_parameter = 1.0 / (radius * 0.25);
        self.impact() * (-0.5 * (distance * radius_parameter).powi(2)).exp()
    }

    pub fn weight(&self, point: Vec2) -> f32 {
        self.weight_from_distance(self.distance(point))
    }

    /// Cost contribution for a candidate mapping from `inside` (a point
    /// inside the mask) to `outside` (its candidate source): the squared
    /// difference between the two points' line-distances, scaled by the
    /// weight at `inside` — copied from `LineConstraint::cost`/
    /// `FiniteLineConstraint::cost`.
    pub fn cost(&self, inside: Vec2, outside: Vec2) -> f32 {
        let distance_inside = self.distance(inside);
        let w = self.weight_from_distance(distance_inside);
        if w <= 0.0 {
            return 0.0;
        }
        let distance_outside = self.distance(outside);
        let diff = distance_inside - distance_outside;
        w * diff * diff
    }
}

/// A precomputed per-pixel index into a constraint list (spec.md 9:
/// "decision frame... precomputed once; optimizers read it in O(1)").
/// `0xFF` means "no constraint applies at this pixel".
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
    decisions: Vec<u8>,
    width: u32,
}

impl ConstraintSet {
    /// For each target pixel, selects the constraint with the highest
    /// weight at that location, once, at initialization time.
    pub fn build(constraints: Vec<Constraint>, width: u32, height: u32, is_target: impl Fn(u32, u32) -> bool) -> ConstraintSet {
        let mut decisions = vec![0xFFu8; (width as usize) * (height as usize)];
        if !constraints.is_empty() {
            for y in 0..height {
                for x in 0..width {
                    if !is_target(x, y) {
                        continue;
                    }
                    let point = (x as f32, y as f32);
                    let mut best_idx = 0xFFu8;
                    let mut best_weight = 0.0f32;
                    for (i, c) in constraints.iter().enumerate() {
                        let w = c.weight(point);
                        if w > best_weight {
                            best_weight = w;
                            best_idx = i as u8;
                        }
                    }
                    decisions[(y as usize) * (width as usize) + x as usize] = best_idx;
                }
            }
        }
        ConstraintSet { constraints, decisions, width }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// O(1) cost lookup via the precomputed decision frame.
    pub fn cost(&self, inside: (u32, u32), outside: Vec2) -> f32 {
        if self.constraints.is_empty() {
            return 0.0;
        }
        let decision = self.decisions[(inside.1 as usize) * (self.width as usize) + inside.0 as usize];
        if decision == 0xFF {
            return 0.0;
        }
        self.constraints[decision as usize].cost((inside.0 as f32, inside.1 as f32), outside)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_line_weight_peaks_on_the_line() {
        let c = Constraint::InfiniteLine { point0: (0.0, 0.0), point1: (10.0, 0.0), impact: 2.0, radius: 4.0 };
        let on_line = c.weight((5.0, 0.0));
        let off_line = c.weight((5.0, 3.0));
        assert!(on_line > off_line);
        assert!((on_line - 2.0).abs() < 1e-5);
    }

    #[test]
    fn weight_is_zero_beyond_radius() {
        let c = Constraint::InfiniteLine { point0: (0.0, 0.0), point1: (10.0, 0.0), impact: 2.0, radius: 4.0 };
        assert_eq!(c.weight((5.0, 10.0)), 0.0);
    }

    #[test]
    fn finite_line_applies_penalty_beyond_endpoint() {
        let c = Constraint::FiniteLine {
            point0: (0.0, 0.0),
            point1: (10.0, 0.0),
            impact: 1.0,
            radius: 4.0,
            penalty: 100.0,
            finite0: true,
            finite1: true,
        };
        // `inside` stays close to the line so its weight is non-zero; only
        // `outside` moves past point1, where its distance is replaced by
        // the penalty (projection > offset^2), inflating the cost.
        let inside = (5.0, 0.5);
        let cost_past_end = c.cost(inside, (20.0, 0.5));
        let cost_on_segment = c.cost(inside, (5.0, 2.0));
        assert!(cost_past_end > cost_on_segment);
    }

    #[test]
    fn decision_frame_picks_highest_weight_constraint() {
        let constraints = vec![
            Constraint::InfiniteLine { point0: (0.0, 5.0), point1: (10.0, 5.0), impact: 1.0, radius: 4.0 },
            Constraint::InfiniteLine { point0: (0.0, 0.0), point1: (10.0, 0.0), impact: 1.0, radius: 4.0 },
        ];
        let set = ConstraintSet::build(constraints, 10, 10, |_, y| y == 0);
        assert_ne!(set.decisions[0], 0xFF);
    }
}
