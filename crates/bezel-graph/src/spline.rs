//! Kochanek-Bartels (tension/continuity/bias) interpolating spline over scalar
//! samples. Multi-component curves use one spline per component.

/// Piecewise cubic Hermite spline whose tangents are shaped by tension, bias and
/// continuity, each in `[-1, 1]`. All zero gives a Catmull-Rom spline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KochanekSpline {
    pub tension: f64,
    pub bias: f64,
    pub continuity: f64,
    knots: Vec<(f64, f64)>,
}

impl KochanekSpline {
    pub fn new(tension: f64, bias: f64, continuity: f64) -> Self {
        Self {
            tension,
            bias,
            continuity,
            knots: Vec::new(),
        }
    }

    /// Add a control point, keeping knots sorted by parameter. A point at an
    /// existing parameter replaces it.
    pub fn add_point(&mut self, t: f64, value: f64) {
        if !t.is_finite() || !value.is_finite() {
            return;
        }
        match self.knots.binary_search_by(|(k, _)| k.total_cmp(&t)) {
            Ok(i) => self.knots[i].1 = value,
            Err(i) => self.knots.insert(i, (t, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Parameter range covered by the knots.
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.knots.first()?.0, self.knots.last()?.0))
    }

    /// Value at `t`, clamped to the end values outside the knot range. An empty
    /// spline evaluates to 0.
    pub fn evaluate(&self, t: f64) -> f64 {
        let n = self.knots.len();
        match n {
            0 => return 0.0,
            1 => return self.knots[0].1,
            _ => {}
        }
        let (first, last) = (self.knots[0], self.knots[n - 1]);
        if t.is_nan() || t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        // Segment i spans knots[i]..knots[i + 1].
        let i = match self.knots.binary_search_by(|(k, _)| k.total_cmp(&t)) {
            Ok(i) => return self.knots[i].1,
            Err(i) => i - 1,
        };
        let (t0, p0) = self.knots[i];
        let (t1, p1) = self.knots[i + 1];
        let s = (t - t0) / (t1 - t0);

        let out_tangent = self.outgoing_tangent(i);
        let in_tangent = self.incoming_tangent(i + 1);

        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        h00 * p0 + h10 * out_tangent + h01 * p1 + h11 * in_tangent
    }

    /// Tangent arriving at knot `i`.
    fn incoming_tangent(&self, i: usize) -> f64 {
        let n = self.knots.len();
        if i == 0 || i == n - 1 {
            return self.end_tangent(i);
        }
        let (d0, d1, scale_in, _) = self.neighbourhood(i);
        let (t, b, c) = (self.tension, self.bias, self.continuity);
        let a = (1.0 - t) * (1.0 - c) * (1.0 + b) / 2.0;
        let z = (1.0 - t) * (1.0 + c) * (1.0 - b) / 2.0;
        (a * d0 + z * d1) * scale_in
    }

    /// Tangent leaving knot `i`.
    fn outgoing_tangent(&self, i: usize) -> f64 {
        let n = self.knots.len();
        if i == 0 || i == n - 1 {
            return self.end_tangent(i);
        }
        let (d0, d1, _, scale_out) = self.neighbourhood(i);
        let (t, b, c) = (self.tension, self.bias, self.continuity);
        let a = (1.0 - t) * (1.0 + c) * (1.0 + b) / 2.0;
        let z = (1.0 - t) * (1.0 - c) * (1.0 - b) / 2.0;
        (a * d0 + z * d1) * scale_out
    }

    /// Chord differences around interior knot `i` and the scale factors that
    /// correct for uneven knot spacing.
    fn neighbourhood(&self, i: usize) -> (f64, f64, f64, f64) {
        let (tp, pp) = self.knots[i - 1];
        let (tc, pc) = self.knots[i];
        let (tn, pn) = self.knots[i + 1];
        let n0 = tc - tp;
        let n1 = tn - tc;
        let span = n0 + n1;
        (pc - pp, pn - pc, 2.0 * n0 / span, 2.0 * n1 / span)
    }

    fn end_tangent(&self, i: usize) -> f64 {
        let n = self.knots.len();
        if i == 0 {
            self.knots[1].1 - self.knots[0].1
        } else {
            self.knots[n - 1].1 - self.knots[n - 2].1
        }
    }
}
