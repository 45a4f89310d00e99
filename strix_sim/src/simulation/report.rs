// strix_sim/src/simulation/report.rs

use std::fmt;

use strix_core::prelude::*;

/// How well one agent's filter tracked its ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReport {
    pub name: String,
    pub steps: usize,
    pub updates: usize,
    pub skipped_updates: usize,
    /// Root-mean-square planar distance between estimate and truth, over all steps.
    pub position_rmse: f64,
    /// `|θ̂ - θ|` wrapped into `[0, π]`, at the last step.
    pub final_heading_error: f64,
    /// Mean normalized innovation squared over accepted updates.
    pub mean_nis: Option<f64>,
}

/// Running sums for an [`AgentReport`].
#[derive(Debug, Default)]
pub struct ErrorAccumulator {
    steps: usize,
    updates: usize,
    skipped_updates: usize,
    squared_position_error: f64,
    last_heading_error: f64,
    nis_sum: f64,
}

impl ErrorAccumulator {
    pub fn record_step(&mut self, truth: &State, estimate: &State) {
        let dx = estimate[0] - truth[0];
        let dy = estimate[1] - truth[1];
        self.squared_position_error += dx * dx + dy * dy;
        self.last_heading_error = normalize_angle(estimate[2] - truth[2]).abs();
        self.steps += 1;
    }

    pub fn record_update(&mut self, nis: f64) {
        self.updates += 1;
        self.nis_sum += nis;
    }

    pub fn record_skipped_update(&mut self) {
        self.skipped_updates += 1;
    }

    pub fn finish(self, name: impl Into<String>) -> AgentReport {
        let position_rmse = if self.steps == 0 {
            0.0
        } else {
            (self.squared_position_error / self.steps as f64).sqrt()
        };
        AgentReport {
            name: name.into(),
            steps: self.steps,
            updates: self.updates,
            skipped_updates: self.skipped_updates,
            position_rmse,
            final_heading_error: self.last_heading_error,
            mean_nis: (self.updates > 0).then(|| self.nis_sum / self.updates as f64),
        }
    }
}

impl fmt::Display for AgentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nis = match self.mean_nis {
            Some(nis) => format!("{nis:.3}"),
            None => "-".to_string(),
        };
        write!(
            f,
            "{:<16} {:>7} {:>8} {:>8} {:>10.4} {:>12.4} {:>9}",
            self.name,
            self.steps,
            self.updates,
            self.skipped_updates,
            self.position_rmse,
            self.final_heading_error,
            nis
        )
    }
}

/// Formats the per-agent reports as a fixed-width table.
pub fn render_table(reports: &[AgentReport]) -> String {
    let mut out = format!(
        "{:<16} {:>7} {:>8} {:>8} {:>10} {:>12} {:>9}\n",
        "agent", "steps", "updates", "skipped", "rmse [m]", "heading [rad]", "mean NIS"
    );
    for report in reports {
        out.push_str(&report.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::DVector;
    use std::f64::consts::PI;

    fn pose(x: f64, y: f64, theta: f64) -> State {
        DVector::from_vec(vec![x, y, theta])
    }

    #[test]
    fn test_rmse_and_heading() {
        let mut acc = ErrorAccumulator::default();
        acc.record_step(&pose(0.0, 0.0, 0.0), &pose(3.0, 4.0, 0.0));
        acc.record_step(&pose(0.0, 0.0, PI - 0.05), &pose(0.0, 0.0, -PI + 0.05));
        let report = acc.finish("rover");

        // sqrt((25 + 0) / 2)
        assert_abs_diff_eq!(report.position_rmse, 12.5_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(report.final_heading_error, 0.1, epsilon = 1e-12);
        assert_eq!(report.steps, 2);
        assert_eq!(report.mean_nis, None);
    }

    #[test]
    fn test_mean_nis_over_accepted_updates() {
        let mut acc = ErrorAccumulator::default();
        acc.record_update(1.0);
        acc.record_update(3.0);
        acc.record_skipped_update();
        let report = acc.finish("rover");
        assert_eq!(report.updates, 2);
        assert_eq!(report.skipped_updates, 1);
        assert_eq!(report.mean_nis, Some(2.0));
    }

    #[test]
    fn test_table_has_one_row_per_agent() {
        let reports = vec![
            ErrorAccumulator::default().finish("a"),
            ErrorAccumulator::default().finish("b"),
        ];
        let table = render_table(&reports);
        assert_eq!(table.lines().count(), 3);
        assert!(table.lines().nth(2).unwrap().starts_with('b'));
    }
}
