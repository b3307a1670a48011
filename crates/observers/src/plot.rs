//! Plotting observer for visualizing solver progress and trajectories.
//!
//! See [`PlotObserver`] and [`Plottable`] for usage.

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use tether_core::{Observer, VariableMatrix};
use tether_solvers::optimization::augmented_lagrangian;

/// Configuration for rendering a [`PlotObserver`] result.
///
/// Construct with [`ShowConfig::new`] and chain builder methods as needed.
/// All fields are independent with sensible defaults.
///
/// # Example
///
/// ```ignore
/// obs.show(ShowConfig::new().title("Convergence").legend().log_y())?;
/// ```
pub struct ShowConfig {
    title: Option<String>,
    legend: bool,
    log_y: bool,
}

impl ShowConfig {
    /// Creates a new `ShowConfig` with defaults: no title, no legend, linear scale.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            legend: false,
            log_y: false,
        }
    }

    /// Sets the window title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Enables a legend labeling each trace by name.
    #[must_use]
    pub fn legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Enables a logarithmic y-axis (base 10).
    ///
    /// y values are transformed with log₁₀ before plotting. Non-positive
    /// values are silently skipped.
    #[must_use]
    pub fn log_y(mut self) -> Self {
        self.log_y = true;
        self
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts plottable data from a solver event.
///
/// Implement this on an event type to use [`PlotObserver`] directly as a
/// solver observer. Return `None` from [`x`][Plottable::x] to skip the event
/// entirely; return `None` in a trace slot to skip that trace for the event.
///
/// [`augmented_lagrangian::Event`] implements `Plottable<3>`, plotting the
/// objective, infeasibility, and stationarity against the inner iteration
/// count.
///
/// # Example
///
/// ```ignore
/// let mut obs = PlotObserver::<3>::new(["Objective", "Infeasibility", "Stationarity"]);
/// ocp.solve_observed(&config, &mut obs)?;
/// obs.show(ShowConfig::new().title("Convergence").legend().log_y())?;
/// ```
pub trait Plottable<const N: usize> {
    /// The x-axis value for this event, or `None` to skip recording entirely.
    fn x(&self) -> Option<f64>;

    /// The y-axis values for each trace.
    ///
    /// `None` in a slot skips that trace for this event while leaving others
    /// unaffected.
    fn traces(&self) -> [Option<f64>; N];
}

impl Plottable<3> for augmented_lagrangian::Event {
    #[allow(clippy::cast_precision_loss)]
    fn x(&self) -> Option<f64> {
        Some(self.iters as f64)
    }

    fn traces(&self) -> [Option<f64>; 3] {
        [
            Some(self.objective),
            Some(self.infeasibility),
            Some(self.stationarity),
        ]
    }
}

/// An observer that collects trace data and displays it via egui.
///
/// The const generic `N` is the number of traces. Create with
/// [`PlotObserver::new`], passing the trace names. Record data by either:
///
/// - **Observer path**: pass `&mut PlotObserver` as the solver observer when
///   the event type implements [`Plottable<N>`][Plottable].
/// - **Manual path**: call [`record`][PlotObserver::record] from a closure
///   observer, or [`record_trajectory`][PlotObserver::record_trajectory]
///   after a solve to plot optimized states and inputs over time.
///
/// Call [`show`][PlotObserver::show] with a [`ShowConfig`] to render the result.
///
/// # Example
///
/// ```ignore
/// ocp.solve(&config)?;
///
/// let mut obs = PlotObserver::<2>::new(["Velocity", "Voltage"]);
/// obs.record_trajectory(0, ocp.x(), 0, dt);
/// obs.record_trajectory(1, ocp.u(), 0, dt);
/// obs.show(ShowConfig::new().title("Flywheel").legend())?;
/// ```
pub struct PlotObserver<const N: usize> {
    names: [String; N],
    data: [Vec<[f64; 2]>; N],
}

impl<const N: usize> PlotObserver<N> {
    /// Creates a new `PlotObserver` with the given trace names.
    pub fn new(names: [&str; N]) -> Self {
        Self {
            names: names.map(str::to_owned),
            data: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Records a single data point across all traces.
    ///
    /// For each trace slot, `None` skips recording for that trace while
    /// leaving other traces unaffected.
    pub fn record(&mut self, x: f64, traces: [Option<f64>; N]) {
        for (i, y) in traces.into_iter().enumerate() {
            if let Some(y) = y {
                self.data[i].push([x, y]);
            }
        }
    }

    /// Records row `row` of a trajectory into trace `trace`.
    ///
    /// Column `k` is plotted at time `k · dt` using its current value.
    ///
    /// # Panics
    ///
    /// Panics if `trace >= N` or `row` is out of range.
    pub fn record_trajectory(
        &mut self,
        trace: usize,
        trajectory: &VariableMatrix,
        row: usize,
        dt: f64,
    ) {
        let values = trajectory.values();
        for (k, &value) in values.row(row).iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let t = k as f64 * dt;
            self.data[trace].push([t, value]);
        }
    }

    /// Opens a blocking egui window displaying all collected traces.
    ///
    /// Blocks until the window is closed by the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the native window cannot be created.
    pub fn show(self, config: ShowConfig) -> Result<(), eframe::Error> {
        let options = eframe::NativeOptions::default();
        let title = config.title.unwrap_or_default();
        let traces: Vec<(String, Vec<[f64; 2]>)> = self.names.into_iter().zip(self.data).collect();

        eframe::run_native(
            &title,
            options,
            Box::new(move |_cc| {
                Ok(Box::new(PlotApp {
                    traces,
                    legend: config.legend,
                    log_y: config.log_y,
                }))
            }),
        )
    }
}

impl<const N: usize, E, A> Observer<E, A> for PlotObserver<N>
where
    E: Plottable<N>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        if let Some(x) = event.x() {
            self.record(x, event.traces());
        }
        None
    }
}

/// Allows `&mut PlotObserver<N>` to be passed to solvers that take an observer
/// by value, so [`PlotObserver::show`] can be called after the solve completes.
impl<const N: usize, E, A> Observer<E, A> for &mut PlotObserver<N>
where
    E: Plottable<N>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        (*self).observe(event)
    }
}

/// The egui [`eframe::App`] that renders collected traces.
struct PlotApp {
    traces: Vec<(String, Vec<[f64; 2]>)>,
    legend: bool,
    log_y: bool,
}

impl eframe::App for PlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut plot = Plot::new("plot_observer");
            if self.legend {
                plot = plot.legend(Legend::default());
            }
            if self.log_y {
                plot = plot.y_axis_label("log₁₀");
            }
            let log_y = self.log_y;
            plot.show(ui, |plot_ui| {
                for (name, points) in &self.traces {
                    let plot_points: PlotPoints = if log_y {
                        points
                            .iter()
                            .filter(|p| p[1] > 0.0)
                            .map(|p| [p[0], p[1].log10()])
                            .collect()
                    } else {
                        points.iter().copied().collect()
                    };
                    plot_ui.line(Line::new(plot_points).name(name));
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tether_core::Variable;
    use tether_solvers::optimization::augmented_lagrangian::{Action, Event};

    fn event(iters: usize, infeasibility: f64) -> Event {
        Event {
            outer_iter: 1,
            iters,
            objective: 4.0,
            infeasibility,
            stationarity: 1e-3,
            penalty: 10.0,
        }
    }

    fn feed(obs: &mut PlotObserver<3>, event: &Event) -> Option<Action> {
        obs.observe(event)
    }

    #[test]
    fn solver_events_record_all_traces() {
        let mut obs = PlotObserver::new(["objective", "infeasibility", "stationarity"]);

        feed(&mut obs, &event(12, 0.5));
        feed(&mut obs, &event(30, 0.01));

        assert_eq!(obs.data[0], [[12.0, 4.0], [30.0, 4.0]]);
        assert_eq!(obs.data[1], [[12.0, 0.5], [30.0, 0.01]]);
        assert_eq!(obs.data[2], [[12.0, 1e-3], [30.0, 1e-3]]);
    }

    #[test]
    fn never_returns_an_action() {
        let mut obs = PlotObserver::new(["a", "b", "c"]);
        assert!(feed(&mut obs, &event(1, 1.0)).is_none());
    }

    #[test]
    fn record_skips_missing_slots() {
        let mut obs: PlotObserver<2> = PlotObserver::new(["a", "b"]);
        obs.record(1.0, [Some(10.0), None]);
        obs.record(2.0, [None, Some(20.0)]);
        assert_eq!(obs.data[0], [[1.0, 10.0]]);
        assert_eq!(obs.data[1], [[2.0, 20.0]]);
    }

    #[test]
    fn trajectory_rows_are_plotted_against_time() {
        #[allow(clippy::cast_precision_loss)]
        let trajectory = VariableMatrix::from_fn(2, 3, |i, j| {
            let sign = if i == 0 { 1.0 } else { -1.0 };
            Variable::constant(sign * (j + 1) as f64)
        });
        let mut obs: PlotObserver<1> = PlotObserver::new(["second row"]);

        obs.record_trajectory(0, &trajectory, 1, 0.5);

        assert_eq!(obs.data[0], [[0.0, -1.0], [0.5, -2.0], [1.0, -3.0]]);
    }
}
