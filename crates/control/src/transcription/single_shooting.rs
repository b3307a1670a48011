//! Single shooting: states are substituted, not constrained.
//!
//! Column `k+1` of the state trajectory is replaced by the expression for one
//! integrator (or discrete) step from column `k`, so every state is a
//! composition of all earlier steps and the inputs alone are free. The first
//! column holds parameters that the caller fixes through the initial state.

use tether_core::VariableMatrix;

use crate::{Config, Dynamics, DynamicsType, Error};

use super::next_state;

pub(crate) fn transcribe<D: Dynamics>(
    x: &mut VariableMatrix,
    u: &VariableMatrix,
    dynamics: &D,
    dynamics_type: DynamicsType,
    config: &Config,
) -> Result<(), Error> {
    for k in 0..config.num_steps() {
        let next = next_state(
            dynamics,
            dynamics_type,
            config.time(k),
            &x.column(k),
            &u.column(k),
            config.dt(),
        )?;
        x.set_column(k + 1, &next);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use ndarray::Array2;
    use tether_core::Kind;
    use tether_solvers::transient::rk4;

    use crate::{FixedStepOcp, TranscriptionMethod};

    fn flywheel(
        _t: f64,
        x: &VariableMatrix,
        u: &VariableMatrix,
    ) -> Result<VariableMatrix, Infallible> {
        Ok(-x + u)
    }

    fn single_shooting(num_steps: usize) -> FixedStepOcp {
        let config = Config::new(1, 1, 0.05, num_steps).unwrap();
        FixedStepOcp::new(
            config,
            flywheel,
            DynamicsType::ExplicitOde,
            TranscriptionMethod::SingleShooting,
        )
        .unwrap()
    }

    #[test]
    fn states_are_expressions_of_inputs() {
        let ocp = single_shooting(4);

        assert_eq!(ocp.x().decision_count(), 0);
        assert_eq!(ocp.x().get(0, 0).kind(), Kind::Parameter);
        for k in 1..=4 {
            assert_eq!(ocp.x().get(0, k).kind(), Kind::Expression);
        }
        assert_eq!(ocp.problem().constraints().len(), 0);
    }

    #[test]
    fn evaluation_matches_forward_simulation_every_time() {
        let mut ocp = single_shooting(20);
        ocp.constrain_initial_state(&VariableMatrix::from_column(&[0.5]))
            .unwrap();

        let inputs: Vec<f64> = (0..=20_i32).map(|k| (f64::from(k) * 0.3).sin()).collect();
        ocp.u()
            .set_values(&Array2::from_shape_vec((1, 21), inputs.clone()).unwrap())
            .unwrap();

        let f = |_t: f64, x: &f64, u: &f64| Ok::<_, Infallible>(-x + u);
        let expected = rk4::propagate(f, 0.5, &inputs[..20], 0.0, 0.05).unwrap();

        let first = ocp.x().values();
        let second = ocp.x().values();
        assert_eq!(first, second);
        for (k, &x) in expected.iter().enumerate() {
            assert_relative_eq!(first[[0, k]], x, epsilon = 1e-12);
        }
    }

    #[test]
    fn long_horizons_do_not_overflow() {
        let ocp = single_shooting(5_000);

        ocp.u().set_values(&Array2::ones((1, 5_001))).unwrap();

        // Converges to the steady state u = 1.
        assert_relative_eq!(ocp.final_state().value(0, 0), 1.0, epsilon = 1e-9);
    }
}
