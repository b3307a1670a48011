use std::convert::Infallible;

use approx::assert_relative_eq;
use ndarray::array;
use thiserror::Error as ThisError;

use tether_core::{Problem, VariableMatrix};

use crate::{Config, DynamicsType, Error, FinalInput, FixedStepOcp, TranscriptionMethod};

const METHODS: [TranscriptionMethod; 3] = [
    TranscriptionMethod::DirectTranscription,
    TranscriptionMethod::DirectCollocation,
    TranscriptionMethod::SingleShooting,
];

/// Two-state oscillator with one input: ẋ = [x1, −x0 + u].
fn oscillator(
    _t: f64,
    x: &VariableMatrix,
    u: &VariableMatrix,
) -> Result<VariableMatrix, Infallible> {
    Ok(VariableMatrix::from_fn(2, 1, |i, _| match i {
        0 => x.get(1, 0).clone(),
        _ => -x.get(0, 0) + u.get(0, 0),
    }))
}

fn build(method: TranscriptionMethod, num_steps: usize) -> FixedStepOcp {
    let config = Config::new(2, 1, 0.1, num_steps).unwrap();
    FixedStepOcp::new(config, oscillator, DynamicsType::ExplicitOde, method).unwrap()
}

#[derive(Debug, ThisError)]
#[error("node limit reached")]
struct NodeLimit;

#[test]
fn trajectories_have_one_column_per_node() {
    for method in METHODS {
        for num_steps in [1, 2, 17] {
            let ocp = build(method, num_steps);

            assert_eq!(ocp.x().shape(), (2, num_steps + 1));
            assert_eq!(ocp.u().shape(), (1, num_steps + 1));
            assert_eq!(ocp.method(), method);
        }
    }
}

#[test]
fn decision_variable_counts_by_method() {
    let n = 10;
    for method in METHODS {
        let ocp = build(method, n);
        let inputs = n + 1;
        let states = if method.has_state_variables() {
            2 * (n + 1)
        } else {
            0
        };

        assert_eq!(ocp.u().decision_count(), inputs);
        assert_eq!(ocp.x().decision_count(), states);
        assert_eq!(ocp.problem().decision_variable_count(), inputs + states);
    }
}

#[test]
fn state_columns_are_independent_for_direct_methods() {
    let ocp = build(TranscriptionMethod::DirectTranscription, 3);

    ocp.x().get(0, 1).set_value(7.0).unwrap();

    assert_eq!(ocp.x().value(0, 1), 7.0);
    assert_eq!(ocp.x().value(0, 2), 0.0);
}

#[test]
fn collocation_with_discrete_dynamics_fails() {
    let config = Config::new(2, 1, 0.1, 5).unwrap();
    let result = FixedStepOcp::new(
        config,
        oscillator,
        DynamicsType::Discrete,
        TranscriptionMethod::DirectCollocation,
    );

    assert!(matches!(result, Err(Error::CollocationRequiresOde)));
}

#[test]
fn constrain_always_visits_every_node_in_order() {
    let mut ocp = build(TranscriptionMethod::DirectTranscription, 6);
    let expected: Vec<_> = (0..=6).map(|k| ocp.x().get(0, k).id()).collect();

    let mut visited = Vec::new();
    ocp.constrain_always(|_problem: &mut Problem, x: &VariableMatrix, u: &VariableMatrix| {
        assert_eq!(x.shape(), (2, 1));
        assert_eq!(u.shape(), (1, 1));
        visited.push(x.get(0, 0).id());
        Ok::<_, Infallible>(())
    })
    .unwrap();

    assert_eq!(visited, expected);
}

#[test]
fn constrain_always_registers_constraints() {
    let mut ocp = build(TranscriptionMethod::SingleShooting, 4);

    ocp.constrain_always(|problem: &mut Problem, x: &VariableMatrix, _u: &VariableMatrix| {
        problem.subject_to(x.leq(5.0));
        Ok::<_, Infallible>(())
    })
    .unwrap();

    assert_eq!(ocp.problem().inequality_count(), 2 * 5);
}

#[test]
fn constrain_always_stops_at_first_error() {
    let mut ocp = build(TranscriptionMethod::DirectTranscription, 6);

    let mut calls = 0;
    let result = ocp.constrain_always(|problem: &mut Problem, x: &VariableMatrix, _u: &VariableMatrix| {
        calls += 1;
        if calls == 3 {
            return Err(NodeLimit);
        }
        problem.subject_to(x.geq(-1.0));
        Ok(())
    });

    assert!(matches!(result, Err(Error::PathConstraint(_))));
    assert_eq!(calls, 3);
    assert_eq!(ocp.problem().inequality_count(), 2 * 2);
}

#[test]
fn boundary_constraints_follow_dynamics() {
    let mut ocp = build(TranscriptionMethod::DirectTranscription, 4);
    let dynamics = ocp.problem().constraints().len();

    ocp.constrain_initial_state(&VariableMatrix::from_column(&[1.0, 0.0]))
        .unwrap();
    ocp.constrain_final_state(&VariableMatrix::from_column(&[0.0, 0.0]))
        .unwrap();

    let constraints = ocp.problem().constraints();
    assert_eq!(dynamics, 2 * 4);
    assert_eq!(constraints.len(), dynamics + 4);
    assert!(constraints[dynamics].lhs().ptr_eq(ocp.x().get(0, 0)));
    assert!(constraints[dynamics + 2].lhs().ptr_eq(ocp.x().get(0, 4)));
}

#[test]
fn boundary_values_must_be_state_columns() {
    let mut ocp = build(TranscriptionMethod::DirectCollocation, 4);

    let result = ocp.constrain_final_state(&VariableMatrix::from_column(&[1.0]));

    assert!(matches!(
        result,
        Err(Error::BoundaryShape {
            expected: (2, 1),
            found: (1, 1)
        })
    ));
}

#[test]
fn single_shooting_substitutes_initial_state() {
    let mut ocp = build(TranscriptionMethod::SingleShooting, 3);

    ocp.constrain_initial_state(&VariableMatrix::from_column(&[1.0, -0.5]))
        .unwrap();

    assert_eq!(ocp.initial_state().values(), array![[1.0], [-0.5]]);
    // With u = 0, the first step moves x0 by roughly dt · x1.
    assert_relative_eq!(ocp.x().value(0, 1), 1.0 - 0.05, epsilon = 1e-2);
    for constraint in ocp.problem().constraints() {
        assert_eq!(constraint.residual().value(), 0.0);
    }
}

#[test]
fn single_shooting_rejects_symbolic_initial_state() {
    let mut ocp = build(TranscriptionMethod::SingleShooting, 3);
    let symbolic = ocp.problem_mut().decision_variable(2, 1);

    let result = ocp.constrain_initial_state(&symbolic);

    assert!(matches!(result, Err(Error::NonConstantInitialState)));
}

#[test]
fn hold_last_ties_final_input() {
    let config = Config::new(2, 1, 0.1, 5)
        .unwrap()
        .with_final_input(FinalInput::HoldLast);
    let ocp = FixedStepOcp::new(
        config,
        oscillator,
        DynamicsType::ExplicitOde,
        TranscriptionMethod::DirectTranscription,
    )
    .unwrap();

    let constraints = ocp.problem().constraints();
    let last = constraints.last().unwrap();
    assert_eq!(constraints.len(), 2 * 5 + 1);
    assert!(last.lhs().ptr_eq(ocp.u().get(0, 5)));
    assert!(last.rhs().ptr_eq(ocp.u().get(0, 4)));
}

#[test]
fn dynamics_errors_surface_unmodified() {
    #[derive(Debug, ThisError)]
    #[error("model diverged at t = {0}")]
    struct Diverged(f64);

    let failing = |t: f64, x: &VariableMatrix, _u: &VariableMatrix| {
        if t >= 0.2 {
            Err(Diverged(t))
        } else {
            Ok(x.clone())
        }
    };
    let config = Config::new(1, 1, 0.1, 5).unwrap();
    let result = FixedStepOcp::new(
        config,
        failing,
        DynamicsType::Discrete,
        TranscriptionMethod::DirectTranscription,
    );

    let Err(Error::Dynamics(source)) = result else {
        panic!("expected a dynamics error");
    };
    let diverged = source.downcast_ref::<Diverged>().unwrap();
    assert_relative_eq!(diverged.0, 0.2);
}

#[test]
fn dynamics_shape_is_checked() {
    let wrong = |_t: f64, _x: &VariableMatrix, u: &VariableMatrix| Ok::<_, Infallible>(u.clone());
    let config = Config::new(2, 1, 0.1, 5).unwrap();

    for method in METHODS {
        let result = FixedStepOcp::new(config, wrong, DynamicsType::ExplicitOde, method);

        assert!(matches!(
            result,
            Err(Error::DynamicsShape {
                expected: (2, 1),
                found: (1, 1)
            })
        ));
    }
}

#[test]
fn dynamics_see_node_times() {
    use std::cell::RefCell;

    let times = RefCell::new(Vec::new());
    let recording = |t: f64, x: &VariableMatrix, _u: &VariableMatrix| {
        times.borrow_mut().push(t);
        Ok::<_, Infallible>(x.clone())
    };
    let config = Config::new(1, 1, 0.25, 4).unwrap();

    FixedStepOcp::new(
        config,
        &recording,
        DynamicsType::Discrete,
        TranscriptionMethod::DirectTranscription,
    )
    .unwrap();

    assert_eq!(times.into_inner(), vec![0.0, 0.25, 0.5, 0.75]);
}
