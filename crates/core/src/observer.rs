/// Receives events from a solver and optionally returns an action.
///
/// Solvers call [`observe`](Observer::observe) at well-defined points in
/// their algorithm. Returning `None` lets the solver continue unchanged;
/// returning `Some(action)` asks the solver to react (for example, to stop
/// early). Which actions are available is defined by each solver.
///
/// Closures of the form `FnMut(&E) -> Option<A>` are observers, and `()` is
/// an observer that never acts.
pub trait Observer<E, A> {
    /// Observes an event and optionally returns an action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Action {
        Stop,
    }

    fn drive<O: Observer<usize, Action>>(mut observer: O, events: usize) -> Option<usize> {
        (0..events).find(|event| observer.observe(event).is_some())
    }

    #[test]
    fn unit_observer_never_acts() {
        assert_eq!(drive((), 10), None);
    }

    #[test]
    fn closure_observer_can_act() {
        let stop_at_three = |event: &usize| (*event == 3).then_some(Action::Stop);
        assert_eq!(drive(stop_at_three, 10), Some(3));
    }
}
