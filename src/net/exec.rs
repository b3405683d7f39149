//! Execution driver with an injectable random source.
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::net::core::{DEFAULT_MAX_STEPS, Net};
use crate::net::ids::TransitionId;
use crate::net::structure::Marking;

/// Why an execution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No transition is enabled under the final marking.
    Converged,
    /// The step budget ran out while transitions were still enabled.
    StepLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    marking: Marking,
    fired: Vec<TransitionId>,
    outcome: Outcome,
}

impl Execution {
    pub(crate) fn new(marking: Marking, fired: Vec<TransitionId>, outcome: Outcome) -> Self {
        Self {
            marking,
            fired,
            outcome,
        }
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn into_marking(self) -> Marking {
        self.marking
    }

    /// Transitions in firing order.
    pub fn fired(&self) -> &[TransitionId] {
        &self.fired
    }

    pub fn steps(&self) -> usize {
        self.fired.len()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_converged(&self) -> bool {
        self.outcome == Outcome::Converged
    }
}

/// Invoked with the step index, the transition that fired and the marking it produced.
pub type StepObserver = dyn Fn(usize, TransitionId, &Marking) + Send + Sync;

#[derive(Clone)]
pub struct ExecutionOptions {
    pub max_steps: usize,
    /// Seed for the internal RNG; `None` draws one from the OS.
    pub seed: Option<u64>,
    pub observer: Option<Arc<StepObserver>>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            seed: None,
            observer: None,
        }
    }
}

impl std::fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("max_steps", &self.max_steps)
            .field("seed", &self.seed)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Runs nets to convergence while owning the random source that resolves
/// conflicts between enabled transitions.
///
/// Consecutive runs continue the same random stream, so an executor built
/// from a fixed seed replays the same sequence of runs.
pub struct Executor<R = StdRng> {
    options: ExecutionOptions,
    rng: R,
}

impl Executor<StdRng> {
    pub fn new(options: ExecutionOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { options, rng }
    }
}

impl<R> Executor<R>
where
    R: Rng,
{
    /// `options.seed` is ignored; `rng` is used as given.
    pub fn with_rng(options: ExecutionOptions, rng: R) -> Self {
        Self { options, rng }
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn run(&mut self, net: &Net, marking: &Marking) -> Execution {
        let observer = self.options.observer.clone();
        net.execute_with(
            marking,
            self.options.max_steps,
            &mut self.rng,
            |step, transition, next| {
                if let Some(observer) = &observer {
                    observer(step, transition, next);
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn fork() -> (Net, Marking) {
        let mut net = Net::empty();
        let start = net.place();
        let a = net.place();
        let b = net.place();
        let ta = net.transition();
        let tb = net.transition();
        let back_a = net.transition();
        let back_b = net.transition();
        net.arc(start, ta).unwrap();
        net.arc(ta, a).unwrap();
        net.arc(start, tb).unwrap();
        net.arc(tb, b).unwrap();
        net.arc(a, back_a).unwrap();
        net.arc(back_a, start).unwrap();
        net.arc(b, back_b).unwrap();
        net.arc(back_b, start).unwrap();
        (net, Marking::from_places([start]))
    }

    #[test]
    fn same_seed_replays_the_same_trace() {
        let (net, marking) = fork();
        let options = ExecutionOptions {
            max_steps: 50,
            seed: Some(42),
            ..Default::default()
        };

        let first = Executor::new(options.clone()).run(&net, &marking);
        let second = Executor::new(options).run(&net, &marking);
        assert_eq!(first, second);
        assert_eq!(first.steps(), 50);
        assert_eq!(first.outcome(), Outcome::StepLimitReached);
    }

    #[test]
    fn injected_rng_is_used() {
        let (net, marking) = fork();
        let options = ExecutionOptions {
            max_steps: 20,
            ..Default::default()
        };
        let mut left = Executor::with_rng(options.clone(), StdRng::seed_from_u64(3));
        let mut right = Executor::with_rng(options, StdRng::seed_from_u64(3));
        assert_eq!(left.run(&net, &marking), right.run(&net, &marking));
    }

    #[test]
    fn observer_sees_every_step() {
        let (net, marking) = fork();
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let options = ExecutionOptions {
            max_steps: 10,
            seed: Some(9),
            observer: Some(Arc::new(move |step: usize, transition: TransitionId, _: &Marking| {
                sink.lock().unwrap().push((step, transition));
            })),
        };

        let execution = Executor::new(options).run(&net, &marking);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        assert_eq!(
            seen.iter().map(|(_, t)| *t).collect::<Vec<_>>(),
            execution.fired()
        );
        assert!(seen.iter().enumerate().all(|(i, (step, _))| i == *step));
    }

    #[test]
    fn observer_does_not_change_the_trace() {
        let (net, marking) = fork();
        let plain = ExecutionOptions {
            max_steps: 30,
            seed: Some(5),
            observer: None,
        };
        let observed = ExecutionOptions {
            observer: Some(Arc::new(|_: usize, _: TransitionId, _: &Marking| {})),
            ..plain.clone()
        };
        assert_eq!(
            Executor::new(plain).run(&net, &marking),
            Executor::new(observed).run(&net, &marking)
        );
    }
}
