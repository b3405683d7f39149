//! # Boolean-token Petri nets
//!
//! A net has places `P` and transitions `T`. Every transition `t` has an input
//! set `•t ⊆ P` and an output set `t• ⊆ P`. A marking `M ⊆ P` is the set of
//! places holding a token; a place holds at most one.
//!
//! * `t` is **enabled** under `M` iff `•t ⊆ M`. A transition with `•t = ∅`
//!   is a source and is enabled under every marking.
//! * **Firing** an enabled `t` yields `M' = (M \ •t) ∪ t•`. Places in both
//!   `•t` and `t•` keep their token.
//!
//! Markings are persistent values; [`Net::fire`] and [`Net::execute`] hand
//! back new markings and never touch their input. Conflicts between several
//! enabled transitions are resolved uniformly at random through an RNG the
//! caller supplies, which makes runs reproducible under a fixed seed.
//!
//! ## Example
//!
//! ```rust
//! use procy::net::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut net = Net::empty();
//! let p0 = net.place();
//! let p1 = net.place();
//! let t0 = net.transition();
//!
//! net.arc(p0, t0).unwrap();
//! net.arc(t0, p1).unwrap();
//!
//! let marking = Marking::from_places([p0]);
//! assert_eq!(net.enabled_transitions(&marking), vec![t0]);
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let execution = net.execute(&marking, &mut rng);
//! assert_eq!(execution.marking(), &Marking::from_places([p1]));
//! assert_eq!(execution.outcome(), Outcome::Converged);
//! ```

pub mod core;
pub mod exec;
pub mod ids;
pub mod index_vec;
pub mod structure;

pub use self::core::{DEFAULT_MAX_STEPS, DiagnosticReport, FireError, Net, NetError};
pub use exec::{Execution, ExecutionOptions, Executor, Outcome, StepObserver};
pub use ids::{NetId, PlaceId, TransitionId};
pub use index_vec::{Idx, IndexVec};
pub use structure::{Arc, ArcDirection, Marking, Place, Transition};
