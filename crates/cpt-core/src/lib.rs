//! # cpt-core: Capacity Planning Core
//!
//! Data structures shared by every part of the capacity planning toolkit:
//! the immutable [`ProblemInstance`] describing a two-stage stochastic
//! provisioning problem, typed entity IDs, diagnostics, instance I/O, and a
//! solver-agnostic linear model layer ([`solver`]) that optimization engines
//! plug into.
//!
//! ## The planning problem
//!
//! Users request virtual machines of several types. Capacity is bought in two
//! stages:
//!
//! - **First stage** (before demand is known): integer VM reservations per
//!   (user, VM type, provider) and continuous router bandwidth reservations
//!   per (user, router).
//! - **Second stage** (per scenario): reserved capacity is utilized, missing
//!   capacity is bought on demand, and VM traffic is routed from providers
//!   through routers to the users over a directed network.
//!
//! ## ID System
//!
//! Every entity is addressed by a newtype wrapper around its position in the
//! instance tables:
//! [`UserId`], [`VmTypeId`], [`ProviderId`], [`RouterId`], [`ArcId`],
//! [`ScenarioId`]. IDs prevent mixing up indices of different entity kinds
//! and are `Ord` so that maps keyed by them iterate deterministically.
//!
//! ## Quick Start
//!
//! ```rust
//! use cpt_core::*;
//!
//! let instance = ProblemInstanceBuilder::new()
//!     .user("alice")
//!     .vm_type(VmType::new("small", 6.0).with_resources(1.0, 0.0, 0.0, 1.0))
//!     .provider(Provider::new("aws").with_cpu_capacity(10.0))
//!     .router(Router::new("edge", 1.0).with_bandwidth_capacity(10.0))
//!     .arc(NetworkNode::Provider(ProviderId::new(0)), NetworkNode::Router(RouterId::new(0)))
//!     .arc(NetworkNode::Router(RouterId::new(0)), NetworkNode::User(UserId::new(0)))
//!     .scenario(
//!         Scenario::new("low", 0.5)
//!             .with_vm_costs(vec![UnitCosts::new(1.0, 10.0)])
//!             .with_router_costs(vec![UnitCosts::new(0.0, 1.5)])
//!             .with_demand(vec![vec![2.0]]),
//!     )
//!     .build()
//!     .expect("consistent instance");
//!
//! assert_eq!(instance.num_scenarios(), 1);
//! ```

use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod instance;
pub mod io;
pub mod solver;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{CptError, CptResult};
pub use instance::{
    finite_capacity, NetworkArc, NetworkNode, ProblemInstance, ProblemInstanceBuilder, Provider,
    Router, Scenario, UnitCosts, User, VmType,
};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                $name(value)
            }
            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }
    };
}

entity_id!(
    /// Position of a user in [`ProblemInstance::users`]
    UserId,
    "user"
);
entity_id!(
    /// Position of a VM type in [`ProblemInstance::vm_types`]
    VmTypeId,
    "vm type"
);
entity_id!(
    /// Position of a provider in [`ProblemInstance::providers`]
    ProviderId,
    "provider"
);
entity_id!(
    /// Position of a router in [`ProblemInstance::routers`]
    RouterId,
    "router"
);
entity_id!(
    /// Position of an arc in [`ProblemInstance::arcs`]
    ArcId,
    "arc"
);
entity_id!(
    /// Position of a scenario in [`ProblemInstance::scenarios`]
    ScenarioId,
    "scenario"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_and_display() {
        let p = ProviderId::new(3);
        assert_eq!(p.value(), 3);
        assert_eq!(p.to_string(), "provider 3");
        assert_eq!(ScenarioId::new(1).to_string(), "scenario 1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&RouterId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: RouterId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RouterId::new(7));
    }

    #[test]
    fn ids_order_by_position() {
        let mut ids = vec![UserId::new(2), UserId::new(0), UserId::new(1)];
        ids.sort();
        assert_eq!(ids, vec![UserId::new(0), UserId::new(1), UserId::new(2)]);
    }
}
