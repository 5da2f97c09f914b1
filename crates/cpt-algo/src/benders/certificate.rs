//! Dual certificates of scenario subproblems and the cuts built from them.
//!
//! For a fixed scenario `s` the recourse cost `Q_s(x, y)` is the optimal
//! value of an LP in which the first stage only appears in right-hand sides.
//! With row duals `π` taken as `∂Q_s/∂rhs`:
//!
//! ```text
//! Q_s(x̂, ŷ) = Σ π_vm·x̂ + Σ π_router·ŷ + Σ π_cap·capacity + Σ π_demand·demand[s]
//! Q_s(x, y) ≥ Σ π_vm·x  + Σ π_router·y  + Σ π_cap·capacity + Σ π_demand·demand[s]
//! ```
//!
//! The first line is the strong-duality check, the second the optimality cut.
//! Rows of the network family have zero right-hand side and drop out; rows of
//! unbounded capacities do not exist and contribute nothing.

use std::collections::BTreeMap;

use cpt_core::{
    finite_capacity, ProblemInstance, ProviderId, RouterId, ScenarioId, UserId, VmTypeId,
};

use super::first_stage::FirstStageDecision;
use super::keys::SubproblemRow;

/// Dual prices of one subproblem solve, partitioned by constraint family
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DualCertificate {
    pub vm_utilization: BTreeMap<(UserId, VmTypeId, ProviderId), f64>,
    pub router_utilization: BTreeMap<(UserId, RouterId), f64>,
    pub cpu_capacity: BTreeMap<ProviderId, f64>,
    pub storage_capacity: BTreeMap<ProviderId, f64>,
    pub memory_capacity: BTreeMap<ProviderId, f64>,
    pub bandwidth_capacity: BTreeMap<RouterId, f64>,
    pub vm_demand: BTreeMap<(UserId, VmTypeId), f64>,
}

impl DualCertificate {
    pub fn new() -> Self {
        Self::default()
    }

    /// File the dual of a subproblem row under its family
    pub fn record(&mut self, row: SubproblemRow, dual: f64) {
        match row {
            SubproblemRow::VmUtilizationBound { user, vm, provider } => {
                self.vm_utilization.insert((user, vm, provider), dual);
            }
            SubproblemRow::RouterUtilizationBound { user, router } => {
                self.router_utilization.insert((user, router), dual);
            }
            SubproblemRow::CpuCapacity(p) => {
                self.cpu_capacity.insert(p, dual);
            }
            SubproblemRow::StorageCapacity(p) => {
                self.storage_capacity.insert(p, dual);
            }
            SubproblemRow::MemoryCapacity(p) => {
                self.memory_capacity.insert(p, dual);
            }
            SubproblemRow::BandwidthCapacity(r) => {
                self.bandwidth_capacity.insert(r, dual);
            }
            SubproblemRow::VmDemand { user, vm } => {
                self.vm_demand.insert((user, vm), dual);
            }
            SubproblemRow::RouterBalance { .. }
            | SubproblemRow::RouterUsage { .. }
            | SubproblemRow::ProviderEgress { .. }
            | SubproblemRow::UserBalance(_) => {}
        }
    }

    /// Part of the dual objective that does not depend on the first stage
    pub fn constant_term(&self, instance: &ProblemInstance, scenario: ScenarioId) -> f64 {
        let priced =
            |price: f64, capacity: f64| finite_capacity(capacity).map_or(0.0, |c| price * c);

        let provider_terms: f64 = instance
            .provider_ids()
            .map(|p| {
                let provider = instance.provider(p);
                let price =
                    |family: &BTreeMap<ProviderId, f64>| family.get(&p).copied().unwrap_or(0.0);
                priced(price(&self.cpu_capacity), provider.cpu_capacity)
                    + priced(price(&self.storage_capacity), provider.storage_capacity)
                    + priced(price(&self.memory_capacity), provider.memory_capacity)
            })
            .sum();

        let router_terms: f64 = instance
            .router_ids()
            .map(|r| {
                let price = self.bandwidth_capacity.get(&r).copied().unwrap_or(0.0);
                priced(price, instance.router(r).bandwidth_capacity)
            })
            .sum();

        let demand_terms: f64 = self
            .vm_demand
            .iter()
            .map(|(&(u, v), &price)| price * instance.demand(scenario, u, v))
            .sum();

        provider_terms + router_terms + demand_terms
    }

    /// Dual objective at a fixed first stage
    pub fn dual_objective(
        &self,
        instance: &ProblemInstance,
        scenario: ScenarioId,
        first_stage: &FirstStageDecision,
    ) -> f64 {
        let vm_terms: f64 = self
            .vm_utilization
            .iter()
            .map(|(&(u, v, p), &price)| price * first_stage.vm(u, v, p))
            .sum();
        let router_terms: f64 = self
            .router_utilization
            .iter()
            .map(|(&(u, r), &price)| price * first_stage.router(u, r))
            .sum();
        vm_terms + router_terms + self.constant_term(instance, scenario)
    }

    /// `η_s >= Σ π_vm·xr + Σ π_router·yr + constant`
    pub fn optimality_cut(&self, instance: &ProblemInstance, scenario: ScenarioId) -> BendersCut {
        BendersCut {
            scenario,
            vm_coefficients: self.vm_utilization.clone(),
            router_coefficients: self.router_utilization.clone(),
            constant: self.constant_term(instance, scenario),
        }
    }
}

/// Optimality cut `η_s >= Σ coef·x + constant`
#[derive(Debug, Clone, PartialEq)]
pub struct BendersCut {
    pub scenario: ScenarioId,
    pub vm_coefficients: BTreeMap<(UserId, VmTypeId, ProviderId), f64>,
    pub router_coefficients: BTreeMap<(UserId, RouterId), f64>,
    pub constant: f64,
}

impl BendersCut {
    /// Right-hand side of the cut at a first-stage decision
    pub fn height(&self, first_stage: &FirstStageDecision) -> f64 {
        let vm: f64 = self
            .vm_coefficients
            .iter()
            .map(|(&(u, v, p), &coef)| coef * first_stage.vm(u, v, p))
            .sum();
        let router: f64 = self
            .router_coefficients
            .iter()
            .map(|(&(u, r), &coef)| coef * first_stage.router(u, r))
            .sum();
        vm + router + self.constant
    }

    /// Whether `eta` lies below the cut by more than `tolerance`
    pub fn is_violated_by(
        &self,
        first_stage: &FirstStageDecision,
        eta: f64,
        tolerance: f64,
    ) -> bool {
        eta < self.height(first_stage) - tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{two_scenario_instance, unbounded_capacity_instance};

    fn decision(x: f64, y: f64) -> FirstStageDecision {
        let u = UserId::new(0);
        let mut decision = FirstStageDecision::default();
        decision
            .vm_reservations
            .insert((u, VmTypeId::new(0), ProviderId::new(0)), x);
        decision.router_reservations.insert((u, RouterId::new(0)), y);
        decision
    }

    /// Duals of the high-demand scenario of the two-scenario fixture at
    /// x = 2, y = 2: a reserved VM saves 9, reserved bandwidth saves 1.5, one
    /// more unit of demand costs 10 + 1.5.
    fn high_scenario_certificate() -> DualCertificate {
        let u = UserId::new(0);
        let mut cert = DualCertificate::new();
        cert.record(
            SubproblemRow::VmUtilizationBound {
                user: u,
                vm: VmTypeId::new(0),
                provider: ProviderId::new(0),
            },
            -9.0,
        );
        cert.record(
            SubproblemRow::RouterUtilizationBound {
                user: u,
                router: RouterId::new(0),
            },
            -1.5,
        );
        cert.record(SubproblemRow::CpuCapacity(ProviderId::new(0)), 0.0);
        cert.record(SubproblemRow::BandwidthCapacity(RouterId::new(0)), 0.0);
        cert.record(
            SubproblemRow::VmDemand {
                user: u,
                vm: VmTypeId::new(0),
            },
            11.5,
        );
        cert.record(SubproblemRow::UserBalance(u), 3.0);
        cert
    }

    #[test]
    fn dual_objective_matches_hand_computed_recourse() {
        let instance = two_scenario_instance();
        let cert = high_scenario_certificate();
        let high = ScenarioId::new(1);
        // 4·11.5 − 9·2 − 1.5·2 = 25
        assert!((cert.dual_objective(&instance, high, &decision(2.0, 2.0)) - 25.0).abs() < 1e-9);
        assert!((cert.constant_term(&instance, high) - 46.0).abs() < 1e-9);
    }

    #[test]
    fn cut_is_tight_at_inducing_first_stage() {
        let instance = two_scenario_instance();
        let cert = high_scenario_certificate();
        let high = ScenarioId::new(1);
        let inducing = decision(2.0, 2.0);
        let cut = cert.optimality_cut(&instance, high);

        let primal = 25.0;
        assert!((cut.height(&inducing) - primal).abs() < 1e-9);
        assert!(!cut.is_violated_by(&inducing, primal, 1e-4));
        assert!(cut.is_violated_by(&inducing, primal - 1.0, 1e-4));
        // Reserving more lowers the bound
        assert!(cut.height(&decision(3.0, 2.0)) < cut.height(&inducing));
    }

    #[test]
    fn unbounded_capacity_contributes_nothing() {
        let instance = unbounded_capacity_instance();
        let mut cert = DualCertificate::new();
        // A price on an unbounded resource, whatever its sign, must not leak
        // into the constant.
        cert.record(SubproblemRow::CpuCapacity(ProviderId::new(0)), -7.0);
        cert.record(SubproblemRow::BandwidthCapacity(RouterId::new(0)), 3.0);
        assert_eq!(cert.constant_term(&instance, ScenarioId::new(0)), 0.0);

        let cut = cert.optimality_cut(&instance, ScenarioId::new(0));
        assert_eq!(cut.constant, 0.0);
        assert_eq!(cut.height(&decision(5.0, 5.0)), 0.0);
    }

    #[test]
    fn finite_capacity_prices_are_counted() {
        let instance = two_scenario_instance();
        let mut cert = DualCertificate::new();
        cert.record(SubproblemRow::CpuCapacity(ProviderId::new(0)), -0.5);
        // 10 CPU at −0.5
        assert_eq!(cert.constant_term(&instance, ScenarioId::new(0)), -5.0);
    }

    #[test]
    fn flow_rows_are_not_recorded() {
        let mut cert = DualCertificate::new();
        cert.record(
            SubproblemRow::RouterBalance {
                user: UserId::new(0),
                router: RouterId::new(0),
            },
            4.0,
        );
        assert_eq!(cert, DualCertificate::new());
    }
}
