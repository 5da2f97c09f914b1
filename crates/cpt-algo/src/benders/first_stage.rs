//! First-stage (reservation) decisions and their model variables.

use std::collections::BTreeMap;

use cpt_core::solver::{LinearExpr, LinearModel, LpSolution, RowKey, VarId, VarKind};
use cpt_core::{ProblemInstance, ProviderId, RouterId, UserId, VmTypeId};
use serde::{Deserialize, Serialize};

/// Reservation variables of a model
#[derive(Debug, Clone)]
pub struct FirstStageVars {
    pub vm_reservation: BTreeMap<(UserId, VmTypeId, ProviderId), VarId>,
    pub router_reservation: BTreeMap<(UserId, RouterId), VarId>,
}

impl FirstStageVars {
    /// Add integer VM reservations and continuous bandwidth reservations.
    pub fn add_to<K: RowKey>(model: &mut LinearModel<K>, instance: &ProblemInstance) -> Self {
        let vm_reservation = instance
            .vm_placements()
            .map(|(u, v, p)| {
                let name = format!("xr[{},{},{}]", u.value(), v.value(), p.value());
                let var = model.add_var(name, VarKind::Integer, 0.0, f64::INFINITY);
                ((u, v, p), var)
            })
            .collect();
        let router_reservation = instance
            .router_links()
            .map(|(u, r)| {
                let name = format!("yr[{},{}]", u.value(), r.value());
                ((u, r), model.add_nonneg(name))
            })
            .collect();
        Self {
            vm_reservation,
            router_reservation,
        }
    }

    /// Σ reservation_cost[v]·xr[u,v,p] + Σ reservation_cost[r]·yr[u,r]
    pub fn reservation_cost(&self, instance: &ProblemInstance) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for (&(_, v, _), &var) in &self.vm_reservation {
            expr.add_term(var, instance.vm_type(v).reservation_cost);
        }
        for (&(_, r), &var) in &self.router_reservation {
            expr.add_term(var, instance.router(r).reservation_cost);
        }
        expr
    }

    /// Read the reservations from a solution; integer counts are rounded.
    pub fn read(&self, solution: &LpSolution) -> FirstStageDecision {
        FirstStageDecision {
            vm_reservations: self
                .vm_reservation
                .iter()
                .map(|(&key, &var)| (key, solution.value(var).round().max(0.0)))
                .collect(),
            router_reservations: self
                .router_reservation
                .iter()
                .map(|(&key, &var)| (key, solution.value(var).max(0.0)))
                .collect(),
        }
    }
}

/// Snapshot of first-stage values handed to the scenario evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirstStageDecision {
    pub vm_reservations: BTreeMap<(UserId, VmTypeId, ProviderId), f64>,
    pub router_reservations: BTreeMap<(UserId, RouterId), f64>,
}

impl FirstStageDecision {
    /// A decision that reserves nothing
    pub fn empty(instance: &ProblemInstance) -> Self {
        Self {
            vm_reservations: instance.vm_placements().map(|key| (key, 0.0)).collect(),
            router_reservations: instance.router_links().map(|key| (key, 0.0)).collect(),
        }
    }

    pub fn vm(&self, user: UserId, vm: VmTypeId, provider: ProviderId) -> f64 {
        self.vm_reservations
            .get(&(user, vm, provider))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn router(&self, user: UserId, router: RouterId) -> f64 {
        self.router_reservations
            .get(&(user, router))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn reservation_cost(&self, instance: &ProblemInstance) -> f64 {
        let vm_cost: f64 = self
            .vm_reservations
            .iter()
            .map(|(&(_, v, _), &count)| instance.vm_type(v).reservation_cost * count)
            .sum();
        let router_cost: f64 = self
            .router_reservations
            .iter()
            .map(|(&(_, r), &amount)| instance.router(r).reservation_cost * amount)
            .sum();
        vm_cost + router_cost
    }

    pub fn plan(&self, instance: &ProblemInstance) -> CapacityPlan {
        CapacityPlan::from_decision(self, instance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmReservation {
    pub user: String,
    pub vm_type: String,
    pub provider: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterReservation {
    pub user: String,
    pub router: String,
    pub bandwidth: f64,
}

/// Non-zero reservations of a decision, labelled with entity names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityPlan {
    pub vm_reservations: Vec<VmReservation>,
    pub router_reservations: Vec<RouterReservation>,
}

impl CapacityPlan {
    pub fn from_decision(decision: &FirstStageDecision, instance: &ProblemInstance) -> Self {
        let vm_reservations = decision
            .vm_reservations
            .iter()
            .filter(|(_, &count)| count >= 0.5)
            .map(|(&(u, v, p), &count)| VmReservation {
                user: instance.users[u.value()].name.clone(),
                vm_type: instance.vm_type(v).name.clone(),
                provider: instance.provider(p).name.clone(),
                count: count.round() as u64,
            })
            .collect();
        let router_reservations = decision
            .router_reservations
            .iter()
            .filter(|(_, &amount)| amount > 1e-9)
            .map(|(&(u, r), &amount)| RouterReservation {
                user: instance.users[u.value()].name.clone(),
                router: instance.router(r).name.clone(),
                bandwidth: amount,
            })
            .collect();
        Self {
            vm_reservations,
            router_reservations,
        }
    }

    pub fn total_vms(&self) -> u64 {
        self.vm_reservations.iter().map(|r| r.count).sum()
    }

    pub fn total_bandwidth(&self) -> f64 {
        self.router_reservations.iter().map(|r| r.bandwidth).sum()
    }
}
