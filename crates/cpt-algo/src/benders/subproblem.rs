//! Scenario recourse model.
//!
//! The structure of the recourse LP is identical for every scenario and
//! every first-stage decision; only three things change between solves:
//! the right-hand sides of the utilization bounds (the reservations), the
//! right-hand sides of the demand rows (the scenario demand) and the
//! objective (the scenario prices). [`SubproblemContext`] builds the model
//! once and rewrites exactly those pieces.
//!
//! ```text
//! min  Σ ucost[s,v]·xu + ocost[s,v]·xo + Σ ucost[s,r]·yu + ocost[s,r]·yo
//! s.t. xu[u,v,p] <= xr[u,v,p]                          VM utilization bound
//!      yu[u,r]   <= yr[u,r]                            router utilization bound
//!      Σ_{u,v} k[v]·(xu + xo)[u,v,p] <= cap_k[p]       k ∈ {cpu, storage, memory}
//!      Σ_u (yu + yo)[u,r] <= bandwidth[r]
//!      Σ_p (xu + xo)[u,v,p] >= demand[s,u,v]
//!      network rows per user (router balance/usage, provider egress, user balance)
//! ```

use std::collections::BTreeMap;

use cpt_core::solver::{
    LinearExpr, LinearModel, ModelError, ObjectiveSense, Relation, RowKey, VarId,
};
use cpt_core::{
    finite_capacity, ArcId, NetworkNode, ProblemInstance, ProviderId, RouterId, ScenarioId, UserId,
    VmTypeId,
};

use super::first_stage::FirstStageDecision;
use super::keys::SubproblemRow;

/// Second-stage variables of one recourse block
#[derive(Debug, Clone)]
pub struct RecourseVars {
    pub vm_utilization: BTreeMap<(UserId, VmTypeId, ProviderId), VarId>,
    pub vm_on_demand: BTreeMap<(UserId, VmTypeId, ProviderId), VarId>,
    pub router_utilization: BTreeMap<(UserId, RouterId), VarId>,
    pub router_on_demand: BTreeMap<(UserId, RouterId), VarId>,
    pub flow: BTreeMap<(UserId, ArcId), VarId>,
}

/// Add one recourse block to `model`.
///
/// `key` maps recourse rows to the key type of the host model, so the same
/// block serves the standalone subproblem and the per-scenario copies of the
/// extensive form. Placeholder rows (utilization bounds, demand) are created
/// with a zero right-hand side; capacity rows are only created for finite
/// capacities.
pub fn add_recourse_block<K, F>(
    model: &mut LinearModel<K>,
    instance: &ProblemInstance,
    label: &str,
    key: F,
) -> Result<RecourseVars, ModelError>
where
    K: RowKey,
    F: Fn(SubproblemRow) -> K,
{
    let mut vm_utilization = BTreeMap::new();
    let mut vm_on_demand = BTreeMap::new();
    for (u, v, p) in instance.vm_placements() {
        let index = format!("{},{},{}", u.value(), v.value(), p.value());
        vm_utilization.insert((u, v, p), model.add_nonneg(format!("{}xu[{}]", label, index)));
        vm_on_demand.insert((u, v, p), model.add_nonneg(format!("{}xo[{}]", label, index)));
    }

    let mut router_utilization = BTreeMap::new();
    let mut router_on_demand = BTreeMap::new();
    for (u, r) in instance.router_links() {
        let index = format!("{},{}", u.value(), r.value());
        router_utilization.insert((u, r), model.add_nonneg(format!("{}yu[{}]", label, index)));
        router_on_demand.insert((u, r), model.add_nonneg(format!("{}yo[{}]", label, index)));
    }

    let mut flow = BTreeMap::new();
    for u in instance.user_ids() {
        for a in instance.arc_ids() {
            let name = format!("{}f[{},{}]", label, u.value(), a.value());
            flow.insert((u, a), model.add_nonneg(name));
        }
    }

    let vars = RecourseVars {
        vm_utilization,
        vm_on_demand,
        router_utilization,
        router_on_demand,
        flow,
    };

    // Utilization bounds
    for (&(user, vm, provider), &xu) in &vars.vm_utilization {
        model.add_row(
            key(SubproblemRow::VmUtilizationBound { user, vm, provider }),
            LinearExpr::new().with_term(xu, 1.0),
            Relation::LessEq,
            0.0,
        )?;
    }
    for (&(user, router), &yu) in &vars.router_utilization {
        model.add_row(
            key(SubproblemRow::RouterUtilizationBound { user, router }),
            LinearExpr::new().with_term(yu, 1.0),
            Relation::LessEq,
            0.0,
        )?;
    }

    // Provider capacities
    for p in instance.provider_ids() {
        let provider = instance.provider(p);
        let resources = [
            (SubproblemRow::CpuCapacity(p), provider.cpu_capacity),
            (SubproblemRow::StorageCapacity(p), provider.storage_capacity),
            (SubproblemRow::MemoryCapacity(p), provider.memory_capacity),
        ];
        for (row, capacity) in resources {
            let Some(capacity) = finite_capacity(capacity) else {
                continue;
            };
            let mut expr = LinearExpr::new();
            for u in instance.user_ids() {
                for v in instance.vm_type_ids() {
                    let vm = instance.vm_type(v);
                    let footprint = match row {
                        SubproblemRow::CpuCapacity(_) => vm.cpu,
                        SubproblemRow::StorageCapacity(_) => vm.storage,
                        _ => vm.memory,
                    };
                    expr.add_term(vars.vm_utilization[&(u, v, p)], footprint);
                    expr.add_term(vars.vm_on_demand[&(u, v, p)], footprint);
                }
            }
            model.add_row(key(row), expr, Relation::LessEq, capacity)?;
        }
    }

    // Router bandwidth
    for r in instance.router_ids() {
        let Some(capacity) = finite_capacity(instance.router(r).bandwidth_capacity) else {
            continue;
        };
        let mut expr = LinearExpr::new();
        for u in instance.user_ids() {
            expr.add_term(vars.router_utilization[&(u, r)], 1.0);
            expr.add_term(vars.router_on_demand[&(u, r)], 1.0);
        }
        model.add_row(
            key(SubproblemRow::BandwidthCapacity(r)),
            expr,
            Relation::LessEq,
            capacity,
        )?;
    }

    // Demand
    for user in instance.user_ids() {
        for vm in instance.vm_type_ids() {
            let mut expr = LinearExpr::new();
            for p in instance.provider_ids() {
                expr.add_term(vars.vm_utilization[&(user, vm, p)], 1.0);
                expr.add_term(vars.vm_on_demand[&(user, vm, p)], 1.0);
            }
            model.add_row(
                key(SubproblemRow::VmDemand { user, vm }),
                expr,
                Relation::GreaterEq,
                0.0,
            )?;
        }
    }

    add_network_rows(model, instance, &vars, &key)?;
    Ok(vars)
}

fn add_network_rows<K, F>(
    model: &mut LinearModel<K>,
    instance: &ProblemInstance,
    vars: &RecourseVars,
    key: &F,
) -> Result<(), ModelError>
where
    K: RowKey,
    F: Fn(SubproblemRow) -> K,
{
    let arcs_from = |node: NetworkNode| {
        instance
            .arc_ids()
            .filter(move |&a| instance.arc(a).from == node)
    };
    let arcs_into = |node: NetworkNode| {
        instance
            .arc_ids()
            .filter(move |&a| instance.arc(a).to == node)
    };

    for user in instance.user_ids() {
        for router in instance.router_ids() {
            let node = NetworkNode::Router(router);

            let mut balance = LinearExpr::new();
            for a in arcs_into(node) {
                balance.add_term(vars.flow[&(user, a)], 1.0);
            }
            for a in arcs_from(node) {
                balance.add_term(vars.flow[&(user, a)], -1.0);
            }
            model.add_row(
                key(SubproblemRow::RouterBalance { user, router }),
                balance,
                Relation::Equal,
                0.0,
            )?;

            let mut usage = LinearExpr::new();
            for a in arcs_from(node) {
                usage.add_term(vars.flow[&(user, a)], 1.0);
            }
            usage.add_term(vars.router_utilization[&(user, router)], -1.0);
            usage.add_term(vars.router_on_demand[&(user, router)], -1.0);
            model.add_row(
                key(SubproblemRow::RouterUsage { user, router }),
                usage,
                Relation::Equal,
                0.0,
            )?;
        }

        for provider in instance.provider_ids() {
            let mut egress = LinearExpr::new();
            for a in arcs_from(NetworkNode::Provider(provider)) {
                egress.add_term(vars.flow[&(user, a)], 1.0);
            }
            for v in instance.vm_type_ids() {
                let bandwidth = instance.vm_type(v).bandwidth;
                egress.add_term(vars.vm_utilization[&(user, v, provider)], -bandwidth);
                egress.add_term(vars.vm_on_demand[&(user, v, provider)], -bandwidth);
            }
            model.add_row(
                key(SubproblemRow::ProviderEgress { user, provider }),
                egress,
                Relation::GreaterEq,
                0.0,
            )?;
        }

        let mut reach = LinearExpr::new();
        for a in arcs_into(NetworkNode::User(user)) {
            reach.add_term(vars.flow[&(user, a)], 1.0);
        }
        for a in instance.arc_ids() {
            if matches!(instance.arc(a).from, NetworkNode::Provider(_)) {
                reach.add_term(vars.flow[&(user, a)], -1.0);
            }
        }
        model.add_row(
            key(SubproblemRow::UserBalance(user)),
            reach,
            Relation::Equal,
            0.0,
        )?;
    }
    Ok(())
}

/// Scenario prices applied to the recourse variables
pub fn scenario_objective(
    instance: &ProblemInstance,
    scenario: ScenarioId,
    vars: &RecourseVars,
) -> LinearExpr {
    let mut objective = LinearExpr::new();
    for (&(_, v, _), &xu) in &vars.vm_utilization {
        objective.add_term(xu, instance.vm_costs(scenario, v).utilization);
    }
    for (&(_, v, _), &xo) in &vars.vm_on_demand {
        objective.add_term(xo, instance.vm_costs(scenario, v).on_demand);
    }
    for (&(_, r), &yu) in &vars.router_utilization {
        objective.add_term(yu, instance.router_costs(scenario, r).utilization);
    }
    for (&(_, r), &yo) in &vars.router_on_demand {
        objective.add_term(yo, instance.router_costs(scenario, r).on_demand);
    }
    objective
}

/// The recourse model together with the bookkeeping needed to refresh it.
///
/// Holding the context by `&mut` is what serializes scenario solves: every
/// refresh rewrites shared right-hand sides and the objective in place.
#[derive(Debug, Clone)]
pub struct SubproblemContext {
    model: LinearModel<SubproblemRow>,
    vars: RecourseVars,
    placeholders: Vec<SubproblemRow>,
}

impl SubproblemContext {
    pub fn build(instance: &ProblemInstance) -> Result<Self, ModelError> {
        let mut model = LinearModel::new("subproblem", ObjectiveSense::Minimize);
        let vars = add_recourse_block(&mut model, instance, "", |row| row)?;
        let placeholders = model
            .rows()
            .iter()
            .map(|row| row.key)
            .filter(SubproblemRow::is_placeholder)
            .collect();
        Ok(Self {
            model,
            vars,
            placeholders,
        })
    }

    pub fn model(&self) -> &LinearModel<SubproblemRow> {
        &self.model
    }

    pub fn vars(&self) -> &RecourseVars {
        &self.vars
    }

    /// Zero every placeholder right-hand side and clear the objective
    pub fn reset_placeholders(&mut self) -> Result<(), ModelError> {
        for row in &self.placeholders {
            self.model.set_rhs(row, 0.0)?;
        }
        self.model.set_objective(LinearExpr::new());
        Ok(())
    }

    /// Write the reservations into the utilization bounds
    pub fn fix_first_stage(
        &mut self,
        first_stage: &FirstStageDecision,
    ) -> Result<(), ModelError> {
        for (&(user, vm, provider), &count) in &first_stage.vm_reservations {
            self.model.set_rhs(
                &SubproblemRow::VmUtilizationBound { user, vm, provider },
                count,
            )?;
        }
        for (&(user, router), &amount) in &first_stage.router_reservations {
            self.model
                .set_rhs(&SubproblemRow::RouterUtilizationBound { user, router }, amount)?;
        }
        Ok(())
    }

    /// Write the scenario demand and prices
    pub fn apply_scenario(
        &mut self,
        instance: &ProblemInstance,
        scenario: ScenarioId,
    ) -> Result<(), ModelError> {
        for user in instance.user_ids() {
            for vm in instance.vm_type_ids() {
                self.model.set_rhs(
                    &SubproblemRow::VmDemand { user, vm },
                    instance.demand(scenario, user, vm),
                )?;
            }
        }
        self.model
            .set_objective(scenario_objective(instance, scenario, &self.vars));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        multi_entity_instance, two_scenario_instance, unbounded_capacity_instance,
    };

    #[test]
    fn row_layout_of_single_path_instance() {
        let instance = two_scenario_instance();
        let context = SubproblemContext::build(&instance).unwrap();
        let model = context.model();

        // 2 utilization bounds, cpu + bandwidth capacity, 1 demand,
        // router balance + usage, provider egress, user balance
        assert_eq!(model.num_rows(), 9);
        assert!(model.row_id(&SubproblemRow::CpuCapacity(ProviderId::new(0))).is_some());
        assert!(model
            .row_id(&SubproblemRow::StorageCapacity(ProviderId::new(0)))
            .is_none());
        assert_eq!(context.placeholders.len(), 3);
        // xu, xo, yu, yo and one flow per arc
        assert_eq!(model.num_vars(), 6);
    }

    #[test]
    fn unbounded_capacities_have_no_rows() {
        let instance = unbounded_capacity_instance();
        let context = SubproblemContext::build(&instance).unwrap();
        let model = context.model();
        assert!(model.row_id(&SubproblemRow::CpuCapacity(ProviderId::new(0))).is_none());
        assert!(model
            .row_id(&SubproblemRow::BandwidthCapacity(RouterId::new(0)))
            .is_none());
    }

    #[test]
    fn refresh_and_reset() {
        let instance = two_scenario_instance();
        let mut context = SubproblemContext::build(&instance).unwrap();
        let u = UserId::new(0);
        let v = VmTypeId::new(0);
        let p = ProviderId::new(0);

        let mut decision = FirstStageDecision::empty(&instance);
        decision.vm_reservations.insert((u, v, p), 3.0);
        context.fix_first_stage(&decision).unwrap();
        context.apply_scenario(&instance, ScenarioId::new(1)).unwrap();

        let bound = SubproblemRow::VmUtilizationBound {
            user: u,
            vm: v,
            provider: p,
        };
        let demand = SubproblemRow::VmDemand { user: u, vm: v };
        let model = context.model();
        assert_eq!(model.row(model.row_id(&bound).unwrap()).rhs, 3.0);
        assert_eq!(model.row(model.row_id(&demand).unwrap()).rhs, 4.0);
        assert!(!model.objective().is_empty());

        context.reset_placeholders().unwrap();
        let model = context.model();
        assert_eq!(model.row(model.row_id(&bound).unwrap()).rhs, 0.0);
        assert_eq!(model.row(model.row_id(&demand).unwrap()).rhs, 0.0);
        assert!(model.objective().is_empty());
        // Capacities are structural and survive a reset
        let cpu = model.row_id(&SubproblemRow::CpuCapacity(p)).unwrap();
        assert_eq!(model.row(cpu).rhs, 10.0);
    }

    #[test]
    fn scenario_objective_prices_every_recourse_variable() {
        let instance = multi_entity_instance();
        let context = SubproblemContext::build(&instance).unwrap();
        let objective = scenario_objective(&instance, ScenarioId::new(2), context.vars());
        let priced = 2 * instance.vm_placements().count() + 2 * instance.router_links().count();
        assert_eq!(objective.terms.len(), priced);
    }
}
