//! Problem instance data structures
//!
//! A [`ProblemInstance`] is the immutable input of every planning run. It is
//! deliberately flat: entity tables are plain vectors addressed by typed IDs,
//! and scenario data is stored densely (`vm_costs[v]`, `router_costs[r]`,
//! `demand[u][v]`) so that it serializes to JSON/YAML without any custom
//! format.
//!
//! ## Recourse precondition
//!
//! The second stage never generates feasibility cuts. On-demand purchase acts
//! as unlimited slack for reserved capacity, but provider and router
//! capacities still bound utilization plus on-demand purchase. Callers must
//! therefore supply capacities that admit every scenario's demand;
//! [`ProblemInstance::diagnose`] flags scenarios that obviously violate this.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::{CptError, CptResult};
use crate::{ArcId, ProviderId, RouterId, ScenarioId, UserId, VmTypeId};

/// Tolerance used when checking that scenario probabilities sum to one
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Returns the capacity if it actually bounds anything.
///
/// Infinite capacities are modeled as absent constraints; every place that
/// multiplies a capacity by a dual price goes through this helper so that an
/// unbounded resource contributes exactly zero.
#[inline]
pub fn finite_capacity(capacity: f64) -> Option<f64> {
    if capacity.is_finite() {
        Some(capacity)
    } else {
        None
    }
}

fn unbounded() -> f64 {
    f64::INFINITY
}

/// Capacities serialize as `null` (or are omitted) when unbounded.
mod capacity_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// A consumer of virtual machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A virtual machine type with its reservation price and resource footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmType {
    pub name: String,
    /// First-stage price of reserving one instance
    pub reservation_cost: f64,
    /// CPU units consumed per instance
    #[serde(default)]
    pub cpu: f64,
    /// Storage units consumed per instance
    #[serde(default)]
    pub storage: f64,
    /// Memory units consumed per instance
    #[serde(default)]
    pub memory: f64,
    /// Network bandwidth each instance needs towards its user
    #[serde(default)]
    pub bandwidth: f64,
}

impl VmType {
    pub fn new(name: impl Into<String>, reservation_cost: f64) -> Self {
        Self {
            name: name.into(),
            reservation_cost,
            cpu: 0.0,
            storage: 0.0,
            memory: 0.0,
            bandwidth: 0.0,
        }
    }

    /// Set the per-instance CPU, storage, memory and bandwidth demand
    pub fn with_resources(mut self, cpu: f64, storage: f64, memory: f64, bandwidth: f64) -> Self {
        self.cpu = cpu;
        self.storage = storage;
        self.memory = memory;
        self.bandwidth = bandwidth;
        self
    }
}

/// A cloud provider hosting VMs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default = "unbounded", with = "capacity_serde")]
    pub cpu_capacity: f64,
    #[serde(default = "unbounded", with = "capacity_serde")]
    pub storage_capacity: f64,
    #[serde(default = "unbounded", with = "capacity_serde")]
    pub memory_capacity: f64,
}

impl Provider {
    /// A provider with unbounded capacities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cpu_capacity: f64::INFINITY,
            storage_capacity: f64::INFINITY,
            memory_capacity: f64::INFINITY,
        }
    }

    pub fn with_cpu_capacity(mut self, capacity: f64) -> Self {
        self.cpu_capacity = capacity;
        self
    }

    pub fn with_storage_capacity(mut self, capacity: f64) -> Self {
        self.storage_capacity = capacity;
        self
    }

    pub fn with_memory_capacity(mut self, capacity: f64) -> Self {
        self.memory_capacity = capacity;
        self
    }
}

/// A router whose bandwidth is reserved per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Router {
    pub name: String,
    /// First-stage price of reserving one unit of bandwidth
    pub reservation_cost: f64,
    #[serde(default = "unbounded", with = "capacity_serde")]
    pub bandwidth_capacity: f64,
}

impl Router {
    /// A router with unbounded bandwidth
    pub fn new(name: impl Into<String>, reservation_cost: f64) -> Self {
        Self {
            name: name.into(),
            reservation_cost,
            bandwidth_capacity: f64::INFINITY,
        }
    }

    pub fn with_bandwidth_capacity(mut self, capacity: f64) -> Self {
        self.bandwidth_capacity = capacity;
        self
    }
}

/// Endpoint of a network arc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkNode {
    User(UserId),
    Provider(ProviderId),
    Router(RouterId),
}

impl std::fmt::Display for NetworkNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkNode::User(id) => write!(f, "{}", id),
            NetworkNode::Provider(id) => write!(f, "{}", id),
            NetworkNode::Router(id) => write!(f, "{}", id),
        }
    }
}

/// Directed arc of the routing network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkArc {
    pub from: NetworkNode,
    pub to: NetworkNode,
}

/// Second-stage unit prices of one resource in one scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCosts {
    /// Price of using one unit of reserved capacity
    pub utilization: f64,
    /// Price of buying one unit on demand
    pub on_demand: f64,
}

impl UnitCosts {
    pub fn new(utilization: f64, on_demand: f64) -> Self {
        Self {
            utilization,
            on_demand,
        }
    }
}

/// One demand realization with its probability and second-stage prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub probability: f64,
    /// Indexed by [`VmTypeId`]
    pub vm_costs: Vec<UnitCosts>,
    /// Indexed by [`RouterId`]
    pub router_costs: Vec<UnitCosts>,
    /// `demand[user][vm_type]`: number of VMs requested
    pub demand: Vec<Vec<f64>>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            vm_costs: Vec::new(),
            router_costs: Vec::new(),
            demand: Vec::new(),
        }
    }

    pub fn with_vm_costs(mut self, costs: Vec<UnitCosts>) -> Self {
        self.vm_costs = costs;
        self
    }

    pub fn with_router_costs(mut self, costs: Vec<UnitCosts>) -> Self {
        self.router_costs = costs;
        self
    }

    pub fn with_demand(mut self, demand: Vec<Vec<f64>>) -> Self {
        self.demand = demand;
        self
    }
}

/// Complete description of a stochastic capacity planning problem.
///
/// Accessors taking IDs index the tables directly and panic on an ID that
/// does not belong to this instance; IDs obtained from the `*_ids()`
/// iterators of a validated instance are always in range.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProblemInstance {
    pub users: Vec<User>,
    pub vm_types: Vec<VmType>,
    pub providers: Vec<Provider>,
    pub routers: Vec<Router>,
    #[serde(default)]
    pub arcs: Vec<NetworkArc>,
    pub scenarios: Vec<Scenario>,
}

impl ProblemInstance {
    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_vm_types(&self) -> usize {
        self.vm_types.len()
    }

    pub fn num_providers(&self) -> usize {
        self.providers.len()
    }

    pub fn num_routers(&self) -> usize {
        self.routers.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    pub fn num_scenarios(&self) -> usize {
        self.scenarios.len()
    }

    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + Clone {
        (0..self.users.len()).map(UserId::new)
    }

    pub fn vm_type_ids(&self) -> impl Iterator<Item = VmTypeId> + Clone {
        (0..self.vm_types.len()).map(VmTypeId::new)
    }

    pub fn provider_ids(&self) -> impl Iterator<Item = ProviderId> + Clone {
        (0..self.providers.len()).map(ProviderId::new)
    }

    pub fn router_ids(&self) -> impl Iterator<Item = RouterId> + Clone {
        (0..self.routers.len()).map(RouterId::new)
    }

    pub fn arc_ids(&self) -> impl Iterator<Item = ArcId> + Clone {
        (0..self.arcs.len()).map(ArcId::new)
    }

    pub fn scenario_ids(&self) -> impl Iterator<Item = ScenarioId> + Clone {
        (0..self.scenarios.len()).map(ScenarioId::new)
    }

    /// Every (user, VM type, provider) triple, the index set of VM reservations
    pub fn vm_placements(&self) -> impl Iterator<Item = (UserId, VmTypeId, ProviderId)> + '_ {
        self.user_ids().flat_map(move |u| {
            self.vm_type_ids()
                .flat_map(move |v| self.provider_ids().map(move |p| (u, v, p)))
        })
    }

    /// Every (user, router) pair, the index set of bandwidth reservations
    pub fn router_links(&self) -> impl Iterator<Item = (UserId, RouterId)> + '_ {
        self.user_ids()
            .flat_map(move |u| self.router_ids().map(move |r| (u, r)))
    }

    pub fn vm_type(&self, id: VmTypeId) -> &VmType {
        &self.vm_types[id.value()]
    }

    pub fn provider(&self, id: ProviderId) -> &Provider {
        &self.providers[id.value()]
    }

    pub fn router(&self, id: RouterId) -> &Router {
        &self.routers[id.value()]
    }

    pub fn arc(&self, id: ArcId) -> &NetworkArc {
        &self.arcs[id.value()]
    }

    pub fn scenario(&self, id: ScenarioId) -> &Scenario {
        &self.scenarios[id.value()]
    }

    /// Number of VMs of type `vm` that `user` requests in `scenario`
    pub fn demand(&self, scenario: ScenarioId, user: UserId, vm: VmTypeId) -> f64 {
        self.scenarios[scenario.value()].demand[user.value()][vm.value()]
    }

    pub fn vm_costs(&self, scenario: ScenarioId, vm: VmTypeId) -> UnitCosts {
        self.scenarios[scenario.value()].vm_costs[vm.value()]
    }

    pub fn router_costs(&self, scenario: ScenarioId, router: RouterId) -> UnitCosts {
        self.scenarios[scenario.value()].router_costs[router.value()]
    }

    /// True when no scenario has a negative utilization or on-demand price,
    /// which makes every recourse cost non-negative.
    pub fn recourse_costs_non_negative(&self) -> bool {
        self.scenarios.iter().all(|s| {
            s.vm_costs
                .iter()
                .chain(s.router_costs.iter())
                .all(|c| c.utilization >= 0.0 && c.on_demand >= 0.0)
        })
    }

    /// Check the instance and collect every issue found.
    pub fn diagnose(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        self.check_entities(&mut diag);
        self.check_arcs(&mut diag);
        self.check_scenarios(&mut diag);
        if !diag.has_errors() {
            diag.merge(self.check_capacity_headroom());
        }
        diag
    }

    /// Fail with [`CptError::DataInconsistency`] if [`Self::diagnose`] reports errors.
    pub fn validate(&self) -> CptResult<()> {
        let diag = self.diagnose();
        if diag.has_errors() {
            let details: Vec<String> = diag.errors().map(|e| e.to_string()).collect();
            return Err(CptError::DataInconsistency(details.join("; ")));
        }
        Ok(())
    }

    fn check_entities(&self, diag: &mut Diagnostics) {
        for (i, vm) in self.vm_types.iter().enumerate() {
            let entity = format!("{} ({})", VmTypeId::new(i), vm.name);
            if !vm.reservation_cost.is_finite() {
                diag.add_error_with_entity("value", "reservation cost is not finite", &entity);
            } else if vm.reservation_cost < 0.0 {
                diag.add_warning_with_entity("cost", "negative reservation cost", &entity);
            }
            for (label, amount) in [
                ("cpu", vm.cpu),
                ("storage", vm.storage),
                ("memory", vm.memory),
                ("bandwidth", vm.bandwidth),
            ] {
                if !amount.is_finite() || amount < 0.0 {
                    diag.add_error_with_entity(
                        "value",
                        &format!("{} demand must be finite and non-negative", label),
                        &entity,
                    );
                }
            }
        }

        for (i, provider) in self.providers.iter().enumerate() {
            let entity = format!("{} ({})", ProviderId::new(i), provider.name);
            for (label, capacity) in [
                ("cpu", provider.cpu_capacity),
                ("storage", provider.storage_capacity),
                ("memory", provider.memory_capacity),
            ] {
                if capacity.is_nan() || capacity < 0.0 {
                    diag.add_error_with_entity(
                        "value",
                        &format!("{} capacity must be non-negative or unbounded", label),
                        &entity,
                    );
                }
            }
        }

        for (i, router) in self.routers.iter().enumerate() {
            let entity = format!("{} ({})", RouterId::new(i), router.name);
            if !router.reservation_cost.is_finite() {
                diag.add_error_with_entity("value", "reservation cost is not finite", &entity);
            } else if router.reservation_cost < 0.0 {
                diag.add_warning_with_entity("cost", "negative reservation cost", &entity);
            }
            if router.bandwidth_capacity.is_nan() || router.bandwidth_capacity < 0.0 {
                diag.add_error_with_entity(
                    "value",
                    "bandwidth capacity must be non-negative or unbounded",
                    &entity,
                );
            }
        }
    }

    fn node_exists(&self, node: NetworkNode) -> bool {
        match node {
            NetworkNode::User(id) => id.value() < self.users.len(),
            NetworkNode::Provider(id) => id.value() < self.providers.len(),
            NetworkNode::Router(id) => id.value() < self.routers.len(),
        }
    }

    fn check_arcs(&self, diag: &mut Diagnostics) {
        for (i, arc) in self.arcs.iter().enumerate() {
            let entity = ArcId::new(i).to_string();
            for endpoint in [arc.from, arc.to] {
                if !self.node_exists(endpoint) {
                    diag.add_error_with_entity(
                        "reference",
                        &format!("endpoint {} does not exist", endpoint),
                        &entity,
                    );
                }
            }
            if arc.from == arc.to {
                diag.add_warning_with_entity("network", "arc is a self-loop", &entity);
            }
        }
    }

    fn check_scenarios(&self, diag: &mut Diagnostics) {
        if self.scenarios.is_empty() {
            diag.add_warning("scenario", "instance has no scenarios");
            return;
        }

        let mut total_probability = 0.0;
        for (i, scenario) in self.scenarios.iter().enumerate() {
            let entity = format!("{} ({})", ScenarioId::new(i), scenario.name);

            if !scenario.probability.is_finite() {
                diag.add_error_with_entity("probability", "probability is not finite", &entity);
            } else {
                if scenario.probability < 0.0 {
                    diag.add_warning_with_entity("probability", "negative probability", &entity);
                }
                total_probability += scenario.probability;
            }

            if scenario.vm_costs.len() != self.vm_types.len() {
                diag.add_error_with_entity(
                    "dimension",
                    &format!(
                        "{} VM cost entries for {} VM types",
                        scenario.vm_costs.len(),
                        self.vm_types.len()
                    ),
                    &entity,
                );
            }
            if scenario.router_costs.len() != self.routers.len() {
                diag.add_error_with_entity(
                    "dimension",
                    &format!(
                        "{} router cost entries for {} routers",
                        scenario.router_costs.len(),
                        self.routers.len()
                    ),
                    &entity,
                );
            }
            for costs in scenario.vm_costs.iter().chain(scenario.router_costs.iter()) {
                if !costs.utilization.is_finite() || !costs.on_demand.is_finite() {
                    diag.add_error_with_entity("value", "unit cost is not finite", &entity);
                } else if costs.utilization < 0.0 || costs.on_demand < 0.0 {
                    diag.add_warning_with_entity(
                        "cost",
                        "negative unit cost; recourse cost may be negative",
                        &entity,
                    );
                }
            }

            if scenario.demand.len() != self.users.len() {
                diag.add_error_with_entity(
                    "dimension",
                    &format!(
                        "demand has {} user rows for {} users",
                        scenario.demand.len(),
                        self.users.len()
                    ),
                    &entity,
                );
            }
            for (u, row) in scenario.demand.iter().enumerate() {
                if row.len() != self.vm_types.len() {
                    diag.add_error_with_entity(
                        "dimension",
                        &format!(
                            "demand row of {} has {} entries for {} VM types",
                            UserId::new(u),
                            row.len(),
                            self.vm_types.len()
                        ),
                        &entity,
                    );
                }
                for value in row {
                    if !value.is_finite() {
                        diag.add_error_with_entity("value", "demand is not finite", &entity);
                    } else if *value < 0.0 {
                        diag.add_warning_with_entity("demand", "negative demand", &entity);
                    }
                }
            }
        }

        if (total_probability - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            diag.add_warning(
                "probability",
                &format!("scenario probabilities sum to {:.6}", total_probability),
            );
        }
    }

    /// Flags scenarios whose aggregate resource demand exceeds the combined
    /// finite capacity of all providers, or whose VM bandwidth cannot pass
    /// through the routers. Such a scenario has an infeasible recourse
    /// problem no matter what is reserved.
    fn check_capacity_headroom(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();

        let mut available = [0.0_f64; 3];
        for p in &self.providers {
            available[0] += p.cpu_capacity;
            available[1] += p.storage_capacity;
            available[2] += p.memory_capacity;
        }

        // Provider traffic is forced through routers only when no arc leaves
        // a provider for anything but a router.
        let routed_only = self.arcs.iter().all(|arc| {
            !matches!(arc.from, NetworkNode::Provider(_))
                || matches!(arc.to, NetworkNode::Router(_))
        });
        let router_bandwidth: f64 = self.routers.iter().map(|r| r.bandwidth_capacity).sum();

        for s in self.scenario_ids() {
            let entity = format!("{} ({})", s, self.scenario(s).name);
            let mut required = [0.0_f64; 3];
            let mut required_bandwidth = 0.0;
            for u in self.user_ids() {
                for v in self.vm_type_ids() {
                    let vm = self.vm_type(v);
                    let d = self.demand(s, u, v);
                    required[0] += vm.cpu * d;
                    required[1] += vm.storage * d;
                    required[2] += vm.memory * d;
                    required_bandwidth += vm.bandwidth * d;
                }
            }

            let labels = ["cpu", "storage", "memory"];
            for ((label, required), available) in labels.iter().zip(required).zip(available) {
                if available.is_finite() && required > available + 1e-9 {
                    diag.add_warning_with_entity(
                        "feasibility",
                        &format!(
                            "demand needs {:.3} {} but providers offer {:.3}; \
                             recourse problem is infeasible",
                            required, label, available
                        ),
                        &entity,
                    );
                }
            }

            if routed_only
                && router_bandwidth.is_finite()
                && required_bandwidth > router_bandwidth + 1e-9
            {
                diag.add_warning_with_entity(
                    "feasibility",
                    &format!(
                        "demand needs {:.3} bandwidth but routers carry {:.3}; \
                         recourse problem is infeasible",
                        required_bandwidth, router_bandwidth
                    ),
                    &entity,
                );
            }
        }
        diag
    }
}

/// Builder for assembling validated problem instances
#[derive(Debug, Default)]
pub struct ProblemInstanceBuilder {
    instance: ProblemInstance,
}

impl ProblemInstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, name: impl Into<String>) -> Self {
        self.instance.users.push(User::new(name));
        self
    }

    pub fn vm_type(mut self, vm_type: VmType) -> Self {
        self.instance.vm_types.push(vm_type);
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.instance.providers.push(provider);
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.instance.routers.push(router);
        self
    }

    pub fn arc(mut self, from: NetworkNode, to: NetworkNode) -> Self {
        self.instance.arcs.push(NetworkArc { from, to });
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.instance.scenarios.push(scenario);
        self
    }

    /// Validate and return the instance
    pub fn build(self) -> CptResult<ProblemInstance> {
        self.instance.validate()?;
        Ok(self.instance)
    }

    /// Return the instance without validation
    pub fn build_unchecked(self) -> ProblemInstance {
        self.instance
    }
}
