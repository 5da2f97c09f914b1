//! Small instances with known optima, shared by unit and integration tests.

use cpt_core::{
    NetworkNode, ProblemInstance, ProblemInstanceBuilder, Provider, ProviderId, Router, RouterId,
    Scenario, UnitCosts, UserId, VmType,
};

/// Optimal expected cost of [`two_scenario_instance`].
///
/// Reserving 2 VMs and 2 units of bandwidth costs 14. The low scenario then
/// pays 2 for utilization; the high scenario pays 2 for utilization, 20 for
/// two on-demand VMs and 3 for on-demand bandwidth.
/// 14 + 0.5·2 + 0.5·25 = 27.5.
pub const TWO_SCENARIO_OPTIMUM: f64 = 27.5;

fn provider_to_user_path(builder: ProblemInstanceBuilder) -> ProblemInstanceBuilder {
    builder
        .arc(
            NetworkNode::Provider(ProviderId::new(0)),
            NetworkNode::Router(RouterId::new(0)),
        )
        .arc(
            NetworkNode::Router(RouterId::new(0)),
            NetworkNode::User(UserId::new(0)),
        )
}

fn single_vm_scenario(name: &str, probability: f64, demand: f64) -> Scenario {
    Scenario::new(name, probability)
        .with_vm_costs(vec![UnitCosts::new(1.0, 10.0)])
        .with_router_costs(vec![UnitCosts::new(0.0, 1.5)])
        .with_demand(vec![vec![demand]])
}

/// One user, VM type, provider and router; demand 2 or 4 with equal odds.
///
/// Capacities are finite (10 CPU, 10 bandwidth) and the optimum buys on
/// demand in the high scenario.
pub fn two_scenario_instance() -> ProblemInstance {
    provider_to_user_path(
        ProblemInstanceBuilder::new()
            .user("u0")
            .vm_type(VmType::new("small", 6.0).with_resources(1.0, 0.0, 0.0, 1.0))
            .provider(Provider::new("p0").with_cpu_capacity(10.0))
            .router(Router::new("r0", 1.0).with_bandwidth_capacity(10.0)),
    )
    .scenario(single_vm_scenario("low", 0.5, 2.0))
    .scenario(single_vm_scenario("high", 0.5, 4.0))
    .build_unchecked()
}

/// Same network as [`two_scenario_instance`] but nobody asks for anything.
pub fn zero_demand_instance() -> ProblemInstance {
    provider_to_user_path(
        ProblemInstanceBuilder::new()
            .user("u0")
            .vm_type(VmType::new("small", 6.0).with_resources(1.0, 0.0, 0.0, 1.0))
            .provider(Provider::new("p0").with_cpu_capacity(10.0))
            .router(Router::new("r0", 1.0).with_bandwidth_capacity(10.0)),
    )
    .scenario(single_vm_scenario("idle", 0.5, 0.0))
    .scenario(single_vm_scenario("quiet", 0.5, 0.0))
    .build_unchecked()
}

/// [`two_scenario_instance`] with every provider and router capacity unbounded.
pub fn unbounded_capacity_instance() -> ProblemInstance {
    provider_to_user_path(
        ProblemInstanceBuilder::new()
            .user("u0")
            .vm_type(VmType::new("small", 6.0).with_resources(1.0, 0.0, 0.0, 1.0))
            .provider(Provider::new("p0"))
            .router(Router::new("r0", 1.0)),
    )
    .scenario(single_vm_scenario("low", 0.5, 2.0))
    .scenario(single_vm_scenario("high", 0.5, 4.0))
    .build_unchecked()
}

/// Two users, VM types, providers and routers with three scenarios.
///
/// Mixes finite and unbounded capacities and a network where both routers
/// reach both users, so cuts carry prices from every constraint family.
pub fn multi_entity_instance() -> ProblemInstance {
    let p0 = NetworkNode::Provider(ProviderId::new(0));
    let p1 = NetworkNode::Provider(ProviderId::new(1));
    let r0 = NetworkNode::Router(RouterId::new(0));
    let r1 = NetworkNode::Router(RouterId::new(1));
    let u0 = NetworkNode::User(UserId::new(0));
    let u1 = NetworkNode::User(UserId::new(1));

    let costs = |vm_scale: f64, router_scale: f64| {
        (
            vec![
                UnitCosts::new(1.0 * vm_scale, 9.0 * vm_scale),
                UnitCosts::new(2.5 * vm_scale, 24.0 * vm_scale),
            ],
            vec![
                UnitCosts::new(0.1 * router_scale, 1.4 * router_scale),
                UnitCosts::new(0.2 * router_scale, 1.1 * router_scale),
            ],
        )
    };
    let scenario = |name: &str, probability: f64, scale: (f64, f64), demand: Vec<Vec<f64>>| {
        let (vm_costs, router_costs) = costs(scale.0, scale.1);
        Scenario::new(name, probability)
            .with_vm_costs(vm_costs)
            .with_router_costs(router_costs)
            .with_demand(demand)
    };

    ProblemInstanceBuilder::new()
        .user("web")
        .user("batch")
        .vm_type(VmType::new("small", 6.0).with_resources(1.0, 2.0, 2.0, 1.0))
        .vm_type(VmType::new("large", 15.0).with_resources(4.0, 4.0, 8.0, 3.0))
        .provider(
            Provider::new("east")
                .with_cpu_capacity(12.0)
                .with_memory_capacity(64.0),
        )
        .provider(Provider::new("west").with_storage_capacity(100.0))
        .router(Router::new("core", 1.0).with_bandwidth_capacity(20.0))
        .router(Router::new("edge", 0.8))
        .arc(p0, r0)
        .arc(p0, r1)
        .arc(p1, r1)
        .arc(r0, u0)
        .arc(r0, u1)
        .arc(r1, u0)
        .arc(r1, u1)
        .scenario(scenario(
            "trough",
            0.3,
            (1.0, 1.0),
            vec![vec![1.0, 0.0], vec![2.0, 1.0]],
        ))
        .scenario(scenario(
            "typical",
            0.5,
            (1.0, 1.2),
            vec![vec![3.0, 1.0], vec![2.0, 1.0]],
        ))
        .scenario(scenario(
            "peak",
            0.2,
            (1.3, 1.5),
            vec![vec![5.0, 2.0], vec![4.0, 2.0]],
        ))
        .build_unchecked()
}
