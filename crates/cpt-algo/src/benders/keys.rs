//! Typed row keys for the models built by the decomposition.

use cpt_core::{ProviderId, RouterId, ScenarioId, UserId, VmTypeId};

/// Row of the recourse (second-stage) model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubproblemRow {
    /// `utilization[u,v,p] <= reservation[u,v,p]`
    VmUtilizationBound {
        user: UserId,
        vm: VmTypeId,
        provider: ProviderId,
    },
    /// `router_utilization[u,r] <= router_reservation[u,r]`
    RouterUtilizationBound { user: UserId, router: RouterId },
    CpuCapacity(ProviderId),
    StorageCapacity(ProviderId),
    MemoryCapacity(ProviderId),
    BandwidthCapacity(RouterId),
    /// `Σ_p (utilization + on_demand)[u,v,p] >= demand[s,u,v]`
    VmDemand { user: UserId, vm: VmTypeId },
    /// Flow into a router equals flow out of it
    RouterBalance { user: UserId, router: RouterId },
    /// Flow out of a router equals the bandwidth it provides
    RouterUsage { user: UserId, router: RouterId },
    /// Flow out of a provider covers the bandwidth of the VMs it hosts
    ProviderEgress { user: UserId, provider: ProviderId },
    /// Flow reaching a user equals flow leaving all providers
    UserBalance(UserId),
}

/// Groups of subproblem rows that share a dual price map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintFamily {
    VmUtilizationBound,
    RouterUtilizationBound,
    CpuCapacity,
    StorageCapacity,
    MemoryCapacity,
    BandwidthCapacity,
    VmDemand,
    /// Network rows; their right-hand side is always zero
    Flow,
}

impl SubproblemRow {
    pub fn family(&self) -> ConstraintFamily {
        match self {
            SubproblemRow::VmUtilizationBound { .. } => ConstraintFamily::VmUtilizationBound,
            SubproblemRow::RouterUtilizationBound { .. } => {
                ConstraintFamily::RouterUtilizationBound
            }
            SubproblemRow::CpuCapacity(_) => ConstraintFamily::CpuCapacity,
            SubproblemRow::StorageCapacity(_) => ConstraintFamily::StorageCapacity,
            SubproblemRow::MemoryCapacity(_) => ConstraintFamily::MemoryCapacity,
            SubproblemRow::BandwidthCapacity(_) => ConstraintFamily::BandwidthCapacity,
            SubproblemRow::VmDemand { .. } => ConstraintFamily::VmDemand,
            SubproblemRow::RouterBalance { .. }
            | SubproblemRow::RouterUsage { .. }
            | SubproblemRow::ProviderEgress { .. }
            | SubproblemRow::UserBalance(_) => ConstraintFamily::Flow,
        }
    }

    /// Rows whose right-hand side is rewritten before every scenario solve
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self.family(),
            ConstraintFamily::VmUtilizationBound
                | ConstraintFamily::RouterUtilizationBound
                | ConstraintFamily::VmDemand
        )
    }
}

/// Row of the master problem; every master row is an optimality cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CutKey {
    pub scenario: ScenarioId,
    /// Position among the cuts of this scenario
    pub ordinal: usize,
}

/// Row of the extensive form: a recourse row replicated per scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensiveRow {
    pub scenario: ScenarioId,
    pub row: SubproblemRow,
}
