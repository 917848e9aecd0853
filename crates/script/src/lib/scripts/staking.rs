use alloy::primitives::{Address, U256};
use catalist_ops_shared::contracts::ContractId;
use catalist_ops_shared::output::{format_ace, ScriptOutput};
use serde_json::Value;

use super::prelude::ScriptRuntime;
use super::{address_value, uint_value};
use crate::contracts::OracleReportSanityChecker;

pub const DEFAULT_STAKING_MODULE_ID: u64 = 1;
pub const DEFAULT_NODE_OPERATOR_ID: u64 = 0;

pub async fn get_staking_modules(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let modules = runtime
        .tx
        .read("getStakingModules", runtime.contracts.staking_router.getStakingModules())
        .await?;

    let mut output = ScriptOutput::new();
    output.untitled().entry("staking modules", modules.len());
    for module in modules {
        output
            .section(format!("Staking module {}", module.id))
            .entry("name", module.name)
            .entry("address", address_value(module.stakingModuleAddress))
            .entry("module fee", module.stakingModuleFee)
            .entry("treasury fee", module.treasuryFee)
            .entry("target share", module.targetShare)
            .entry("status", module.status)
            .entry("last deposit at", module.lastDepositAt)
            .entry("last deposit block", uint_value(module.lastDepositBlock))
            .entry("exited validators", uint_value(module.exitedValidatorsCount));
    }
    Ok(output)
}

pub async fn get_staking_limit(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let info = runtime
        .tx
        .read("getStakeLimitFullInfo", runtime.contracts.catalist.getStakeLimitFullInfo())
        .await?;

    let mut output = ScriptOutput::new();
    output
        .section("Staking limit")
        .entry("staking paused", info.isStakingPaused)
        .entry("staking limit set", info.isStakingLimitSet)
        .entry("current stake limit", format_ace(info.currentStakeLimit))
        .entry("max stake limit", format_ace(info.maxStakeLimit))
        .entry("max stake limit growth blocks", uint_value(info.maxStakeLimitGrowthBlocks))
        .entry("prev stake limit", format_ace(info.prevStakeLimit))
        .entry("prev stake block number", uint_value(info.prevStakeBlockNumber));
    Ok(output)
}

/// Module ids start at 1; anything lower is read as the first module.
pub fn clamp_module_id(module_id: u64) -> u64 {
    module_id.max(1)
}

pub async fn staking_module_summary(runtime: &ScriptRuntime, module_id: u64) -> anyhow::Result<ScriptOutput> {
    let module_id = clamp_module_id(module_id);
    let summary = runtime
        .tx
        .read(
            "getStakingModuleSummary",
            runtime.contracts.staking_router.getStakingModuleSummary(U256::from(module_id)),
        )
        .await?;

    let mut output = ScriptOutput::new();
    output.untitled().entry("staking module id", module_id);
    output
        .section("Staking module summary")
        .entry("total exited validators", uint_value(summary.totalExitedValidators))
        .entry("total deposited validators", uint_value(summary.totalDepositedValidators))
        .entry("depositable validators", uint_value(summary.depositableValidatorsCount));
    Ok(output)
}

pub async fn total_ace(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let pooled = runtime
        .tx
        .read("getTotalPooledAce", runtime.contracts.catalist.getTotalPooledAce())
        .await?;
    let mut output = ScriptOutput::new();
    output.untitled().entry("total pooled ACE", format_ace(pooled));
    Ok(output)
}

pub async fn balance(runtime: &ScriptRuntime, account: Address) -> anyhow::Result<ScriptOutput> {
    let balance = runtime
        .tx
        .read("balanceOf", runtime.contracts.catalist.balanceOf(account))
        .await?;
    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("address", address_value(account))
        .entry("balance", format_ace(balance));
    Ok(output)
}

pub async fn staking_overview(runtime: &ScriptRuntime, module_id: u64, operator_id: u64) -> anyhow::Result<ScriptOutput> {
    let router = &runtime.contracts.staking_router;
    let registry = &runtime.contracts.node_operators_registry;
    let module = U256::from(clamp_module_id(module_id));
    let operator = U256::from(operator_id);

    let depositable = runtime
        .tx
        .read("getDepositableAce", runtime.contracts.catalist.getDepositableAce())
        .await?;
    let max_deposits = runtime
        .tx
        .read(
            "getStakingModuleMaxDepositsCount",
            router.getStakingModuleMaxDepositsCount(module, depositable),
        )
        .await?;
    let module_summary = runtime
        .tx
        .read("getStakingModuleSummary", router.getStakingModuleSummary(module))
        .await?;
    let operator_summary = runtime
        .tx
        .read("getNodeOperatorSummary", router.getNodeOperatorSummary(module, operator))
        .await?;
    let node_operator = runtime
        .tx
        .read("getNodeOperator", registry.getNodeOperator(operator, true))
        .await?;
    let allocation = runtime
        .tx
        .read("getDepositsAllocation", router.getDepositsAllocation(depositable))
        .await?;
    let penalized = runtime
        .tx
        .read("isOperatorPenalized", registry.isOperatorPenalized(operator))
        .await?;
    let stuck_penalty_delay = runtime
        .tx
        .read("getStuckPenaltyDelay", registry.getStuckPenaltyDelay())
        .await?;

    let mut output = ScriptOutput::new();
    output
        .section("Deposits")
        .entry("depositable ACE", format_ace(depositable))
        .entry("max deposits count", uint_value(max_deposits))
        .entry("allocated", uint_value(allocation.allocated))
        .entry(
            "allocations",
            Value::Array(allocation.allocations.into_iter().map(uint_value).collect()),
        );
    output
        .section(format!("Staking module {module}"))
        .entry("total exited validators", uint_value(module_summary.totalExitedValidators))
        .entry(
            "total deposited validators",
            uint_value(module_summary.totalDepositedValidators),
        )
        .entry(
            "depositable validators",
            uint_value(module_summary.depositableValidatorsCount),
        );
    output
        .section(format!("Node operator {operator}"))
        .entry("name", node_operator.name)
        .entry("active", node_operator.active)
        .entry("reward address", address_value(node_operator.rewardAddress))
        .entry("total vetted validators", node_operator.totalVettedValidators)
        .entry("total added validators", node_operator.totalAddedValidators)
        .entry("target limit active", operator_summary.isTargetLimitActive)
        .entry("target validators", uint_value(operator_summary.targetValidatorsCount))
        .entry("stuck validators", uint_value(operator_summary.stuckValidatorsCount))
        .entry("refunded validators", uint_value(operator_summary.refundedValidatorsCount))
        .entry(
            "stuck penalty end timestamp",
            uint_value(operator_summary.stuckPenaltyEndTimestamp),
        )
        .entry("total exited validators", uint_value(operator_summary.totalExitedValidators))
        .entry(
            "total deposited validators",
            uint_value(operator_summary.totalDepositedValidators),
        )
        .entry(
            "depositable validators",
            uint_value(operator_summary.depositableValidatorsCount),
        )
        .entry("penalized", penalized)
        .entry("stuck penalty delay", uint_value(stuck_penalty_delay));
    Ok(output)
}

pub async fn protocol_stats(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let catalist = &runtime.contracts.catalist;
    let beacon = runtime.tx.read("getBeaconStat", catalist.getBeaconStat()).await?;
    let buffered = runtime.tx.read("getBufferedAce", catalist.getBufferedAce()).await?;
    let depositable = runtime.tx.read("getDepositableAce", catalist.getDepositableAce()).await?;
    let stake_limit = runtime
        .tx
        .read("getCurrentStakeLimit", catalist.getCurrentStakeLimit())
        .await?;
    let paused = runtime.tx.read("isStakingPaused", catalist.isStakingPaused()).await?;
    let components = runtime
        .tx
        .read(
            "oracleReportComponentsForCatalist",
            runtime.contracts.locator.oracleReportComponentsForCatalist(),
        )
        .await?;

    let checker_address = runtime.resolve_optional(ContractId::OracleReportSanityChecker).await?;
    let checker = OracleReportSanityChecker::new(checker_address, runtime.provider());
    let limits = runtime
        .tx
        .read("getOracleReportLimits", checker.getOracleReportLimits())
        .await?;

    let mut output = ScriptOutput::new();
    output
        .section("Beacon stat")
        .entry("deposited validators", uint_value(beacon.depositedValidators))
        .entry("beacon validators", uint_value(beacon.beaconValidators))
        .entry("beacon balance", format_ace(beacon.beaconBalance));
    output
        .section("Buffer")
        .entry("buffered ACE", format_ace(buffered))
        .entry("depositable ACE", format_ace(depositable))
        .entry("current stake limit", format_ace(stake_limit))
        .entry("staking paused", paused);
    output
        .section("Oracle report limits")
        .entry("churn validators per day", uint_value(limits.churnValidatorsPerDayLimit))
        .entry(
            "one-off CL balance decrease BP",
            uint_value(limits.oneOffCLBalanceDecreaseBPLimit),
        )
        .entry(
            "annual balance increase BP",
            uint_value(limits.annualBalanceIncreaseBPLimit),
        )
        .entry(
            "simulated share rate deviation BP",
            uint_value(limits.simulatedShareRateDeviationBPLimit),
        )
        .entry(
            "max validator exit requests per report",
            uint_value(limits.maxValidatorExitRequestsPerReport),
        )
        .entry(
            "max accounting extra data list items",
            uint_value(limits.maxAccountingExtraDataListItemsCount),
        )
        .entry(
            "max node operators per extra data item",
            uint_value(limits.maxNodeOperatorsPerExtraDataItemCount),
        )
        .entry("request timestamp margin", uint_value(limits.requestTimestampMargin))
        .entry("max positive token rebase", uint_value(limits.maxPositiveTokenRebase));
    output
        .section("Oracle report components")
        .entry("accounting oracle", address_value(components.accountingOracle))
        .entry("EL rewards vault", address_value(components.elRewardsVault))
        .entry(
            "oracle report sanity checker",
            address_value(components.oracleReportSanityChecker),
        )
        .entry("burner", address_value(components.burner))
        .entry("withdrawal queue", address_value(components.withdrawalQueue))
        .entry("withdrawal vault", address_value(components.withdrawalVault))
        .entry(
            "post token rebase receiver",
            address_value(components.postTokenRebaseReceiver),
        );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_ids_below_one_read_the_first_module() {
        assert_eq!(clamp_module_id(0), 1);
        assert_eq!(clamp_module_id(1), 1);
        assert_eq!(clamp_module_id(3), 3);
    }
}
