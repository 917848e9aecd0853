use alloy::primitives::{Address, U256};
use catalist_ops_shared::output::ScriptOutput;

use super::oracle::current_initial_epoch;
use super::prelude::ScriptRuntime;
use super::staking::clamp_module_id;
use super::{address_value, record_tx};

#[derive(Debug, Clone)]
pub struct ProtocolInitArgs {
    pub oracle_member: Address,
    /// Defaults to the oracle member.
    pub guardian: Option<Address>,
    pub quorum: u64,
    pub staking_module_id: u64,
    /// Account the roles are granted to. Defaults to `DEPLOYER`, then the signer.
    pub deployer: Option<Address>,
}

/// First-deployment bootstrap: unpauses the protocol and wires in the oracle member and guardian.
pub async fn protocol_init(runtime: &ScriptRuntime, args: &ProtocolInitArgs) -> anyhow::Result<ScriptOutput> {
    let deployer = match args.deployer.or(runtime.config.deployer) {
        Some(deployer) => deployer,
        None => runtime.signer_address()?,
    };
    let guardian = args.guardian.unwrap_or(args.oracle_member);
    let module_id = U256::from(clamp_module_id(args.staking_module_id));
    let quorum = U256::from(args.quorum);
    let contracts = &runtime.contracts;

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("deployer", address_value(deployer))
        .entry("oracle member", address_value(args.oracle_member))
        .entry("guardian", address_value(guardian))
        .entry("quorum", args.quorum);

    tracing::info!("Resuming Catalist");
    let tx_hash = runtime.tx.send("resume", contracts.catalist.resume()).await?;
    record_tx(output.section("Resume Catalist"), tx_hash);

    let queue = &contracts.withdrawal_queue;
    let role = runtime.tx.read("RESUME_ROLE", queue.RESUME_ROLE()).await?;
    let grant = runtime.tx.send("grantRole", queue.grantRole(role, deployer)).await?;
    let resume = runtime.tx.send("resume", queue.resume()).await?;
    output
        .section("Resume withdrawal queue")
        .entry("grant RESUME_ROLE", grant.to_string())
        .entry("resume", resume.to_string());

    let initial_epoch = current_initial_epoch(runtime).await?;
    for (id, hash_consensus) in contracts.hash_consensus() {
        let role = runtime
            .tx
            .read(
                "MANAGE_MEMBERS_AND_QUORUM_ROLE",
                hash_consensus.MANAGE_MEMBERS_AND_QUORUM_ROLE(),
            )
            .await?;
        let grant = runtime
            .tx
            .send("grantRole", hash_consensus.grantRole(role, deployer))
            .await?;
        let add_member = runtime
            .tx
            .send("addMember", hash_consensus.addMember(args.oracle_member, quorum))
            .await?;
        let update_epoch = runtime
            .tx
            .send(
                "updateInitialEpoch",
                hash_consensus.updateInitialEpoch(U256::from(initial_epoch)),
            )
            .await?;
        output
            .section(id.name())
            .entry("grant MANAGE_MEMBERS_AND_QUORUM_ROLE", grant.to_string())
            .entry("add member", add_member.to_string())
            .entry("initial epoch", initial_epoch)
            .entry("update initial epoch", update_epoch.to_string());
    }

    let exit_bus = &contracts.validators_exit_bus_oracle;
    let role = runtime.tx.read("RESUME_ROLE", exit_bus.RESUME_ROLE()).await?;
    let grant = runtime.tx.send("grantRole", exit_bus.grantRole(role, deployer)).await?;
    let resume = runtime.tx.send("resume", exit_bus.resume()).await?;
    output
        .section("Resume validators exit bus oracle")
        .entry("grant RESUME_ROLE", grant.to_string())
        .entry("resume", resume.to_string());

    let tx_hash = runtime
        .tx
        .send(
            "addGuardian",
            contracts.deposit_security_module.addGuardian(guardian, quorum),
        )
        .await?;
    record_tx(output.section("Add deposit security guardian"), tx_hash);

    let router = &contracts.staking_router;
    let role = runtime
        .tx
        .read("STAKING_MODULE_RESUME_ROLE", router.STAKING_MODULE_RESUME_ROLE())
        .await?;
    let grant = runtime.tx.send("grantRole", router.grantRole(role, deployer)).await?;
    let resume = runtime
        .tx
        .send("resumeStakingModule", router.resumeStakingModule(module_id))
        .await?;
    output
        .section("Resume staking module")
        .entry("staking module id", module_id.to_string())
        .entry("grant STAKING_MODULE_RESUME_ROLE", grant.to_string())
        .entry("resume", resume.to_string());

    Ok(output)
}
