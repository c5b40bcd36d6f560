//! # Environment Builder Adapter

use crate::domain::entities::{BlockInfo, Env};
use crate::domain::value_objects::ContractAddress;
use crate::ports::outbound::EnvironmentBuilder;

/// Builds `Env` from the current block and the contract address only.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockEnvBuilder;

impl EnvironmentBuilder for BlockEnvBuilder {
    fn build(&self, block: &BlockInfo, contract: &ContractAddress) -> Env {
        Env::new(block, *contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_pure() {
        let block = BlockInfo {
            height: 5,
            time: 10,
            chain_id: "c".into(),
        };
        let addr = ContractAddress::new([4u8; 20]);
        let env = BlockEnvBuilder.build(&block, &addr);

        assert_eq!(env, BlockEnvBuilder.build(&block, &addr));
        assert_eq!(env.block.height, 5);
        assert_eq!(env.contract.address, addr);
    }
}
