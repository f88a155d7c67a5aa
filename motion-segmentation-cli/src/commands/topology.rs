use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::output;

#[derive(Args)]
pub struct TopologyCommand {}

impl TopologyCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        if ctx.json {
            return output::print_json(&ctx.config.topology);
        }
        output::print_topology(&ctx.config.topology);
        Ok(())
    }
}
