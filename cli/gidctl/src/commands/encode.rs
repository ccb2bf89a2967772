//! Encode command.

use anyhow::Result;
use clap::Args;
use global_id::{GidUri, GlobalId, Params};

use crate::config::parse_key_val;
use crate::output::print_single;

use super::decode::GidView;
use super::CommandContext;

/// Build a gid:// URI from a model name and id.
#[derive(Debug, Args)]
pub struct EncodeCommand {
    /// Model type name (e.g. Person or Person::Child).
    model_name: String,

    /// Model id.
    model_id: String,

    /// Extra query parameter (KEY=value). May be repeated.
    #[arg(long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,
}

impl EncodeCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let app = ctx.settings.require_app()?;
        let params: Params = self.params.into_iter().collect();
        let gid = GlobalId::from(GidUri::build(app, self.model_name, self.model_id, params)?);

        tracing::debug!(gid = %gid, "encoded global id");

        let view = GidView::from(&gid);
        print_single(&view, &view.rows(), ctx.format);
        Ok(())
    }
}
