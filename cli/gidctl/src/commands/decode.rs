//! Decode command.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use global_id::GlobalId;
use serde::Serialize;

use crate::error::CliError;
use crate::output::{print_single, FieldRow};

use super::CommandContext;

/// Show the components of a gid:// URI or its param form.
#[derive(Debug, Args)]
pub struct DecodeCommand {
    /// gid:// URI or base64 param.
    input: String,
}

/// A global id as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct GidView {
    pub gid: String,
    pub param: String,
    pub app: String,
    pub model_name: String,
    pub model_id: String,
    pub params: BTreeMap<String, String>,
}

impl From<&GlobalId> for GidView {
    fn from(gid: &GlobalId) -> Self {
        Self {
            gid: gid.to_string(),
            param: gid.to_param(),
            app: gid.app().to_string(),
            model_name: gid.model_name().to_string(),
            model_id: gid.model_id().to_string(),
            params: gid
                .params()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl GidView {
    pub fn rows(&self) -> Vec<FieldRow> {
        let mut rows = vec![
            FieldRow::new("gid", &self.gid),
            FieldRow::new("param", &self.param),
            FieldRow::new("app", &self.app),
            FieldRow::new("model_name", &self.model_name),
            FieldRow::new("model_id", &self.model_id),
        ];
        rows.extend(
            self.params
                .iter()
                .map(|(k, v)| FieldRow::new(format!("params.{k}"), v)),
        );
        rows
    }
}

impl DecodeCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let gid = GlobalId::parse(&self.input).ok_or(CliError::NotAGlobalId(self.input))?;

        let view = GidView::from(&gid);
        print_single(&view, &view.rows(), ctx.format);
        Ok(())
    }
}
