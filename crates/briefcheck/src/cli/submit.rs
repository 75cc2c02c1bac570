//! `briefcheck submit` - route a document through the engine.

use anyhow::Result;
use briefcheck::RouteOutcome;
use briefcheck_protocol::{InputKind, RunMode};
use std::path::PathBuf;

use super::context::{read_input, EngineContext};

#[derive(Debug)]
pub struct SubmitArgs {
    pub file: Option<PathBuf>,
    pub text: Option<String>,
    pub mode: Option<String>,
}

pub async fn run(ctx: &EngineContext, args: SubmitArgs) -> Result<()> {
    let input_kind = if args.file.is_some() {
        InputKind::FileDerivedText
    } else {
        InputKind::Text
    };
    let force_mode = match args.mode.as_deref() {
        Some(raw) => Some(raw.parse::<RunMode>().map_err(anyhow::Error::msg)?),
        None => None,
    };
    let text = read_input(args.file, args.text)?;

    match ctx.router.submit(text, input_kind, force_mode).await? {
        RouteOutcome::Completed(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        RouteOutcome::Accepted(ack) => {
            println!("{}", serde_json::to_string_pretty(&ack)?);
        }
    }
    Ok(())
}
