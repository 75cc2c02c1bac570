//! `briefcheck extract` - extraction and clustering only, no verification.
//!
//! The debugging surface for the first two pipeline stages: what would we
//! send to the authority, and how would it be grouped?

use anyhow::Result;
use briefcheck_cluster::{cluster, propagate_context};
use briefcheck_extract::extract;
use briefcheck_protocol::ResultPayload;
use std::path::PathBuf;

use super::context::read_input;

#[derive(Debug)]
pub struct ExtractArgs {
    pub file: Option<PathBuf>,
    pub text: Option<String>,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let text = read_input(args.file, args.text)?;
    let citations = extract(&text);
    let mut clusters = cluster(citations, &text);
    propagate_context(&mut clusters);
    let payload = ResultPayload::from_clusters(&clusters);
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
