//! Envvars command implementation

use anyhow::Result;

use super::style;
use cliconf::config::{EnvSnapshot, EnvVarMap};
use cliconf::params::ParameterTree;

pub fn run(tree: &ParameterTree, env: &EnvSnapshot) -> Result<()> {
    let map = EnvVarMap::build(tree)?;
    let width = map.bindings().iter().map(|b| b.path.len()).max().unwrap_or(0);

    println!("{}", style::heading("Environment variables:"));
    for binding in map.bindings() {
        let names: Vec<String> = binding
            .candidates
            .iter()
            .map(|name| match env.get(name) {
                Some(value) if !value.is_empty() => {
                    format!("{} {}", name, console::style("(set)").yellow())
                }
                _ => name.clone(),
            })
            .collect();
        println!("  {:<width$}  {}", binding.path, names.join(", "));
    }
    Ok(())
}
