//! Symbols command implementation.
//!
//! This module lists the symbols the provider knows, with optional filtering.

use crate::config::FileConfig;
use anyhow::{Context, Result};
use barvault_lib::prelude::*;

/// List provider symbols matching `filter`.
pub(crate) async fn list_symbols(
    settings: &FileConfig,
    provider_url: Option<&str>,
    filter: Option<&str>,
    selected_only: bool,
) -> Result<()> {
    let provider = HttpProvider::new(settings.client_config(provider_url))
        .context("Failed to create provider client")?;
    let symbols = provider
        .list_symbols()
        .await
        .context("Failed to list provider symbols")?;

    let symbols = filter_symbols(symbols, filter, selected_only);
    if symbols.is_empty() {
        println!("No symbols found.");
        return Ok(());
    }

    println!("{:<20} {:<10} {:<10}", "SYMBOL", "SELECTED", "VISIBLE");
    println!("{}", "-".repeat(40));

    for symbol in &symbols {
        println!(
            "{:<20} {:<10} {:<10}",
            symbol.name,
            yes_no(symbol.selected),
            yes_no(symbol.visible)
        );
    }

    println!("\nTotal: {} symbols", symbols.len());
    Ok(())
}

fn filter_symbols(
    mut symbols: Vec<SymbolInfo>,
    filter: Option<&str>,
    selected_only: bool,
) -> Vec<SymbolInfo> {
    let pattern = filter.map(str::to_lowercase);
    symbols.retain(|s| {
        (!selected_only || s.selected)
            && pattern
                .as_deref()
                .is_none_or(|p| s.name.to_lowercase().contains(p))
    });
    symbols.sort_by(|a, b| a.name.cmp(&b.name));
    symbols
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str, selected: bool) -> SymbolInfo {
        SymbolInfo {
            name: name.to_string(),
            selected,
            visible: true,
        }
    }

    #[test]
    fn test_filter_symbols() {
        let all = vec![
            symbol("XAUUSD", false),
            symbol("EURUSD", true),
            symbol("EURGBP", false),
        ];

        let eur = filter_symbols(all.clone(), Some("eur"), false);
        let names: Vec<_> = eur.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["EURGBP", "EURUSD"]);

        let selected = filter_symbols(all.clone(), None, true);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "EURUSD");

        assert_eq!(filter_symbols(all, None, false).len(), 3);
    }
}
