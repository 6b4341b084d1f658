//! `sectionforge tree` command

use std::collections::HashSet;

use anyhow::Result;

use crate::cli::TreeArgs;
use crate::commands::{load_config, registry, GlobalArgs};
use sectionforge::crawler::CrawlResult;
use sectionforge::ops::generate::crawl;
use sectionforge::PackageName;

pub fn execute(args: TreeArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = load_config(global)?;
    let mut registry = registry(&mut config, &args.registry)?;

    let result = crawl(&config, registry.as_mut())?;

    let max_depth = args.depth.unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    for root in result.top_level() {
        let mut path = Vec::new();
        print_tree(
            &result,
            root,
            0,
            max_depth,
            &mut seen,
            &mut path,
            args.duplicates,
        );
    }

    Ok(())
}

fn print_tree<'a>(
    result: &'a CrawlResult,
    name: &'a PackageName,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<&'a PackageName>,
    path: &mut Vec<&'a PackageName>,
    show_duplicates: bool,
) {
    if depth > max_depth {
        return;
    }

    let is_duplicate = !seen.insert(name);
    // Never expand a package inside its own subtree
    let collapse = path.contains(&name) || (is_duplicate && !show_duplicates);

    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    };

    let hidden_marker = match result.package(name) {
        Some(package) if !package.visibility().is_visible() => " [hidden]",
        _ => "",
    };
    let dup_marker = if collapse { " (*)" } else { "" };

    println!("{}{}{}{}", prefix, name, hidden_marker, dup_marker);

    if collapse {
        return;
    }

    path.push(name);
    for edge in result.edges_from(name) {
        print_tree(
            result,
            &edge.dependency,
            depth + 1,
            max_depth,
            seen,
            path,
            show_duplicates,
        );
    }
    path.pop();
}
