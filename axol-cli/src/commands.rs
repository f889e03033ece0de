//! CLI command bodies. Each function takes already-parsed flags and either a
//! `FeedRegistry` (crawl/feed/prune/stats/feeds) or bare provider args (search, which is
//! explicitly ad-hoc and never touches a store).

use crate::registry::FeedRegistry;
use anyhow::{bail, Context, Result};
use axol_core::{AnyFeed, ProviderAdapter};
use regex::Regex;
use std::collections::HashMap;

/// `search <module> <query>`: runs `adapter.search` directly, no DB writes.
pub fn search(module: &str, query: &str, limit: Option<usize>, raw: bool, quiet: bool) -> Result<()> {
    match module {
        "hackernews" => {
            let adapter = provider_hackernews::HackerNewsAdapter::new();
            let compiled = adapter.default_query(query);
            run_search(&adapter, &compiled, limit, raw, quiet)
        }
        "lobsters" => {
            let adapter = provider_lobsters::LobstersAdapter::new()?;
            let compiled = adapter.default_query(query);
            run_search(&adapter, &compiled, limit, raw, quiet)
        }
        "pinboard" => {
            let adapter = provider_pinboard::PinboardAdapter::new()?;
            let compiled = adapter.default_query(query);
            run_search(&adapter, &compiled, limit, raw, quiet)
        }
        other => bail!(
            "module {other:?} needs credentials to search ad-hoc; run against a configured feed instead"
        ),
    }
}

fn run_search<A: ProviderAdapter>(
    adapter: &A,
    query: &A::Query,
    limit: Option<usize>,
    raw: bool,
    quiet: bool,
) -> Result<()>
where
    A::Entity: std::fmt::Debug,
{
    use axol_core::compile_queries;
    let atoms = compile_queries(std::slice::from_ref(query));
    let mut printed = 0usize;
    for atom in &atoms {
        let results = adapter.search(atom, limit)?;
        for (uid, data) in results {
            if raw {
                if !quiet {
                    println!("{uid}\t{}", data.as_str().unwrap_or("<binary>"));
                }
            } else {
                match adapter.parse(&data) {
                    Ok(entity) => {
                        if !quiet {
                            println!("{uid}\t{entity:?}");
                        }
                    }
                    Err(e) => eprintln!("{uid}\tparse error: {e}"),
                }
            }
            printed += 1;
            if let Some(n) = limit {
                if printed >= n {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

fn compile_filters(include: Option<&str>, exclude: Option<&str>) -> Result<(Option<Regex>, Option<Regex>)> {
    if include.is_some() && exclude.is_some() {
        bail!("--include and --exclude are mutually exclusive");
    }
    let include = include.map(Regex::new).transpose().context("invalid --include regex")?;
    let exclude = exclude.map(Regex::new).transpose().context("invalid --exclude regex")?;
    Ok((include, exclude))
}

/// `crawl`: per-feed crawl pipeline; `--parallel` groups feeds by provider prefix and
/// runs each group's feeds on its own OS thread (no async runtime required per the
/// blocking/synchronous core).
pub fn crawl(
    registry: &FeedRegistry,
    include: Option<&str>,
    exclude: Option<&str>,
    limit: Option<usize>,
    dry: bool,
    quiet: bool,
    parallel: bool,
) -> Result<bool> {
    let (include, exclude) = compile_filters(include, exclude)?;
    let feeds = registry.get_feeds(include.as_ref(), exclude.as_ref())?;

    let mut any_error = false;
    if parallel {
        let mut groups: HashMap<&str, Vec<&dyn AnyFeed>> = HashMap::new();
        for feed in feeds {
            let prefix = feed.name().split('_').next().unwrap_or(feed.name());
            groups.entry(prefix).or_default().push(feed);
        }
        std::thread::scope(|scope| {
            let handles: Vec<_> = groups
                .into_values()
                .map(|group| {
                    scope.spawn(move || {
                        let mut group_ok = true;
                        for feed in group {
                            if !run_crawl_one(feed, limit, dry, quiet) {
                                group_ok = false;
                            }
                        }
                        group_ok
                    })
                })
                .collect();
            for h in handles {
                match h.join() {
                    Ok(group_ok) => any_error |= !group_ok,
                    Err(_) => any_error = true,
                }
            }
        });
    } else {
        for feed in feeds {
            if !run_crawl_one(feed, limit, dry, quiet) {
                any_error = true;
            }
        }
    }
    Ok(any_error)
}

fn run_crawl_one(feed: &dyn AnyFeed, limit: Option<usize>, dry: bool, quiet: bool) -> bool {
    let rows = feed.crawl(limit, dry);
    let mut ok = true;
    for row in rows {
        match row.entity {
            Ok(entity) => {
                if !quiet {
                    println!("{}\t{}\t{entity}", feed.name(), row.uid);
                }
            }
            Err(e) => {
                ok = false;
                eprintln!("{}\t{}\tparse error: {}", feed.name(), row.uid, e.message);
            }
        }
    }
    ok
}

/// `feed`: streams the accumulated store contents for every matched feed.
pub fn feed(registry: &FeedRegistry, include: Option<&str>, exclude: Option<&str>) -> Result<bool> {
    let (include, exclude) = compile_filters(include, exclude)?;
    let feeds = registry.get_feeds(include.as_ref(), exclude.as_ref())?;
    let mut any_error = false;
    for feed in feeds {
        for row in feed.feed() {
            match row.entity {
                Ok(entity) => println!("{}\t{}\t{entity}", feed.name(), row.uid),
                Err(e) => {
                    any_error = true;
                    eprintln!("{}\t{}\tparse error: {}", feed.name(), row.uid, e.message);
                }
            }
        }
    }
    Ok(any_error)
}

/// `prune`: applies each matched feed's current exclude predicate destructively.
pub fn prune(
    registry: &FeedRegistry,
    include: Option<&str>,
    exclude: Option<&str>,
    dry: bool,
    print: bool,
) -> Result<bool> {
    let (include, exclude) = compile_filters(include, exclude)?;
    let feeds = registry.get_feeds(include.as_ref(), exclude.as_ref())?;
    let mut any_error = false;
    for feed in feeds {
        let rows = feed.prune_db(dry);
        println!("{}: pruned {} row(s){}", feed.name(), rows.len(), if dry { " (dry run)" } else { "" });
        if print {
            for row in &rows {
                match &row.entity {
                    Ok(entity) => println!("  {}\t{entity}", row.uid),
                    Err(e) => {
                        any_error = true;
                        eprintln!("  {}\tparse error: {}", row.uid, e.message);
                    }
                }
            }
        }
    }
    Ok(any_error)
}

/// Extracts `field: value` pairs out of an entity's derived-`Debug` rendering. Good
/// enough for a histogram without requiring every provider's `Entity` to also carry a
/// structured field-map representation.
fn debug_fields(rendered: &str) -> Vec<(String, String)> {
    let re = regex::Regex::new(r#"(\w+): ("(?:[^"\\]|\\.)*"|[^,}]+)"#).unwrap();
    re.captures_iter(rendered)
        .map(|c| (c[1].to_string(), c[2].trim().to_string()))
        .collect()
}

/// `stats`: histogram of field values across every matched feed's entities, filtered to
/// `count/total >= threshold`.
pub fn stats(registry: &FeedRegistry, include: Option<&str>, exclude: Option<&str>, threshold: f64) -> Result<()> {
    let (include, exclude) = compile_filters(include, exclude)?;
    let feeds = registry.get_feeds(include.as_ref(), exclude.as_ref())?;
    for feed in feeds {
        let rows = feed.feed();
        let total = rows.len();
        if total == 0 {
            println!("{}: no stored items", feed.name());
            continue;
        }
        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for row in &rows {
            if let Ok(entity) = &row.entity {
                for (field, value) in debug_fields(entity) {
                    *counts.entry((field, value)).or_insert(0) += 1;
                }
            }
        }
        println!("{} ({total} items):", feed.name());
        let mut entries: Vec<_> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        for ((field, value), count) in entries {
            let ratio = count as f64 / total as f64;
            if ratio >= threshold {
                println!("  {field}={value}: {count}/{total} ({:.0}%)", ratio * 100.0);
            }
        }
    }
    Ok(())
}

/// `feeds`: tabulates declared feeds, optionally their compiled SearchQuery fan-out or
/// their stored item count.
pub fn feeds(
    registry: &FeedRegistry,
    include: Option<&str>,
    exclude: Option<&str>,
    db_stats: bool,
) -> Result<()> {
    let (include, exclude) = compile_filters(include, exclude)?;
    let feeds = registry.get_feeds(include.as_ref(), exclude.as_ref())?;
    for feed in feeds {
        if db_stats {
            let count = feed.feed().len();
            println!("{}\t{count} stored item(s)", feed.name());
        } else {
            println!("{}", feed.name());
        }
    }
    Ok(())
}

/// `markdown`: the rendering stage itself is an external collaborator;
/// this command surfaces the command's full flag/exit-code contract and a clear error
/// when no renderer is wired in, rather than silently doing nothing.
pub fn markdown(_include: Option<&str>, _to: Option<&std::path::Path>) -> Result<()> {
    bail!("no markdown renderer configured; wire a Renderer implementation into axol-cli to enable this command")
}
