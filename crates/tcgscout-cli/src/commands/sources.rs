use std::fmt::Write as _;

use serde::Serialize;
use tcgscout_core::{CommandService, Game, PriceRouter, ProviderId, SourceHealth, SourceSnapshot};

use crate::cli::SourcesArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SourceRoute {
    game: Game,
    /// 1-based position in the game's plan; lower wins latency ties.
    priority: usize,
}

#[derive(Debug, Serialize)]
struct SourceStatus {
    id: ProviderId,
    name: &'static str,
    configured: bool,
    status: &'static str,
    routes: Vec<SourceRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<SourceHealth>,
}

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<SourceStatus>,
}

pub fn run(args: &SourcesArgs, service: &CommandService) -> Result<CommandResult, CliError> {
    let sources = service
        .router()
        .snapshot()
        .into_iter()
        .map(|snapshot| to_status(snapshot, args.verbose))
        .collect::<Vec<_>>();

    let text = render_text(&sources, args.verbose);
    let data = serde_json::to_value(SourcesResponseData { sources })?;

    Ok(CommandResult {
        data,
        text,
        failed: false,
        latency_ms: 0,
    })
}

fn to_status(snapshot: SourceSnapshot, verbose: bool) -> SourceStatus {
    let routes = snapshot
        .games
        .iter()
        .filter_map(|game| {
            PriceRouter::plan(*game)
                .iter()
                .position(|provider| *provider == snapshot.id)
                .map(|index| SourceRoute {
                    game: *game,
                    priority: index + 1,
                })
        })
        .collect();

    SourceStatus {
        id: snapshot.id,
        name: snapshot.name,
        configured: snapshot.configured,
        status: snapshot.status_label(),
        routes,
        health: verbose.then_some(snapshot.health),
    }
}

fn render_text(sources: &[SourceStatus], verbose: bool) -> String {
    let mut out = format!("{:<12} {:<16} {:<15} routes\n", "id", "name", "status");
    for source in sources {
        let routes = source
            .routes
            .iter()
            .map(|route| format!("{}#{}", route.game, route.priority))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "{:<12} {:<16} {:<15} {routes}",
            source.id.as_str(),
            source.name,
            source.status
        );

        if let Some(health) = source.health.filter(|_| verbose) {
            let _ = writeln!(
                out,
                "{:<12} failures={} outages={} response_time_ms={}",
                "", health.failures, health.outages, health.response_time_ms
            );
        }
    }
    out
}
