use clap::{Parser, Subcommand, ValueEnum};
use migration_orchestrator::catalog::providers::ContractRegistry;
use migration_orchestrator::catalog::validation::contract_graph;
use migration_orchestrator::catalog::OperationId;
use migration_orchestrator::graph::resolver;
use migration_orchestrator::viz;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "plan-cli")]
#[command(about = "Inspect provider contracts and execution plans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a provider contract and report every defect
    Validate {
        /// Provider id (zephyr, qtest)
        provider: String,
    },
    /// Print the execution plan for a provider, full or up to a target
    Plan {
        provider: String,

        /// Target operation, e.g. CREATE_TEST_CASE; omitted = full plan
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Render the dependency graph
    Graph {
        provider: String,

        /// Restrict to the minimal set for one target operation
        #[arg(short, long)]
        target: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Mermaid)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Mermaid,
    Dot,
    Html,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    migration_orchestrator::observability::logging::init();
    let cli = Cli::parse();
    let registry = ContractRegistry::with_builtin();

    match cli.command {
        Commands::Validate { provider } => {
            let contract = lookup(&registry, &provider)?;
            let errors = migration_orchestrator::catalog::validation::validate(contract);
            if errors.is_empty() {
                println!(
                    "{}: OK ({} operations)",
                    contract.provider_id,
                    contract.operations.len()
                );
            } else {
                for error in &errors {
                    eprintln!("{error}");
                }
                return Err(format!("{provider}: {} defect(s)", errors.len()).into());
            }
        }
        Commands::Plan { provider, target } => {
            let contract = lookup(&registry, &provider)?;
            let plan = match parse_target(target)? {
                Some(target) => resolver::resolve_target(contract, target)?,
                None => resolver::resolve_full(contract)?,
            };
            println!("{}", serde_json::to_string_pretty(&plan)?);
            eprintln!(
                "{} operations, estimated {} ms",
                plan.operations.len(),
                plan.estimated_cost_ms()
            );
        }
        Commands::Graph {
            provider,
            target,
            format,
        } => {
            let contract = lookup(&registry, &provider)?;
            let graph = match parse_target(target)? {
                Some(target) => {
                    // Induced subgraph of the minimal plan.
                    let plan = resolver::resolve_target(contract, target)?;
                    let ids: Vec<OperationId> = plan.order();
                    let mut g = migration_orchestrator::graph::DependencyGraph::new();
                    for &id in &ids {
                        g.add_node(id);
                        if let Some(def) = contract.get(id) {
                            for &dep in &def.dependencies {
                                if ids.contains(&dep) {
                                    g.add_edge(dep, id);
                                }
                            }
                        }
                    }
                    g
                }
                None => contract_graph(contract),
            };
            let rendered = match format {
                Format::Mermaid => viz::render_mermaid(&graph, None),
                Format::Dot => viz::render_dot(&graph, None),
                Format::Html => {
                    viz::render_html(&graph, None, &format!("{provider} operation graph"))
                }
            };
            println!("{rendered}");
        }
    }

    Ok(())
}

fn lookup<'a>(
    registry: &'a ContractRegistry,
    provider: &str,
) -> Result<&'a migration_orchestrator::catalog::ProviderContract, Box<dyn std::error::Error>> {
    registry.get(provider).ok_or_else(|| {
        format!(
            "unknown provider {provider:?}; available: {}",
            registry.provider_ids().join(", ")
        )
        .into()
    })
}

fn parse_target(
    target: Option<String>,
) -> Result<Option<OperationId>, Box<dyn std::error::Error>> {
    match target {
        Some(name) => Ok(Some(OperationId::from_str(&name)?)),
        None => Ok(None),
    }
}
