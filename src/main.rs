use std::{borrow::Cow, fs, io, path::PathBuf, sync::LazyLock};

use chainsmith::{ChainEnumerator, ChainError, FunctionalGroup, GroupDatabase, LengthBound, Template, enumerator::CARBON};
use clap::{ArgAction, Args, Parser, Subcommand};
use itertools::Itertools;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, IntoDiagnostic, Result, miette};
use rustyline::DefaultEditor;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

static GROUP_DB: LazyLock<GroupDatabase> = LazyLock::new(GroupDatabase::default);

/// Enumerates straight-chain variants of functional-group templates, like C-OH, CC-OH, CCC-OH for R-OH
#[derive(Parser, Debug)]
#[command(version, about, arg_required_else_help = true)]
struct Cli {
    /// Log more detail to stderr (repeat for even more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Substitute a chain of every length from MIN to MAX into each R of TEMPLATE
    Enumerate {
        /// A line-notation template, like R-OH or RC(=O)OR
        template: String,
        #[arg(allow_negative_numbers = true)]
        min: i64,
        #[arg(allow_negative_numbers = true)]
        max: i64,
        #[command(flatten)]
        atom: AtomArgs,
    },
    /// List the functional groups in the database
    Groups {
        /// Include the groups that aren't enabled
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        database: DatabaseArgs,
    },
    /// Enumerate functional groups from the database, printing `name,smiles` lines
    Generate {
        /// Enumerate every group with a template, not just the enabled ones
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        database: DatabaseArgs,
        #[command(flatten)]
        atom: AtomArgs,
    },
    /// Print the line-notation syntax legend
    Syntax {
        #[command(flatten)]
        database: DatabaseArgs,
    },
    /// Interactively enumerate templates (TEMPLATE MIN MAX) or named groups
    Repl {
        #[command(flatten)]
        database: DatabaseArgs,
        #[command(flatten)]
        atom: AtomArgs,
    },
}

#[derive(Args, Debug)]
struct DatabaseArgs {
    /// A KDL functional group database to use instead of the bundled one
    #[arg(short, long, value_name = "FILE")]
    database: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AtomArgs {
    /// The atom repeated to build each chain
    #[arg(short, long, default_value = CARBON)]
    atom: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Enumerate {
            template,
            min,
            max,
            atom,
        } => {
            let enumerator = atom.enumerator()?;
            for chain in enumerate(&enumerator, &template, min, max)? {
                println!("{chain}");
            }
        }
        Command::Groups { all, database } => {
            let db = database.load()?;
            let groups: Vec<_> = if all {
                db.groups().iter().collect()
            } else {
                db.enabled().collect()
            };
            for group in groups {
                println!("{}", describe_group(group));
            }
        }
        Command::Generate {
            all,
            database,
            atom,
        } => {
            let db = database.load()?;
            let enumerator = atom.enumerator()?;
            let enumerated = if all {
                db.enumerate_all(&enumerator)
            } else {
                db.enumerate_enabled(&enumerator)
            };
            for (group, chains) in enumerated {
                info!(group = %group.name, chains = chains.len(), "generated chains");
                for chain in chains {
                    println!("{},{chain}", group.name);
                }
            }
        }
        Command::Syntax { database } => {
            let db = database.load()?;
            for rule in db.syntax() {
                println!(
                    "{:<20} {:<38} {:<10} {}",
                    rule.feature, rule.symbol, rule.example, rule.meaning
                );
            }
        }
        Command::Repl { database, atom } => {
            let db = database.load()?;
            let enumerator = atom.enumerator()?;
            repl(&db, &enumerator)?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // NOTE: Logs go to stderr so that stdout only ever contains generated chains
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

impl DatabaseArgs {
    fn load(&self) -> Result<Cow<'static, GroupDatabase>> {
        let Some(path) = &self.database else {
            debug!("using the bundled functional group database");
            return Ok(Cow::Borrowed(&*GROUP_DB));
        };

        let kdl = fs::read_to_string(path).into_diagnostic()?;
        let db = GroupDatabase::new(path.display().to_string(), kdl)?;
        info!(path = %path.display(), groups = db.groups().len(), "loaded functional group database");
        Ok(Cow::Owned(db))
    }
}

impl AtomArgs {
    fn enumerator(&self) -> Result<ChainEnumerator> {
        ChainEnumerator::new(self.atom.as_str()).map_err(|e| (*e).into())
    }
}

fn enumerate(enumerator: &ChainEnumerator, template: &str, min: i64, max: i64) -> Result<Vec<String>> {
    let template = Template::new(template).map_err(|e| *e)?;
    let (Ok(min_length), Ok(max_length)) = (u32::try_from(min), u32::try_from(max)) else {
        return Err(ChainError::InvalidRange { min, max }.into());
    };
    let bound = LengthBound::new(min_length, max_length).map_err(|e| *e)?;
    Ok(enumerator.chains(&template, bound).collect())
}

fn describe_group(group: &FunctionalGroup) -> String {
    let status = if group.enabled { '*' } else { ' ' };
    let templates = if group.is_enumerable() {
        group.templates.iter().join(", ")
    } else {
        "(reference only)".to_owned()
    };
    format!(
        "{status} {:<26} {:<30} {:<7} {templates}",
        group.name,
        group.formula,
        group.lengths.to_string()
    )
}

// REPL ================================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
enum Request<'s> {
    Group(&'s str),
    Template { template: &'s str, min: i64, max: i64 },
}

fn repl(db: &GroupDatabase, enumerator: &ChainEnumerator) -> Result<()> {
    let mut rl = DefaultEditor::new().into_diagnostic()?;
    while let Ok(line) = rl.readline("Template or group: ") {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line).into_diagnostic()?;

        match respond(db, enumerator, line) {
            Ok(chains) => println!("{}\n", chains.join("\n")),
            Err(report) => render_error(&*report),
        }
    }
    Ok(())
}

fn respond(db: &GroupDatabase, enumerator: &ChainEnumerator, line: &str) -> Result<Vec<String>> {
    match parse_request(db, line)? {
        Request::Group(name) => {
            let group = db
                .group(name)
                .ok_or_else(|| miette!("the functional group {name:?} could not be found"))?;
            if !group.is_enumerable() {
                return Err(miette!(
                    help = "only groups with at least one template can be enumerated",
                    "the functional group {name:?} is for reference only"
                ));
            }
            Ok(group.enumerate(enumerator))
        }
        Request::Template { template, min, max } => enumerate(enumerator, template, min, max),
    }
}

fn parse_request<'s>(db: &GroupDatabase, line: &'s str) -> Result<Request<'s>> {
    if db.group(line).is_some() {
        return Ok(Request::Group(line));
    }

    let Some((template, min, max)) = line.split_whitespace().collect_tuple() else {
        return Err(miette!(
            help = "try something like `R-OH 1 12`, or the name of a group, like `Alcohol`",
            "expected a template followed by a minimum and maximum chain length"
        ));
    };
    let min = min.parse().into_diagnostic()?;
    let max = max.parse().into_diagnostic()?;
    Ok(Request::Template { template, min, max })
}

fn render_error(diagnostic: &dyn Diagnostic) {
    let mut buf = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic)
        .unwrap();
    println!("{buf}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_template_requests() {
        assert_eq!(
            parse_request(&GROUP_DB, "R-OH 1 12").unwrap(),
            Request::Template {
                template: "R-OH",
                min: 1,
                max: 12
            }
        );
        assert_eq!(
            parse_request(&GROUP_DB, "  RC(=O)OR   2 4").unwrap(),
            Request::Template {
                template: "RC(=O)OR",
                min: 2,
                max: 4
            }
        );
        assert!(parse_request(&GROUP_DB, "R-OH 1").is_err());
        assert!(parse_request(&GROUP_DB, "R-OH 1 2 3").is_err());
        assert!(parse_request(&GROUP_DB, "R-OH one 2").is_err());
        assert_eq!(
            parse_request(&GROUP_DB, "R-OH -1 2").unwrap(),
            Request::Template {
                template: "R-OH",
                min: -1,
                max: 2
            }
        );
    }

    #[test]
    fn parse_group_requests() {
        assert_eq!(
            parse_request(&GROUP_DB, "Amine (primary)").unwrap(),
            Request::Group("Amine (primary)")
        );
    }

    #[test]
    fn respond_to_requests() {
        let enumerator = ChainEnumerator::default();
        assert_eq!(
            respond(&GROUP_DB, &enumerator, "R-OH 1 3").unwrap(),
            ["C-OH", "CC-OH", "CCC-OH"]
        );
        assert_eq!(respond(&GROUP_DB, &enumerator, "Alcohol").unwrap().len(), 12);

        let error = respond(&GROUP_DB, &enumerator, "Cage").unwrap_err();
        assert_eq!(error.to_string(), r#"the functional group "Cage" is for reference only"#);
        let error = respond(&GROUP_DB, &enumerator, "CCCC 1 3").unwrap_err();
        assert_eq!(
            error.to_string(),
            r#"the template "CCCC" contains no R placeholder to substitute a chain into"#
        );
        let error = respond(&GROUP_DB, &enumerator, "R-OH 5 2").unwrap_err();
        assert_eq!(error.to_string(), "the chain-length range 5..=2 is invalid");

        for (line, min, max) in [("R-OH -1 2", -1, 2), ("R-OH 0 3", 0, 3), ("R-OH 1 4294967296", 1, 4_294_967_296)] {
            let error = respond(&GROUP_DB, &enumerator, line).unwrap_err();
            assert_eq!(
                error.downcast_ref::<ChainError>(),
                Some(&ChainError::InvalidRange { min, max })
            );
            assert_eq!(error.to_string(), format!("the chain-length range {min}..={max} is invalid"));
        }
        // Bad templates are still reported before bad ranges
        let error = respond(&GROUP_DB, &enumerator, "CCCC -1 2").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ChainError>(),
            Some(ChainError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn describe_groups() {
        let alkene = describe_group(GROUP_DB.group("Alkene").unwrap());
        assert!(alkene.starts_with("* Alkene"));
        assert!(alkene.ends_with("1..=11  R=C"));

        let cage = describe_group(GROUP_DB.group("Cage").unwrap());
        assert!(cage.starts_with("  Cage"));
        assert!(cage.ends_with("(reference only)"));
    }

    #[test]
    fn atom_enumerators() {
        let silicon = AtomArgs { atom: "Si".to_owned() }.enumerator().unwrap();
        assert_eq!(enumerate(&silicon, "R[H]", 2, 3).unwrap(), ["SiSi[H]", "SiSiSi[H]"]);

        let error = AtomArgs { atom: String::new() }.enumerator().unwrap_err();
        assert_eq!(error.downcast_ref::<ChainError>(), Some(&ChainError::EmptyAtom));
        render_error(&ChainError::EmptyAtom);
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
