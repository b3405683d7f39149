//! Command-line options for `pn-sim`.
//!
//! A net is described inline: `--place` and `--transition` declare nodes,
//! `--arc FROM>TO` connects them by name and `--mark` puts the initial tokens.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Arg, ArgAction, Command, value_parser};

use crate::config::SimConfig;
use crate::net::{ExecutionOptions, Marking, Net, PlaceId, TransitionId};

fn make_options_parser() -> clap::Command {
    Command::new("pn-sim")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Executes a boolean-token Petri net")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with execution defaults"),
        )
        .arg(
            Arg::new("place")
                .short('p')
                .long("place")
                .value_name("NAME")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("transition")
                .short('t')
                .long("transition")
                .value_name("NAME")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("arc")
                .short('a')
                .long("arc")
                .value_name("FROM>TO")
                .action(ArgAction::Append)
                .help("Place>transition or transition>place"),
        )
        .arg(
            Arg::new("mark")
                .short('m')
                .long("mark")
                .value_name("PLACE")
                .action(ArgAction::Append)
                .help("Place holding a token initially"),
        )
        .arg(
            Arg::new("max-steps")
                .short('n')
                .long("max-steps")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the result as JSON"),
        )
}

#[derive(Debug, Default)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub places: Vec<String>,
    pub transitions: Vec<String>,
    pub arcs: Vec<(String, String)>,
    pub marked: Vec<String>,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
    pub json: bool,
}

enum Node {
    Place(PlaceId),
    Transition(TransitionId),
}

impl Options {
    pub fn parse_from_args(flags: &[String]) -> Result<Self> {
        let matches = make_options_parser().try_get_matches_from(flags.iter())?;
        let strings = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|values| values.cloned().collect())
                .unwrap_or_default()
        };

        let arcs = strings("arc")
            .iter()
            .map(|raw| parse_arc(raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Options {
            config: matches.get_one::<PathBuf>("config").cloned(),
            places: strings("place"),
            transitions: strings("transition"),
            arcs,
            marked: strings("mark"),
            max_steps: matches.get_one::<usize>("max-steps").copied(),
            seed: matches.get_one::<u64>("seed").copied(),
            json: matches.get_flag("json"),
        })
    }

    /// Command-line values win over the config file.
    pub fn execution_options(&self, config: &SimConfig) -> ExecutionOptions {
        let mut options = config.execution_options();
        if let Some(max_steps) = self.max_steps {
            options.max_steps = max_steps;
        }
        if self.seed.is_some() {
            options.seed = self.seed;
        }
        options
    }

    pub fn build_net(&self) -> Result<(Net, Marking)> {
        let mut net = Net::empty();
        let mut nodes = HashMap::new();

        for name in &self.places {
            let id = net.place_named(name.as_str());
            if nodes.insert(name.as_str(), Node::Place(id)).is_some() {
                bail!("node '{}' declared twice", name);
            }
        }
        for name in &self.transitions {
            let id = net.transition_named(name.as_str());
            if nodes.insert(name.as_str(), Node::Transition(id)).is_some() {
                bail!("node '{}' declared twice", name);
            }
        }

        for (from, to) in &self.arcs {
            let lookup = |name: &str| {
                nodes
                    .get(name)
                    .ok_or_else(|| anyhow!("arc refers to undeclared node '{}'", name))
            };
            match (lookup(from.as_str())?, lookup(to.as_str())?) {
                (Node::Place(place), Node::Transition(transition)) => {
                    net.arc(*place, *transition)?
                }
                (Node::Transition(transition), Node::Place(place)) => {
                    net.arc(*transition, *place)?
                }
                _ => bail!(
                    "arc {}>{} must connect a place and a transition",
                    from,
                    to
                ),
            }
        }

        let marking = self
            .marked
            .iter()
            .map(|name| match nodes.get(name.as_str()) {
                Some(Node::Place(place)) => Ok(*place),
                Some(Node::Transition(_)) => Err(anyhow!("cannot mark transition '{}'", name)),
                None => Err(anyhow!("cannot mark undeclared place '{}'", name)),
            })
            .collect::<Result<Marking>>()?;

        Ok((net, marking))
    }
}

fn parse_arc(raw: &str) -> Result<(String, String)> {
    let (from, to) = raw
        .split_once('>')
        .with_context(|| format!("arc '{}' is not of the form FROM>TO", raw))?;
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        bail!("arc '{}' is missing an endpoint", raw);
    }
    Ok((from.to_owned(), to.to_owned()))
}
