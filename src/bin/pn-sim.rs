use anyhow::Result;
use serde::Serialize;

use procy::config::SimConfig;
use procy::net::{Executor, Outcome};
use procy::options::Options;

#[derive(Serialize)]
struct Report<'a> {
    marking: Vec<&'a str>,
    fired: Vec<&'a str>,
    steps: usize,
    outcome: Outcome,
}

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let options = match Options::parse_from_args(&args) {
        Ok(options) => options,
        // help and version requests exit 0, usage errors exit 2
        Err(err) => match err.downcast_ref::<clap::Error>() {
            Some(clap_err) => clap_err.exit(),
            None => return Err(err),
        },
    };
    log::debug!("pn-sim options: {:?}", options);

    let config = match &options.config {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::default(),
    };
    let (net, marking) = options.build_net()?;
    if config.diagnostics {
        net.log_diagnostics();
    }

    let mut executor = Executor::new(options.execution_options(&config));
    let execution = executor.run(&net, &marking);

    let place_name = |id| net.get_place(id).map_or("?", |p| p.name());
    let transition_name = |id| net.get_transition(id).map_or("?", |t| t.name());

    for (step, transition) in execution.fired().iter().enumerate() {
        log::info!("step {}: {}", step, transition_name(*transition));
    }

    let report = Report {
        marking: execution.marking().iter().map(place_name).collect(),
        fired: execution.fired().iter().copied().map(transition_name).collect(),
        steps: execution.steps(),
        outcome: execution.outcome(),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("marking: {{{}}}", report.marking.join(", "));
        println!("steps: {}", report.steps);
        match report.outcome {
            Outcome::Converged => println!("outcome: converged"),
            Outcome::StepLimitReached => println!("outcome: step limit reached"),
        }
    }
    Ok(())
}
