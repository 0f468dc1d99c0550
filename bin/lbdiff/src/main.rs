use std::path::PathBuf;

use lightbulb_automata::prelude::*;
use lightbulb_learning::prelude::*;

use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

fn automaton_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("automaton in the tab separated transition format")
}

fn learner_arg() -> Arg {
    Arg::new("learner")
        .long("learner")
        .value_parser(["dfa", "sfa"])
        .default_value("sfa")
}

fn cli() -> clap::Command {
    Command::new("lbdiff")
    .about("Active learning and differential analysis of finite automata")
    .subcommand_required(true)
    .arg(
        Arg::new("verbosity")
        .short('v')
        .long("verbosity")
        .num_args(0..=1)
        .require_equals(true)
        .value_parser(["info", "debug", "trace"])
        .default_missing_value("info")
    )
    .subcommand(
        Command::new("diff")
        .about("learns the two given automata side by side and reports a word on which they differ")
        .arg(automaton_arg("leader"))
        .arg(automaton_arg("follower"))
        .arg(learner_arg())
        .arg(Arg::new("num-diff").long("num-diff").value_parser(value_parser!(usize)).default_value("5"))
        .arg(Arg::new("max-depth").long("max-depth").value_parser(value_parser!(usize)).default_value("64"))
        .arg(Arg::new("max-rounds").long("max-rounds").value_parser(value_parser!(usize)).default_value("256"))
        .arg(Arg::new("asymmetric").long("asymmetric").action(ArgAction::SetTrue)
            .help("only report words the leader accepts and the follower rejects"))
        .arg(Arg::new("seed").long("seed").action(ArgAction::SetTrue)
            .help("initialize both learners from the automata themselves"))
    )
    .subcommand(
        Command::new("learn")
        .about("learns the given automaton through queries and prints the hypothesis")
        .arg(automaton_arg("target"))
        .arg(learner_arg())
        .arg(Arg::new("dot").long("dot").action(ArgAction::SetTrue)
            .help("print the hypothesis in graphviz format"))
    )
    .subcommand(
        Command::new("regex")
        .about("converts the given automaton into a regular expression")
        .arg(automaton_arg("target"))
    )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn load(matches: &ArgMatches, name: &str) -> Result<DFA, String> {
    let path = matches
        .get_one::<PathBuf>(name)
        .ok_or_else(|| format!("missing argument {name}"))?;
    debug!("reading {name} automaton from {}", path.display());
    DFA::load(path).map_err(|e| format!("could not read {}: {e}", path.display()))
}

fn kind(matches: &ArgMatches) -> LearnerKind {
    match matches.get_one::<String>("learner").map(|s| s.as_str()) {
        Some("dfa") => LearnerKind::Dfa,
        _ => LearnerKind::Sfa,
    }
}

fn usize_arg(matches: &ArgMatches, name: &str) -> usize {
    matches.get_one::<usize>(name).copied().unwrap_or_default()
}

fn diff(matches: &ArgMatches) -> Result<(), String> {
    let leader = load(matches, "leader")?;
    let follower = load(matches, "follower")?;
    let alphabet = leader.alphabet().union(follower.alphabet());

    let config = DiffConfig::default()
        .with_kind(kind(matches))
        .with_num_diff(usize_arg(matches, "num-diff"))
        .with_max_depth(usize_arg(matches, "max-depth"))
        .with_max_rounds(usize_arg(matches, "max-rounds"))
        .with_mode(if matches.get_flag("asymmetric") {
            ExposureMode::Asymmetric
        } else {
            ExposureMode::Symmetric
        });

    let mut session = DiffSession::new(
        alphabet,
        DfaOracle::new(leader.clone()),
        DfaOracle::new(follower.clone()),
    )
    .with_config(config);
    if matches.get_flag("seed") {
        session = session
            .with_leader_seed(leader.clone())
            .with_follower_seed(follower.clone());
    }
    let report = session
        .with_leader_fallback(DfaOracle::new(leader))
        .with_follower_fallback(DfaOracle::new(follower))
        .run()
        .map_err(|e| e.to_string())?;

    println!("{report}");
    Ok(())
}

fn learn(matches: &ArgMatches) -> Result<(), String> {
    let target = load(matches, "target")?;
    let alphabet = target.alphabet().clone();
    let start = std::time::Instant::now();

    let (learned, statistics) = match kind(matches) {
        LearnerKind::Dfa => {
            let mut learner = DfaLearner::new(
                alphabet,
                QueryCache::new(DfaOracle::new(target.clone())),
                DfaOracle::new(target),
            );
            let learned = learner.learn().map_err(|e| e.to_string())?;
            (learned, learner.statistics())
        }
        LearnerKind::Sfa => {
            let mut learner = SfaLearner::new(
                alphabet,
                QueryCache::new(DfaOracle::new(target.clone())),
                DfaOracle::new(target),
            );
            let learned = learner.learn().map_err(|e| e.to_string())?;
            (learned.to_dfa(), learner.statistics())
        }
    };
    info!(
        "learning took {}ms ({statistics})",
        start.elapsed().as_millis()
    );

    if matches.get_flag("dot") {
        print!("{}", learned.dot_representation());
    } else {
        print!("{}", learned.to_text());
    }
    Ok(())
}

fn regex(matches: &ArgMatches) -> Result<(), String> {
    let target = load(matches, "target")?;
    println!("{}", target.to_regex().render(target.alphabet()));
    Ok(())
}

pub fn main() {
    let matches = cli().get_matches();

    setup_logging(&matches);

    let result = match matches.subcommand() {
        Some(("diff", sub_matches)) => diff(sub_matches),
        Some(("learn", sub_matches)) => learn(sub_matches),
        Some(("regex", sub_matches)) => regex(sub_matches),
        _ => unreachable!(),
    };

    if let Err(message) = result {
        error!("{message}");
        std::process::exit(1);
    }
}
