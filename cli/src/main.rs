#[macro_use]
extern crate log;

use std::process;

use tract_classify::prelude::*;
use tract_classify::render;

mod params;

use params::{Output, Parameters};

fn command() -> clap::Command<'static> {
    use clap::*;
    Command::new("classify")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Classify an image with a pretrained ImageNet network")
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .takes_value(true)
                .required(true)
                .help("ONNX network, path or url"),
        )
        .arg(
            Arg::new("labels")
                .short('l')
                .long("labels")
                .takes_value(true)
                .required(true)
                .help("Label table (id,name or one label per line), path or url"),
        )
        .arg(Arg::new("image").required(true).help("Image to classify, path or url"))
        .arg(
            Arg::new("top")
                .short('k')
                .long("top")
                .takes_value(true)
                .default_value("10")
                .help("Number of classes to display"),
        )
        .arg(
            Arg::new("optimize")
                .long("optimize")
                .takes_value(true)
                .possible_values(["plain", "declutter", "optimize"])
                .default_value("optimize")
                .help("How far tract transforms the network before running it"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .possible_values(["chart", "table", "json"])
                .default_value("chart")
                .help("Output format"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .takes_value(true)
                .default_value("40")
                .help("Width of the longest bar in the chart"),
        )
        .arg(Arg::new("no-color").long("no-color").help("Disable colors in the chart"))
        .arg(
            Arg::new("verbosity")
                .short('v')
                .multiple_occurrences(true)
                .help("Sets the level of verbosity."),
        )
}

/// Entrypoint for the command-line interface.
fn main() {
    let matches = command().get_matches();

    let level = match matches.occurrences_of("verbosity") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = format!("classify={level},tract_classify={level}");
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, filter);
    env_logger::Builder::from_env(env).format_timestamp_nanos().init();

    if let Err(e) = handle(&matches) {
        error!("{e:?}");
        process::exit(1)
    }
}

fn handle(matches: &clap::ArgMatches) -> TractResult<()> {
    let params = Parameters::from_clap(matches)?;
    debug!("{params:?}");
    let pipeline = Pipeline::imagenet(&params.model, &params.labels, params.optimization)?;
    let predictions = pipeline.classify(&params.image)?;
    let top = predictions.top(params.top);
    match params.output {
        Output::Chart => print!("{}", render::bar_chart(top, &params.chart)),
        Output::Table => print!("{}", render::table(top)),
        Output::Json => println!("{}", render::json(top)?),
    }
    Ok(())
}
