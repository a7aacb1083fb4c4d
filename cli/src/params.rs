use anyhow::{Context, bail};
use tract_classify::prelude::*;
use tract_classify::render::ChartOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Chart,
    Table,
    Json,
}

impl std::str::FromStr for Output {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> TractResult<Output> {
        match s {
            "chart" => Ok(Output::Chart),
            "table" => Ok(Output::Table),
            "json" => Ok(Output::Json),
            _ => bail!("Unknown output {s:?}"),
        }
    }
}

/// Structure holding the parsed parameters.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub model: Source,
    pub labels: Source,
    pub image: Source,
    pub top: usize,
    pub optimization: Optimization,
    pub output: Output,
    pub chart: ChartOptions,
}

impl Parameters {
    pub fn from_clap(matches: &clap::ArgMatches) -> TractResult<Parameters> {
        let source = |name: &str| -> TractResult<Source> {
            matches
                .value_of(name)
                .with_context(|| format!("Missing {name} argument"))?
                .parse()
                .with_context(|| format!("Invalid {name} location"))
        };
        let top: usize =
            matches.value_of("top").unwrap_or("10").parse().context("Invalid --top value")?;
        let width: usize = matches
            .value_of("width")
            .unwrap_or("40")
            .parse()
            .context("Invalid --width value")?;
        let color = !matches.is_present("no-color") && atty::is(atty::Stream::Stdout);
        Ok(Parameters {
            model: source("model")?,
            labels: source("labels")?,
            image: source("image")?,
            top,
            optimization: matches.value_of("optimize").unwrap_or("optimize").parse()?,
            output: matches.value_of("output").unwrap_or("chart").parse()?,
            chart: ChartOptions { width, color },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> TractResult<Parameters> {
        let matches = crate::command()
            .try_get_matches_from(std::iter::once("classify").chain(args.iter().copied()))?;
        Parameters::from_clap(&matches)
    }

    #[test]
    fn defaults() -> TractResult<()> {
        let params = parse(&["--model", "resnet.onnx", "--labels", "labels.txt", "dog.jpg"])?;
        assert_eq!(params.model, Source::Path("resnet.onnx".into()));
        assert_eq!(params.image, Source::Path("dog.jpg".into()));
        assert_eq!(params.top, 10);
        assert_eq!(params.optimization, Optimization::Optimized);
        assert_eq!(params.output, Output::Chart);
        assert_eq!(params.chart.width, 40);
        Ok(())
    }

    #[test]
    fn overrides() -> TractResult<()> {
        let params = parse(&[
            "-m",
            "https://example.com/resnet.onnx",
            "-l",
            "labels.csv",
            "-k",
            "3",
            "--optimize",
            "declutter",
            "--output",
            "json",
            "--no-color",
            "https://example.com/dog.jpg",
        ])?;
        assert!(params.model.is_remote());
        assert!(params.image.is_remote());
        assert_eq!(params.top, 3);
        assert_eq!(params.optimization, Optimization::Decluttered);
        assert_eq!(params.output, Output::Json);
        assert!(!params.chart.color);
        Ok(())
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["-m", "a.onnx", "-l", "l.txt", "-k", "many", "x.jpg"]).is_err());
        assert!(parse(&["-m", "a.onnx", "-l", "l.txt", "--output", "svg", "x.jpg"]).is_err());
        assert!(parse(&["-m", "a.onnx", "x.jpg"]).is_err());
    }
}
