use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use env_logger::Env;

use discussion::config::{self, LoadOptions};
use discussion::fetch::Fetcher;
use discussion::{Registry, Renderer};

const HELP: &str = "Discussion - Render a Hacker News or Lobsters thread as embeddable HTML.

Usage: discussion [OPTIONS] <URL> [DESCRIPTION]

  --json               Print the thread as JSON instead of HTML
  --config <PATH>      Read configuration from PATH
  --version, -V        Show version and exit
  --help,    -h        Show this help message";

#[derive(Debug, Default)]
struct Args {
    json: bool,
    config_file: Option<PathBuf>,
    url: Option<String>,
    description: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => return,
        Err(err) => {
            eprintln!("error: {err:?}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

/// Returns `None` when a flag was handled and the process should exit.
fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Discussion {}", discussion::VERSION);
                return Ok(None);
            }
            "--help" | "-h" => {
                println!("{HELP}");
                return Ok(None);
            }
            "--json" => args.json = true,
            "--config" => {
                let path = raw.next().context("--config requires a path")?;
                args.config_file = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            positional if args.url.is_none() => args.url = Some(positional.to_string()),
            positional if args.description.is_none() => {
                args.description = Some(positional.to_string());
            }
            positional => bail!("unexpected argument {positional}"),
        }
    }
    if args.url.is_none() {
        bail!("missing <URL>; see --help");
    }
    Ok(Some(args))
}

fn run(args: Args) -> Result<()> {
    let cfg = config::load(LoadOptions {
        config_file: args.config_file,
        env_prefix: None,
    })?;

    let fetcher = Fetcher::new(cfg.http.client_config()).context("create http client")?;
    let registry = Registry::with_defaults(Arc::new(fetcher));

    let url = args.url.unwrap_or_default();
    let thread = registry
        .fetch(&url, args.description.as_deref())
        .with_context(|| format!("load discussion for {url}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&thread).context("encode thread")?);
    } else {
        println!("{}", Renderer::with_options(cfg.render.options()).render(&thread));
    }
    Ok(())
}
