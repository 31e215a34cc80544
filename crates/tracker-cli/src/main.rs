// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use runtime::TrackerRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracker_app::{AppState, ListQuery, PopularSkill, RemoteCollection};
use tracker_tui::AppRuntime;

const DEMO_SEED: u64 = 20_260_302;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match options.action {
        CliAction::Help => {
            print_help();
            return Ok(());
        }
        CliAction::PrintConfigPath => {
            println!("{}", options.config_path.display());
            return Ok(());
        }
        CliAction::PrintExampleConfig => {
            print!("{}", Config::example_config(&options.config_path));
            return Ok(());
        }
        CliAction::Check | CliAction::Run => {}
    }
    let check_only = options.action == CliAction::Check;

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `tracker --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    if check_only {
        logging::init_stderr(config.log_level())?;
    } else {
        logging::init_file(config.log_level(), &config.log_file()?)?;
    }

    let search_debounce = config.search_debounce()?;
    let mut runtime = if options.demo {
        info!(seed = DEMO_SEED, "using in-memory demo data");
        TrackerRuntime::demo(DEMO_SEED, search_debounce)
    } else {
        let client = tracker_api::Client::new(
            config.base_url(),
            config.timeout()?,
            config.token_source(),
        )
        .with_context(|| {
            format!(
                "invalid [server] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
        info!(base_url = %client.base_url(), "using tracker server");
        TrackerRuntime::connect(&client, search_debounce)
    };

    if check_only {
        let report = check(&runtime)?;
        println!("{}", report.summary());
        return Ok(());
    }

    let mut state = AppState {
        active_tab: config.start_tab(),
        ..AppState::default()
    };
    tracker_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, PartialEq)]
struct CheckReport {
    jobs: usize,
    skills: usize,
    popular: Option<PopularSkill>,
}

impl CheckReport {
    fn summary(&self) -> String {
        let mut summary = format!("ok: {} jobs, {} skills", self.jobs, self.skills);
        if let Some(popular) = &self.popular {
            summary.push_str("; ");
            summary.push_str(&popular.summary());
        }
        summary
    }
}

/// One read of every endpoint the UI touches on start.
fn check<R: AppRuntime>(runtime: &R) -> Result<CheckReport> {
    let query = ListQuery::default();
    let jobs = runtime.jobs().list(&query).context("list jobs")?;
    let skills = runtime.skills().list(&query).context("list skills")?;
    let popular = runtime
        .skills()
        .popular()
        .context("read skill popularity")?;
    info!(jobs = jobs.len(), skills = skills.len(), "check passed");
    Ok(CheckReport {
        jobs: jobs.len(),
        skills: skills.len(),
        popular,
    })
}

/// What a single invocation does. Only one may be named per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliAction {
    Run,
    Check,
    PrintConfigPath,
    PrintExampleConfig,
    Help,
}

impl CliAction {
    fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "--check" => Some(Self::Check),
            "--print-config-path" => Some(Self::PrintConfigPath),
            "--print-example-config" => Some(Self::PrintExampleConfig),
            "--help" | "-h" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    action: CliAction,
    /// Serve from seeded in-memory data instead of the server. Combines with
    /// `Run` and `Check`.
    demo: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        action: CliAction::Run,
        demo: false,
    };
    let mut action_flag: Option<String> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        if let Some(action) = CliAction::from_flag(arg) {
            if action == CliAction::Help {
                options.action = action;
                return Ok(options);
            }
            if let Some(previous) = action_flag.as_deref().filter(|previous| *previous != arg) {
                bail!("{arg} cannot be combined with {previous}");
            }
            options.action = action;
            action_flag = Some(arg.to_owned());
            continue;
        }
        match arg {
            "--config" => {
                let value = iter
                    .next()
                    .filter(|value| !value.as_ref().starts_with("--"))
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--demo" => options.demo = true,
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("tracker: jobs and skills from the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch against seeded in-memory data");
    println!("  --check                  Validate config and reach every endpoint once");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CheckReport, CliAction, CliOptions, check, parse_cli_args};
    use crate::runtime::TrackerRuntime;
    use anyhow::{Result, anyhow};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};
    use tracker_api::{Client, NoToken};
    use tracker_app::PopularSkill;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/tracker-config.toml")
    }

    fn parse(args: &[&str]) -> Result<CliOptions> {
        parse_cli_args(args.iter().copied(), default_options_path())
    }

    #[test]
    fn each_flag_selects_its_action() -> Result<()> {
        let cases: &[(&[&str], CliAction, bool)] = &[
            (&[], CliAction::Run, false),
            (&["--demo"], CliAction::Run, true),
            (&["--check"], CliAction::Check, false),
            (&["--demo", "--check"], CliAction::Check, true),
            (&["--check", "--demo"], CliAction::Check, true),
            (&["--print-config-path"], CliAction::PrintConfigPath, false),
            (&["--print-example-config"], CliAction::PrintExampleConfig, false),
            (&["-h"], CliAction::Help, false),
            (&["--help"], CliAction::Help, false),
        ];
        for (args, action, demo) in cases {
            let options = parse(args)?;
            assert_eq!(options.action, *action, "args {args:?}");
            assert_eq!(options.demo, *demo, "args {args:?}");
            assert_eq!(options.config_path, default_options_path());
        }
        Ok(())
    }

    #[test]
    fn last_config_path_wins() -> Result<()> {
        let options = parse(&["--config", "/a.toml", "--check", "--config", "/b.toml"])?;
        assert_eq!(
            options,
            CliOptions {
                config_path: PathBuf::from("/b.toml"),
                action: CliAction::Check,
                demo: false,
            }
        );
        Ok(())
    }

    #[test]
    fn config_needs_a_path_not_a_flag() {
        for args in [&["--config"][..], &["--config", "--demo"][..]] {
            let error = parse(args).expect_err("missing config value should fail");
            assert!(error.to_string().contains("--config requires a file path"));
        }
    }

    #[test]
    fn conflicting_actions_are_rejected() {
        let error = parse(&["--check", "--print-config-path"]).expect_err("two actions");
        assert_eq!(
            error.to_string(),
            "--print-config-path cannot be combined with --check"
        );
        assert!(parse(&["--check", "--check"]).is_ok());
    }

    #[test]
    fn help_stops_parsing_early() -> Result<()> {
        let options = parse(&["--check", "--help", "--wat"])?;
        assert_eq!(options.action, CliAction::Help);

        let error = parse(&["--wat", "--help"]).expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument \"--wat\""));
        assert!(message.contains("--help"));
        Ok(())
    }

    #[test]
    fn check_summarizes_demo_data() -> Result<()> {
        let report = check(&TrackerRuntime::demo(7, Duration::ZERO))?;
        assert!(report.jobs > 0);
        assert!(report.skills > 0);
        assert!(report.summary().contains("most popular: "));
        Ok(())
    }

    #[test]
    fn check_reads_every_endpoint_from_the_server() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            let mut urls = Vec::new();
            for body in [
                r#"[{"_id":1,"title":"Engineer","company":"Acme"}]"#,
                r#"[{"_id":"s1","name":"Rust","rating":4},{"_id":"s2","name":"Go"}]"#,
                r#"{"_id":"Rust","averageRating":4}"#,
            ] {
                let request = server.recv().expect("request expected");
                urls.push(request.url().to_owned());
                let response = Response::from_string(body).with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
                request.respond(response).expect("response should succeed");
            }
            urls
        });

        let client = Client::new(&base_url, Duration::from_secs(2), Arc::new(NoToken))?;
        let report = check(&TrackerRuntime::connect(&client, Duration::ZERO))?;
        let urls = handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?;

        assert_eq!(urls, vec!["/jobs", "/skills", "/skills/popular"]);
        assert_eq!(
            report,
            CheckReport {
                jobs: 1,
                skills: 2,
                popular: Some(PopularSkill {
                    name: "Rust".to_owned(),
                    average_rating: 4.0,
                }),
            }
        );
        assert_eq!(
            report.summary(),
            "ok: 1 jobs, 2 skills; most popular: Rust (avg 4.0)"
        );
        Ok(())
    }

    #[test]
    fn check_fails_when_the_server_is_down() -> Result<()> {
        let client = Client::new(
            "http://127.0.0.1:9",
            Duration::from_millis(200),
            Arc::new(NoToken),
        )?;
        let error = check(&TrackerRuntime::connect(&client, Duration::ZERO))
            .expect_err("unreachable server should fail");
        let message = format!("{error:#}");
        assert!(message.contains("list jobs"));
        assert!(message.contains("cannot reach"));
        Ok(())
    }
}
