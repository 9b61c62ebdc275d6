use std::ffi::OsString;
use std::io::{self, Write};
#[cfg(feature = "perf-tracing")]
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::Result;
use procsnap::collector::HostProbe;
use procsnap::report;

#[derive(Parser)]
#[command(
    name = "procsnap",
    version,
    about = "Print allocator, descriptor limit and host memory figures as JSON"
)]
struct Cli {
    /// Perf tracing output file (JSON lines).
    #[cfg(feature = "perf-tracing")]
    #[arg(long)]
    trace_output: Option<PathBuf>,

    /// Stray arguments are accepted and ignored.
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    _extra: Vec<OsString>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    ExitCode::from(finish(run(&cli), &mut io::stderr()))
}

fn run(cli: &Cli) -> Result<()> {
    color_eyre::install()?;

    #[cfg(feature = "perf-tracing")]
    if let Some(path) = &cli.trace_output {
        procsnap::perf::init_tracing_json(path)?;
    }
    #[cfg(not(feature = "perf-tracing"))]
    let _ = cli;

    report::run(&HostProbe, &mut io::stdout().lock())
}

/// Exit status for `result`; failures leave one diagnostic line on `stderr`.
fn finish(result: Result<()>, stderr: &mut impl Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(stderr, "{}", report::diagnostic_line(&err));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::{WrapErr, eyre};

    use super::*;

    #[test]
    fn success_exits_zero_silently() {
        let mut stderr = Vec::new();
        assert_eq!(finish(Ok(()), &mut stderr), 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn failure_exits_one_with_a_single_line() {
        let err = Err::<(), _>(eyre!("getrlimit(RLIMIT_NOFILE) failed"))
            .wrap_err("failed to get descriptors");
        let mut stderr = Vec::new();

        assert_eq!(finish(err, &mut stderr), 1);
        let text = String::from_utf8(stderr).unwrap();
        assert_eq!(
            text,
            "failed to get descriptors: getrlimit(RLIMIT_NOFILE) failed\n"
        );
    }

    #[test]
    fn stray_arguments_are_ignored() {
        assert!(Cli::try_parse_from(["procsnap"]).is_ok());
        assert!(Cli::try_parse_from(["procsnap", "extra"]).is_ok());
        assert!(Cli::try_parse_from(["procsnap", "extra", "--flag"]).is_ok());
    }
}
