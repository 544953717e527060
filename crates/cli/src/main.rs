//! Command-line entry point for `agentsync`.

fn main() -> anyhow::Result<std::process::ExitCode> {
    agentsync::run()
}
